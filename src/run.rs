//! @ai:module:intent Run a task over its file set and record per-file outcomes
//! @ai:module:layer application
//! @ai:module:public_api RunOptions, RunReport, FileOutcome, run_task, run_files
//! @ai:module:depends_on assembler, config, document, grammar, error
//! @ai:module:stateless true

use crate::assembler::emit_file;
use crate::config::Task;
use crate::document::Index;
use crate::error::{Error, Result};
use crate::grammar::GrammarCache;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// @ai:intent Where and how a run writes its documents
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output: PathBuf,
    /// Remove the output directory before writing.
    pub clean: bool,
}

/// @ai:intent Outcome for one source file
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub result: Result<PathBuf>,
}

/// @ai:intent Result of running a task
#[derive(Debug)]
pub struct RunReport {
    pub task: String,
    pub output: PathBuf,
    pub outcomes: Vec<FileOutcome>,
    pub index: Option<PathBuf>,
}

impl RunReport {
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.source.as_path(), e)))
    }

    /// @ai:intent Check if every file was emitted
    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// @ai:intent Resolve a task's files and emit a document for each
/// @ai:post a failing file never stops the rest; the index lists written documents only
/// @ai:effects fs:read, fs:write
pub fn run_task(task: &Task, grammars: &GrammarCache, options: &RunOptions) -> Result<RunReport> {
    let files = task.files()?;
    run_files(task, &files, grammars, options)
}

/// @ai:intent Emit documents for an explicit file list
/// @ai:effects fs:read, fs:write
pub fn run_files(
    task: &Task,
    files: &[PathBuf],
    grammars: &GrammarCache,
    options: &RunOptions,
) -> Result<RunReport> {
    if options.clean && options.output.is_dir() {
        tracing::info!("Removing previous output {}", options.output.display());
        std::fs::remove_dir_all(&options.output)?;
    }

    tracing::info!(
        "Task `{}`: processing {} file{}",
        task.name,
        files.len(),
        if files.len() == 1 { "" } else { "s" }
    );

    // Each file gets its own builder; only the grammar cache is shared.
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| FileOutcome {
            source: path.clone(),
            result: emit_file(path, task, grammars, &options.output),
        })
        .collect();

    for (path, error) in outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| (&o.source, e)))
    {
        tracing::warn!("Skipped {}: {}", path.display(), error);
    }

    let index = Index {
        files: outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect(),
    };
    let index_path = if index.files.is_empty() {
        None
    } else {
        Some(index.write(&options.output)?)
    };

    Ok(RunReport {
        task: task.name.clone(),
        output: options.output.clone(),
        outcomes,
        index: index_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::CommentTokens;
    use crate::config::Pattern;
    use crate::error::FilterViolation;
    use tempfile::TempDir;

    fn task_for(dir: &Path) -> Task {
        let mut task = Task::with_tokens(CommentTokens::new("/*", "*", "*/", "//"));
        task.name = "docs".to_string();
        task.file = Pattern {
            include: vec![format!("{}/src/*.c", dir.display())],
            exclude: vec![],
        };
        task.keyword.exclude = vec!["secret".to_string()];
        task
    }

    #[test]
    fn test_run_writes_documents_and_index() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("a.c"), "// .title A\n").unwrap();
        std::fs::write(src.join("b.c"), "// .secret B\n").unwrap();
        std::fs::write(src.join("c.c"), "// .title C\n").unwrap();

        let output = dir.path().join("out");
        std::fs::create_dir_all(output.join("stale")).unwrap();

        let options = RunOptions {
            output: output.clone(),
            clean: true,
        };
        let report = run_task(&task_for(dir.path()), &GrammarCache::default(), &options).unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.written().count(), 2);
        assert!(!report.passed());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.ends_with("b.c"));
        assert!(matches!(
            failures[0].1,
            Error::Filter {
                violation: FilterViolation::KeywordExcluded { .. },
                ..
            }
        ));

        assert!(!output.join("stale").exists());
        let index: Index =
            serde_json::from_str(&std::fs::read_to_string(report.index.unwrap()).unwrap()).unwrap();
        assert_eq!(index.files.len(), 2);
        assert!(index.files.iter().all(|f| f.exists()));
    }

    #[test]
    fn test_outcomes_keep_input_order() {
        let dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..20)
            .map(|i| {
                let path = dir.path().join(format!("f{:02}.c", i));
                std::fs::write(&path, format!("// .n {}\n", i)).unwrap();
                path
            })
            .collect();

        let options = RunOptions {
            output: dir.path().join("out"),
            clean: false,
        };
        let task = Task::with_tokens(CommentTokens::new("", "", "", "//"));
        let report = run_files(&task, &files, &GrammarCache::default(), &options).unwrap();

        let sources: Vec<_> = report.outcomes.iter().map(|o| o.source.clone()).collect();
        assert_eq!(sources, files);
        assert!(report.passed());
    }

    #[test]
    fn test_missing_file_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let options = RunOptions {
            output: dir.path().join("out"),
            clean: false,
        };
        let task = Task::with_tokens(CommentTokens::new("", "", "", "//"));
        let files = vec![dir.path().join("gone.c")];

        let report = run_files(&task, &files, &GrammarCache::default(), &options).unwrap();
        assert!(matches!(
            report.outcomes[0].result,
            Err(Error::FileRead { .. })
        ));
        assert!(report.index.is_none());
    }
}
