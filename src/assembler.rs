//! @ai:module:intent Filter, collapse and assemble parsed files into documents
//! @ai:module:layer application
//! @ai:module:public_api check_filters, assemble, emit_file
//! @ai:module:depends_on builder, collapse, document, config, grammar, error
//! @ai:module:stateless true

use crate::builder::{parse_file, ParsedFile};
use crate::collapse::collapse_appending;
use crate::config::Task;
use crate::document::{document_path, Document};
use crate::error::{Error, FilterViolation, Result};
use crate::grammar::GrammarCache;
use crate::node::{Node, Tree};
use std::path::{Path, PathBuf};

/// @ai:intent Check the task's keyword and configuration filters against a parsed file
/// @ai:post the first failing check is reported, in the order keyword include,
///          keyword exclude, configuration include, configuration exclude
/// @ai:effects pure
pub fn check_filters(
    task: &Task,
    tree: &Tree,
    configuration: &[Node],
) -> std::result::Result<(), FilterViolation> {
    if !task.keyword.include.is_empty() && tree.find_keyword(&task.keyword.include).is_none() {
        return Err(FilterViolation::KeywordIncludeNotFound);
    }

    if let Some(keyword) = tree.find_keyword(&task.keyword.exclude) {
        return Err(FilterViolation::KeywordExcluded {
            keyword: keyword.to_string(),
        });
    }

    let include = &task.configuration.include;
    if let Some(node) = configuration
        .iter()
        .find(|n| !include.is_empty() && !include.contains(&n.keyword))
    {
        return Err(FilterViolation::ConfigurationNotIncluded {
            keyword: node.keyword.clone(),
        });
    }

    let exclude = &task.configuration.exclude;
    if let Some(node) = configuration.iter().find(|n| exclude.contains(&n.keyword)) {
        return Err(FilterViolation::ConfigurationExcluded {
            keyword: node.keyword.clone(),
        });
    }

    Ok(())
}

/// @ai:intent Turn a parsed file into a document, or refuse it
/// @ai:post on a filter violation nothing is collapsed or built
/// @ai:effects time
pub fn assemble(parsed: ParsedFile, task: &Task) -> Result<Document> {
    let ParsedFile {
        path,
        mut tree,
        configuration,
    } = parsed;

    check_filters(task, &tree, &configuration).map_err(|violation| Error::Filter {
        path: path.clone(),
        violation,
    })?;

    collapse_appending(&mut tree);
    Ok(Document::new(&path, &tree, &configuration))
}

/// @ai:intent Run the whole pipeline for one source file and write its document
/// @ai:pre output is the directory documents are written under
/// @ai:post returns the written document path; nothing is written on failure
/// @ai:effects fs:read, fs:write
pub fn emit_file(
    path: &Path,
    task: &Task,
    grammars: &GrammarCache,
    output: &Path,
) -> Result<PathBuf> {
    let parsed = parse_file(path, task, grammars)?;
    let document = assemble(parsed, task)?;
    let target = document_path(output, path);
    document.write(&target)?;
    tracing::debug!("Wrote {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::parse_str;
    use crate::comment::CommentTokens;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn c_task() -> Task {
        Task::with_tokens(CommentTokens::new("/*", "*", "*/", "//"))
    }

    fn parsed(source: &str, task: &Task) -> ParsedFile {
        let (tree, configuration) = parse_str(source, "c", task, &GrammarCache::default());
        ParsedFile {
            path: PathBuf::from("src/sample.c"),
            tree,
            configuration,
        }
    }

    fn violation(source: &str, task: &Task) -> Option<FilterViolation> {
        let p = parsed(source, task);
        check_filters(task, &p.tree, &p.configuration).err()
    }

    #[test]
    fn test_keyword_include() {
        let mut task = c_task();
        task.keyword.include = vec!["title".to_string()];

        assert_eq!(violation("// .title x", &task), None);
        assert_eq!(
            violation("// .other x", &task),
            Some(FilterViolation::KeywordIncludeNotFound)
        );
    }

    #[test]
    fn test_keyword_exclude() {
        let mut task = c_task();
        task.keyword.exclude = vec!["secret".to_string()];

        assert_eq!(violation("// .title x", &task), None);
        assert_eq!(
            violation("// .title x\n//  .secret y", &task),
            Some(FilterViolation::KeywordExcluded {
                keyword: "secret".to_string()
            })
        );
    }

    #[test]
    fn test_configuration_include_and_exclude() {
        let mut task = c_task();
        task.configuration.include = vec!["version".to_string()];
        assert_eq!(violation("// .emits.version 1", &task), None);
        assert_eq!(
            violation("// .emits.version 1\n// .emits.draft", &task),
            Some(FilterViolation::ConfigurationNotIncluded {
                keyword: "draft".to_string()
            })
        );

        let mut task = c_task();
        task.configuration.exclude = vec!["draft".to_string()];
        assert_eq!(violation("// .emits.version 1", &task), None);
        assert_eq!(
            violation("// .emits.draft", &task),
            Some(FilterViolation::ConfigurationExcluded {
                keyword: "draft".to_string()
            })
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let mut task = c_task();
        task.keyword.include = vec!["missing".to_string()];
        task.keyword.exclude = vec!["secret".to_string()];
        task.configuration.exclude = vec!["draft".to_string()];

        assert_eq!(
            violation("// .emits.draft\n// .secret x", &task),
            Some(FilterViolation::KeywordIncludeNotFound)
        );
    }

    #[test]
    fn test_assemble_collapses_block() {
        let source = "/* .a ...::\n * line one\n * line two\n */";
        let document = assemble(parsed(source, &c_task()), &c_task()).unwrap();

        assert_eq!(document.data.len(), 1);
        assert_eq!(document.data[0].keyword, "a");
        assert_eq!(document.data[0].value, "line one\nline two");
        assert!(document.data[0].data.is_empty());
        assert_eq!(document.file.name, "sample");
        assert_eq!(document.file.extension, "c");
    }

    #[test]
    fn test_emit_writes_document() {
        let out = TempDir::new().unwrap();
        let mut file = NamedTempFile::with_suffix(".c").unwrap();
        writeln!(file, "// .title Hello").unwrap();

        let target = emit_file(file.path(), &c_task(), &GrammarCache::default(), out.path()).unwrap();

        assert!(target.starts_with(out.path()));
        let document: Document =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(document.data[0].keyword, "title");
        assert_eq!(document.data[0].value, "Hello");
    }

    #[test]
    fn test_excluded_keyword_writes_nothing() {
        let out = TempDir::new().unwrap();
        let mut file = NamedTempFile::with_suffix(".c").unwrap();
        writeln!(file, "// .secret hunter2").unwrap();

        let mut task = c_task();
        task.keyword.exclude = vec!["secret".to_string()];

        let err = emit_file(file.path(), &task, &GrammarCache::default(), out.path());
        assert!(matches!(err, Err(Error::Filter { .. })));
        assert!(!document_path(out.path(), file.path()).exists());
    }
}
