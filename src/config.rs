//! @ai:module:intent Read-only task configuration loaded from emits.json
//! @ai:module:layer infrastructure
//! @ai:module:public_api ConfigFile, Task, Group, Comment, Block, Pattern, CONFIG_FILE_NAME
//! @ai:module:depends_on comment, error
//! @ai:module:stateless true

use crate::comment::CommentTokens;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "emits.json";

/// @ai:intent Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "group", default)]
    pub groups: Vec<Group>,
    #[serde(rename = "task", default)]
    pub tasks: Vec<Task>,
}

/// @ai:intent A named set of tasks run together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// @ai:intent One extraction task: what to read and how to recognize annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comment: Comment,
    /// Expose raw source lines inside appending blocks.
    #[serde(default)]
    pub source: bool,
    #[serde(default)]
    pub file: Pattern,
    #[serde(default)]
    pub keyword: Pattern,
    #[serde(default)]
    pub configuration: Pattern,
    #[serde(default)]
    pub grammar: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub block: Block,
    #[serde(default)]
    pub inline: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub close: String,
}

/// @ai:intent Include/exclude lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Comment {
    /// @ai:intent Flatten into the token set the classifier uses
    /// @ai:effects pure
    pub fn tokens(&self) -> CommentTokens {
        CommentTokens {
            open: self.block.open.clone(),
            line: self.block.line.clone(),
            close: self.block.close.clone(),
            inline: self.inline.clone(),
        }
    }
}

impl Pattern {
    /// @ai:intent Trim, drop empty entries and deduplicate both lists, keeping first occurrences
    /// @ai:effects pure
    pub fn sanitize(&mut self) {
        self.include = deduplicate(&self.include);
        self.exclude = deduplicate(&self.exclude);
    }
}

fn deduplicate(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl Task {
    /// @ai:intent Build an unnamed task that only carries comment tokens
    /// @ai:effects pure
    pub fn with_tokens(tokens: CommentTokens) -> Self {
        Self {
            comment: Comment {
                block: Block {
                    open: tokens.open,
                    line: tokens.line,
                    close: tokens.close,
                },
                inline: tokens.inline,
            },
            ..Default::default()
        }
    }

    /// @ai:intent Normalize every pattern list
    pub fn sanitize(&mut self) {
        self.file.sanitize();
        self.keyword.sanitize();
        self.configuration.sanitize();
    }

    /// @ai:intent Resolve the task's file globs into a deduplicated path list
    /// @ai:post result keeps include order and contains no path matched by an exclude glob
    /// @ai:effects fs:read
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let includes = expand_globs(&self.file.include)?;
        let excludes: HashSet<PathBuf> = expand_globs(&self.file.exclude)?.into_iter().collect();

        Ok(includes
            .into_iter()
            .filter(|path| !excludes.contains(path))
            .collect())
    }
}

fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for pattern in deduplicate(patterns) {
        let entries = glob::glob(&pattern).map_err(|e| Error::Glob {
            pattern: pattern.clone(),
            source: e,
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    if seen.insert(path.clone()) {
                        paths.push(path);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable path: {}", e),
            }
        }
    }

    Ok(paths)
}

impl ConfigFile {
    /// @ai:intent Load and sanitize a configuration file
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| Error::Configuration {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// @ai:intent Parse and sanitize configuration JSON
    /// @ai:effects pure
    pub fn from_json(json: &str) -> Result<Self> {
        let mut file: ConfigFile = serde_json::from_str(json)?;
        for task in &mut file.tasks {
            task.sanitize();
        }
        Ok(file)
    }

    /// @ai:intent Find a task by case-insensitive name
    pub fn task(&self, name: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| same_name(&t.name, name))
            .ok_or_else(|| Error::TaskNotFound(name.trim().to_string()))
    }

    /// @ai:intent Find a group by case-insensitive name
    pub fn group(&self, name: &str) -> Result<&Group> {
        self.groups
            .iter()
            .find(|g| same_name(&g.name, name))
            .ok_or_else(|| Error::GroupNotFound(name.trim().to_string()))
    }

    /// @ai:intent Resolve every task a group names
    /// @ai:post fails on the first task name that does not exist
    pub fn group_tasks(&self, name: &str) -> Result<Vec<&Task>> {
        self.group(name)?
            .tasks
            .iter()
            .map(|t| self.task(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "group": [{ "name": "Docs", "tasks": ["api", "web"] }],
        "task": [
            {
                "name": "API",
                "description": "Public API",
                "comment": { "block": { "open": "/*", "line": "*", "close": "*/" }, "inline": "//" },
                "source": true,
                "file": { "include": ["src/*.go", " src/*.go ", ""], "exclude": [] },
                "keyword": { "include": ["title", "title"] },
                "grammar": ["go"]
            },
            { "name": "web" }
        ]
    }"#;

    #[test]
    fn test_load_and_sanitize() {
        let config = ConfigFile::from_json(CONFIG).unwrap();
        let task = config.task(" api ").unwrap();

        assert_eq!(task.description, "Public API");
        assert_eq!(task.file.include, vec!["src/*.go"]);
        assert_eq!(task.keyword.include, vec!["title"]);
        assert!(task.configuration.include.is_empty());
        assert!(task.source);
        assert_eq!(task.comment.tokens(), CommentTokens::new("/*", "*", "*/", "//"));
    }

    #[test]
    fn test_defaults_for_sparse_task() {
        let config = ConfigFile::from_json(CONFIG).unwrap();
        let web = config.task("WEB").unwrap();
        assert!(!web.source);
        assert_eq!(web.comment.tokens(), CommentTokens::default());
    }

    #[test]
    fn test_missing_task_and_group() {
        let config = ConfigFile::from_json(CONFIG).unwrap();
        assert!(matches!(config.task("nope"), Err(Error::TaskNotFound(_))));
        assert!(matches!(config.group("nope"), Err(Error::GroupNotFound(_))));
    }

    #[test]
    fn test_group_tasks() {
        let config = ConfigFile::from_json(CONFIG).unwrap();
        let names: Vec<_> = config
            .group_tasks("docs")
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, vec!["API", "web"]);
    }

    #[test]
    fn test_files_include_minus_exclude() {
        let dir = TempDir::new().unwrap();
        for name in ["a.go", "b.go", "skip.go", "c.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let root = dir.path().display();

        let task = Task {
            file: Pattern {
                include: vec![format!("{}/*.go", root), format!("{}/a.*", root)],
                exclude: vec![format!("{}/skip.go", root)],
            },
            ..Default::default()
        };

        let files = task.files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_invalid_glob_is_error() {
        let task = Task {
            file: Pattern {
                include: vec!["[".to_string()],
                exclude: vec![],
            },
            ..Default::default()
        };
        assert!(matches!(task.files(), Err(Error::Glob { .. })));
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            ConfigFile::load(&path),
            Err(Error::Configuration { .. })
        ));
    }
}
