//! @ai:module:intent Emitted document format and its writer
//! @ai:module:layer infrastructure
//! @ai:module:public_api Document, FileMeta, DocumentNode, Index, document_path
//! @ai:module:depends_on node, error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::node::{Node, NodeId, Tree};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Suffix appended to a source path to name its document.
pub const DOCUMENT_SUFFIX: &str = ".json";
/// Name of the index file written next to the documents of a run.
pub const INDEX_FILE_NAME: &str = "emits.json";

/// @ai:intent The emitted document for one source file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub file: FileMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configuration: Vec<DocumentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DocumentNode>,
}

/// @ai:intent Source file metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extension: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
}

fn is_zero_usize(n: &usize) -> bool {
    *n == 0
}

fn is_zero_i32(n: &i32) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// @ai:intent Serialized node; empty fields are omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentNode {
    #[serde(default, skip_serializing_if = "is_zero_usize")]
    pub parent: usize,
    #[serde(default, skip_serializing_if = "is_zero_usize")]
    pub line: usize,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub index: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keyword: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DocumentNode>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub separator: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl From<&Node> for DocumentNode {
    fn from(node: &Node) -> Self {
        Self {
            parent: node.parent,
            line: node.line,
            index: node.index,
            keyword: node.keyword.clone(),
            value: node.value.clone(),
            data: Vec::new(),
            separator: node.separator,
            flags: node.flags.clone(),
        }
    }
}

impl DocumentNode {
    /// @ai:intent Copy a subtree out of the arena into owned nodes
    /// @ai:effects pure
    pub fn from_tree(tree: &Tree, id: NodeId) -> Self {
        let mut node = Self::from(tree.get(id));
        node.data = tree
            .children(id)
            .iter()
            .map(|child| Self::from_tree(tree, *child))
            .collect();
        node
    }
}

impl FileMeta {
    /// @ai:intent Describe a source path, stamped with the current UTC time
    /// @ai:effects time
    pub fn for_path(path: &Path) -> Self {
        Self {
            path: path
                .parent()
                .map(|p| p.display().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ".".to_string()),
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl Document {
    /// @ai:intent Assemble a document from a resolved tree and its configuration nodes
    /// @ai:effects time
    pub fn new(path: &Path, tree: &Tree, configuration: &[Node]) -> Self {
        Self {
            file: FileMeta::for_path(path),
            configuration: configuration.iter().map(DocumentNode::from).collect(),
            data: tree
                .children(tree.root())
                .iter()
                .map(|id| DocumentNode::from_tree(tree, *id))
                .collect(),
        }
    }

    /// @ai:intent Write the document as tab-indented JSON, creating parent directories
    /// @ai:effects fs:write
    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}

/// @ai:intent List of documents written by a run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Index {
    #[serde(rename = "file", default)]
    pub files: Vec<PathBuf>,
}

impl Index {
    /// @ai:effects fs:write
    pub fn write(&self, output: &Path) -> Result<PathBuf> {
        let path = output.join(INDEX_FILE_NAME);
        write_json(self, &path)?;
        Ok(path)
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let write_error = |e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, buffer).map_err(write_error)
}

/// @ai:intent Where the document for `source` lands under `output`
/// @ai:post the result always stays inside `output`
/// @ai:example ("out", "src/main.go") -> "out/src/main.go.json"
/// @ai:example ("out", "/abs/main.go") -> "out/abs/main.go.json"
/// @ai:example ("out", "a/../b.go") -> "out/b.go.json"
/// @ai:effects pure
pub fn document_path(output: &Path, source: &Path) -> PathBuf {
    let mut relative = PathBuf::new();
    for component in source.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            // `..` above the start has nothing to pop and is dropped.
            Component::ParentDir => {
                relative.pop();
            }
            _ => {}
        }
    }
    let mut name = relative.into_os_string();
    name.push(DOCUMENT_SUFFIX);
    output.join(name)
}
