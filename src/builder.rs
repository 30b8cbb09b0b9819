//! @ai:module:intent Build the annotation tree for a source file line by line
//! @ai:module:layer application
//! @ai:module:public_api TreeBuilder, ParsedFile, parse_file, parse_str
//! @ai:module:depends_on comment, token, grammar, node, config, error
//! @ai:module:stateless true

use crate::comment::{classify_line, CommentRole, CommentTokens};
use crate::config::Task;
use crate::error::{Error, Result};
use crate::grammar::GrammarCache;
use crate::node::{Node, Tree};
use crate::token::extract_node;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// @ai:intent Parse result for one file: content tree plus configuration side channel
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub tree: Tree,
    pub configuration: Vec<Node>,
}

/// @ai:intent Incremental per-file builder; all state is local so files can be built in parallel
pub struct TreeBuilder<'a> {
    tokens: CommentTokens,
    source: bool,
    grammars: &'a GrammarCache,
    extension: String,
    tree: Tree,
    configuration: Vec<Node>,
    previous: CommentRole,
    line_number: usize,
}

impl<'a> TreeBuilder<'a> {
    /// @ai:intent Start a builder for a file with the given extension
    /// @ai:effects pure
    pub fn new(task: &Task, grammars: &'a GrammarCache, extension: &str) -> Self {
        Self {
            tokens: task.comment.tokens(),
            source: task.source,
            grammars,
            extension: extension.to_string(),
            tree: Tree::new(),
            configuration: Vec::new(),
            previous: CommentRole::default(),
            line_number: 0,
        }
    }

    /// @ai:intent Process the next physical line
    /// @ai:pre lines are fed strictly in source order
    /// @ai:effects state:write
    pub fn feed(&mut self, raw: &str) {
        self.line_number += 1;

        let classified = classify_line(raw, &self.tokens, self.previous);
        let mut node = extract_node(&classified, self.line_number);
        if !self.grammars.is_empty() {
            self.grammars.apply(&mut node, &self.extension);
        }
        self.previous = node.comment;

        if node.comment.is_comment() {
            if node.configuration {
                self.configuration.push(node);
            } else if node.has_data() {
                self.tree.insert(node);
            }
            return;
        }

        let Some(target) = self.tree.appending_target() else {
            return;
        };
        // Source text is only exposed when the task opts in.
        let value = if self.source {
            raw.trim().to_string()
        } else {
            String::new()
        };
        let index = self.tree.get(target).index + 1;
        self.tree.append_child(
            target,
            Node {
                line: self.line_number,
                index,
                value,
                comment: CommentRole {
                    inline: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
    }

    /// @ai:intent Finish building and return the tree and configuration nodes
    pub fn finish(self) -> (Tree, Vec<Node>) {
        (self.tree, self.configuration)
    }
}

/// @ai:intent Parse a source file into a tree and configuration list
/// @ai:pre path exists and is readable text
/// @ai:post on a read error no partial tree is returned
/// @ai:effects fs:read
pub fn parse_file(path: &Path, task: &Task, grammars: &GrammarCache) -> Result<ParsedFile> {
    let read_error = |e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(read_error)?;
    let mut builder = TreeBuilder::new(task, grammars, extension_of(path));
    // Lines are decoded lossily; only I/O failures abort the file.
    for line in BufReader::new(file).split(b'\n') {
        let bytes = line.map_err(read_error)?;
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(&bytes[..]);
        builder.feed(&String::from_utf8_lossy(bytes));
    }

    let (tree, configuration) = builder.finish();
    tracing::debug!(
        "Parsed {}: {} configuration nodes",
        path.display(),
        configuration.len()
    );

    Ok(ParsedFile {
        path: path.to_path_buf(),
        tree,
        configuration,
    })
}

/// @ai:intent Parse in-memory content as if read from a file with `extension`
/// @ai:effects pure
pub fn parse_str(
    content: &str,
    extension: &str,
    task: &Task,
    grammars: &GrammarCache,
) -> (Tree, Vec<Node>) {
    let mut builder = TreeBuilder::new(task, grammars, extension);
    for line in content.lines() {
        builder.feed(line);
    }
    builder.finish()
}

/// @ai:intent File extension without the dot, empty when absent
pub fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
