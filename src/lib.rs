//! @ai:module:intent Emits library: extract hierarchical metadata from annotated source comments
//! @ai:module:layer infrastructure
//! @ai:module:public_api comment, token, node, builder, grammar, collapse, assembler, document, config, run, output, error
//! @ai:module:stateless true
//!
//! # Emits
//!
//! Reads source files line by line, picks out comment lines, turns
//! `.keyword value` annotations into a tree ordered by indentation, and
//! writes one JSON document per file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use emits::{config::ConfigFile, grammar::GrammarCache, output, run};
//! use std::path::{Path, PathBuf};
//!
//! let config = ConfigFile::load(Path::new("emits.json")).unwrap();
//! let task = config.task("docs").unwrap();
//! let grammars = GrammarCache::load(Path::new("."), &task.grammar).cache;
//!
//! let options = run::RunOptions {
//!     output: PathBuf::from("emits/docs"),
//!     clean: true,
//! };
//! let report = run::run_task(task, &grammars, &options).unwrap();
//! println!("{}", output::format_report(&report, output::OutputFormat::Text));
//! ```

pub mod assembler;
pub mod builder;
pub mod collapse;
pub mod comment;
pub mod config;
pub mod document;
pub mod error;
pub mod grammar;
pub mod language;
pub mod node;
pub mod output;
pub mod run;
pub mod token;

pub use assembler::{assemble, check_filters, emit_file};
pub use builder::{parse_file, parse_str, ParsedFile, TreeBuilder};
pub use collapse::{collapse_appending, collapsed_value};
pub use comment::{classify_line, ClassifiedLine, CommentRole, CommentTokens};
pub use config::{ConfigFile, Group, Task, CONFIG_FILE_NAME};
pub use document::{document_path, Document, DocumentNode, FileMeta, Index};
pub use error::{Error, FilterViolation, Result};
pub use grammar::{Grammar, GrammarCache, LoadedGrammars};
pub use language::{detect_language, Language};
pub use node::{Node, NodeId, Tree};
pub use output::{format_document, format_report, OutputFormat};
pub use run::{run_files, run_task, FileOutcome, RunOptions, RunReport};
pub use token::{extract_node, split_keyword_line, KeywordLine};
