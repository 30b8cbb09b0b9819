//! @ai:module:intent Define error types for the emits pipeline
//! @ai:module:layer domain
//! @ai:module:public_api Error, FilterViolation, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all emits operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filter rejected {path}: {violation}")]
    Filter {
        path: PathBuf,
        violation: FilterViolation,
    },

    #[error("Failed to load grammar `{name}`: {message}")]
    GrammarLoad { name: String, message: String },

    #[error("Invalid grammar pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid file pattern `{pattern}`: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read configuration {path}: {message}")]
    Configuration { path: PathBuf, message: String },

    #[error("`{0}` is not a valid task")]
    TaskNotFound(String),

    #[error("`{0}` is not a valid group")]
    GroupNotFound(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// @ai:intent Reasons a parsed file is refused by the task filters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterViolation {
    #[error("keyword include not found")]
    KeywordIncludeNotFound,

    #[error("keyword exclude found: {keyword}")]
    KeywordExcluded { keyword: String },

    #[error("configuration include not found: {keyword}")]
    ConfigurationNotIncluded { keyword: String },

    #[error("configuration exclude found: {keyword}")]
    ConfigurationExcluded { keyword: String },
}

pub type Result<T> = std::result::Result<T, Error>;
