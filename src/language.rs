//! @ai:module:intent Default comment tokens for common languages
//! @ai:module:layer domain
//! @ai:module:public_api Language, detect_language
//! @ai:module:stateless true

use crate::comment::CommentTokens;
use std::path::Path;

/// @ai:intent A language with a known comment vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    CFamily,
    Python,
    Shell,
    Html,
    Sql,
}

const ALL_LANGUAGES: [Language; 5] = [
    Language::CFamily,
    Language::Python,
    Language::Shell,
    Language::Html,
    Language::Sql,
];

impl Language {
    /// @ai:intent Comment tokens used when no task supplies them
    /// @ai:effects pure
    pub fn comment_tokens(&self) -> CommentTokens {
        match self {
            Language::CFamily => CommentTokens::new("/*", "*", "*/", "//"),
            Language::Python => CommentTokens::new("\"\"\"", "", "\"\"\"", "#"),
            Language::Shell => CommentTokens::new("", "", "", "#"),
            Language::Html => CommentTokens::new("<!--", "", "-->", ""),
            Language::Sql => CommentTokens::new("/*", "*", "*/", "--"),
        }
    }

    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::CFamily => &[
                "rs", "go", "c", "h", "cpp", "cc", "cxx", "hpp", "java", "js", "jsx", "mjs",
                "ts", "tsx", "cs", "swift", "kt", "scala", "css", "scss",
            ],
            Language::Python => &["py", "pyi"],
            Language::Shell => &["sh", "bash", "zsh", "rb", "pl", "yaml", "yml", "toml"],
            Language::Html => &["html", "htm", "xml", "md", "vue", "svelte"],
            Language::Sql => &["sql"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::CFamily => "c-family",
            Language::Python => "python",
            Language::Shell => "shell",
            Language::Html => "markup",
            Language::Sql => "sql",
        }
    }
}

/// @ai:intent Detect the comment vocabulary from a file path
/// @ai:example ("main.go") -> Some(CFamily)
/// @ai:example ("run.sh") -> Some(Shell)
/// @ai:example ("notes.txt") -> None
/// @ai:effects pure
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ALL_LANGUAGES
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext.as_str()))
}
