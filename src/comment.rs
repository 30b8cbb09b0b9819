//! @ai:module:intent Classify source lines by the comment role they play
//! @ai:module:layer domain
//! @ai:module:public_api CommentTokens, CommentRole, ClassifiedLine, classify_line
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// @ai:intent The comment vocabulary a task uses; an empty token disables its role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTokens {
    pub open: String,
    pub line: String,
    pub close: String,
    pub inline: String,
}

impl CommentTokens {
    /// @ai:intent Build a token set from string slices
    /// @ai:effects pure
    pub fn new(open: &str, line: &str, close: &str, inline: &str) -> Self {
        Self {
            open: open.to_string(),
            line: line.to_string(),
            close: close.to_string(),
            inline: inline.to_string(),
        }
    }
}

/// @ai:intent Comment roles recognized on a single line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRole {
    pub block_open: bool,
    pub block_line: bool,
    pub block_close: bool,
    pub inline: bool,
}

impl CommentRole {
    /// @ai:intent Check whether any comment role is set
    /// @ai:effects pure
    pub fn is_comment(&self) -> bool {
        self.block_open || self.block_line || self.block_close || self.inline
    }

    /// @ai:intent Check whether the next line continues an open block comment
    /// @ai:effects pure
    pub fn continues_block(&self) -> bool {
        self.block_open || (self.block_line && !self.block_close)
    }
}

/// @ai:intent A line after comment classification, with its token stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    pub role: CommentRole,
    /// Leading whitespace count, the provisional hierarchy index.
    pub indent: i32,
    pub text: &'a str,
}

/// @ai:intent Classify one raw line given the role carried from the previous line
/// @ai:pre previous is the role returned for the preceding line (default for the first)
/// @ai:post a line opening and closing a block is reported as inline only
/// @ai:example ("// .title Hello", inline "//") -> inline, text ".title Hello"
/// @ai:effects pure
pub fn classify_line<'a>(
    raw: &'a str,
    tokens: &CommentTokens,
    previous: CommentRole,
) -> ClassifiedLine<'a> {
    let indent = raw.chars().take_while(|c| c.is_whitespace()).count() as i32;
    let mut text = raw.trim();
    let mut role = CommentRole::default();

    if let Some(rest) = strip_token_prefix(text, &tokens.inline) {
        role.inline = true;
        text = rest;
    }
    // Blocks do not nest, so an open token inside a block is not a new block.
    if !previous.continues_block() {
        if let Some(rest) = strip_token_prefix(text, &tokens.open) {
            role.block_open = true;
            text = rest;
        }
    }
    if let Some(rest) = strip_token_suffix(text, &tokens.close) {
        role.block_close = true;
        text = rest;
    }

    // A block cannot open and close on one line and remain a block.
    if role.block_open && role.block_close {
        role = CommentRole {
            inline: true,
            ..CommentRole::default()
        };
    }

    if previous.continues_block() {
        role.block_line = true;
        if let Some(rest) = strip_token_prefix(text, &tokens.line) {
            text = rest;
        }
    }

    ClassifiedLine { role, indent, text }
}

fn strip_token_prefix<'a>(text: &'a str, token: &str) -> Option<&'a str> {
    if token.trim().is_empty() {
        return None;
    }
    text.strip_prefix(token).map(str::trim_start)
}

fn strip_token_suffix<'a>(text: &'a str, token: &str) -> Option<&'a str> {
    if token.trim().is_empty() {
        return None;
    }
    text.strip_suffix(token).map(str::trim)
}
