//! @ai:module:intent Extract keyword, value, flags and index from comment lines
//! @ai:module:layer domain
//! @ai:module:public_api extract_node, split_keyword_line, KeywordLine
//! @ai:module:depends_on comment, node
//! @ai:module:stateless true

use crate::comment::ClassifiedLine;
use crate::node::Node;

pub const SEPARATOR: char = '.';
pub const APPENDING: &str = "...";
pub const COLLAPSING: &str = ":";
pub const CONFIGURATION_PREFIX: &str = "emits.";
pub const ESCAPE: char = '\\';
pub const FLAG: char = '`';
pub const FLAG_SEPARATOR: char = ',';
pub const INDENT: char = '>';
pub const OUTDENT: char = '<';

/// @ai:intent Keyword, value, flags and adjusted index split out of one line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordLine {
    pub keyword: String,
    pub value: String,
    pub flags: Vec<String>,
    pub index: i32,
}

/// @ai:intent Split a comment-stripped line into keyword, value, flags and index
/// @ai:pre index is the provisional index (leading whitespace count)
/// @ai:example (".title Hello", 0) -> keyword "title", value "Hello"
/// @ai:example (".title<< x", 3) -> keyword "title", index 1
/// @ai:example (".a`x,y` v", 0) -> keyword "a", flags [x, y]
/// @ai:effects pure
pub fn split_keyword_line(line: &str, index: i32) -> KeywordLine {
    let mut result = KeywordLine {
        index,
        ..Default::default()
    };

    let Some((_, region)) = line.split_once(SEPARATOR) else {
        return result;
    };

    let (raw_keyword, value) = match region.split_once(' ') {
        Some((keyword, value)) => (keyword.trim(), value.trim()),
        None => (region.trim(), ""),
    };
    result.value = value.to_string();

    // Separator characters are part of the keyword, which also keeps
    // `emits.` configuration keywords whole.
    let accepted = raw_keyword
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == SEPARATOR))
        .map(|(i, _)| i)
        .unwrap_or(raw_keyword.len());
    result.keyword = raw_keyword[..accepted].to_string();

    let mut meta = &raw_keyword[accepted..];
    while let Some(rest) = meta.strip_prefix(OUTDENT) {
        result.index -= 1;
        meta = rest;
    }
    while let Some(rest) = meta.strip_prefix(INDENT) {
        result.index += 1;
        meta = rest;
    }

    if let Some(list) = meta
        .strip_prefix(FLAG)
        .and_then(|inner| inner.strip_suffix(FLAG))
    {
        let cleaned: String = list
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == FLAG_SEPARATOR)
            .collect();
        result.flags = cleaned
            .split(FLAG_SEPARATOR)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
    }

    result
}

/// @ai:intent Turn a classified line into a candidate node
/// @ai:post a line with no comment role yields a node with empty keyword and value
/// @ai:effects pure
pub fn extract_node(classified: &ClassifiedLine<'_>, line_number: usize) -> Node {
    let mut node = Node {
        line: line_number,
        index: classified.indent,
        comment: classified.role,
        ..Default::default()
    };

    if !classified.role.is_comment() {
        return node;
    }

    let text = classified.text;
    let split = split_keyword_line(text, classified.indent);
    node.keyword = split.keyword;
    node.value = split.value;
    node.flags = split.flags;
    node.index = split.index;

    if node.index == 0 && node.keyword.starts_with(CONFIGURATION_PREFIX) {
        node.keyword = node.keyword[CONFIGURATION_PREFIX.len()..].to_string();
        node.configuration = true;
    } else if let Some(rest) = node.keyword.strip_prefix(SEPARATOR) {
        node.keyword = rest.to_string();
        node.separator = true;
    } else if let Some(literal) = text.strip_prefix(ESCAPE) {
        node.index += 1;
        node.keyword.clear();
        node.value = literal.to_string();
    } else if node.value.starts_with(APPENDING) {
        let double = COLLAPSING.repeat(2);
        let marker = &node.value[APPENDING.len()..];
        if marker.ends_with(COLLAPSING) {
            node.collapsing = true;
            node.newline = marker.ends_with(double.as_str());
        }
        node.value.clear();
        node.appending = true;
    } else if node.keyword.is_empty() && node.value.is_empty() && classified.role.block_line {
        // Free text inside a block is appended to the enclosing node.
        node.index += 1;
        node.value = text.to_string();
        node.comment.inline = true;
    }

    node
}
