//! @ai:module:intent Fold appended multi-line content into scalar values
//! @ai:module:layer domain
//! @ai:module:public_api collapse_appending, collapsed_value
//! @ai:module:depends_on node
//! @ai:module:stateless true

use crate::node::{NodeId, Tree};

/// @ai:intent Collapse every node marked collapsing into a leaf holding the joined value
/// @ai:post no reachable node is still marked collapsing
/// @ai:invariant running it twice gives the same tree
/// @ai:effects state:write
pub fn collapse_appending(tree: &mut Tree) {
    let root = tree.root();
    collapse_under(tree, root);
}

fn collapse_under(tree: &mut Tree, id: NodeId) {
    let children = tree.children(id).to_vec();
    for child in children {
        if tree.get(child).collapsing {
            let value = collapsed_value(tree, child);
            let node = tree.get_mut(child);
            node.value = value;
            node.collapsing = false;
            node.appending = false;
            tree.clear_children(child);
        } else {
            collapse_under(tree, child);
        }
    }
}

/// @ai:intent Join the values of every descendant of `id` in source order
/// @ai:example newline, [(1, "a"), (2, "b")] -> "a\n b"
/// @ai:example no newline, [(1, "a"), (2, "b")] -> "ab"
/// @ai:effects pure
pub fn collapsed_value(tree: &Tree, id: NodeId) -> String {
    let newline = tree.get(id).newline;
    let mut joined = String::new();

    for descendant in tree.descendants(id) {
        let node = tree.get(descendant);
        if newline {
            joined.push('\n');
            joined.push_str(&" ".repeat(node.index.max(0) as usize));
        }
        joined.push_str(&node.value);
    }

    if newline {
        let body = joined.strip_prefix('\n').unwrap_or(&joined);
        dedent(body)
    } else {
        joined
    }
}

/// Strips the indentation shared by every non-blank line.
fn dedent(text: &str) -> String {
    let common = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                &l[common..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
