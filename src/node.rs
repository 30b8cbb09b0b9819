//! @ai:module:intent Node data and the index-placed annotation tree
//! @ai:module:layer domain
//! @ai:module:public_api Node, NodeId, Tree
//! @ai:module:stateless false

use crate::comment::CommentRole;

/// @ai:intent One annotation line or appended content entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// 1-based source line, 0 for the root and synthetic nodes.
    pub line: usize,
    pub index: i32,
    /// Line of the parent node, assigned on placement.
    pub parent: usize,
    pub keyword: String,
    pub value: String,
    pub flags: Vec<String>,
    pub separator: bool,
    pub configuration: bool,
    pub appending: bool,
    pub collapsing: bool,
    pub newline: bool,
    pub comment: CommentRole,
}

impl Node {
    /// @ai:intent Check for a keyword, configuration nodes never report one
    pub fn has_keyword(&self) -> bool {
        !self.keyword.is_empty() && !self.configuration
    }

    /// @ai:intent Check for a value, configuration nodes never report one
    pub fn has_value(&self) -> bool {
        !self.value.is_empty() && !self.configuration
    }

    /// @ai:intent Check whether the node carries anything worth placing in the tree
    /// @ai:effects pure
    pub fn has_data(&self) -> bool {
        self.has_keyword() || self.has_value() || self.separator
    }
}

/// Stable handle into a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// @ai:intent Arena-backed tree; children are owned in order, parents are plain ids
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    last: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// @ai:intent Create a tree holding only the root
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                node: Node::default(),
                parent: None,
                children: Vec::new(),
            }],
            last: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.slots[id.0].node
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id.0].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    /// @ai:intent The most recently attached node, or the root when empty
    pub fn last(&self) -> NodeId {
        self.last
    }

    /// @ai:intent Check whether the root has any children
    pub fn is_empty(&self) -> bool {
        self.slots[0].children.is_empty()
    }

    /// @ai:intent Attach a node as the last child of `parent`
    /// @ai:post the new node is the tree's last node and records the parent's line
    /// @ai:effects state:write
    pub fn append_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = self.get(parent).line;
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.0].children.push(id);
        self.last = id;
        id
    }

    /// @ai:intent Find the node a new entry at `index` attaches under
    /// @ai:post result is the root or a node whose index is strictly less than `index`
    /// @ai:example last at 1, index 2 -> last (child)
    /// @ai:example last at 2, index 2 -> last's parent (sibling)
    /// @ai:example last at 3 under 1 under root, index 1 -> root (sibling of the index 1 ancestor)
    /// @ai:example last at 3 under 0 under root, index 1 -> root (sibling of the index 0 ancestor)
    /// @ai:effects pure
    pub fn placement_parent(&self, index: i32) -> NodeId {
        let last = self.last;
        if last == self.root() || self.get(last).index < index {
            return last;
        }

        // Walk up to the first node not deeper than `index`; the entry becomes its
        // sibling. Stranded indices land next to the shallower ancestor.
        let mut current = last;
        while let Some(parent) = self.parent(current) {
            if self.get(current).index <= index {
                return parent;
            }
            current = parent;
        }
        current
    }

    /// @ai:intent Place a node by its index relative to the last node
    /// @ai:effects state:write
    pub fn insert(&mut self, node: Node) -> NodeId {
        let parent = self.placement_parent(node.index);
        self.append_child(parent, node)
    }

    /// @ai:intent Find the nearest node, from the last node upward, that is collecting appended lines
    /// @ai:effects pure
    pub fn appending_target(&self) -> Option<NodeId> {
        let mut current = Some(self.last);
        while let Some(id) = current {
            if self.get(id).appending {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// @ai:intent Return the first listed keyword that occurs anywhere in the tree
    /// @ai:effects pure
    pub fn find_keyword<'k>(&self, keywords: &'k [String]) -> Option<&'k str> {
        keywords
            .iter()
            .filter(|k| !k.is_empty())
            .find(|k| self.descendants(self.root()).any(|id| self.get(id).keyword == **k))
            .map(String::as_str)
    }

    /// @ai:intent Iterate every descendant of `id` in source (pre-)order
    /// @ai:effects pure
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// @ai:intent Drop every child of `id`, turning it into a leaf
    /// @ai:effects state:write
    pub fn clear_children(&mut self, id: NodeId) {
        self.slots[id.0].children.clear();
    }
}
