use std::fmt;
use std::ops::{Index, IndexMut};

use derive_more::{Display, IsVariant};
use snafu::ensure;

use crate::filesystem::FileSystemError;
use crate::filesystem::error::NotADirectorySnafu;

/// Stable handle of a node stored in a [`NodeArena`].
///
/// Handles are only meaningful for the arena that issued them. A handle
/// whose node was removed must not be used again; its slot may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("node#{_0}")]
pub struct NodeId(usize);

/// What kind of entry to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Directory,
    File,
}

/// The payload of a node. Only directories carry a children container.
#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum NodeKind {
    Directory { children: Vec<NodeId> },
    File,
}

impl From<EntryType> for NodeKind {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Directory => NodeKind::Directory {
                children: Vec::new(),
            },
            EntryType::File => NodeKind::File,
        }
    }
}

/// A single directory or file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, parent: Option<NodeId>, entry_type: EntryType) -> Self {
        Self {
            name: name.into(),
            parent,
            kind: entry_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Child handles in insertion order. Always empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File => &[],
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Directory { .. } => write!(f, "{} <directory>", self.name),
            NodeKind::File => write!(f, "{}", self.name),
        }
    }
}

/// Flat table of nodes addressed by [`NodeId`].
///
/// Parent and child links are plain handles, so the graph never holds
/// reference cycles. Freed slots are recycled by later insertions.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    live: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a parentless directory.
    pub fn insert_root(&mut self, name: impl Into<String>) -> NodeId {
        self.allocate(Node::new(name, None, EntryType::Directory))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Creates a new node under `parent` and appends it to its children.
    ///
    /// Name uniqueness is not checked here.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        entry_type: EntryType,
    ) -> Result<NodeId, FileSystemError> {
        let parent_node = &self[parent];
        ensure!(
            parent_node.is_directory(),
            NotADirectorySnafu {
                name: parent_node.name(),
            }
        );

        let child = self.allocate(Node::new(name, Some(parent), entry_type));
        if let NodeKind::Directory { children } = &mut self[parent].kind {
            children.push(child);
        }
        Ok(child)
    }

    /// Unlinks the child at `index` of `parent` and frees it together with
    /// anything below it. Returns the detached node.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Option<Node> {
        let NodeKind::Directory { children } = &mut self[parent].kind else {
            return None;
        };
        if index >= children.len() {
            return None;
        }
        let id = children.remove(index);
        self.release(id)
    }

    /// Absolute path of `id`, every segment followed by `/`.
    ///
    /// An unnamed root renders as a single `/`.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self[node_id];
            segments.push(node.name());
            current = node.parent();
        }

        let mut path = String::from("/");
        let mut segments = segments.into_iter().rev();
        if let Some(root_name) = segments.next() {
            if !root_name.is_empty() {
                path.push_str(root_name);
                path.push('/');
            }
        }
        for segment in segments {
            path.push_str(segment);
            path.push('/');
        }
        path
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Frees `id` and every node below it.
    fn release(&mut self, id: NodeId) -> Option<Node> {
        let node = self.take(id)?;
        let mut pending = node.children().to_vec();
        while let Some(child) = pending.pop() {
            if let Some(released) = self.take(child) {
                pending.extend(released.children());
            }
        }
        Some(node)
    }

    fn take(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(node)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("{id} does not refer to a live node"),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("{id} does not refer to a live node"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_display_has_marker() {
        let node = Node::new("docs", None, EntryType::Directory);
        assert_eq!(node.to_string(), "docs <directory>");
    }

    #[test]
    fn file_display_is_bare_name() {
        let node = Node::new("readme", None, EntryType::File);
        assert_eq!(node.to_string(), "readme");
    }

    #[test]
    fn each_directory_gets_its_own_children() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        let a = arena.append_child(root, "a", EntryType::Directory).unwrap();
        let b = arena.append_child(root, "b", EntryType::Directory).unwrap();
        arena.append_child(a, "inner", EntryType::File).unwrap();

        assert_eq!(arena[a].children().len(), 1);
        assert!(arena[b].children().is_empty());
    }

    #[test]
    fn append_child_to_file_fails() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        let file = arena.append_child(root, "notes", EntryType::File).unwrap();

        let result = arena.append_child(file, "x", EntryType::File);

        assert!(matches!(
            result,
            Err(FileSystemError::NotADirectoryError { ref name }) if name == "notes"
        ));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn append_child_links_parent_and_preserves_order() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        let first = arena.append_child(root, "first", EntryType::File).unwrap();
        let second = arena.append_child(root, "second", EntryType::Directory).unwrap();

        assert_eq!(arena[root].children(), &[first, second]);
        assert_eq!(arena[first].parent(), Some(root));
        assert!(arena[root].is_root());
        assert!(!arena[second].is_root());
    }

    #[test]
    fn path_of_unnamed_root_is_slash() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        let docs = arena.append_child(root, "docs", EntryType::Directory).unwrap();
        let notes = arena.append_child(docs, "notes", EntryType::Directory).unwrap();

        assert_eq!(arena.path(root), "/");
        assert_eq!(arena.path(docs), "/docs/");
        assert_eq!(arena.path(notes), "/docs/notes/");
    }

    #[test]
    fn path_of_named_root_includes_name() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("home");
        let user = arena.append_child(root, "user", EntryType::Directory).unwrap();

        assert_eq!(arena.path(root), "/home/");
        assert_eq!(arena.path(user), "/home/user/");
    }

    #[test]
    fn remove_child_frees_subtree_and_reuses_slots() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        let dir = arena.append_child(root, "dir", EntryType::Directory).unwrap();
        arena.append_child(dir, "a", EntryType::File).unwrap();
        assert_eq!(arena.len(), 3);

        let removed = arena.remove_child(root, 0).unwrap();

        assert_eq!(removed.name(), "dir");
        assert_eq!(arena.len(), 1);
        assert!(arena.get(dir).is_none());
        assert!(arena[root].children().is_empty());

        let reused = arena.append_child(root, "again", EntryType::File).unwrap();
        assert_eq!(arena[reused].name(), "again");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn remove_child_frees_deep_chain() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        let mut parent = root;
        for _ in 0..100_000 {
            parent = arena.append_child(parent, "d", EntryType::Directory).unwrap();
        }

        arena.remove_child(root, 0).unwrap();

        assert_eq!(arena.len(), 1);
        assert!(arena.get(parent).is_none());
    }

    #[test]
    fn remove_child_out_of_range_is_none() {
        let mut arena = NodeArena::new();
        let root = arena.insert_root("");
        assert!(arena.remove_child(root, 0).is_none());
    }
}
