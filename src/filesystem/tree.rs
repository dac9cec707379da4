use std::fmt;
use std::ops::Index;

use snafu::{OptionExt, ensure};
use tracing::debug;

use crate::filesystem::error::{
    DirectoryNotEmptySnafu, DirectoryNotFoundSnafu, DuplicateNameSnafu, FileNotFoundSnafu,
    IsADirectorySnafu, NotADirectorySnafu,
};
use crate::filesystem::{EntryType, FileSystemError, Node, NodeArena, NodeId};

const PARENT_DIRECTORY: &str = "..";

/// A filesystem tree with a cursor pointing at the current directory.
///
/// Every operation validates first and mutates last, so a failed call
/// leaves both the nodes and the cursor untouched.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: NodeArena,
    root: NodeId,
    cursor: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding a single unnamed root directory.
    pub fn new() -> Self {
        Self::with_root_name("")
    }

    pub fn with_root_name(name: impl Into<String>) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.insert_root(name);
        Self {
            arena,
            root,
            cursor: root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Children of `id` in insertion order; empty for files and stale handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.get(id).map(Node::children).unwrap_or_default()
    }

    /// Number of nodes in the tree, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Fails if the current directory already has an entry called `name`.
    pub fn check_name_available(&self, name: &str) -> Result<(), FileSystemError> {
        ensure!(self.find_child(name).is_none(), DuplicateNameSnafu { name });
        Ok(())
    }

    pub fn mkdir(&mut self, dirname: &str) -> Result<(), FileSystemError> {
        self.create_entry(dirname, EntryType::Directory)
    }

    pub fn touch(&mut self, name: &str) -> Result<(), FileSystemError> {
        self.create_entry(name, EntryType::File)
    }

    /// Entries of the current directory in insertion order.
    pub fn ls(&self) -> impl Iterator<Item = &Node> {
        self.arena[self.cursor]
            .children()
            .iter()
            .map(|&child| &self.arena[child])
    }

    /// Moves the cursor into the child directory `name`, or to the parent
    /// for `..`. Going up from the root does nothing.
    pub fn cd(&mut self, name: &str) -> Result<(), FileSystemError> {
        if name == PARENT_DIRECTORY {
            if let Some(parent) = self.arena[self.cursor].parent() {
                self.cursor = parent;
            }
            return Ok(());
        }

        let target = self.arena[self.cursor]
            .children()
            .iter()
            .copied()
            .find(|&child| {
                let node = &self.arena[child];
                node.name() == name && node.is_directory()
            })
            .context(DirectoryNotFoundSnafu { name })?;

        self.cursor = target;
        debug!("Changed directory to {}", self.pwd());
        Ok(())
    }

    /// Removes the file `filename` from the current directory.
    pub fn rm(&mut self, filename: &str) -> Result<(), FileSystemError> {
        let (index, node) = self
            .find_child(filename)
            .context(FileNotFoundSnafu { name: filename })?;
        ensure!(!node.is_directory(), IsADirectorySnafu { name: filename });

        self.arena.remove_child(self.cursor, index);
        debug!("Removed file '{}'", filename);
        Ok(())
    }

    /// Removes the empty directory `dirname` from the current directory.
    pub fn rmdir(&mut self, dirname: &str) -> Result<(), FileSystemError> {
        let (index, node) = self
            .find_child(dirname)
            .context(DirectoryNotFoundSnafu { name: dirname })?;
        ensure!(node.is_directory(), NotADirectorySnafu { name: dirname });
        ensure!(
            node.children().is_empty(),
            DirectoryNotEmptySnafu { name: dirname }
        );

        self.arena.remove_child(self.cursor, index);
        debug!("Removed directory '{}'", dirname);
        Ok(())
    }

    pub fn pwd(&self) -> String {
        self.arena.path(self.cursor)
    }

    /// Preorder walk of the current directory, the directory itself first.
    pub fn tree(&self) -> TreeLines<'_> {
        TreeLines {
            arena: &self.arena,
            stack: vec![(self.cursor, 0)],
        }
    }

    /// Appends an entry below `parent` without the duplicate-name check.
    /// Used when rebuilding a tree whose names were validated elsewhere.
    pub(crate) fn append_entry(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        entry_type: EntryType,
    ) -> Result<NodeId, FileSystemError> {
        self.arena.append_child(parent, name, entry_type)
    }

    /// Points the cursor at `id`, which must be a live directory.
    pub(crate) fn set_cursor(&mut self, id: NodeId) -> Result<(), FileSystemError> {
        let node = self.arena.get(id).context(DirectoryNotFoundSnafu {
            name: id.to_string(),
        })?;
        ensure!(node.is_directory(), NotADirectorySnafu { name: node.name() });
        self.cursor = id;
        Ok(())
    }

    fn create_entry(&mut self, name: &str, entry_type: EntryType) -> Result<(), FileSystemError> {
        self.check_name_available(name)?;
        self.arena.append_child(self.cursor, name, entry_type)?;
        debug!("Created {:?} '{}' in {}", entry_type, name, self.pwd());
        Ok(())
    }

    fn find_child(&self, name: &str) -> Option<(usize, &Node)> {
        self.arena[self.cursor]
            .children()
            .iter()
            .map(|&child| &self.arena[child])
            .enumerate()
            .find(|(_, node)| node.name() == name)
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    /// Panics if `id` no longer refers to a node of this tree.
    fn index(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }
}

/// One line of [`Tree::tree`] output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLine<'a> {
    pub depth: usize,
    pub name: &'a str,
}

impl fmt::Display for TreeLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.name, indent = self.depth * 2)
    }
}

/// Lazy depth-first preorder iterator over a subtree.
#[derive(Debug, Clone)]
pub struct TreeLines<'a> {
    arena: &'a NodeArena,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Iterator for TreeLines<'a> {
    type Item = TreeLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let node = &self.arena[id];
        // Reversed so the first child is popped first
        self.stack
            .extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
        Some(TreeLine {
            depth,
            name: node.name(),
        })
    }
}
