//! In-memory filesystem tree.
//!
//! Nodes live in a [`NodeArena`] and refer to each other through
//! [`NodeId`] handles. [`Tree`] keeps the root and the current directory
//! and implements the shell-level operations on top of the arena.

mod error;
mod node;
mod tree;

pub use error::FileSystemError;
pub use node::{EntryType, Node, NodeArena, NodeId, NodeKind};
pub use tree::Tree;
