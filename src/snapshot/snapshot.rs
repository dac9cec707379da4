use std::collections::HashSet;
use std::hash::Hasher;
use std::path::PathBuf;

use bincode::{Decode, Encode};
use metrohash::MetroHash64;
use snafu::prelude::*;

use crate::filesystem::{EntryType, FileSystemError, NodeId, NodeKind, Tree};

const MAGIC: &[u8; 4] = b"TSNP";
const FORMAT_VERSION: u8 = 2;
const CHECKSUM_LEN: usize = 8;
const HEADER_LEN: usize = MAGIC.len() + 1 + CHECKSUM_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum SnapshotKind {
    Directory { child_count: u64 },
    File,
}

/// A single node of a [`Snapshot`], without links.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct SnapshotEntry {
    pub name: String,
    pub kind: SnapshotKind,
}

/// Owned, arena-free copy of a [`Tree`].
///
/// `entries` lists the nodes in preorder starting with the root. Every
/// directory is followed by its `child_count` children, each with its own
/// subtree. `cursor` holds the child indices leading from the root to the
/// current directory.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
    cursor: Vec<u32>,
}

/// A directory being refilled during [`Snapshot::restore`].
struct OpenDirectory {
    id: NodeId,
    remaining: u64,
    names: HashSet<String>,
}

impl OpenDirectory {
    fn new(id: NodeId, child_count: u64) -> Self {
        Self {
            id,
            remaining: child_count,
            names: HashSet::new(),
        }
    }
}

impl Snapshot {
    pub fn capture(tree: &Tree) -> Self {
        let mut entries = Vec::with_capacity(tree.len());
        let mut pending = vec![tree.root()];
        while let Some(id) = pending.pop() {
            let node = &tree[id];
            let kind = match node.kind() {
                NodeKind::Directory { children } => {
                    // Reversed so the first child is captured first
                    pending.extend(children.iter().rev());
                    SnapshotKind::Directory {
                        child_count: children.len() as u64,
                    }
                }
                NodeKind::File => SnapshotKind::File,
            };
            entries.push(SnapshotEntry {
                name: node.name().to_string(),
                kind,
            });
        }

        Self {
            entries,
            cursor: cursor_indices(tree),
        }
    }

    /// Rebuilds a tree, rejecting snapshots that break the tree invariants.
    pub fn restore(self) -> Result<Tree, SnapshotError> {
        let mut entries = self.entries.into_iter();
        let root = entries.next().context(InvalidTreeSnafu {
            reason: "snapshot has no entries",
        })?;
        let SnapshotKind::Directory { child_count } = root.kind else {
            return InvalidTreeSnafu {
                reason: "root is not a directory",
            }
            .fail();
        };

        let mut tree = Tree::with_root_name(root.name);
        let mut open = vec![OpenDirectory::new(tree.root(), child_count)];
        while let Some(directory) = open.last_mut() {
            if directory.remaining == 0 {
                open.pop();
                continue;
            }
            directory.remaining -= 1;

            let entry = entries.next().context(InvalidTreeSnafu {
                reason: "snapshot ends inside a directory",
            })?;
            ensure!(
                directory.names.insert(entry.name.clone()),
                InvalidTreeSnafu {
                    reason: format!("duplicate entry '{}'", entry.name),
                }
            );

            let parent = directory.id;
            match entry.kind {
                SnapshotKind::Directory { child_count } => {
                    let id = tree
                        .append_entry(parent, entry.name, EntryType::Directory)
                        .context(RebuildSnafu)?;
                    open.push(OpenDirectory::new(id, child_count));
                }
                SnapshotKind::File => {
                    tree.append_entry(parent, entry.name, EntryType::File)
                        .context(RebuildSnafu)?;
                }
            }
        }
        ensure!(
            entries.next().is_none(),
            InvalidTreeSnafu {
                reason: "snapshot has entries outside the root",
            }
        );

        let mut cursor = tree.root();
        for &index in &self.cursor {
            cursor = tree
                .children(cursor)
                .get(index as usize)
                .copied()
                .with_context(|| InvalidTreeSnafu {
                    reason: format!("cursor index {} is out of range", index),
                })?;
        }
        tree.set_cursor(cursor).context(RebuildSnafu)?;

        Ok(tree)
    }

    /// Serializes into the on-disk layout:
    /// magic, version byte, MetroHash64 of the payload, zstd(bincode).
    pub fn to_bytes(&self, compression_level: i32) -> Result<Vec<u8>, SnapshotError> {
        let encoded =
            bincode::encode_to_vec(self, bincode::config::standard()).context(EncodeSnafu)?;
        let payload = zstd::encode_all(encoded.as_slice(), compression_level)
            .context(CompressSnafu)?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&checksum(&payload).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        ensure!(bytes.len() >= HEADER_LEN, TruncatedSnafu { len: bytes.len() });

        let (magic, rest) = bytes.split_at(MAGIC.len());
        ensure!(magic == MAGIC, BadMagicSnafu);

        let version = rest[0];
        ensure!(
            version == FORMAT_VERSION,
            UnsupportedVersionSnafu { version }
        );

        let (checksum_bytes, payload) = rest[1..].split_at(CHECKSUM_LEN);
        let mut raw = [0u8; CHECKSUM_LEN];
        raw.copy_from_slice(checksum_bytes);
        let expected = u64::from_le_bytes(raw);
        let actual = checksum(payload);
        ensure!(
            expected == actual,
            ChecksumMismatchSnafu { expected, actual }
        );

        let decoded = zstd::decode_all(payload).context(DecompressSnafu)?;
        let (snapshot, _): (Self, usize) =
            bincode::decode_from_slice(&decoded, bincode::config::standard())
                .context(DecodeSnafu)?;
        Ok(snapshot)
    }
}

fn checksum(payload: &[u8]) -> u64 {
    let mut hasher = MetroHash64::default();
    hasher.write(payload);
    hasher.finish()
}

fn cursor_indices(tree: &Tree) -> Vec<u32> {
    let mut indices = Vec::new();
    let mut current = tree.cursor();
    while let Some(parent) = tree[current].parent() {
        if let Some(index) = tree.children(parent).iter().position(|&c| c == current) {
            indices.push(index as u32);
        }
        current = parent;
    }
    indices.reverse();
    indices
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SnapshotError {
    #[snafu(display("Failed to read snapshot file: {}", path.display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write snapshot file: {}", path.display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create snapshot directory: {}", path.display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to compress snapshot"))]
    CompressError { source: std::io::Error },
    #[snafu(display("Failed to decompress snapshot"))]
    DecompressError { source: std::io::Error },
    #[snafu(display("Failed to encode snapshot"))]
    EncodeError { source: bincode::error::EncodeError },
    #[snafu(display("Failed to decode snapshot"))]
    DecodeError { source: bincode::error::DecodeError },
    #[snafu(display("Not a snapshot file"))]
    BadMagicError,
    #[snafu(display("Unsupported snapshot format version {}", version))]
    UnsupportedVersionError { version: u8 },
    #[snafu(display(
        "Snapshot checksum mismatch: expected {:016x}, got {:016x}",
        expected,
        actual
    ))]
    ChecksumMismatchError { expected: u64, actual: u64 },
    #[snafu(display("Snapshot is truncated ({} bytes)", len))]
    TruncatedError { len: usize },
    #[snafu(display("Snapshot does not describe a valid tree: {}", reason))]
    InvalidTreeError { reason: String },
    #[snafu(display("Failed to rebuild tree from snapshot"))]
    RebuildError { source: FileSystemError },
}
