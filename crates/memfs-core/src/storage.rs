//! Namespace store: the authoritative path -> node mapping.

use std::collections::BTreeMap;

use crate::error::{FsError, FsResult};
use crate::path::{self, ROOT};
use crate::types::{NodeType, Permissions};

/// Regular file contents and permission bits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileNode {
    pub content: Vec<u8>,
    pub permissions: Permissions,
}

impl FileNode {
    pub fn new(content: Vec<u8>, permissions: Permissions) -> Self {
        Self {
            content,
            permissions,
        }
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Symbolic link; the target is kept verbatim and re-resolved on every use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymlinkNode {
    pub target: String,
}

/// Filesystem node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Directory,
    Symlink(SymlinkNode),
}

impl Node {
    pub fn kind(&self) -> NodeType {
        match self {
            Node::File(_) => NodeType::File,
            Node::Directory => NodeType::Directory,
            Node::Symlink(_) => NodeType::Symlink,
        }
    }

    /// Bytes this node contributes to quota usage.
    pub fn content_len(&self) -> u64 {
        match self {
            Node::File(file) => file.len(),
            _ => 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory)
    }
}

/// Ordered map of canonical absolute paths to nodes.
///
/// The ordering lets every subtree be read as one contiguous key range.
/// Paths handed to the store must already be canonical and free of
/// symlink indirection; resolution happens a layer above.
#[derive(Clone, Debug)]
pub struct Namespace {
    entries: BTreeMap<String, Node>,
}

impl Namespace {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(ROOT.to_string(), Node::Directory);
        Self { entries }
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.get(path).is_some_and(Node::is_dir)
    }

    /// Fail unless `path` is free and its parent is a directory.
    pub fn check_vacant(&self, path: &str) -> FsResult<()> {
        if self.contains(path) {
            return Err(FsError::already_exists(path));
        }
        let parent = path::parent_of(path).ok_or_else(|| FsError::already_exists(path))?;
        if !self.is_dir(parent) {
            return Err(FsError::no_parent(path));
        }
        Ok(())
    }

    /// Insert a node at a vacant path whose parent directory exists.
    pub fn put(&mut self, path: &str, node: Node) -> FsResult<()> {
        self.check_vacant(path)?;
        self.entries.insert(path.to_string(), node);
        Ok(())
    }

    /// Check that [`remove`](Self::remove) would succeed.
    pub fn check_removable(&self, path: &str) -> FsResult<&Node> {
        if path::is_root(path) {
            return Err(FsError::invalid_path(path, "the root directory cannot be removed"));
        }
        let node = self.get(path).ok_or_else(|| FsError::not_found(path))?;
        match node {
            Node::Directory if self.has_descendants(path) => Err(FsError::NotEmpty {
                path: path.to_string(),
            }),
            Node::File(file) if !file.permissions.can_write() => Err(FsError::access_denied(path)),
            _ => Ok(node),
        }
    }

    /// Remove a single entry, honouring emptiness and write permission.
    pub fn remove(&mut self, path: &str) -> FsResult<Node> {
        self.check_removable(path)?;
        self.entries
            .remove(path)
            .ok_or_else(|| FsError::not_found(path))
    }

    /// Remove `path` and everything beneath it without any checks.
    pub fn remove_subtree(&mut self, path: &str) -> Vec<(String, Node)> {
        let doomed: Vec<String> = std::iter::once(path.to_string())
            .filter(|p| self.contains(p))
            .chain(self.descendants(path).map(|(p, _)| p.to_string()))
            .collect();
        doomed
            .into_iter()
            .filter_map(|p| self.entries.remove(&p).map(|node| (p, node)))
            .collect()
    }

    /// Reinsert entries previously taken out; used by subtree rewrites.
    pub(crate) fn insert_unchecked(&mut self, path: String, node: Node) {
        self.entries.insert(path, node);
    }

    /// Entries strictly nested under `path`, in lexicographic order.
    pub fn descendants<'a>(&'a self, path: &str) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        let prefix = path::descendant_prefix(path);
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(p, _)| p.starts_with(&prefix))
            .filter(|(p, _)| !path::is_root(p))
            .map(|(p, n)| (p.as_str(), n))
    }

    pub fn has_descendants(&self, path: &str) -> bool {
        self.descendants(path).next().is_some()
    }

    /// `path` itself (when present) followed by its descendants.
    pub fn subtree<'a>(&'a self, path: &str) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.entries
            .get_key_value(path)
            .map(|(p, n)| (p.as_str(), n))
            .into_iter()
            .chain(self.descendants(path))
    }

    /// Immediate children of a directory as `(name, node)` pairs.
    pub fn children_of<'a>(&'a self, path: &str) -> FsResult<Vec<(&'a str, &'a Node)>> {
        match self.get(path) {
            None => Err(FsError::not_found(path)),
            Some(Node::Directory) => Ok(self
                .descendants(path)
                .filter(|(p, _)| path::parent_of(p) == Some(path))
                .map(|(p, n)| (path::basename(p), n))
                .collect()),
            Some(_) => Err(FsError::not_a_directory(path)),
        }
    }

    /// Total content length of the files at or under `path`.
    pub fn content_size(&self, path: &str) -> u64 {
        self.subtree(path).map(|(_, node)| node.content_len()).sum()
    }

    /// Recomputed total of every file's length, independent of the quota counter.
    pub fn total_content_size(&self) -> u64 {
        self.entries.values().map(Node::content_len).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        // the root is always present
        false
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
