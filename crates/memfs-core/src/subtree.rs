//! Whole-subtree operations: move, copy, recursive delete and search.
//!
//! Each operation collects and validates the affected entries first and
//! only then rewrites the namespace, so a rejected call changes nothing.

use tracing::{debug, trace};

use crate::error::{FsError, FsResult};
use crate::links::Follow;
use crate::path;
use crate::storage::Node;
use crate::vfs::FsState;

impl FsState {
    /// Resolve the source and destination of a move or copy and apply the
    /// shared guards.
    fn transfer_endpoints(&self, src: &str, dest: &str) -> FsResult<(String, String)> {
        let source = self.resolve(src, Follow::Parents)?;
        if path::is_root(&source) {
            return Err(FsError::invalid_path(source, "the root directory cannot be moved or copied"));
        }
        if !self.ns.contains(&source) {
            return Err(FsError::not_found(source));
        }

        // Resolved, so a link that points back into the source is caught too.
        let destination = self.resolve_new(dest)?;
        if path::is_within(&destination, &source) {
            return Err(FsError::invalid_path(
                destination,
                "destination lies inside the source",
            ));
        }
        self.ns.check_vacant(&destination)?;
        Ok((source, destination))
    }

    pub(crate) fn move_path(&mut self, src: &str, dest: &str) -> FsResult<()> {
        let (source, destination) = self.transfer_endpoints(src, dest)?;

        let moved = self.ns.remove_subtree(&source);
        let count = moved.len();
        for (old, node) in moved {
            self.ns
                .insert_unchecked(path::rebase(&old, &source, &destination), node);
        }

        if path::is_within(&self.cwd, &source) {
            self.cwd = path::rebase(&self.cwd, &source, &destination);
        }
        debug!(from = %source, to = %destination, entries = count, "moved");
        Ok(())
    }

    pub(crate) fn copy(&mut self, src: &str, dest: &str) -> FsResult<()> {
        let (source, destination) = self.transfer_endpoints(src, dest)?;

        let mut copies: Vec<(String, Node)> = Vec::new();
        let mut total: u64 = 0;
        for (old, node) in self.ns.subtree(&source) {
            if let Node::File(file) = node {
                if !file.permissions.can_read() {
                    return Err(FsError::access_denied(old));
                }
                total += file.len();
            }
            copies.push((path::rebase(old, &source, &destination), node.clone()));
        }

        self.quota.reserve(total)?;
        let count = copies.len();
        for (new, node) in copies {
            self.ns.insert_unchecked(new, node);
        }
        debug!(from = %source, to = %destination, entries = count, bytes = total, "copied");
        Ok(())
    }

    pub(crate) fn delete_recursive(&mut self, path: &str) -> FsResult<()> {
        let target = self.resolve(path, Follow::Parents)?;
        if path::is_root(&target) {
            return Err(FsError::invalid_path(target, "the root directory cannot be removed"));
        }
        if !self.ns.contains(&target) {
            return Err(FsError::not_found(target));
        }

        let removed = self.ns.remove_subtree(&target);
        let freed: u64 = removed.iter().map(|(_, node)| node.content_len()).sum();
        self.quota.release(freed);

        if path::is_within(&self.cwd, &target) {
            debug!(cwd = %self.cwd, "working directory removed, returning to /");
            self.cwd = path::ROOT.to_string();
        }
        debug!(path = %target, entries = removed.len(), freed, "deleted subtree");
        Ok(())
    }

    pub(crate) fn find(&self, root: &str, name: &str) -> FsResult<Vec<String>> {
        let (start, _) = self.lookup(root, Follow::All)?;
        Ok(self
            .ns
            .subtree(&start)
            .filter(|(p, node)| matches!(node, Node::File(_)) && path::basename(p) == name)
            .map(|(p, _)| p.to_string())
            .collect())
    }

    pub(crate) fn grep(&self, root: &str, needle: &[u8]) -> FsResult<Vec<String>> {
        let (start, _) = self.lookup(root, Follow::All)?;
        let mut hits = Vec::new();
        for (p, node) in self.ns.subtree(&start) {
            let Node::File(file) = node else { continue };
            if !file.permissions.can_read() {
                trace!(path = p, "grep skipping unreadable file");
                continue;
            }
            if contains_bytes(&file.content, needle) {
                hits.push(p.to_string());
            }
        }
        Ok(hits)
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
