//! Symbolic link resolution.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{FsError, FsResult};
use crate::path::{self, ROOT};
use crate::storage::{Namespace, Node};

/// Whether the last path component is itself dereferenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Follow {
    /// Dereference every component, like `stat`.
    All,
    /// Leave the final component alone, like `lstat`.
    Parents,
}

/// The outermost link the current path was rewritten from, and how many
/// leading segments of the current path spell out its target.
struct Substitution {
    link: String,
    target: String,
    depth: usize,
}

/// Resolves canonical paths to backing paths over a namespace snapshot.
pub struct LinkResolver<'a> {
    ns: &'a Namespace,
    max_hops: usize,
}

impl<'a> LinkResolver<'a> {
    pub fn new(ns: &'a Namespace, max_hops: usize) -> Self {
        Self { ns, max_hops }
    }

    /// Rewrite `path` until none of the components it is asked to follow
    /// is a symlink.
    ///
    /// The result may name a path that does not exist (for example the
    /// destination of a `create`). A missing component that came from a
    /// link's target is reported as `DanglingLink` for that link; targets
    /// may themselves pass through further links.
    pub fn resolve(&self, path: &str, follow: Follow) -> FsResult<String> {
        let mut current = path.to_string();
        let mut visited: HashSet<String> = HashSet::new();
        let mut hops = 0usize;
        let mut origin: Option<Substitution> = None;

        loop {
            let next = {
                let segments: Vec<&str> = path::segments(&current).collect();
                let mut prefix = ROOT.to_string();
                let mut next = None;

                for (idx, segment) in segments.iter().enumerate() {
                    let candidate = path::join(&prefix, segment);
                    let is_last = idx + 1 == segments.len();
                    let in_target = origin.as_ref().is_some_and(|o| idx < o.depth);

                    match self.ns.get(&candidate) {
                        Some(Node::Symlink(link)) if !is_last || follow == Follow::All => {
                            if !visited.insert(current.clone()) {
                                trace!(path, at = %candidate, "symlink cycle");
                                return Err(FsError::SymlinkCycle {
                                    path: path.to_string(),
                                });
                            }
                            if hops >= self.max_hops {
                                return Err(FsError::TooManySymlinks {
                                    path: path.to_string(),
                                    limit: self.max_hops,
                                });
                            }
                            hops += 1;

                            let base = path::parent_of(&candidate).unwrap_or(ROOT);
                            let target = path::normalize(&link.target, base);
                            let target_depth = path::segments(&target).count();
                            origin = match origin.take() {
                                // still inside the outer target: it keeps the blame
                                Some(outer) if in_target => Some(Substitution {
                                    depth: target_depth + outer.depth - idx - 1,
                                    ..outer
                                }),
                                _ => Some(Substitution {
                                    link: candidate.clone(),
                                    target: target.clone(),
                                    depth: target_depth,
                                }),
                            };

                            trace!(link = %candidate, target = %target, hop = hops, "following symlink");
                            let rest = segments[idx + 1..].join("/");
                            next = Some(path::join(&target, &rest));
                            break;
                        }
                        Some(Node::File(_)) if !is_last => {
                            return Err(FsError::not_a_directory(candidate));
                        }
                        None if in_target => {
                            let (link, target) = origin
                                .take()
                                .map(|o| (o.link, o.target))
                                .unwrap_or_default();
                            return Err(FsError::DanglingLink { link, target });
                        }
                        None if !is_last => {
                            return Err(FsError::not_found(candidate));
                        }
                        _ => prefix = candidate,
                    }
                }
                next
            };

            match next {
                Some(rewritten) => current = rewritten,
                None => return Ok(current),
            }
        }
    }

    /// Resolve and require the backing entry to exist.
    pub fn resolve_existing(&self, path: &str, follow: Follow) -> FsResult<(String, &'a Node)> {
        let resolved = self.resolve(path, follow)?;
        let ns: &'a Namespace = self.ns;
        match ns.get(&resolved) {
            Some(node) => Ok((resolved, node)),
            None => Err(FsError::not_found(path)),
        }
    }
}
