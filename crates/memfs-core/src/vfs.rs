//! Virtual filesystem implementation for memfs

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::inspect::TreeNode;
use crate::links::{Follow, LinkResolver};
use crate::path::{self, ROOT};
use crate::quota::QuotaManager;
use crate::storage::{FileNode, Namespace, Node, SymlinkNode};
use crate::types::{DirEntry, Metadata, Permissions};

/// Everything a filesystem instance owns: namespace, quota and working
/// directory.
///
/// Operations validate everything that can fail before their first
/// mutation, so an error always leaves the state untouched.
#[derive(Debug)]
pub(crate) struct FsState {
    pub(crate) ns: Namespace,
    pub(crate) quota: QuotaManager,
    pub(crate) cwd: String,
    max_symlink_hops: usize,
    default_permissions: Permissions,
}

impl FsState {
    fn new(config: &FsConfig) -> Self {
        Self {
            ns: Namespace::new(),
            quota: QuotaManager::new(config.quota_bytes),
            cwd: ROOT.to_string(),
            max_symlink_hops: config.max_symlink_hops,
            default_permissions: config.default_permissions,
        }
    }

    /// Canonical absolute form of a caller-supplied path.
    pub(crate) fn absolute(&self, path: &str) -> FsResult<String> {
        if path.is_empty() {
            return Err(FsError::invalid_path(path, "empty path"));
        }
        if path.contains('\0') {
            return Err(FsError::invalid_path(path, "path contains a NUL byte"));
        }
        Ok(path::normalize(path, &self.cwd))
    }

    pub(crate) fn resolver(&self) -> LinkResolver<'_> {
        LinkResolver::new(&self.ns, self.max_symlink_hops)
    }

    pub(crate) fn resolve(&self, path: &str, follow: Follow) -> FsResult<String> {
        let absolute = self.absolute(path)?;
        self.resolver().resolve(&absolute, follow)
    }

    /// Resolve the location a new entry would occupy. A missing or
    /// non-directory ancestor leaves the entry without a parent.
    pub(crate) fn resolve_new(&self, path: &str) -> FsResult<String> {
        let absolute = self.absolute(path)?;
        match self.resolver().resolve(&absolute, Follow::Parents) {
            Err(FsError::NotFound { .. } | FsError::NotADirectory { .. }) => {
                Err(FsError::no_parent(absolute))
            }
            other => other,
        }
    }

    /// Resolve `path` and return the entry it denotes.
    pub(crate) fn lookup(&self, path: &str, follow: Follow) -> FsResult<(String, &Node)> {
        let absolute = self.absolute(path)?;
        self.resolver().resolve_existing(&absolute, follow)
    }

    /// Resolve `path` through every link and require a regular file.
    pub(crate) fn lookup_file(&self, path: &str) -> FsResult<(String, &FileNode)> {
        match self.lookup(path, Follow::All)? {
            (resolved, Node::File(file)) => Ok((resolved, file)),
            (resolved, _) => Err(FsError::not_a_file(resolved)),
        }
    }

    /// Content of a file the caller is allowed to read.
    pub(crate) fn readable_content(&self, path: &str) -> FsResult<(String, &[u8])> {
        let (resolved, file) = self.lookup_file(path)?;
        if !file.permissions.can_read() {
            return Err(FsError::access_denied(resolved));
        }
        Ok((resolved, file.content.as_slice()))
    }

    fn create(&mut self, path: &str, content: &[u8]) -> FsResult<()> {
        let target = self.resolve_new(path)?;
        self.ns.check_vacant(&target)?;
        self.quota.reserve(content.len() as u64)?;
        let file = FileNode::new(content.to_vec(), self.default_permissions);
        self.ns.insert_unchecked(target.clone(), Node::File(file));
        debug!(path = %target, len = content.len(), "created file");
        Ok(())
    }

    fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        let (_, content) = self.readable_content(path)?;
        Ok(content.to_vec())
    }

    fn write(&mut self, path: &str, content: &[u8]) -> FsResult<()> {
        let target = self.resolve(path, Follow::All)?;
        let file = writable_file(&mut self.ns, &target)?;
        self.quota.resize(file.len(), content.len() as u64)?;
        file.content = content.to_vec();
        debug!(path = %target, len = content.len(), "wrote file");
        Ok(())
    }

    fn append(&mut self, path: &str, content: &[u8]) -> FsResult<()> {
        let target = self.resolve(path, Follow::All)?;
        let file = writable_file(&mut self.ns, &target)?;
        self.quota.reserve(content.len() as u64)?;
        file.content.extend_from_slice(content);
        debug!(path = %target, appended = content.len(), "appended to file");
        Ok(())
    }

    fn truncate(&mut self, path: &str, len: u64) -> FsResult<()> {
        let target = self.resolve(path, Follow::All)?;
        let file = writable_file(&mut self.ns, &target)?;
        let old = file.len();
        if len >= old {
            return Ok(());
        }
        // len < old, so it fits in usize
        file.content.truncate(len as usize);
        self.quota.release(old - len);
        debug!(path = %target, from = old, to = len, "truncated file");
        Ok(())
    }

    fn delete(&mut self, path: &str) -> FsResult<()> {
        let target = self.resolve(path, Follow::Parents)?;
        let node = self.ns.remove(&target)?;
        self.quota.release(node.content_len());
        debug!(path = %target, kind = ?node.kind(), "deleted entry");
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        let target = self.resolve_new(path)?;
        self.ns.put(&target, Node::Directory)?;
        debug!(path = %target, "created directory");
        Ok(())
    }

    fn mkdir_all(&mut self, path: &str) -> FsResult<()> {
        let absolute = self.absolute(path)?;
        let mut current = ROOT.to_string();
        let mut missing: Vec<String> = Vec::new();

        // Plan first, then create: a conflict deep in the path leaves nothing behind.
        for segment in path::segments(&absolute) {
            let candidate = path::join(&current, segment);
            if !missing.is_empty() {
                missing.push(candidate.clone());
                current = candidate;
                continue;
            }
            match self.ns.get(&candidate) {
                None => {
                    missing.push(candidate.clone());
                    current = candidate;
                }
                Some(Node::Directory) => current = candidate,
                Some(Node::Symlink(_)) => {
                    let resolved = self.resolver().resolve(&candidate, Follow::All)?;
                    if !self.ns.is_dir(&resolved) {
                        return Err(FsError::already_exists(candidate));
                    }
                    current = resolved;
                }
                Some(Node::File(_)) => return Err(FsError::already_exists(candidate)),
            }
        }

        for dir in missing {
            debug!(path = %dir, "created directory");
            self.ns.insert_unchecked(dir, Node::Directory);
        }
        Ok(())
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let target = self.resolve(path, Follow::All)?;
        let entries = self
            .ns
            .children_of(&target)?
            .into_iter()
            .map(|(name, node)| DirEntry {
                name: name.to_string(),
                kind: node.kind(),
                len: node.content_len(),
            })
            .collect();
        Ok(entries)
    }

    fn metadata(&self, path: &str) -> FsResult<Metadata> {
        let (resolved, node) = self.lookup(path, Follow::All)?;
        let permissions = match node {
            Node::File(file) => Some(file.permissions),
            _ => None,
        };
        Ok(Metadata {
            kind: node.kind(),
            len: node.content_len(),
            permissions,
            path: resolved,
        })
    }

    fn readlink(&self, path: &str) -> FsResult<String> {
        match self.lookup(path, Follow::Parents)? {
            (_, Node::Symlink(link)) => Ok(link.target.clone()),
            (resolved, _) => Err(FsError::NotASymlink { path: resolved }),
        }
    }

    fn symlink(&mut self, target: &str, link_path: &str) -> FsResult<()> {
        if target.is_empty() {
            return Err(FsError::invalid_path(target, "empty symlink target"));
        }
        let link = self.resolve_new(link_path)?;
        self.ns.put(
            &link,
            Node::Symlink(SymlinkNode {
                target: target.to_string(),
            }),
        )?;
        debug!(link = %link, target, "created symlink");
        Ok(())
    }

    fn chmod(&mut self, path: &str, permissions: Permissions) -> FsResult<()> {
        let target = self.resolve(path, Follow::All)?;
        match self.ns.get_mut(&target) {
            Some(Node::File(file)) => {
                file.permissions = permissions;
                debug!(path = %target, %permissions, "changed permissions");
                Ok(())
            }
            _ => Err(FsError::not_found(target)),
        }
    }

    fn cd(&mut self, path: &str) -> FsResult<()> {
        let (resolved, is_dir) = {
            let (resolved, node) = self.lookup(path, Follow::All)?;
            (resolved, node.is_dir())
        };
        if !is_dir {
            return Err(FsError::not_a_directory(resolved));
        }
        self.cwd = resolved;
        Ok(())
    }
}

/// The file at an already resolved `target`, provided it may be modified.
fn writable_file<'n>(ns: &'n mut Namespace, target: &str) -> FsResult<&'n mut FileNode> {
    match ns.get_mut(target) {
        Some(Node::File(file)) if file.permissions.can_write() => Ok(file),
        Some(Node::File(_)) => Err(FsError::access_denied(target)),
        Some(_) => Err(FsError::not_a_file(target)),
        None => Err(FsError::not_found(target)),
    }
}

/// An in-memory POSIX-like filesystem.
///
/// All state sits behind one lock, taken once per call, so every operation
/// is atomic with respect to every other and the type can be shared across
/// threads.
pub struct VirtualFs {
    config: FsConfig,
    state: Mutex<FsState>,
}

impl VirtualFs {
    pub fn new() -> Self {
        Self::with_config(FsConfig::default())
    }

    pub fn with_config(config: FsConfig) -> Self {
        let state = Mutex::new(FsState::new(&config));
        Self { config, state }
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// State mutations never panic halfway, so a poisoned lock still guards
    /// consistent data.
    pub(crate) fn state(&self) -> MutexGuard<'_, FsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // File operations

    /// Create a new file. The parent must be an existing directory and the
    /// path must be free.
    pub fn create(&self, path: &str, content: impl AsRef<[u8]>) -> FsResult<()> {
        self.state().create(path, content.as_ref())
    }

    pub fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        self.state().read(path)
    }

    /// Replace the content of an existing file.
    pub fn write(&self, path: &str, content: impl AsRef<[u8]>) -> FsResult<()> {
        self.state().write(path, content.as_ref())
    }

    pub fn append(&self, path: &str, content: impl AsRef<[u8]>) -> FsResult<()> {
        self.state().append(path, content.as_ref())
    }

    /// Shrink a file to `len` bytes; longer lengths leave it unchanged.
    pub fn truncate(&self, path: &str, len: u64) -> FsResult<()> {
        self.state().truncate(path, len)
    }

    /// Remove a file, an empty directory or a symlink (not its target).
    pub fn delete(&self, path: &str) -> FsResult<()> {
        self.state().delete(path)
    }

    // Directory operations

    pub fn mkdir(&self, path: &str) -> FsResult<()> {
        self.state().mkdir(path)
    }

    /// Create a directory and any missing ancestors.
    pub fn mkdir_all(&self, path: &str) -> FsResult<()> {
        self.state().mkdir_all(path)
    }

    /// Names of the entries in a directory, sorted.
    pub fn list(&self, path: &str) -> FsResult<Vec<String>> {
        let entries = self.state().read_dir(path)?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    pub fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        self.state().read_dir(path)
    }

    // Queries

    pub fn metadata(&self, path: &str) -> FsResult<Metadata> {
        self.state().metadata(path)
    }

    /// Whether `path` resolves to an existing entry. Dangling links do not exist.
    pub fn exists(&self, path: &str) -> bool {
        self.state().lookup(path, Follow::All).is_ok()
    }

    pub fn is_file(&self, path: &str) -> bool {
        matches!(self.state().lookup(path, Follow::All), Ok((_, Node::File(_))))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.state().lookup(path, Follow::All), Ok((_, Node::Directory)))
    }

    pub fn is_symlink(&self, path: &str) -> bool {
        matches!(self.state().lookup(path, Follow::Parents), Ok((_, Node::Symlink(_))))
    }

    /// The stored target of a symlink, verbatim.
    pub fn readlink(&self, path: &str) -> FsResult<String> {
        self.state().readlink(path)
    }

    /// Create a symlink at `link_path` pointing to `target`. The target need
    /// not exist yet; relative targets are taken relative to the link's
    /// directory.
    pub fn symlink(&self, target: &str, link_path: &str) -> FsResult<()> {
        self.state().symlink(target, link_path)
    }

    // Quota and permissions

    /// Bytes used by a file, or by every file beneath a directory.
    pub fn size_of(&self, path: &str) -> FsResult<u64> {
        let state = self.state();
        let (resolved, _) = state.lookup(path, Follow::All)?;
        Ok(state.ns.content_size(&resolved))
    }

    pub fn disk_usage(&self) -> u64 {
        self.state().quota.used()
    }

    pub fn quota(&self) -> u64 {
        self.state().quota.limit()
    }

    pub fn set_quota(&self, bytes: u64) {
        let mut state = self.state();
        state.quota.set_limit(bytes);
        debug!(limit = bytes, used = state.quota.used(), "quota changed");
    }

    /// Change a file's permissions. Anything but a file is `NotFound`.
    pub fn chmod(&self, path: &str, permissions: Permissions) -> FsResult<()> {
        self.state().chmod(path, permissions)
    }

    // Working directory

    /// Parent of `path` (relative paths are taken from the working
    /// directory); `None` for the root.
    pub fn get_parent(&self, path: &str) -> FsResult<Option<String>> {
        let absolute = self.state().absolute(path)?;
        Ok(path::parent_of(&absolute).map(str::to_string))
    }

    /// Canonical absolute form of `relative`, taken from the working
    /// directory. Links are not resolved.
    pub fn resolve_absolute(&self, relative: &str) -> FsResult<String> {
        self.state().absolute(relative)
    }

    pub fn pwd(&self) -> String {
        self.state().cwd.clone()
    }

    /// Change the working directory. Symlinks are resolved, so `pwd`
    /// reports the backing directory.
    pub fn cd(&self, path: &str) -> FsResult<()> {
        self.state().cd(path)
    }

    // Subtree operations

    /// Rename a file, symlink or whole directory tree.
    pub fn move_path(&self, src: &str, dest: &str) -> FsResult<()> {
        self.state().move_path(src, dest)
    }

    /// Duplicate a file, symlink or directory tree. Quota for the whole copy
    /// is reserved before anything is written.
    pub fn copy(&self, src: &str, dest: &str) -> FsResult<()> {
        self.state().copy(src, dest)
    }

    /// Remove a path and everything beneath it, regardless of permissions.
    pub fn delete_recursive(&self, path: &str) -> FsResult<()> {
        self.state().delete_recursive(path)
    }

    /// Files at or beneath `root` whose name is exactly `name`.
    pub fn find(&self, root: &str, name: &str) -> FsResult<Vec<String>> {
        self.state().find(root, name)
    }

    /// Readable files at or beneath `root` whose content contains `text`.
    pub fn grep(&self, root: &str, text: impl AsRef<[u8]>) -> FsResult<Vec<String>> {
        self.state().grep(root, text.as_ref())
    }

    // Inspection

    pub fn tree(&self, path: &str) -> FsResult<TreeNode> {
        self.state().tree(path)
    }

    /// Line diff of two files; empty when their contents are identical.
    pub fn diff(&self, a: &str, b: &str) -> FsResult<String> {
        self.state().diff(a, b)
    }
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_consistency_after_mixed_operations() {
        let fs = VirtualFs::with_config(FsConfig::default().with_quota(1000));
        fs.mkdir_all("/a/b").unwrap();
        fs.create("/a/one", "12345").unwrap();
        fs.create("/a/b/two", "abc").unwrap();
        fs.append("/a/one", "678").unwrap();
        fs.truncate("/a/b/two", 1).unwrap();
        fs.write("/a/one", "x").unwrap();
        fs.copy("/a", "/c").unwrap();
        fs.delete("/c/one").unwrap();

        let state = fs.state();
        assert_eq!(state.quota.used(), state.ns.total_content_size());
        assert_eq!(state.quota.used(), 3);
    }

    #[test]
    fn test_failed_write_leaves_state_untouched() {
        let fs = VirtualFs::with_config(FsConfig::default().with_quota(8));
        fs.create("/f", "1234").unwrap();
        assert!(matches!(
            fs.write("/f", "123456789"),
            Err(FsError::QuotaExceeded { .. })
        ));
        assert_eq!(fs.read("/f").unwrap(), b"1234");
        assert_eq!(fs.disk_usage(), 4);
    }

    #[test]
    fn test_mkdir_all_is_atomic() {
        let fs = VirtualFs::new();
        fs.mkdir("/a").unwrap();
        fs.create("/a/file", "").unwrap();
        assert!(matches!(
            fs.mkdir_all("/a/file/b/c"),
            Err(FsError::AlreadyExists { .. })
        ));
        assert!(!fs.exists("/a/file/b"));
        assert_eq!(fs.list("/a").unwrap(), vec!["file"]);
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let fs = Arc::new(VirtualFs::with_config(FsConfig::default().with_quota(10_000)));
        fs.mkdir("/t").unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let fs = Arc::clone(&fs);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        fs.create(&format!("/t/{i}-{j}"), "xx").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(fs.list("/t").unwrap().len(), 100);
        assert_eq!(fs.disk_usage(), 200);
    }
}
