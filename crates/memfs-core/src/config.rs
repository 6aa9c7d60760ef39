//! Configuration types for memfs

use serde::{Deserialize, Serialize};

use crate::types::Permissions;

/// Initial storage ceiling in bytes.
pub const DEFAULT_QUOTA_BYTES: u64 = 100;

/// Symlink substitutions allowed while resolving a single path.
pub const DEFAULT_MAX_SYMLINK_HOPS: usize = 40;

/// Main filesystem configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Ceiling on the total length of all file contents.
    pub quota_bytes: u64,
    pub max_symlink_hops: usize,
    /// Permissions given to newly created files.
    pub default_permissions: Permissions,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            quota_bytes: DEFAULT_QUOTA_BYTES,
            max_symlink_hops: DEFAULT_MAX_SYMLINK_HOPS,
            default_permissions: Permissions::ReadWrite,
        }
    }
}

impl FsConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = bytes;
        self
    }
}
