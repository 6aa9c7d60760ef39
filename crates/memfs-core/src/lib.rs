//! memfs core: an in-memory, POSIX-like filesystem namespace
//!
//! Files, directories and symbolic links live in a single ordered namespace
//! keyed by canonical absolute path, guarded by per-file permission bits and
//! a global content quota. [`VirtualFs`] is the entry point.

pub mod config;
pub mod error;
pub mod inspect;
pub mod links;
pub mod path;
pub mod quota;
pub mod storage;
mod subtree;
pub mod types;
pub mod vfs;

// Re-export key types for convenience
pub use config::FsConfig;
pub use error::{FsError, FsResult};
pub use inspect::TreeNode;
pub use types::*;
pub use vfs::VirtualFs;
