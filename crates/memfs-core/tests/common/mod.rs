//! Helpers shared by the integration tests.

#![allow(dead_code)]

use memfs_core::{FsConfig, VirtualFs};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A filesystem with the default configuration.
pub fn setup() -> VirtualFs {
    init_tracing();
    VirtualFs::new()
}

/// A filesystem with room for `bytes` bytes of content.
pub fn setup_with_quota(bytes: u64) -> VirtualFs {
    init_tracing();
    VirtualFs::with_config(FsConfig::default().with_quota(bytes))
}

pub fn read_string(fs: &VirtualFs, path: &str) -> String {
    String::from_utf8(fs.read(path).expect("read failed")).expect("content is not UTF-8")
}
