//! Storage quota accounting.

use tracing::warn;

use crate::error::{FsError, FsResult};

/// Tracks the total length of stored file contents against a ceiling.
///
/// `used` is only changed through [`reserve`](Self::reserve) and
/// [`release`](Self::release); callers reserve before mutating content and
/// perform no fallible work between the reservation and the mutation.
#[derive(Clone, Debug)]
pub struct QuotaManager {
    limit: u64,
    used: u64,
}

impl QuotaManager {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Lowering the limit below current usage is allowed; it only blocks growth.
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = limit;
    }

    /// Charge `delta` bytes, or reject without changing anything.
    pub fn reserve(&mut self, delta: u64) -> FsResult<()> {
        match self.used.checked_add(delta) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => {
                warn!(
                    requested = delta,
                    used = self.used,
                    limit = self.limit,
                    "quota reservation rejected"
                );
                Err(FsError::QuotaExceeded {
                    requested: delta,
                    available: self.available(),
                })
            }
        }
    }

    pub fn release(&mut self, bytes: u64) {
        debug_assert!(bytes <= self.used, "releasing more than was charged");
        self.used = self.used.saturating_sub(bytes);
    }

    /// Account for content changing length from `old` to `new`.
    pub fn resize(&mut self, old: u64, new: u64) -> FsResult<()> {
        if new > old {
            self.reserve(new - old)
        } else {
            self.release(old - new);
            Ok(())
        }
    }
}
