//! Core type definitions for memfs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FsError;

/// File permission bits.
///
/// Only files carry permissions; directories and symlinks are not gated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permissions {
    None,
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl Permissions {
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Read => "r",
            Self::Write => "w",
            Self::ReadWrite => "rw",
        }
    }
}

impl FromStr for Permissions {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "-" => Ok(Self::None),
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "rw" | "wr" => Ok(Self::ReadWrite),
            other => Err(FsError::InvalidPermissions(other.to_string())),
        }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entry stored at a path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
    Symlink,
}

/// Directory entry information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeType,
    pub len: u64,
}

/// Attributes of a resolved path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Backing path after symlink resolution.
    pub path: String,
    pub kind: NodeType,
    pub len: u64,
    /// `None` for directories.
    pub permissions: Option<Permissions>,
}

impl Metadata {
    pub fn is_file(&self) -> bool {
        self.kind == NodeType::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeType::Directory
    }
}
