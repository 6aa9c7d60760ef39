//! Error types for memfs

/// Core filesystem error type
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("already exists: {path}")]
    AlreadyExists { path: String },
    #[error("parent directory does not exist: {path}")]
    NoParent { path: String },
    #[error("directory not empty: {path}")]
    NotEmpty { path: String },
    #[error("not a directory: {path}")]
    NotADirectory { path: String },
    #[error("not a file: {path}")]
    NotAFile { path: String },
    #[error("not a symbolic link: {path}")]
    NotASymlink { path: String },
    #[error("access denied: {path}")]
    AccessDenied { path: String },
    #[error("quota exceeded: {requested} bytes requested, {available} available")]
    QuotaExceeded { requested: u64, available: u64 },
    #[error("symbolic link cycle detected while resolving {path}")]
    SymlinkCycle { path: String },
    #[error("too many levels of symbolic links resolving {path} (limit {limit})")]
    TooManySymlinks { path: String, limit: usize },
    #[error("dangling symbolic link {link} -> {target}")]
    DanglingLink { link: String, target: String },
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("invalid permissions: {0:?}")]
    InvalidPermissions(String),
}

impl FsError {
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn already_exists<S: Into<String>>(path: S) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    pub fn no_parent<S: Into<String>>(path: S) -> Self {
        Self::NoParent { path: path.into() }
    }

    pub fn not_a_directory<S: Into<String>>(path: S) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    pub fn not_a_file<S: Into<String>>(path: S) -> Self {
        Self::NotAFile { path: path.into() }
    }

    pub fn access_denied<S: Into<String>>(path: S) -> Self {
        Self::AccessDenied { path: path.into() }
    }

    pub fn invalid_path<S: Into<String>>(path: S, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// True for errors a caller should present as "no such file".
    ///
    /// A dangling link is reported distinctly so diagnostics can name the
    /// missing target, but it means the same thing to a reader.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::DanglingLink { .. })
    }

    /// True for symlink resolution failures (cycles and hop limit).
    pub fn is_link_error(&self) -> bool {
        matches!(
            self,
            Self::SymlinkCycle { .. } | Self::TooManySymlinks { .. } | Self::DanglingLink { .. }
        )
    }
}

pub type FsResult<T> = Result<T, FsError>;
