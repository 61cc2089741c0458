//! Error taxonomy for attribution operations
//!
//! Every fallible operation returns [`AttribError`]. Errors always carry the
//! path involved; nothing is retried or logged on the way out.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AttribError>;

/// Coarse error category, independent of which stage wrapped the error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Filesystem open/read/write/remove/mkdir failed
    Io,
    /// Live digest of a local file differs from the recorded digest
    Integrity,
    /// Unknown sidecar suffix, unparseable sidecar, or non-text content
    Format,
    /// Variant-specific operation invoked on the other variant
    TypeMismatch,
}

/// Filesystem operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Open,
    Read,
    Write,
    Rename,
    Remove,
    CreateDir,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoOp::Open => "open",
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::Rename => "rename",
            IoOp::Remove => "remove",
            IoOp::CreateDir => "create directories for",
        };
        f.write_str(s)
    }
}

/// Step of a pointer delete that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStage {
    /// Resolving the sidecar before deletion
    Resolve,
    /// Removing the content's backing storage
    Content,
    /// Removing the sidecar file itself
    Sidecar,
}

impl fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeleteStage::Resolve => "resolving sidecar",
            DeleteStage::Content => "deleting content",
            DeleteStage::Sidecar => "deleting sidecar",
        };
        f.write_str(s)
    }
}

/// Step of a pointer copy that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStage {
    Resolve,
    Read,
    CreateDirs,
    Write,
    Attribute,
}

impl fmt::Display for CopyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CopyStage::Resolve => "resolving source sidecar",
            CopyStage::Read => "reading source content",
            CopyStage::CreateDirs => "creating destination directories",
            CopyStage::Write => "writing copy",
            CopyStage::Attribute => "attributing copy",
        };
        f.write_str(s)
    }
}

/// Errors from attribution operations
#[derive(Debug, thiserror::Error)]
pub enum AttribError {
    #[error("failed to {op} {path}: {source}")]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checksum mismatch for {path}: recorded {expected}, current {actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("unrecognized attributed file format: {path}")]
    UnknownFormat { path: PathBuf },

    #[error("failed to parse sidecar {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid embedded payload in {path}: {reason}")]
    Payload { path: PathBuf, reason: String },

    #[error("failed to serialize sidecar {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("content at {path} is not valid UTF-8: {source}")]
    NotText {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("{path}: expected {expected} content, found {actual}")]
    TypeMismatch {
        path: PathBuf,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("while scanning {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{stage} at {path}: {source}")]
    Delete {
        stage: DeleteStage,
        path: PathBuf,
        #[source]
        source: Box<AttribError>,
    },

    #[error("{stage} to {path}: {source}")]
    Copy {
        stage: CopyStage,
        path: PathBuf,
        #[source]
        source: Box<AttribError>,
    },
}

impl AttribError {
    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        AttribError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn delete(stage: DeleteStage, path: impl Into<PathBuf>, source: AttribError) -> Self {
        AttribError::Delete {
            stage,
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn copy(stage: CopyStage, path: impl Into<PathBuf>, source: AttribError) -> Self {
        AttribError::Copy {
            stage,
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Category of the underlying failure, looking through stage wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            AttribError::Io { .. } | AttribError::Walk { .. } => ErrorKind::Io,
            AttribError::Integrity { .. } => ErrorKind::Integrity,
            AttribError::UnknownFormat { .. }
            | AttribError::Parse { .. }
            | AttribError::Payload { .. }
            | AttribError::Serialize { .. }
            | AttribError::NotText { .. } => ErrorKind::Format,
            AttribError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            AttribError::Delete { source, .. } | AttribError::Copy { source, .. } => source.kind(),
        }
    }

    /// True if this error (or the one it wraps) is a digest mismatch
    pub fn is_integrity(&self) -> bool {
        self.kind() == ErrorKind::Integrity
    }

    /// The innermost error, with stage wrappers removed
    pub fn root_cause(&self) -> &AttribError {
        match self {
            AttribError::Delete { source, .. } | AttribError::Copy { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
