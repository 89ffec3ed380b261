//! Outcome taxonomy shared by every disc operation.
//!
//! `Ok(())` is the `OK` code; every other code is a [`DiscError`] variant.
//! The set is flat: callers branch on the exact code, and several codes
//! (`LOADING`, `NOT_READY`, `CANCELLED`) describe "not yet" states rather
//! than failures.

use thiserror::Error;

/// Result of a disc operation
pub type DiscResult<T = ()> = std::result::Result<T, DiscError>;

/// Every non-`OK` outcome a disc operation can report
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscError {
    #[error("entry is not in the disc tree")]
    NotInTree,

    #[error("project is not ready")]
    NotReady,

    #[error("project is loading")]
    Loading,

    #[error("broken symbolic link")]
    BrokenSymlink,

    #[error("operation cancelled")]
    Cancelled,

    #[error("contents do not fit on the disc")]
    Size,

    #[error("nothing selected")]
    EmptySelection,

    #[error("file not found")]
    FileNotFound,

    #[error("file is not readable")]
    Unreadable,

    #[error("already in the disc tree")]
    AlreadyInTree,

    #[error("name is not compatible with Joliet")]
    Joliet,

    #[error("unsupported file type")]
    FileType,

    #[error("worker thread failure")]
    Thread,

    #[error("unknown error")]
    Unknown,
}

/// Code name of the `OK` outcome.
pub const OK_CODE: &str = "OK";

impl DiscError {
    /// Stable upper-case code name.
    pub fn code(&self) -> &'static str {
        match self {
            DiscError::NotInTree => "NOT_IN_TREE",
            DiscError::NotReady => "NOT_READY",
            DiscError::Loading => "LOADING",
            DiscError::BrokenSymlink => "BROKEN_SYMLINK",
            DiscError::Cancelled => "CANCELLED",
            DiscError::Size => "ERROR_SIZE",
            DiscError::EmptySelection => "ERROR_EMPTY_SELECTION",
            DiscError::FileNotFound => "ERROR_FILE_NOT_FOUND",
            DiscError::Unreadable => "ERROR_UNREADABLE",
            DiscError::AlreadyInTree => "ERROR_ALREADY_IN_TREE",
            DiscError::Joliet => "ERROR_JOLIET",
            DiscError::FileType => "ERROR_FILE_TYPE",
            DiscError::Thread => "ERROR_THREAD",
            DiscError::Unknown => "ERROR_UNKNOWN",
        }
    }

    /// "Not yet" states, resolved by re-querying after the next notification.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            DiscError::Loading | DiscError::NotReady | DiscError::Cancelled
        )
    }

    /// Faults of the core or a collaborator rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, DiscError::Thread | DiscError::Unknown)
    }
}

/// Code name of any disc outcome, `OK` included.
pub fn code_of<T>(result: &DiscResult<T>) -> &'static str {
    match result {
        Ok(_) => OK_CODE,
        Err(err) => err.code(),
    }
}
