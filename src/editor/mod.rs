//! Project Editors
//!
//! Concrete [`Disc`](crate::disc::Disc) implementations:
//! - [`AudioDisc`]: ordered songs with gaps and trim boundaries
//! - [`DataDisc`]: files and directories grafted into a disc tree
//!
//! Both share the [`EditorState`] machine that backs `status`.

mod audio;
mod data;
pub mod joliet;
pub mod probe;
pub mod scan;

pub use audio::AudioDisc;
pub use data::DataDisc;

use crate::disc::{DiscError, DiscResult};

/// Lifecycle of an editor's content.
///
/// `Empty -> Loading -> Ready`, `Ready -> Exploring -> Ready` on user edits
/// that need a rescan, and any state to `Error` on unrecoverable failure.
/// Only `clear`/`reset` leave `Error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Empty,
    /// Content pushed by `load_track` is still being imported
    Loading,
    /// User-initiated content is still being explored
    Exploring,
    Ready,
    Error(DiscError),
}

impl EditorState {
    /// Whether a snapshot can be produced in this state.
    pub fn check(self) -> DiscResult {
        match self {
            EditorState::Ready => Ok(()),
            EditorState::Empty => Err(DiscError::EmptySelection),
            EditorState::Loading => Err(DiscError::Loading),
            EditorState::Exploring => Err(DiscError::NotReady),
            EditorState::Error(code) => Err(code),
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, EditorState::Error(_))
    }
}

/// `ERROR_SIZE` when `size` does not fit in `capacity`.
pub(crate) fn check_capacity(size: i64, capacity: Option<i64>) -> DiscResult {
    match capacity {
        Some(capacity) if size > capacity => Err(DiscError::Size),
        _ => Ok(()),
    }
}
