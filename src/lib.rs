//! Kiln - Disc Project Editor
//!
//! Kiln builds the content of an optical disc before it is burnt. Two
//! editors implement one [`Disc`] contract:
//! - Audio: an ordered list of songs with gaps, measured in playing time
//! - Data: a tree of files and directories grafted from the local
//!   filesystem, measured in bytes
//!
//! # Architecture
//!
//! - [`disc`]: the editor contract, status codes, tracks and notifications
//! - [`editor`]: the audio and data editors with their background scans
//! - [`project`]: the host owning the active editor, project files
//! - [`state`]: window and project state persisted between runs

pub mod cli;
pub mod config;
pub mod disc;
pub mod editor;
pub mod error;
pub mod project;
pub mod state;

pub use config::KilnConfig;
pub use disc::{Disc, DiscError, DiscEvent, DiscResult, Track, TrackType};
pub use editor::{AudioDisc, DataDisc};
pub use error::{KilnError, Result};
pub use project::ProjectManager;
