//! Disc Abstraction
//!
//! The [`Disc`] trait is the uniform surface every project editor
//! implements. The host holds a `Box<dyn Disc>` and drives whichever editor
//! is active (status queries, snapshots, burn session preparation) without
//! knowing its concrete type.
//!
//! Default methods report `ERROR_UNKNOWN` for result operations, `None` for
//! queries and do nothing for plain mutations, so an editor only implements
//! what it supports.

mod drive;
mod events;
mod flags;
mod result;
mod session;
mod track;
mod ui;

use std::sync::mpsc::Receiver;
use std::time::Duration;

use enumflags2::BitFlags;

pub use drive::{Drive, AUDIO_BYTES_PER_SECOND};
pub use events::{DiscEvent, EventEmitter};
pub use flags::{describe as describe_flags, BurnFlag};
pub use result::{code_of, DiscError, DiscResult, OK_CODE};
pub use session::{BurnSession, MemorySession, SessionParams};
pub use track::{AudioTrack, DataTrack, GraftPoint, Song, SongInfo, Track, TrackType};
pub use ui::{
    Action, ActionGroup, ActionHost, ActionRegistry, MessageArea, MessageLog, UiHandle,
    DISC_ACTION_GROUP,
};

/// Terminal result of a background operation, keyed by its locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub uri: String,
    pub result: DiscResult,
}

impl Completion {
    pub fn new(uri: impl Into<String>, result: DiscResult) -> Self {
        Self {
            uri: uri.into(),
            result,
        }
    }
}

/// Content editor contract.
///
/// Mutations take `&mut self`, so at most one is in flight per instance.
/// Queries never block on I/O.
pub trait Disc: Send {
    /// Kind of track this editor produces and accepts.
    fn kind(&self) -> TrackType;

    /// Whether the content can be exported right now.
    ///
    /// `Ok` guarantees that [`Disc::track`] succeeds.
    fn status(&self) -> DiscResult;

    /// Replace the content with `track`.
    ///
    /// A track of the wrong kind is refused and the content left unchanged.
    fn load_track(&mut self, _track: &Track) -> DiscResult {
        Err(DiscError::Unknown)
    }

    /// Independent snapshot of the content.
    fn track(&self) -> DiscResult<Track> {
        Err(DiscError::Unknown)
    }

    /// Push parameters (kind, flags, size) into a session.
    fn set_session_param(&self, _session: &mut dyn BurnSession) -> DiscResult {
        Err(DiscError::Unknown)
    }

    /// Push the content into a session, after [`Disc::set_session_param`].
    fn set_session_contents(&self, _session: &mut dyn BurnSession) -> DiscResult {
        Err(DiscError::Unknown)
    }

    /// Predict the outcome of [`Disc::add_uri`] without side effects.
    fn can_add_uri(&self, _uri: &str) -> DiscResult {
        Err(DiscError::Unknown)
    }

    /// Add one source item.
    fn add_uri(&mut self, _uri: &str) -> DiscResult {
        Err(DiscError::Unknown)
    }

    /// Locator of the selected item.
    fn selected_uri(&self) -> Option<String> {
        None
    }

    /// Trim boundaries of the selected item.
    fn boundaries(&self) -> Option<(i64, i64)> {
        None
    }

    fn delete_selected(&mut self) {}

    /// Empty the content. Idempotent.
    fn clear(&mut self) {}

    /// Empty the content and restore defaults. Idempotent.
    fn reset(&mut self) {}

    /// Merge this editor's actions into the host UI.
    fn add_ui(
        &mut self,
        _host: &mut dyn ActionHost,
        _messages: &mut dyn MessageArea,
    ) -> Option<UiHandle> {
        None
    }

    /// Currently selected target drive.
    fn set_drive(&mut self, _drive: Option<Drive>) {}

    /// Flags the current content imposes on the burn.
    fn flags(&self) -> BitFlags<BurnFlag> {
        BitFlags::empty()
    }

    /// Register an observer of this editor's notifications.
    fn subscribe(&mut self) -> Receiver<DiscEvent>;

    /// Apply finished background work on the owner thread.
    fn process_pending(&mut self) -> Vec<Completion> {
        Vec::new()
    }

    /// Block until background work finishes or `timeout` elapses.
    fn wait_pending(&mut self, _timeout: Duration) -> Vec<Completion> {
        self.process_pending()
    }
}

/// Two-phase push of an editor's content into a session.
pub fn prepare_session(disc: &dyn Disc, session: &mut dyn BurnSession) -> DiscResult {
    disc.status()?;
    disc.set_session_param(session)?;
    disc.set_session_contents(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Editor implementing only the required operations.
    struct BareDisc {
        events: EventEmitter,
    }

    impl Disc for BareDisc {
        fn kind(&self) -> TrackType {
            TrackType::Data
        }

        fn status(&self) -> DiscResult {
            Ok(())
        }

        fn subscribe(&mut self) -> Receiver<DiscEvent> {
            self.events.subscribe()
        }
    }

    #[test]
    fn test_default_operations() {
        let mut disc = BareDisc {
            events: EventEmitter::new(),
        };
        let mut host = ActionRegistry::new();
        let mut messages = MessageLog::new();

        assert_eq!(disc.can_add_uri("/tmp/a"), Err(DiscError::Unknown));
        assert_eq!(disc.add_uri("/tmp/a"), Err(DiscError::Unknown));
        assert_eq!(disc.track(), Err(DiscError::Unknown));
        assert_eq!(
            disc.load_track(&Track::empty(TrackType::Data)),
            Err(DiscError::Unknown)
        );
        assert_eq!(disc.selected_uri(), None);
        assert_eq!(disc.boundaries(), None);
        assert_eq!(disc.add_ui(&mut host, &mut messages), None);
        assert!(disc.flags().is_empty());
        assert!(disc.wait_pending(Duration::from_millis(1)).is_empty());
        assert!(host.is_empty());
    }

    #[test]
    fn test_prepare_session_stops_at_first_failure() {
        let disc = BareDisc {
            events: EventEmitter::new(),
        };
        let mut session = MemorySession::new();
        assert_eq!(prepare_session(&disc, &mut session), Err(DiscError::Unknown));
        assert!(session.params().is_none());
    }
}
