//! Burn session sink
//!
//! Editors push their content into a session in two phases: parameters
//! first, so the session can validate capacity and format, then the track.

use enumflags2::BitFlags;

use super::flags::BurnFlag;
use super::result::{DiscError, DiscResult};
use super::track::{Track, TrackType};

/// Parameters pushed before the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    /// Kind of track that will follow
    pub track_type: TrackType,

    /// Flags the content requires
    pub flags: BitFlags<BurnFlag>,

    /// Aggregate size (bytes for data, nanoseconds for audio)
    pub size: i64,
}

/// External object accumulating content destined for a disc image.
pub trait BurnSession {
    /// Accept or refuse the parameters of the next track.
    fn set_params(&mut self, params: SessionParams) -> DiscResult;

    /// Accept or refuse the track itself.
    fn add_track(&mut self, track: Track) -> DiscResult;
}

/// In-memory session used by the CLI dry run and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    capacity: Option<i64>,
    params: Option<SessionParams>,
    tracks: Vec<Track>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session refusing parameters whose size exceeds `capacity`.
    pub fn with_capacity(capacity: i64) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn params(&self) -> Option<&SessionParams> {
        self.params.as_ref()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

impl BurnSession for MemorySession {
    fn set_params(&mut self, params: SessionParams) -> DiscResult {
        if let Some(capacity) = self.capacity {
            if params.size > capacity {
                tracing::debug!(size = params.size, capacity, "session refused oversized content");
                return Err(DiscError::Size);
            }
        }
        self.params = Some(params);
        Ok(())
    }

    fn add_track(&mut self, track: Track) -> DiscResult {
        let Some(params) = &self.params else {
            return Err(DiscError::NotReady);
        };
        if params.track_type != track.track_type() {
            return Err(DiscError::FileType);
        }
        self.tracks.push(track);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(track_type: TrackType, size: i64) -> SessionParams {
        SessionParams {
            track_type,
            flags: BitFlags::empty(),
            size,
        }
    }

    #[test]
    fn test_contents_require_params_first() {
        let mut session = MemorySession::new();
        assert_eq!(
            session.add_track(Track::empty(TrackType::Data)),
            Err(DiscError::NotReady)
        );

        session.set_params(params(TrackType::Data, 10)).unwrap();
        session.add_track(Track::empty(TrackType::Data)).unwrap();
        assert_eq!(session.tracks().len(), 1);
    }

    #[test]
    fn test_capacity_is_checked_in_param_phase() {
        let mut session = MemorySession::with_capacity(100);
        assert_eq!(
            session.set_params(params(TrackType::Data, 101)),
            Err(DiscError::Size)
        );
        assert!(session.params().is_none());
        assert!(session.set_params(params(TrackType::Data, 100)).is_ok());
    }

    #[test]
    fn test_track_must_match_params() {
        let mut session = MemorySession::new();
        session.set_params(params(TrackType::Audio, 0)).unwrap();
        assert_eq!(
            session.add_track(Track::empty(TrackType::Data)),
            Err(DiscError::FileType)
        );
    }
}
