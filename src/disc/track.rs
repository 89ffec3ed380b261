//! Track model
//!
//! A [`Track`] is the snapshot of one editor's content: either an ordered
//! audio program or a data layout built from graft points. It is both the
//! editors' working representation and the serialization boundary towards
//! project files and burn sessions.
//!
//! All time values (`gap`, `start`, `end`) are nanoseconds and are passed
//! through untouched.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{DiscError, DiscResult};

/// Kind of content a track (and the editor producing it) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    /// Ordered songs
    Audio,
    /// Files and directories
    Data,
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackType::Audio => write!(f, "audio"),
            TrackType::Data => write!(f, "data"),
        }
    }
}

/// Descriptive metadata attached to a song. Not interpreted by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
}

/// One entry of an audio program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Source locator
    pub uri: String,

    /// Silence preceding the song
    pub gap: i64,

    /// Trim start within the source
    #[serde(default)]
    pub start: Option<i64>,

    /// Trim end within the source
    #[serde(default)]
    pub end: Option<i64>,

    #[serde(default)]
    pub info: SongInfo,
}

impl Song {
    /// Full-length song without gap.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            gap: 0,
            start: None,
            end: None,
            info: SongInfo::default(),
        }
    }

    pub fn with_gap(mut self, gap: i64) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_boundaries(mut self, start: i64, end: i64) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_info(mut self, info: SongInfo) -> Self {
        self.info = info;
        self
    }

    /// Check the gap and trim invariants.
    pub fn validate(&self) -> DiscResult {
        if self.gap < 0 {
            return Err(DiscError::Unknown);
        }
        match (self.start, self.end) {
            (Some(start), _) if start < 0 => Err(DiscError::Unknown),
            (Some(start), Some(end)) if end < start => Err(DiscError::Unknown),
            _ => Ok(()),
        }
    }

    /// True when the whole source is used.
    pub fn is_full_length(&self) -> bool {
        match (self.start, self.end) {
            (None, None) => true,
            (Some(start), Some(end)) => start == end,
            _ => false,
        }
    }

    /// Trim boundaries, when both are set.
    pub fn boundaries(&self) -> Option<(i64, i64)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Played length given the source duration, when it can be known.
    pub fn length(&self, source_duration: Option<i64>) -> Option<i64> {
        if !self.is_full_length() {
            if let Some((start, end)) = self.boundaries() {
                return Some(end - start);
            }
        }
        let start = if self.is_full_length() {
            0
        } else {
            self.start.unwrap_or(0)
        };
        source_duration.map(|duration| (duration - start).max(0))
    }
}

/// Binding of a source entry to a path inside the disc tree.
///
/// A graft without source is a directory created inside the disc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraftPoint {
    #[serde(default)]
    pub uri: Option<String>,

    /// Absolute path inside the disc tree
    pub path: String,
}

impl GraftPoint {
    pub fn new(uri: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            path: path.into(),
        }
    }

    /// Empty directory created inside the disc.
    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            uri: None,
            path: path.into(),
        }
    }

    /// Last component of the disc path.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Data layout: grafts plus exclusion and restoration sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTrack {
    #[serde(default)]
    pub grafts: Vec<GraftPoint>,

    #[serde(default)]
    pub excluded: BTreeSet<String>,

    #[serde(default)]
    pub restored: BTreeSet<String>,
}

impl DataTrack {
    pub fn is_empty(&self) -> bool {
        self.grafts.is_empty()
    }

    /// Entries that are both excluded and restored.
    pub fn conflicts(&self) -> Vec<&String> {
        self.excluded.intersection(&self.restored).collect()
    }
}

/// Ordered audio program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl AudioTrack {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Snapshot of one editor's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Track {
    Audio(AudioTrack),
    Data(DataTrack),
}

impl Track {
    /// Empty track of the given kind.
    pub fn empty(kind: TrackType) -> Self {
        match kind {
            TrackType::Audio => Track::Audio(AudioTrack::default()),
            TrackType::Data => Track::Data(DataTrack::default()),
        }
    }

    pub fn track_type(&self) -> TrackType {
        match self {
            Track::Audio(_) => TrackType::Audio,
            Track::Data(_) => TrackType::Data,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Track::Audio(audio) => audio.is_empty(),
            Track::Data(data) => data.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_song_validation() {
        assert!(Song::new("a.wav").validate().is_ok());
        assert!(Song::new("a.wav").with_gap(-1).validate().is_err());
        assert!(Song::new("a.wav")
            .with_boundaries(10, 5)
            .validate()
            .is_err());
        assert!(Song::new("a.wav").with_boundaries(5, 5).validate().is_ok());
    }

    #[test]
    fn test_full_length_semantics() {
        assert!(Song::new("a.wav").is_full_length());
        assert!(Song::new("a.wav").with_boundaries(7, 7).is_full_length());
        let trimmed = Song::new("a.wav").with_boundaries(2, 9);
        assert!(!trimmed.is_full_length());
        assert_eq!(trimmed.length(None), Some(7));
        assert_eq!(Song::new("a.wav").length(Some(30)), Some(30));
        assert_eq!(Song::new("a.wav").length(None), None);
    }

    #[test]
    fn test_track_serializes_with_type_tag() {
        let track = Track::Data(DataTrack {
            grafts: vec![
                GraftPoint::new("file:///home/u/doc.txt", "/doc.txt"),
                GraftPoint::folder("/extra"),
            ],
            excluded: BTreeSet::from(["file:///home/u/music/skip.mp3".to_string()]),
            restored: BTreeSet::new(),
        });

        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["type"], "data");

        let back: Track = serde_json::from_value(json).unwrap();
        assert_eq!(back, track);
    }

    #[test]
    fn test_data_track_conflicts() {
        let mut data = DataTrack::default();
        data.excluded.insert("file:///x".to_string());
        data.restored.insert("file:///x".to_string());
        data.restored.insert("file:///y".to_string());
        assert_eq!(data.conflicts(), vec!["file:///x"]);
    }

    #[test]
    fn test_graft_name() {
        assert_eq!(GraftPoint::folder("/extra").name(), "extra");
        assert_eq!(GraftPoint::new("file:///a/b", "/b/c").name(), "c");
    }

    #[test]
    fn test_empty_track_kind() {
        assert_eq!(Track::empty(TrackType::Audio).track_type(), TrackType::Audio);
        assert!(Track::empty(TrackType::Data).is_empty());
    }
}
