//! Audio project editor
//!
//! Holds an ordered program of songs. Every edit is synchronous: sources are
//! probed with lofty when they are added, so the editor never reports
//! `LOADING`.

use std::sync::mpsc::Receiver;

use enumflags2::BitFlags;

use crate::config::{AudioConfig, KilnConfig};
use crate::disc::{
    Action, ActionGroup, ActionHost, AudioTrack, BurnFlag, BurnSession, Disc, DiscError,
    DiscEvent, DiscResult, Drive, EventEmitter, MessageArea, SessionParams, Song, Track,
    TrackType, UiHandle, DISC_ACTION_GROUP,
};

use super::probe::{classify, path_to_uri, probe_audio, uri_to_path, AudioProbe, EntryKind};
use super::{check_capacity, EditorState};

#[derive(Debug, Clone)]
struct SongEntry {
    song: Song,
    /// Source duration, when it could be probed
    duration: Option<i64>,
}

impl SongEntry {
    /// Gap plus played length, in nanoseconds.
    fn program_length(&self) -> i64 {
        self.song
            .gap
            .saturating_add(self.song.length(self.duration).unwrap_or(0))
    }
}

/// Editor for audio projects.
pub struct AudioDisc {
    config: AudioConfig,
    songs: Vec<SongEntry>,
    selection: Option<usize>,
    drive: Option<Drive>,
    flags: BitFlags<BurnFlag>,
    state: EditorState,
    events: EventEmitter,
}

impl AudioDisc {
    pub fn new(config: &KilnConfig) -> Self {
        Self {
            config: config.audio.clone(),
            songs: Vec::new(),
            selection: None,
            drive: None,
            flags: BitFlags::empty(),
            state: EditorState::Empty,
            events: EventEmitter::new(),
        }
    }

    /// Number of songs in the program.
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Songs in burn order.
    pub fn songs(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter().map(|entry| &entry.song)
    }

    /// Total program length in nanoseconds.
    pub fn size(&self) -> i64 {
        self.songs
            .iter()
            .map(SongEntry::program_length)
            .fold(0, i64::saturating_add)
    }

    /// Select the song at `index`, or nothing.
    pub fn select(&mut self, index: Option<usize>) -> DiscResult {
        if let Some(i) = index {
            if i >= self.songs.len() {
                return Err(DiscError::NotInTree);
            }
        }
        if self.selection != index {
            self.selection = index;
            self.events.selection_changed();
        }
        Ok(())
    }

    /// Move the song at `from` so that it ends up at `to`.
    pub fn move_song(&mut self, from: usize, to: usize) -> DiscResult {
        if from >= self.songs.len() || to >= self.songs.len() {
            return Err(DiscError::NotInTree);
        }
        if from == to {
            return Ok(());
        }

        let entry = self.songs.remove(from);
        self.songs.insert(to, entry);
        self.selection = self.selection.map(|s| match s {
            s if s == from => to,
            s if from < s && s <= to => s - 1,
            s if to <= s && s < from => s + 1,
            s => s,
        });

        tracing::debug!(from, to, "song moved");
        self.events.contents_changed(self.songs.len());
        self.update_flags();
        Ok(())
    }

    /// Change the silence preceding the song at `index`.
    pub fn set_gap(&mut self, index: usize, gap: i64) -> DiscResult {
        if gap < 0 {
            return Err(DiscError::Unknown);
        }
        let entry = self.songs.get_mut(index).ok_or(DiscError::NotInTree)?;
        if entry.song.gap == gap {
            return Ok(());
        }
        entry.song.gap = gap;

        self.events.size_changed(self.size());
        self.update_flags();
        Ok(())
    }

    fn update_flags(&mut self) {
        // a gapless transition needs disc-at-once
        let flags = if self.songs.iter().skip(1).any(|e| e.song.gap == 0) {
            BitFlags::from(BurnFlag::Dao)
        } else {
            BitFlags::empty()
        };
        if flags != self.flags {
            self.flags = flags;
            self.events.flags_changed(flags);
        }
    }

    fn refresh_state(&mut self) {
        if !self.state.is_error() {
            self.state = if self.songs.is_empty() {
                EditorState::Empty
            } else {
                EditorState::Ready
            };
        }
    }

    fn capacity(&self) -> Option<i64> {
        self.drive.as_ref().and_then(Drive::audio_capacity)
    }

    /// Classification shared by `can_add_uri` and `add_uri`.
    fn check_uri(&self, uri: &str) -> DiscResult<(String, AudioProbe)> {
        if let EditorState::Error(code) = self.state {
            return Err(code);
        }

        let path = uri_to_path(uri)?;
        match classify(&path)? {
            EntryKind::Directory => return Err(DiscError::FileType),
            EntryKind::File { .. } => {}
        }
        let probe = probe_audio(&path)?;

        let added = self.config.default_gap_ns.saturating_add(probe.duration);
        check_capacity(self.size().saturating_add(added), self.capacity())?;

        Ok((path_to_uri(&path), probe))
    }

    /// Duration of a loaded song's source, probed only when it is needed.
    fn loaded_duration(song: &Song) -> Option<i64> {
        if !song.is_full_length() {
            return None;
        }
        let path = uri_to_path(&song.uri).ok()?;
        match probe_audio(&path) {
            Ok(probe) => Some(probe.duration),
            Err(e) => {
                tracing::debug!(uri = %song.uri, code = e.code(), "could not probe loaded song");
                None
            }
        }
    }
}

impl Disc for AudioDisc {
    fn kind(&self) -> TrackType {
        TrackType::Audio
    }

    fn status(&self) -> DiscResult {
        self.state.check()?;
        check_capacity(self.size(), self.capacity())
    }

    fn load_track(&mut self, track: &Track) -> DiscResult {
        let Track::Audio(audio) = track else {
            tracing::warn!(kind = %track.track_type(), "audio editor refused a track");
            return Err(DiscError::Unknown);
        };
        if let Some(bad) = audio.songs.iter().find(|s| s.validate().is_err()) {
            tracing::warn!(uri = %bad.uri, "refused track with invalid song");
            return Err(DiscError::Unknown);
        }

        self.songs = audio
            .songs
            .iter()
            .map(|song| SongEntry {
                song: song.clone(),
                duration: Self::loaded_duration(song),
            })
            .collect();
        self.state = EditorState::Empty;
        self.refresh_state();

        tracing::debug!(songs = self.songs.len(), "audio track loaded");
        if self.selection.take().is_some() {
            self.events.selection_changed();
        }
        self.events.contents_changed(self.songs.len());
        self.events.size_changed(self.size());
        self.update_flags();
        Ok(())
    }

    fn track(&self) -> DiscResult<Track> {
        self.state.check()?;
        Ok(Track::Audio(AudioTrack {
            songs: self.songs().cloned().collect(),
        }))
    }

    fn set_session_param(&self, session: &mut dyn BurnSession) -> DiscResult {
        self.status()?;
        session.set_params(SessionParams {
            track_type: TrackType::Audio,
            flags: self.flags,
            size: self.size(),
        })
    }

    fn set_session_contents(&self, session: &mut dyn BurnSession) -> DiscResult {
        session.add_track(self.track()?)
    }

    fn can_add_uri(&self, uri: &str) -> DiscResult {
        self.check_uri(uri).map(|_| ())
    }

    fn add_uri(&mut self, uri: &str) -> DiscResult {
        let (uri, probe) = self.check_uri(uri)?;

        let song = Song::new(uri)
            .with_gap(self.config.default_gap_ns)
            .with_boundaries(0, probe.duration)
            .with_info(probe.info);
        tracing::debug!(uri = %song.uri, duration = probe.duration, "song added");
        self.songs.push(SongEntry {
            song,
            duration: Some(probe.duration),
        });
        self.refresh_state();

        self.events.contents_changed(self.songs.len());
        self.events.size_changed(self.size());
        self.update_flags();
        Ok(())
    }

    fn selected_uri(&self) -> Option<String> {
        self.selection
            .and_then(|i| self.songs.get(i))
            .map(|entry| entry.song.uri.clone())
    }

    fn boundaries(&self) -> Option<(i64, i64)> {
        self.selection
            .and_then(|i| self.songs.get(i))
            .and_then(|entry| entry.song.boundaries())
    }

    fn delete_selected(&mut self) {
        let Some(index) = self.selection.take() else {
            return;
        };
        if index < self.songs.len() {
            self.songs.remove(index);
        }
        self.refresh_state();

        self.events.selection_changed();
        self.events.contents_changed(self.songs.len());
        self.events.size_changed(self.size());
        self.update_flags();
    }

    fn clear(&mut self) {
        self.state = EditorState::Empty;
        if self.selection.take().is_some() {
            self.events.selection_changed();
        }
        if self.songs.is_empty() {
            return;
        }
        self.songs.clear();
        self.events.contents_changed(0);
        self.events.size_changed(0);
        self.update_flags();
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn add_ui(
        &mut self,
        host: &mut dyn ActionHost,
        messages: &mut dyn MessageArea,
    ) -> Option<UiHandle> {
        let group = ActionGroup::new(DISC_ACTION_GROUP)
            .with_action(
                Action::new("DeleteAudio", "_Remove Songs", "Remove the selected songs")
                    .with_accelerator("Delete"),
            )
            .with_action(Action::new("MoveUp", "Move _Up", "Play the song earlier"))
            .with_action(Action::new("MoveDown", "Move _Down", "Play the song later"))
            .with_action(Action::new("EditGap", "_Pause", "Change the pause before the song"));
        if self.songs.is_empty() {
            messages.show(
                "The project is empty",
                Some("Add songs to build the audio program."),
            );
        }
        Some(host.merge(group))
    }

    fn set_drive(&mut self, drive: Option<Drive>) {
        tracing::debug!(device = ?drive.as_ref().map(|d| d.device.as_str()), "drive changed");
        self.drive = drive;
    }

    fn flags(&self) -> BitFlags<BurnFlag> {
        self.flags
    }

    fn subscribe(&mut self) -> Receiver<DiscEvent> {
        self.events.subscribe()
    }
}
