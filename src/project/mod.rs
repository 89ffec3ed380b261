//! Project Manager
//!
//! The host side of the editors. `ProjectManager` owns the active
//! `Box<dyn Disc>`, keeps the status bar figures up to date from the
//! editor's notifications, decides whether burning is possible and saves or
//! opens project files.

mod file;

pub use file::{ProjectFile, PROJECT_FILE, PROJECT_SCHEMA_VERSION};

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use chrono::{DateTime, Utc};
use enumflags2::BitFlags;
use uuid::Uuid;

use crate::config::KilnConfig;
use crate::disc::{
    self, BurnFlag, BurnSession, Completion, Disc, DiscError, DiscEvent, DiscResult, Track,
    TrackType,
};
use crate::editor::{AudioDisc, DataDisc};
use crate::error::Result;
use crate::state::ProjectStore;

/// Create the editor for `kind`.
pub fn create_disc(kind: TrackType, config: &KilnConfig) -> Box<dyn Disc> {
    match kind {
        TrackType::Audio => Box::new(AudioDisc::new(config)),
        TrackType::Data => Box::new(DataDisc::new(config)),
    }
}

/// Figures shown in the status bar, maintained from editor notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub files: usize,
    /// Bytes for data projects, nanoseconds for audio projects
    pub size: i64,
    pub flags: BitFlags<BurnFlag>,
    pub selection_changes: usize,
}

impl StatusSummary {
    fn apply(&mut self, event: &DiscEvent) {
        match event {
            DiscEvent::SelectionChanged => self.selection_changes += 1,
            DiscEvent::ContentsChanged { files } => self.files = *files,
            DiscEvent::SizeChanged { size } => self.size = *size,
            DiscEvent::FlagsChanged { flags } => self.flags = *flags,
        }
    }
}

/// Owner of the active project editor.
pub struct ProjectManager {
    config: KilnConfig,
    disc: Box<dyn Disc>,
    events: Receiver<DiscEvent>,
    summary: StatusSummary,
    path: Option<PathBuf>,
    dirty: bool,
    id: Uuid,
    created_at: DateTime<Utc>,
}

impl ProjectManager {
    /// New, empty project of the given kind.
    pub fn new(kind: TrackType, config: KilnConfig) -> Self {
        let mut disc = create_disc(kind, &config);
        let events = disc.subscribe();
        let summary = StatusSummary {
            flags: disc.flags(),
            ..StatusSummary::default()
        };
        Self {
            config,
            disc,
            events,
            summary,
            path: None,
            dirty: false,
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    /// Open a saved project, waiting up to `timeout` for its import.
    pub fn open(path: &Path, config: KilnConfig, timeout: Duration) -> Result<Self> {
        let mut manager = Self::new(TrackType::Data, config);
        manager.load(path)?;
        manager.wait(timeout);
        manager.dirty = false;
        Ok(manager)
    }

    /// Replace the editor with an empty one of another kind.
    pub fn switch_to(&mut self, kind: TrackType) {
        if self.disc.kind() == kind {
            return;
        }
        tracing::info!(from = %self.disc.kind(), to = %kind, "switching project kind");
        let mut disc = create_disc(kind, &self.config);
        let events = disc.subscribe();
        self.install(disc, events);
    }

    /// Make `disc` the active editor, dropping the current one.
    fn install(&mut self, disc: Box<dyn Disc>, events: Receiver<DiscEvent>) {
        self.disc.clear();
        self.disc = disc;
        self.events = events;
        self.summary = StatusSummary {
            flags: self.disc.flags(),
            ..StatusSummary::default()
        };
        self.dirty = false;
    }

    pub fn kind(&self) -> TrackType {
        self.disc.kind()
    }

    pub fn disc(&self) -> &dyn Disc {
        self.disc.as_ref()
    }

    pub fn disc_mut(&mut self) -> &mut dyn Disc {
        self.disc.as_mut()
    }

    pub fn summary(&self) -> &StatusSummary {
        &self.summary
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the content changed since it was last saved or opened.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply finished background work and pending notifications.
    pub fn refresh(&mut self) -> Vec<Completion> {
        let done = self.disc.process_pending();
        self.drain_events();
        done
    }

    /// Like [`ProjectManager::refresh`], blocking up to `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Completion> {
        let done = self.disc.wait_pending(timeout);
        self.drain_events();
        for completion in &done {
            if let Err(code) = completion.result {
                tracing::warn!(uri = %completion.uri, code = code.code(), "background operation failed");
            }
        }
        done
    }

    fn drain_events(&mut self) {
        for event in self.events.try_iter() {
            if matches!(event, DiscEvent::ContentsChanged { .. }) {
                self.dirty = true;
            }
            self.summary.apply(&event);
        }
    }

    /// Burn button state.
    pub fn burn_enabled(&self) -> bool {
        self.disc.status().is_ok()
    }

    /// Push the editor's content into `session`.
    pub fn prepare_session(&self, session: &mut dyn BurnSession) -> DiscResult {
        disc::prepare_session(self.disc.as_ref(), session)
    }

    /// Snapshot to save; an empty editor saves an empty track.
    fn snapshot(&self) -> DiscResult<Track> {
        match self.disc.track() {
            Err(DiscError::EmptySelection) => Ok(Track::empty(self.disc.kind())),
            other => other,
        }
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = ProjectFile {
            version: PROJECT_SCHEMA_VERSION.to_string(),
            id: self.id,
            created_at: self.created_at,
            modified_at: self.created_at,
            track: self.snapshot()?,
        };
        file.write(path)
    }

    /// Save the project to `path` and remember it.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        tracing::info!(path = %path.display(), "project saved");
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    /// Replace the content with the project saved at `path`.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let file = ProjectFile::read(path)?;

        // the open project stays untouched until the new one is accepted
        let mut disc = create_disc(file.track.track_type(), &self.config);
        let events = disc.subscribe();
        disc.load_track(&file.track)?;
        self.install(disc, events);
        self.drain_events();

        tracing::info!(path = %path.display(), kind = %file.track.track_type(), "project opened");
        self.id = file.id;
        self.created_at = file.created_at;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }
}

impl ProjectStore for ProjectManager {
    fn save_session(&mut self, path: Option<&Path>, cancellable: bool) -> bool {
        self.refresh();
        match self.disc.status() {
            Err(DiscError::Loading) | Err(DiscError::NotReady) if cancellable => {
                tracing::info!("project still loading, shutdown vetoed");
                return true;
            }
            Err(DiscError::EmptySelection) => {
                tracing::debug!("empty project, nothing to resume");
                return false;
            }
            _ => {}
        }

        let Some(path) = path else {
            return false;
        };
        match self.write_to(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "project saved for next session");
                false
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not save project for next session");
                cancellable
            }
        }
    }

    fn load_session(&mut self, path: Option<&Path>) -> Result<()> {
        let Some(path) = path else {
            return Ok(());
        };
        let previous = self.path.take();
        let loaded = self.load(path);
        // the resume file is not the user's project file
        self.path = previous;
        if loaded.is_ok() {
            self.dirty = true;
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::{GraftPoint, MemorySession};
    use tempfile::TempDir;

    #[test]
    fn test_new_project_is_not_burnable() {
        let manager = ProjectManager::new(TrackType::Data, KilnConfig::default());
        assert!(!manager.burn_enabled());
        assert!(manager.summary().flags.contains(BurnFlag::Joliet));
        assert!(!manager.is_dirty());
    }

    #[test]
    fn test_summary_follows_events() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.bin");
        std::fs::write(&file, vec![1u8; 42]).unwrap();

        let mut manager = ProjectManager::new(TrackType::Data, KilnConfig::default());
        manager.disc_mut().add_uri(file.to_str().unwrap()).unwrap();
        manager.refresh();

        assert_eq!(manager.summary().files, 1);
        assert_eq!(manager.summary().size, 42);
        assert!(manager.is_dirty());
        assert!(manager.burn_enabled());

        let mut session = MemorySession::new();
        manager.prepare_session(&mut session).unwrap();
        assert_eq!(session.params().map(|p| p.size), Some(42));
    }

    #[test]
    fn test_empty_project_saves_empty_track() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_FILE);

        let mut manager = ProjectManager::new(TrackType::Audio, KilnConfig::default());
        manager.save(&path).unwrap();

        let file = ProjectFile::read(&path).unwrap();
        assert_eq!(file.track, Track::empty(TrackType::Audio));
        assert_eq!(file.id, manager.id());
    }

    #[test]
    fn test_open_switches_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_FILE);

        let mut track = Track::empty(TrackType::Data);
        if let Track::Data(data) = &mut track {
            data.grafts.push(GraftPoint::folder("/backup"));
        }
        ProjectFile::new(track.clone()).write(&path).unwrap();

        let mut manager = ProjectManager::new(TrackType::Audio, KilnConfig::default());
        manager.load(&path).unwrap();
        assert_eq!(manager.kind(), TrackType::Data);
        assert_eq!(manager.disc().track().unwrap(), track);
        assert_eq!(manager.path(), Some(path.as_path()));
    }

    #[test]
    fn test_session_save_skips_empty_project() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("resume.json");

        let mut manager = ProjectManager::new(TrackType::Data, KilnConfig::default());
        assert!(!manager.save_session(Some(&marker), true));
        assert!(!marker.exists());
    }

    #[test]
    fn test_failed_open_keeps_current_project() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_FILE);

        let bad = Track::Audio(crate::disc::AudioTrack {
            songs: vec![crate::disc::Song::new("file:///music/a.flac").with_gap(-1)],
        });
        ProjectFile::new(bad).write(&path).unwrap();

        let kept = Track::Data(crate::disc::DataTrack {
            grafts: vec![GraftPoint::folder("/keep")],
            ..Default::default()
        });
        let mut manager = ProjectManager::new(TrackType::Data, KilnConfig::default());
        manager.disc_mut().load_track(&kept).unwrap();
        manager.refresh();
        let id = manager.id();

        assert!(manager.load(&path).is_err());
        assert_eq!(manager.kind(), TrackType::Data);
        assert_eq!(manager.disc().track().unwrap(), kept);
        assert_eq!(manager.id(), id);
        assert!(manager.path().is_none());

        assert!(manager.load_session(Some(&path)).is_err());
        assert_eq!(manager.disc().track().unwrap(), kept);
        assert!(manager.is_dirty());
    }
}
