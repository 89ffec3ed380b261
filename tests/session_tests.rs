//! Session Persistence Tests
//!
//! Window geometry and resume project across a simulated restart.

use std::fs;
use std::path::Path;
use std::time::Duration;

use kiln::disc::{DataTrack, GraftPoint};
use kiln::error::Result;
use kiln::state::{
    self, ProjectStore, ScreenGeometry, SessionHost, SessionLink, SessionPaths, SessionRequest,
    WindowGeometry,
};
use kiln::{KilnConfig, ProjectManager, Track, TrackType};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SCREEN: ScreenGeometry = ScreenGeometry {
    width: 1000,
    height: 800,
};

/// Records what the session asked of the project side.
#[derive(Default)]
struct RecordingStore {
    veto: bool,
    saved_to: Vec<Option<String>>,
    loaded_from: Vec<Option<String>>,
}

impl ProjectStore for RecordingStore {
    fn save_session(&mut self, path: Option<&Path>, _cancellable: bool) -> bool {
        if let Some(p) = path {
            fs::write(p, b"{}").unwrap();
        }
        self.saved_to
            .push(path.map(|p| p.display().to_string()));
        self.veto
    }

    fn load_session(&mut self, path: Option<&Path>) -> Result<()> {
        self.loaded_from
            .push(path.map(|p| p.display().to_string()));
        Ok(())
    }
}

struct MockHost<S: ProjectStore> {
    geometry: WindowGeometry,
    store: S,
}

impl<S: ProjectStore> SessionHost for MockHost<S> {
    fn screen(&self) -> ScreenGeometry {
        SCREEN
    }

    fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    fn apply_geometry(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry;
    }

    fn projects(&mut self) -> &mut dyn ProjectStore {
        &mut self.store
    }
}

fn host<S: ProjectStore>(store: S) -> MockHost<S> {
    MockHost {
        geometry: WindowGeometry {
            width: 1,
            height: 1,
            maximized: false,
        },
        store,
    }
}

fn write_document(paths: &SessionPaths, version: &str) {
    paths.ensure_dir().unwrap();
    fs::write(
        paths.session_file(),
        format!(
            "<?xml version=\"1.0\"?>\n<Session>\n\t<version>{version}</version>\n\t<width>800</width>\n\t<height>600</height>\n\t<state>1</state>\n</Session>\n"
        ),
    )
    .unwrap();
}

#[test]
fn test_current_document_restores_maximized_window() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));
    write_document(&paths, "0.1");

    let mut host = host(RecordingStore::default());
    assert!(!state::load(&mut host, &paths, true));
    assert_eq!(
        host.geometry,
        WindowGeometry {
            width: 800,
            height: 600,
            maximized: true
        }
    );
    assert_eq!(host.store.loaded_from, vec![None]);
}

#[test]
fn test_mismatched_version_falls_back_to_screen_share() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));
    write_document(&paths, "0.0");

    let mut host = host(RecordingStore::default());
    state::load(&mut host, &paths, true);
    assert_eq!(
        host.geometry,
        WindowGeometry {
            width: 850,
            height: 680,
            maximized: false
        }
    );
}

#[test]
fn test_missing_or_malformed_document_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));

    let mut missing = host(RecordingStore::default());
    state::load(&mut missing, &paths, true);
    assert_eq!(missing.geometry, WindowGeometry::default_for(SCREEN));

    paths.ensure_dir().unwrap();
    fs::write(paths.session_file(), "<Session><width>800").unwrap();
    let mut malformed = host(RecordingStore::default());
    state::load(&mut malformed, &paths, true);
    assert_eq!(malformed.geometry, WindowGeometry::default_for(SCREEN));
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));
    let geometry = WindowGeometry {
        width: 1024,
        height: 700,
        maximized: false,
    };

    let mut saving = host(RecordingStore::default());
    saving.geometry = geometry;
    assert!(!state::save(&mut saving, &paths, false, false));
    assert_eq!(saving.store.saved_to, vec![None]);

    let mut loading = host(RecordingStore::default());
    state::load(&mut loading, &paths, true);
    assert_eq!(loading.geometry, geometry);
}

#[test]
fn test_veto_skips_document() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));

    let mut host = host(RecordingStore {
        veto: true,
        ..RecordingStore::default()
    });
    assert!(state::save(&mut host, &paths, true, true));
    assert!(!paths.session_file().exists());
}

#[test]
fn test_resume_marker_is_consumed() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));

    let mut saving = host(RecordingStore::default());
    state::save(&mut saving, &paths, true, false);
    assert!(paths.project_file().exists());

    let mut first = host(RecordingStore::default());
    assert!(state::load(&mut first, &paths, true));
    assert_eq!(
        first.store.loaded_from,
        vec![Some(paths.project_file().display().to_string())]
    );
    assert!(!paths.project_file().exists());

    let mut second = host(RecordingStore::default());
    assert!(!state::load(&mut second, &paths, true));
    assert_eq!(second.store.loaded_from, vec![None]);
}

#[test]
fn test_link_routes_requests_only_while_connected() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));
    let mut link = SessionLink::new();
    let mut host = host(RecordingStore::default());

    assert!(!link.handle(SessionRequest::Die, &mut host, &paths));
    assert!(host.store.saved_to.is_empty());

    link.connect();
    assert!(link.handle(SessionRequest::Die, &mut host, &paths));
    assert_eq!(host.store.saved_to, vec![None]);
    assert!(link.clone_command().is_none());

    assert!(link.handle(SessionRequest::SaveYourself, &mut host, &paths));
    assert_eq!(
        host.store.saved_to.last().cloned().flatten(),
        Some(paths.project_file().display().to_string())
    );
    assert_eq!(link.clone_command(), Some(&["kiln-cli".to_string()][..]));
}

#[test]
fn test_project_resumes_through_manager() {
    let dir = TempDir::new().unwrap();
    let paths = SessionPaths::new(dir.path().join("kiln"));
    let config = KilnConfig::default();

    let track = Track::Data(DataTrack {
        grafts: vec![GraftPoint::folder("/backup")],
        ..DataTrack::default()
    });
    let mut before = ProjectManager::new(TrackType::Data, config.clone());
    before.disc_mut().load_track(&track).unwrap();
    let mut saving = host(before);
    assert!(!state::save(&mut saving, &paths, true, true));

    let after = ProjectManager::new(TrackType::Audio, config);
    let mut loading = host(after);
    assert!(state::load(&mut loading, &paths, true));
    loading.store.wait(Duration::from_secs(5));

    assert_eq!(loading.store.kind(), TrackType::Data);
    assert_eq!(loading.store.disc().track().unwrap(), track);
    assert!(loading.store.is_dirty());
    assert!(loading.store.path().is_none());
    assert!(!paths.project_file().exists());
}
