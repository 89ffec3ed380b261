//! Session State Module
//!
//! Persists the application session between runs: the main window geometry
//! in a small XML document, and optionally the open project in a resume
//! file that is consumed by the next start.

mod document;
mod link;

pub use document::SessionDocument;
pub use link::{SessionLink, SessionRequest, RESTART_COMMAND};

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::KilnConfig;
use crate::error::{KilnError, Result};

/// Version written to and expected from the session document.
pub const SESSION_VERSION: &str = "0.1";

pub const SESSION_FILE: &str = "session.xml";

/// Project saved at shutdown and reopened by the next start.
pub const RESUME_PROJECT_FILE: &str = "session_project.json";

/// Size of the display the main window lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: i32,
    pub height: i32,
}

/// Main window size and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: i32,
    pub height: i32,
    pub maximized: bool,
}

impl WindowGeometry {
    /// First-run size: 85% of the screen, not maximized.
    pub fn default_for(screen: ScreenGeometry) -> Self {
        Self {
            width: screen.width / 100 * 85,
            height: screen.height / 100 * 85,
            maximized: false,
        }
    }
}

/// Where the session files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    dir: PathBuf,
}

impl SessionPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `[session] dir` when set, else `<config dir>/kiln`.
    pub fn from_config(config: &KilnConfig) -> Option<Self> {
        config
            .session
            .dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join("kiln")))
            .map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_file(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn project_file(&self) -> PathBuf {
        self.dir.join(RESUME_PROJECT_FILE)
    }

    /// Create the directory, private to the user.
    pub fn ensure_dir(&self) -> Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .map_err(|e| KilnError::DirectoryCreateError {
                path: self.dir.clone(),
                source: e,
            })
    }
}

/// The project side of a session.
pub trait ProjectStore {
    /// Save the open project to `path` (when given) before shutdown.
    ///
    /// Returns `true` to veto a `cancellable` shutdown.
    fn save_session(&mut self, path: Option<&Path>, cancellable: bool) -> bool;

    /// Start the session, reopening the project at `path` when given.
    fn load_session(&mut self, path: Option<&Path>) -> Result<()>;
}

/// The application side of a session.
pub trait SessionHost {
    fn screen(&self) -> ScreenGeometry;

    /// Current main window geometry.
    fn geometry(&self) -> WindowGeometry;

    fn apply_geometry(&mut self, geometry: WindowGeometry);

    fn projects(&mut self) -> &mut dyn ProjectStore;
}

/// Geometry to restore: the stored one, or 85% of `screen` when the
/// document is missing, invalid or from another version.
pub fn read_geometry(paths: &SessionPaths, screen: ScreenGeometry) -> WindowGeometry {
    let fallback = WindowGeometry::default_for(screen);
    match SessionDocument::read(&paths.session_file()) {
        Some(doc) => doc.geometry(fallback),
        None => fallback,
    }
}

/// Restore the session. Returns whether a saved project was reopened.
pub fn load(host: &mut dyn SessionHost, paths: &SessionPaths, load_project: bool) -> bool {
    let geometry = read_geometry(paths, host.screen());
    tracing::debug!(?geometry, "restoring window geometry");
    host.apply_geometry(geometry);

    let marker = paths.project_file();
    let resume = load_project && marker.exists();

    let loaded = host
        .projects()
        .load_session(resume.then_some(marker.as_path()));
    if let Err(e) = &loaded {
        tracing::warn!(path = %marker.display(), error = %e, "could not resume project");
    }

    if resume {
        if let Err(e) = fs::remove_file(&marker) {
            tracing::warn!(path = %marker.display(), error = %e, "could not remove resume file");
        }
    }

    resume && loaded.is_ok()
}

/// Save the session. Returns `true` when shutdown should be cancelled.
pub fn save(
    host: &mut dyn SessionHost,
    paths: &SessionPaths,
    save_project: bool,
    cancellable: bool,
) -> bool {
    if let Err(e) = paths.ensure_dir() {
        tracing::warn!(error = %e, "session directory unavailable");
        // the store still gets a chance to veto
        return host.projects().save_session(None, cancellable);
    }

    let marker = save_project.then(|| paths.project_file());
    if host.projects().save_session(marker.as_deref(), cancellable) {
        return true;
    }

    let geometry = host.geometry();
    let path = paths.session_file();
    match SessionDocument::write(&path, &geometry) {
        Ok(()) => tracing::debug!(path = %path.display(), ?geometry, "session saved"),
        Err(e) => tracing::warn!(error = %e, "could not save session"),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_uses_integer_steps() {
        let geometry = WindowGeometry::default_for(ScreenGeometry {
            width: 1000,
            height: 800,
        });
        assert_eq!(
            geometry,
            WindowGeometry {
                width: 850,
                height: 680,
                maximized: false
            }
        );

        // 1366 / 100 truncates before scaling
        let geometry = WindowGeometry::default_for(ScreenGeometry {
            width: 1366,
            height: 768,
        });
        assert_eq!((geometry.width, geometry.height), (1105, 595));
    }

    #[test]
    fn test_paths() {
        let paths = SessionPaths::new("/tmp/kiln-session");
        assert_eq!(paths.session_file(), PathBuf::from("/tmp/kiln-session/session.xml"));
        assert_eq!(
            paths.project_file(),
            PathBuf::from("/tmp/kiln-session/session_project.json")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let paths = SessionPaths::new(dir.path().join("kiln"));
        paths.ensure_dir().unwrap();
        let mode = fs::metadata(paths.dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
