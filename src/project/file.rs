//! Project file
//!
//! A project is saved as a single JSON document holding the editor's track
//! plus identity and timestamps.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::disc::Track;
use crate::error::{KilnError, Result};

/// Current project schema version.
pub const PROJECT_SCHEMA_VERSION: &str = "1.0";

/// Default file name for projects created from the CLI.
pub const PROJECT_FILE: &str = "project.kiln.json";

fn default_schema_version() -> String {
    PROJECT_SCHEMA_VERSION.to_string()
}

/// On-disk project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Schema version for compatibility checks.
    #[serde(default = "default_schema_version")]
    pub version: String,

    /// Unique project identifier.
    pub id: Uuid,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,

    /// Editor content.
    pub track: Track,
}

impl ProjectFile {
    pub fn new(track: Track) -> Self {
        let now = Utc::now();
        Self {
            version: default_schema_version(),
            id: Uuid::new_v4(),
            created_at: now,
            modified_at: now,
            track,
        }
    }

    /// Read and validate a project document.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(KilnError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| KilnError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ProjectFile = serde_json::from_str(&content)?;
        if file.version != PROJECT_SCHEMA_VERSION {
            return Err(KilnError::InvalidSchemaVersion {
                version: file.version,
            });
        }
        Ok(file)
    }

    /// Write the document, stamping the modification time.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        self.modified_at = Utc::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| KilnError::DirectoryCreateError {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| KilnError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::{GraftPoint, TrackType};
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(PROJECT_FILE);

        let mut track = Track::empty(TrackType::Data);
        if let Track::Data(data) = &mut track {
            data.grafts.push(GraftPoint::folder("/extra"));
        }
        let mut file = ProjectFile::new(track.clone());
        file.write(&path).unwrap();

        let back = ProjectFile::read(&path).unwrap();
        assert_eq!(back.id, file.id);
        assert_eq!(back.track, track);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ProjectFile::read(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_future_schema_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        let mut file = ProjectFile::new(Track::empty(TrackType::Audio));
        file.version = "9.0".to_string();
        file.write(&path).unwrap();

        let err = ProjectFile::read(&path).unwrap_err();
        assert!(matches!(err, KilnError::InvalidSchemaVersion { version } if version == "9.0"));
    }
}
