//! Filesystem probing
//!
//! Classification of source locators shared by the pre-flight and commit
//! paths of both editors, plus audio probing through lofty.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey};
use url::Url;

use crate::disc::{DiscError, DiscResult, SongInfo};

/// What a locator points at, once it has been found readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File { size: u64 },
    Directory,
}

/// Resolve a locator (`file://` URI or plain path) to a local path.
pub fn uri_to_path(uri: &str) -> DiscResult<PathBuf> {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| DiscError::FileType),
        // Windows drive letters parse as a one-letter scheme
        Ok(url) if url.scheme().len() > 1 => Err(DiscError::FileType),
        _ => Ok(PathBuf::from(uri)),
    }
}

/// `file://` locator for a local path.
pub fn path_to_uri(path: &Path) -> String {
    match Url::from_file_path(path) {
        Ok(url) => url.to_string(),
        Err(()) => path.display().to_string(),
    }
}

/// Classify `path` without modifying anything.
pub fn classify(path: &Path) -> DiscResult<EntryKind> {
    let link = fs::symlink_metadata(path).map_err(io_to_disc)?;

    let meta = if link.file_type().is_symlink() {
        fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DiscError::BrokenSymlink,
            _ => io_to_disc(e),
        })?
    } else {
        link
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o444 == 0 {
            return Err(DiscError::Unreadable);
        }
    }

    if meta.is_dir() {
        fs::read_dir(path).map_err(|_| DiscError::Unreadable)?;
        Ok(EntryKind::Directory)
    } else if meta.is_file() {
        File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => DiscError::Unreadable,
            _ => io_to_disc(e),
        })?;
        Ok(EntryKind::File { size: meta.len() })
    } else {
        Err(DiscError::FileType)
    }
}

fn io_to_disc(err: io::Error) -> DiscError {
    match err.kind() {
        io::ErrorKind::NotFound => DiscError::FileNotFound,
        io::ErrorKind::PermissionDenied => DiscError::Unreadable,
        _ => {
            tracing::warn!(error = %err, "unexpected I/O failure while probing");
            DiscError::Unreadable
        }
    }
}

/// Audio properties read from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioProbe {
    /// Duration in nanoseconds
    pub duration: i64,
    pub info: SongInfo,
}

/// Probe an audio file. Anything lofty cannot parse is `ERROR_FILE_TYPE`.
pub fn probe_audio(path: &Path) -> DiscResult<AudioProbe> {
    let tagged = Probe::open(path)
        .and_then(|probe| Ok(probe.guess_file_type()?))
        .and_then(|probe| probe.read())
        .map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "not an audio file");
            DiscError::FileType
        })?;

    let duration = duration_to_ns(tagged.properties().duration());

    let info = match tagged.primary_tag().or_else(|| tagged.first_tag()) {
        Some(tag) => SongInfo {
            title: tag.title().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            composer: tag.get_string(&ItemKey::Composer).map(str::to_string),
            isrc: tag.get_string(&ItemKey::Isrc).map(str::to_string),
        },
        None => SongInfo::default(),
    };

    Ok(AudioProbe { duration, info })
}

fn duration_to_ns(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_uri_forms() {
        assert_eq!(
            uri_to_path("file:///tmp/a%20b.txt").unwrap(),
            PathBuf::from("/tmp/a b.txt")
        );
        assert_eq!(uri_to_path("/tmp/a.txt").unwrap(), PathBuf::from("/tmp/a.txt"));
        assert_eq!(uri_to_path("relative/a.txt").unwrap(), PathBuf::from("relative/a.txt"));
        assert_eq!(uri_to_path("http://host/a.txt"), Err(DiscError::FileType));
    }

    #[test]
    fn test_path_to_uri_escapes() {
        let uri = path_to_uri(Path::new("/tmp/a b.txt"));
        assert_eq!(uri, "file:///tmp/a%20b.txt");
        assert_eq!(uri_to_path(&uri).unwrap(), PathBuf::from("/tmp/a b.txt"));
    }

    #[test]
    fn test_classify() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, b"hello").unwrap();

        assert_eq!(classify(&file), Ok(EntryKind::File { size: 5 }));
        assert_eq!(classify(dir.path()), Ok(EntryKind::Directory));
        assert_eq!(
            classify(&dir.path().join("missing")),
            Err(DiscError::FileNotFound)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_links_and_permissions() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = TempDir::new().unwrap();
        let dangling = dir.path().join("dangling");
        symlink(dir.path().join("nowhere"), &dangling).unwrap();
        assert_eq!(classify(&dangling), Err(DiscError::BrokenSymlink));

        let locked = dir.path().join("locked.txt");
        fs::write(&locked, b"secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        assert_eq!(classify(&locked), Err(DiscError::Unreadable));
    }

    #[test]
    fn test_probe_rejects_non_audio() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, b"definitely not audio").unwrap();
        assert_eq!(probe_audio(&file), Err(DiscError::FileType));
    }
}
