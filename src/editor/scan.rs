//! Background directory exploration
//!
//! A grafted directory is walked on a named worker thread. The worker only
//! measures; it reports a [`ScanReport`] over an mpsc channel and the owning
//! editor applies it on its own thread.

use std::cell::Cell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use walkdir::WalkDir;

use crate::disc::{DiscError, DiscResult};

use super::probe::{classify, EntryKind};

/// Which entries a scan keeps.
#[derive(Debug, Clone, Default)]
pub struct ScanRules {
    pub include_hidden: bool,
    pub follow_links: bool,
    pub excluded: HashSet<PathBuf>,
    pub restored: HashSet<PathBuf>,
}

impl ScanRules {
    /// Whether the walk descends into / counts `path`. Restoration wins.
    fn keeps(&self, path: &Path) -> bool {
        if self.restored.contains(path) {
            return true;
        }
        if self.excluded.contains(path) {
            return false;
        }
        self.include_hidden || !is_hidden(path)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Work order for one directory.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub id: u64,
    pub root: PathBuf,
    pub rules: ScanRules,
}

/// Measured content of a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Bytes of all kept files
    pub size: u64,
    /// Kept non-directory entries
    pub files: usize,
    /// Entries left out by the rules or broken links
    pub filtered: usize,
}

/// Outcome of one request, sent back to the owner.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub id: u64,
    pub outcome: DiscResult<ScanSummary>,
}

/// Run `request` on a new worker thread.
pub fn spawn_scan(
    request: ScanRequest,
    cancel: Arc<AtomicBool>,
    reports: Sender<ScanReport>,
) -> DiscResult {
    let id = request.id;
    thread::Builder::new()
        .name(format!("kiln-scan-{id}"))
        .spawn(move || {
            let outcome = scan_tree(&request.root, &request.rules, &cancel);
            // the editor may be gone already
            let _ = reports.send(ScanReport {
                id: request.id,
                outcome,
            });
        })
        .map(|_| ())
        .map_err(|e| {
            tracing::error!(id, error = %e, "failed to spawn scan worker");
            DiscError::Thread
        })
}

/// Walk `root` and measure what `rules` keep.
pub fn scan_tree(root: &Path, rules: &ScanRules, cancel: &AtomicBool) -> DiscResult<ScanSummary> {
    if classify(root)? != EntryKind::Directory {
        return Err(DiscError::FileType);
    }

    let mut summary = ScanSummary::default();
    let filtered = Cell::new(0);
    let walker = WalkDir::new(root)
        .follow_links(rules.follow_links)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || rules.keeps(e.path()) {
                return true;
            }
            tracing::trace!(path = %e.path().display(), "filtered");
            filtered.set(filtered.get() + 1);
            false
        });

    for entry in walker {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!(root = %root.display(), "scan cancelled");
            return Err(DiscError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // unreadable subdirectories and dangling links when following
                tracing::debug!(error = %e, "skipping entry");
                summary.filtered += 1;
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let size = if entry.path_is_symlink() && !rules.follow_links {
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => meta.len(),
                Ok(_) => 0,
                Err(_) if rules.restored.contains(entry.path()) => 0,
                Err(_) => {
                    summary.filtered += 1;
                    continue;
                }
            }
        } else {
            entry.metadata().map(|m| m.len()).unwrap_or(0)
        };

        summary.size += size;
        summary.files += 1;
    }

    summary.filtered += filtered.get();

    tracing::debug!(
        root = %root.display(),
        files = summary.files,
        size = summary.size,
        filtered = summary.filtered,
        "scan finished"
    );
    Ok(summary)
}
