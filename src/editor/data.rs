//! Data project editor
//!
//! Files and directories are grafted at the root of the disc tree. Files are
//! measured on the spot; directories are explored by a background scan and
//! only become part of the content once their scan completes. Finished scans
//! are applied by [`Disc::process_pending`] on the owner thread.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use enumflags2::BitFlags;

use crate::config::{DataConfig, KilnConfig};
use crate::disc::{
    Action, ActionGroup, ActionHost, BurnFlag, BurnSession, Completion, DataTrack, Disc,
    DiscError, DiscEvent, DiscResult, Drive, EventEmitter, GraftPoint, MessageArea,
    SessionParams, Track, TrackType, UiHandle, DISC_ACTION_GROUP,
};

use super::joliet;
use super::probe::{classify, path_to_uri, uri_to_path, EntryKind};
use super::scan::{spawn_scan, ScanReport, ScanRequest, ScanRules};
use super::{check_capacity, EditorState};

/// A graft and what its source measured.
#[derive(Debug, Clone)]
struct GraftEntry {
    graft: GraftPoint,
    /// Local source, `None` for folders created inside the disc
    source: Option<PathBuf>,
    is_dir: bool,
    size: u64,
    files: usize,
}

impl GraftEntry {
    fn folder(path: String) -> Self {
        Self {
            graft: GraftPoint::folder(path),
            source: None,
            is_dir: true,
            size: 0,
            files: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum ScanKind {
    /// New directory graft, committed on success
    Add(GraftPoint),
    /// Re-measure an existing graft after an exclusion edit
    Rescan(String),
    /// Measure a graft pushed by `load_track`
    Load(String),
}

#[derive(Debug, Clone)]
struct PendingScan {
    uri: String,
    root: PathBuf,
    kind: ScanKind,
}

/// Result of classifying a locator against the current content.
struct Candidate {
    uri: String,
    source: PathBuf,
    disc_path: String,
    kind: EntryKind,
}

/// Editor for data projects.
pub struct DataDisc {
    config: DataConfig,
    grafts: Vec<GraftEntry>,
    excluded: BTreeSet<String>,
    restored: BTreeSet<String>,
    joliet: bool,
    selection: Option<String>,
    drive: Option<Drive>,
    state: EditorState,

    pending: BTreeMap<u64, PendingScan>,
    next_scan: u64,
    cancel: Arc<AtomicBool>,
    reports_tx: Sender<ScanReport>,
    reports_rx: Receiver<ScanReport>,
    cancelled: Vec<Completion>,

    events: EventEmitter,
}

impl DataDisc {
    pub fn new(config: &KilnConfig) -> Self {
        let (reports_tx, reports_rx) = mpsc::channel();
        Self {
            config: config.data.clone(),
            grafts: Vec::new(),
            excluded: BTreeSet::new(),
            restored: BTreeSet::new(),
            joliet: config.data.joliet,
            selection: None,
            drive: None,
            state: EditorState::Empty,
            pending: BTreeMap::new(),
            next_scan: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            reports_tx,
            reports_rx,
            cancelled: Vec::new(),
            events: EventEmitter::new(),
        }
    }

    /// Total bytes of the committed content.
    pub fn size(&self) -> i64 {
        let bytes: u64 = self.grafts.iter().map(|g| g.size).sum();
        i64::try_from(bytes).unwrap_or(i64::MAX)
    }

    /// Number of files in the committed content.
    pub fn file_count(&self) -> usize {
        self.grafts.iter().map(|g| g.files).sum()
    }

    /// Disc paths of the grafts, in order.
    pub fn graft_paths(&self) -> impl Iterator<Item = &str> {
        self.grafts.iter().map(|g| g.graft.path.as_str())
    }

    pub fn joliet(&self) -> bool {
        self.joliet
    }

    /// Number of scans still running.
    pub fn pending_scans(&self) -> usize {
        self.pending.len()
    }

    /// Select the entry at disc path `path`, or nothing.
    pub fn select(&mut self, path: Option<&str>) -> DiscResult {
        if let Some(p) = path {
            self.resolve(p)?;
        }
        let selection = path.map(str::to_string);
        if self.selection != selection {
            self.selection = selection;
            self.events.selection_changed();
        }
        Ok(())
    }

    /// Leave the source entry `uri` out of its grafted directory.
    pub fn exclude(&mut self, uri: &str) -> DiscResult {
        let (uri, index) = self.locate_inner(uri)?;
        self.restored.remove(&uri);
        if !self.excluded.insert(uri.clone()) {
            return Ok(());
        }
        tracing::debug!(%uri, "entry excluded");
        self.rescan(index, uri)
    }

    /// Bring back an excluded or filtered source entry.
    pub fn restore(&mut self, uri: &str) -> DiscResult {
        let (uri, index) = self.locate_inner(uri)?;
        self.excluded.remove(&uri);
        if !self.restored.insert(uri.clone()) {
            return Ok(());
        }
        tracing::debug!(%uri, "entry restored");
        self.rescan(index, uri)
    }

    /// Create an empty directory at the root of the disc.
    pub fn create_folder(&mut self, name: &str) -> DiscResult {
        if let EditorState::Error(code) = self.state {
            return Err(code);
        }
        if name.is_empty() || name.contains('/') {
            return Err(DiscError::FileType);
        }
        let path = format!("/{name}");
        if self.name_taken(&path) {
            return Err(DiscError::AlreadyInTree);
        }
        if self.joliet && !joliet::is_compatible(name) {
            return Err(DiscError::Joliet);
        }

        self.grafts.push(GraftEntry::folder(path));
        self.refresh_state();
        self.events.contents_changed(self.file_count());
        self.events.size_changed(self.size());
        Ok(())
    }

    /// Turn Joliet names on or off.
    pub fn set_joliet(&mut self, enabled: bool) -> DiscResult {
        if enabled {
            if let Some(bad) = self
                .grafts
                .iter()
                .find(|g| !joliet::is_compatible(g.graft.name()))
            {
                tracing::debug!(path = %bad.graft.path, "name not Joliet compatible");
                return Err(DiscError::Joliet);
            }
        }
        if self.joliet != enabled {
            self.joliet = enabled;
            self.events.flags_changed(self.flags());
        }
        Ok(())
    }

    fn refresh_state(&mut self) {
        if self.state.is_error() {
            return;
        }
        let loading = self
            .pending
            .values()
            .any(|p| matches!(p.kind, ScanKind::Load(_)));
        self.state = if loading {
            EditorState::Loading
        } else if !self.pending.is_empty() {
            EditorState::Exploring
        } else if self.grafts.is_empty() {
            EditorState::Empty
        } else {
            EditorState::Ready
        };
    }

    fn capacity(&self) -> Option<i64> {
        self.drive.as_ref().and_then(Drive::data_capacity)
    }

    fn name_taken(&self, disc_path: &str) -> bool {
        self.grafts.iter().any(|g| g.graft.path == disc_path)
            || self.pending.values().any(|p| match &p.kind {
                ScanKind::Add(graft) => graft.path == disc_path,
                _ => false,
            })
    }

    fn source_taken(&self, uri: &str) -> bool {
        self.grafts
            .iter()
            .any(|g| g.graft.uri.as_deref() == Some(uri))
            || self.pending.values().any(|p| match &p.kind {
                ScanKind::Add(graft) => graft.uri.as_deref() == Some(uri),
                _ => false,
            })
    }

    /// Classification shared by `can_add_uri` and `add_uri`.
    fn check_uri(&self, uri: &str) -> DiscResult<Candidate> {
        if let EditorState::Error(code) = self.state {
            return Err(code);
        }

        let source = uri_to_path(uri)?;
        let kind = classify(&source)?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(DiscError::FileType)?;

        let uri = path_to_uri(&source);
        let disc_path = format!("/{name}");
        if self.source_taken(&uri) || self.name_taken(&disc_path) {
            return Err(DiscError::AlreadyInTree);
        }
        if self.joliet && !joliet::is_compatible(&name) {
            return Err(DiscError::Joliet);
        }
        if let EntryKind::File { size } = kind {
            let size = i64::try_from(size).unwrap_or(i64::MAX);
            check_capacity(self.size().saturating_add(size), self.capacity())?;
        }

        Ok(Candidate {
            uri,
            source,
            disc_path,
            kind,
        })
    }

    /// Graft index whose source directory contains `uri`, below its root.
    fn locate_inner(&self, uri: &str) -> DiscResult<(String, usize)> {
        let path = uri_to_path(uri)?;
        let index = self
            .grafts
            .iter()
            .position(|g| match &g.source {
                Some(source) => g.is_dir && path != *source && path.starts_with(source),
                None => false,
            })
            .ok_or(DiscError::NotInTree)?;
        Ok((path_to_uri(&path), index))
    }

    /// Resolve a disc path to the graft holding it and the source entry.
    fn resolve(&self, disc_path: &str) -> DiscResult<(usize, Option<PathBuf>)> {
        for (index, entry) in self.grafts.iter().enumerate() {
            let root = entry.graft.path.as_str();
            if disc_path == root {
                return Ok((index, entry.source.clone()));
            }
            let Some(rest) = disc_path.strip_prefix(root).and_then(|r| r.strip_prefix('/')) else {
                continue;
            };
            if let Some(source) = entry.source.as_ref().filter(|_| entry.is_dir) {
                let inner = source.join(rest);
                if inner.symlink_metadata().is_ok() {
                    return Ok((index, Some(inner)));
                }
            }
        }
        Err(DiscError::NotInTree)
    }

    fn rules(&self) -> ScanRules {
        let to_paths = |set: &BTreeSet<String>| {
            set.iter()
                .filter_map(|uri| uri_to_path(uri).ok())
                .collect()
        };
        ScanRules {
            include_hidden: self.config.include_hidden,
            follow_links: self.config.follow_links,
            excluded: to_paths(&self.excluded),
            restored: to_paths(&self.restored),
        }
    }

    fn schedule(&mut self, uri: String, root: PathBuf, kind: ScanKind) -> DiscResult {
        let id = self.next_scan;
        self.next_scan += 1;

        let request = ScanRequest {
            id,
            root: root.clone(),
            rules: self.rules(),
        };
        if let Err(code) = spawn_scan(request, Arc::clone(&self.cancel), self.reports_tx.clone())
        {
            self.state = EditorState::Error(code);
            return Err(code);
        }

        tracing::debug!(id, %uri, "scan scheduled");
        self.pending.insert(id, PendingScan { uri, root, kind });
        self.refresh_state();
        Ok(())
    }

    fn rescan(&mut self, index: usize, uri: String) -> DiscResult {
        let entry = &self.grafts[index];
        let (Some(root), path) = (entry.source.clone(), entry.graft.path.clone()) else {
            return Ok(());
        };
        self.schedule(uri, root, ScanKind::Rescan(path))
    }

    /// Abandon every running scan, recording a `CANCELLED` completion each.
    fn cancel_scans(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.cancel.store(true, Ordering::Relaxed);
        self.cancel = Arc::new(AtomicBool::new(false));

        tracing::debug!(scans = self.pending.len(), "scans cancelled");
        let pending = std::mem::take(&mut self.pending);
        self.cancelled.extend(
            pending
                .into_values()
                .map(|p| Completion::new(p.uri, Err(DiscError::Cancelled))),
        );
    }

    /// Apply one finished scan.
    fn apply(&mut self, report: ScanReport) -> Option<Completion> {
        // reports of cancelled scans
        let pending = self.pending.remove(&report.id)?;

        let result = match report.outcome {
            Ok(summary) => {
                match pending.kind {
                    ScanKind::Add(graft) => self.grafts.push(GraftEntry {
                        graft,
                        source: Some(pending.root),
                        is_dir: true,
                        size: summary.size,
                        files: summary.files,
                    }),
                    ScanKind::Rescan(path) | ScanKind::Load(path) => {
                        // a newer scan of the same graft supersedes this one
                        let superseded = self.pending.range(report.id..).any(|(_, p)| {
                            matches!(&p.kind, ScanKind::Rescan(other) | ScanKind::Load(other) if *other == path)
                        });
                        let entry = self.grafts.iter_mut().find(|g| g.graft.path == path);
                        if let (false, Some(entry)) = (superseded, entry) {
                            entry.size = summary.size;
                            entry.files = summary.files;
                        }
                    }
                }
                Ok(())
            }
            Err(code) => {
                tracing::debug!(uri = %pending.uri, code = code.code(), "scan failed");
                Err(code)
            }
        };

        self.refresh_state();
        self.events.contents_changed(self.file_count());
        self.events.size_changed(self.size());
        Some(Completion::new(pending.uri, result))
    }
}

impl Disc for DataDisc {
    fn kind(&self) -> TrackType {
        TrackType::Data
    }

    fn status(&self) -> DiscResult {
        self.state.check()?;
        check_capacity(self.size(), self.capacity())
    }

    fn load_track(&mut self, track: &Track) -> DiscResult {
        let Track::Data(data) = track else {
            tracing::warn!(kind = %track.track_type(), "data editor refused a track");
            return Err(DiscError::Unknown);
        };

        self.cancel_scans();
        self.state = EditorState::Empty;
        self.excluded = data.excluded.clone();
        // exclusion wins over restoration
        self.restored = data.restored.difference(&data.excluded).cloned().collect();

        let mut grafts = Vec::with_capacity(data.grafts.len());
        let mut scans = Vec::new();
        for graft in &data.grafts {
            let Some(uri) = &graft.uri else {
                grafts.push(GraftEntry::folder(graft.path.clone()));
                continue;
            };
            let source = uri_to_path(uri).ok();
            let mut entry = GraftEntry {
                graft: graft.clone(),
                source: source.clone(),
                is_dir: false,
                size: 0,
                files: 0,
            };
            match source.as_deref().map(classify) {
                Some(Ok(EntryKind::File { size })) => {
                    entry.size = size;
                    entry.files = 1;
                }
                Some(Ok(EntryKind::Directory)) => {
                    entry.is_dir = true;
                    if let Some(root) = source {
                        scans.push((uri.clone(), root, graft.path.clone()));
                    }
                }
                Some(Err(code)) => {
                    tracing::debug!(%uri, code = code.code(), "loaded graft has no usable source");
                }
                None => {
                    tracing::debug!(%uri, "loaded graft is not a local file");
                }
            }
            grafts.push(entry);
        }
        self.grafts = grafts;

        for (uri, root, path) in scans {
            self.schedule(uri, root, ScanKind::Load(path))?;
        }
        self.refresh_state();

        tracing::debug!(grafts = self.grafts.len(), loading = self.pending.len(), "data track loaded");
        if self.selection.take().is_some() {
            self.events.selection_changed();
        }
        self.events.contents_changed(self.file_count());
        self.events.size_changed(self.size());
        Ok(())
    }

    fn track(&self) -> DiscResult<Track> {
        self.state.check()?;
        Ok(Track::Data(DataTrack {
            grafts: self.grafts.iter().map(|g| g.graft.clone()).collect(),
            excluded: self.excluded.clone(),
            restored: self.restored.clone(),
        }))
    }

    fn set_session_param(&self, session: &mut dyn BurnSession) -> DiscResult {
        self.status()?;
        session.set_params(SessionParams {
            track_type: TrackType::Data,
            flags: self.flags(),
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
        let candidate = self.check_uri(uri)?;
        let graft = GraftPoint::new(candidate.uri.clone(), candidate.disc_path);

        match candidate.kind {
            EntryKind::File { size } => {
                tracing::debug!(uri = %candidate.uri, size, "file grafted");
                self.grafts.push(GraftEntry {
                    graft,
                    source: Some(candidate.source),
                    is_dir: false,
                    size,
                    files: 1,
                });
                self.refresh_state();
                self.events.contents_changed(self.file_count());
                self.events.size_changed(self.size());
                Ok(())
            }
            EntryKind::Directory => {
                self.schedule(candidate.uri, candidate.source, ScanKind::Add(graft))
            }
        }
    }

    fn selected_uri(&self) -> Option<String> {
        let selection = self.selection.as_deref()?;
        let (index, source) = self.resolve(selection).ok()?;
        if selection == self.grafts[index].graft.path {
            return self.grafts[index].graft.uri.clone();
        }
        source.map(|p| path_to_uri(&p))
    }

    fn delete_selected(&mut self) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        self.events.selection_changed();

        let Ok((index, source)) = self.resolve(&selection) else {
            return;
        };
        if selection == self.grafts[index].graft.path {
            let removed = self.grafts.remove(index);
            if let Some(root) = removed.source.as_deref() {
                let under = |uri: &String| {
                    uri_to_path(uri)
                        .map(|p| p.starts_with(root))
                        .unwrap_or(false)
                };
                self.excluded.retain(|uri| !under(uri));
                self.restored.retain(|uri| !under(uri));
            }
            tracing::debug!(path = %removed.graft.path, "graft removed");
            self.refresh_state();
            self.events.contents_changed(self.file_count());
            self.events.size_changed(self.size());
        } else if let Some(inner) = source {
            if let Err(code) = self.exclude(&path_to_uri(&inner)) {
                tracing::warn!(path = %selection, code = code.code(), "could not exclude selection");
            }
        }
    }

    fn clear(&mut self) {
        self.cancel_scans();
        self.state = EditorState::Empty;
        if self.selection.take().is_some() {
            self.events.selection_changed();
        }
        if self.grafts.is_empty() && self.excluded.is_empty() && self.restored.is_empty() {
            return;
        }
        self.grafts.clear();
        self.excluded.clear();
        self.restored.clear();
        self.events.contents_changed(0);
        self.events.size_changed(0);
    }

    fn reset(&mut self) {
        self.clear();
        if self.joliet != self.config.joliet {
            self.joliet = self.config.joliet;
            self.events.flags_changed(self.flags());
        }
    }

    fn add_ui(
        &mut self,
        host: &mut dyn ActionHost,
        messages: &mut dyn MessageArea,
    ) -> Option<UiHandle> {
        let group = ActionGroup::new(DISC_ACTION_GROUP)
            .with_action(
                Action::new("NewFolder", "New _Folder", "Create a new empty folder")
                    .with_accelerator("<control>N"),
            )
            .with_action(
                Action::new("DeleteData", "_Remove Files", "Remove the selected files")
                    .with_accelerator("Delete"),
            )
            .with_action(Action::new(
                "RestoreData",
                "Re_store",
                "Bring back files that were left out",
            ))
            .with_action(Action::new(
                "ToggleJoliet",
                "Increase _Compatibility",
                "Use Joliet names readable on Windows",
            ));
        if self.grafts.is_empty() {
            messages.show(
                "The project is empty",
                Some("Add files and folders to build the disc."),
            );
        }
        Some(host.merge(group))
    }

    fn set_drive(&mut self, drive: Option<Drive>) {
        tracing::debug!(device = ?drive.as_ref().map(|d| d.device.as_str()), "drive changed");
        self.drive = drive;
    }

    fn flags(&self) -> BitFlags<BurnFlag> {
        if self.joliet {
            BurnFlag::Joliet.into()
        } else {
            BitFlags::empty()
        }
    }

    fn subscribe(&mut self) -> Receiver<DiscEvent> {
        self.events.subscribe()
    }

    fn process_pending(&mut self) -> Vec<Completion> {
        let mut done = std::mem::take(&mut self.cancelled);
        while let Ok(report) = self.reports_rx.try_recv() {
            done.extend(self.apply(report));
        }
        done
    }

    fn wait_pending(&mut self, timeout: Duration) -> Vec<Completion> {
        let deadline = Instant::now() + timeout;
        let mut done = self.process_pending();
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.reports_rx.recv_timeout(remaining) {
                Ok(report) => done.extend(self.apply(report)),
                Err(_) => break,
            }
        }
        done
    }
}

impl Drop for DataDisc {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}
