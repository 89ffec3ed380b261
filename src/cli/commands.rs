//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use log::{info, warn};

use crate::config::KilnConfig;
use crate::disc::{
    code_of, describe_flags, Completion, Disc, DiscError, DiscResult, Drive, MemorySession, Track,
    TrackType,
};
use crate::editor::{AudioDisc, DataDisc};
use crate::error::KilnError;
use crate::project::{ProjectFile, ProjectManager};
use crate::state::{
    self, ProjectStore, ScreenGeometry, SessionHost, SessionLink, SessionPaths, SessionRequest,
    WindowGeometry,
};

/// How long a command waits for directory scans.
const SCAN_TIMEOUT: Duration = Duration::from_secs(120);

/// Application context shared by the commands.
pub struct Context {
    pub config: KilnConfig,
    pub link: SessionLink,
}

impl Context {
    pub fn new(config: KilnConfig) -> Self {
        Self {
            config,
            link: SessionLink::new(),
        }
    }

    fn session_paths(&self) -> Result<SessionPaths> {
        SessionPaths::from_config(&self.config)
            .context("no configuration directory for the session files")
    }

    fn open(&self, project: &Path) -> Result<ProjectManager> {
        ProjectManager::open(project, self.config.clone(), SCAN_TIMEOUT)
            .with_context(|| format!("cannot open project {}", project.display()))
    }
}

/// Human-readable size of an editor's content.
fn format_size(kind: TrackType, size: i64) -> String {
    match kind {
        TrackType::Audio => {
            let seconds = size / 1_000_000_000;
            format!("{}:{:02}", seconds / 60, seconds % 60)
        }
        TrackType::Data => match size {
            s if s >= 1 << 30 => format!("{:.1} GiB", s as f64 / (1u64 << 30) as f64),
            s if s >= 1 << 20 => format!("{:.1} MiB", s as f64 / (1u64 << 20) as f64),
            s if s >= 1 << 10 => format!("{:.1} KiB", s as f64 / (1u64 << 10) as f64),
            s => format!("{s} B"),
        },
    }
}

fn report(done: &[Completion]) {
    for completion in done {
        match completion.result {
            Ok(()) => info!("{}: done", completion.uri),
            Err(code) => warn!("{}: {}", completion.uri, code),
        }
    }
}

/// Create a new project file.
pub fn new_project(ctx: &Context, path: &Path, kind: TrackType) -> Result<()> {
    info!("Creating new {} project at: {}", kind, path.display());

    if path.exists() {
        bail!("{} already exists", path.display());
    }
    let mut manager = ProjectManager::new(kind, ctx.config.clone());
    manager.save(path)?;

    println!("Project created: {}", path.display());
    Ok(())
}

/// Add locators to a project.
pub fn add(ctx: &Context, project: &Path, uris: &[String]) -> Result<()> {
    info!("Adding {} item(s) to: {}", uris.len(), project.display());

    let mut manager = ctx.open(project)?;
    let mut added = 0;
    for uri in uris {
        match manager.disc_mut().add_uri(uri) {
            Ok(()) => added += 1,
            Err(code) => {
                println!("{uri}: {code} ({})", code.code());
            }
        }
    }

    let done = manager.wait(SCAN_TIMEOUT);
    report(&done);
    if manager.disc().status().is_err_and(|code| code.is_pending()) {
        bail!("directory exploration did not finish in time");
    }

    manager.save(project)?;
    println!("Added {added} of {} item(s)", uris.len());
    Ok(())
}

/// Pre-flight a locator.
pub fn check(ctx: &Context, project: &Path, uri: &str) -> Result<()> {
    let manager = ctx.open(project)?;
    let result = manager.disc().can_add_uri(uri);
    println!("{}", code_of(&result));
    Ok(())
}

/// Open `project` into a concrete data editor, apply `edit`, save.
fn edit_data(
    ctx: &Context,
    project: &Path,
    edit: impl FnOnce(&mut DataDisc) -> DiscResult,
) -> Result<()> {
    let mut file = ProjectFile::read(project)?;
    let mut disc = DataDisc::new(&ctx.config);
    disc.load_track(&file.track)?;
    report(&disc.wait_pending(SCAN_TIMEOUT));

    edit(&mut disc)?;
    report(&disc.wait_pending(SCAN_TIMEOUT));

    file.track = snapshot(&disc)?;
    file.write(project)?;
    Ok(())
}

/// Open `project` into a concrete audio editor, apply `edit`, save.
fn edit_audio(
    ctx: &Context,
    project: &Path,
    edit: impl FnOnce(&mut AudioDisc) -> DiscResult,
) -> Result<()> {
    let mut file = ProjectFile::read(project)?;
    let mut disc = AudioDisc::new(&ctx.config);
    disc.load_track(&file.track)?;

    edit(&mut disc)?;

    file.track = snapshot(&disc)?;
    file.write(project)?;
    Ok(())
}

fn snapshot(disc: &dyn Disc) -> DiscResult<Track> {
    match disc.track() {
        Err(DiscError::EmptySelection) => Ok(Track::empty(disc.kind())),
        other => other,
    }
}

fn project_kind(project: &Path) -> Result<TrackType> {
    Ok(ProjectFile::read(project)?.track.track_type())
}

/// Remove an entry by disc path or song number.
pub fn remove(ctx: &Context, project: &Path, target: &str) -> Result<()> {
    info!("Removing {} from: {}", target, project.display());

    match project_kind(project)? {
        TrackType::Audio => {
            let number: usize = target
                .parse()
                .with_context(|| format!("'{target}' is not a song number"))?;
            let index = number.checked_sub(1).context("song numbers start at 1")?;
            edit_audio(ctx, project, |disc| {
                disc.select(Some(index))?;
                disc.delete_selected();
                Ok(())
            })?;
        }
        TrackType::Data => {
            edit_data(ctx, project, |disc| {
                disc.select(Some(target))?;
                disc.delete_selected();
                Ok(())
            })?;
        }
    }

    println!("Removed: {target}");
    Ok(())
}

/// Create an empty folder in a data project.
pub fn mkdir(ctx: &Context, project: &Path, name: &str) -> Result<()> {
    if project_kind(project)? != TrackType::Data {
        bail!("folders can only be created in data projects");
    }
    edit_data(ctx, project, |disc| disc.create_folder(name))?;
    println!("Created folder: /{name}");
    Ok(())
}

/// Exclude or restore an entry of a grafted directory.
pub fn set_excluded(ctx: &Context, project: &Path, uri: &str, excluded: bool) -> Result<()> {
    if project_kind(project)? != TrackType::Data {
        bail!("only data projects have exclusions");
    }
    edit_data(ctx, project, |disc| {
        if excluded {
            disc.exclude(uri)
        } else {
            disc.restore(uri)
        }
    })?;
    println!("{}: {uri}", if excluded { "Excluded" } else { "Restored" });
    Ok(())
}

/// Print project content and status.
pub fn show(ctx: &Context, project: &Path) -> Result<()> {
    let manager = ctx.open(project)?;
    let kind = manager.kind();
    let status = manager.disc().status();
    let summary = manager.summary();

    println!("Project: {}", project.display());
    println!("Kind:    {kind}");
    println!("Status:  {}", code_of(&status));
    println!("Files:   {}", summary.files);
    println!("Size:    {}", format_size(kind, summary.size));
    println!("Flags:   {}", describe_flags(manager.disc().flags()));
    println!("{:-<60}", "");

    match manager.disc().track() {
        Ok(Track::Audio(audio)) => {
            for (i, song) in audio.songs.iter().enumerate() {
                let title = song.info.title.as_deref().unwrap_or(&song.uri);
                let length = song.length(None).map(|l| format_size(kind, l));
                println!(
                    "{:>3}. {} [gap {}{}]",
                    i + 1,
                    title,
                    format_size(kind, song.gap),
                    length.map(|l| format!(", {l}")).unwrap_or_default()
                );
            }
        }
        Ok(Track::Data(data)) => {
            for graft in &data.grafts {
                match &graft.uri {
                    Some(uri) => println!("{} <- {}", graft.path, uri),
                    None => println!("{} (folder)", graft.path),
                }
            }
            for uri in &data.excluded {
                println!("  excluded: {uri}");
            }
            for uri in &data.restored {
                println!("  restored: {uri}");
            }
        }
        Err(code) => println!("(no content: {})", code.code()),
    }
    Ok(())
}

/// Dry-run burn into an in-memory session.
pub fn burn(ctx: &Context, project: &Path, capacity: Option<u64>) -> Result<()> {
    let mut manager = ctx.open(project)?;
    let drive = capacity.map(|bytes| Drive::new("image", "Image file").with_capacity(bytes));
    manager.disc_mut().set_drive(drive.clone());

    if !manager.burn_enabled() {
        let status = manager.disc().status();
        println!("Burn disabled: {}", code_of(&status));
        if let Some(hint) = status
            .err()
            .and_then(|code| KilnError::Disc(code).recovery_suggestion())
        {
            println!("{hint}");
        }
        return Ok(());
    }

    let limit = drive.and_then(|d| match manager.kind() {
        TrackType::Audio => d.audio_capacity(),
        TrackType::Data => d.data_capacity(),
    });
    let mut session = match limit {
        Some(limit) => MemorySession::with_capacity(limit),
        None => MemorySession::new(),
    };
    manager.prepare_session(&mut session)?;

    if let Some(params) = session.params() {
        println!("Track type: {}", params.track_type);
        println!("Size:       {}", format_size(params.track_type, params.size));
        println!("Flags:      {}", describe_flags(params.flags));
    }
    println!("Session ready with {} track(s)", session.tracks().len());
    Ok(())
}

/// Host without a window, used by the session commands.
struct HeadlessHost {
    screen: ScreenGeometry,
    geometry: WindowGeometry,
    projects: ProjectManager,
}

impl SessionHost for HeadlessHost {
    fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    fn apply_geometry(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry;
    }

    fn projects(&mut self) -> &mut dyn ProjectStore {
        &mut self.projects
    }
}

fn print_geometry(geometry: &WindowGeometry) {
    println!(
        "Window: {}x{}{}",
        geometry.width,
        geometry.height,
        if geometry.maximized { " (maximized)" } else { "" }
    );
}

/// Print the geometry the next start would restore.
pub fn session_show(ctx: &Context, screen: ScreenGeometry) -> Result<()> {
    let paths = ctx.session_paths()?;
    println!("Session file: {}", paths.session_file().display());
    print_geometry(&state::read_geometry(&paths, screen));
    if paths.project_file().exists() {
        println!("Resume project: {}", paths.project_file().display());
    }
    Ok(())
}

/// Save a session through the session manager link.
pub fn session_save(ctx: &mut Context, geometry: WindowGeometry, project: Option<PathBuf>) -> Result<()> {
    let paths = ctx.session_paths()?;
    let projects = match &project {
        Some(path) => ctx.open(path)?,
        None => ProjectManager::new(TrackType::Data, ctx.config.clone()),
    };
    let mut host = HeadlessHost {
        screen: ScreenGeometry {
            width: geometry.width,
            height: geometry.height,
        },
        geometry,
        projects,
    };

    ctx.link.connect();
    let request = if project.is_some() {
        SessionRequest::SaveYourself
    } else {
        SessionRequest::Die
    };
    ctx.link.handle(request, &mut host, &paths);
    ctx.link.disconnect();

    println!("Session saved: {}", paths.session_file().display());
    Ok(())
}

/// Restore the session as a start would and print the result.
pub fn session_restore(ctx: &Context, screen: ScreenGeometry, load_project: bool) -> Result<()> {
    let paths = ctx.session_paths()?;
    let mut host = HeadlessHost {
        screen,
        geometry: WindowGeometry::default_for(screen),
        projects: ProjectManager::new(TrackType::Data, ctx.config.clone()),
    };

    let resumed = state::load(&mut host, &paths, load_project);
    print_geometry(&host.geometry);
    if resumed {
        host.projects.wait(SCAN_TIMEOUT);
        let summary = host.projects.summary();
        println!(
            "Resumed {} project: {} file(s), {}",
            host.projects.kind(),
            summary.files,
            format_size(host.projects.kind(), summary.size)
        );
    }
    Ok(())
}
