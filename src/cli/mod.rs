//! CLI Module
//!
//! Command-line interface for building and checking disc projects.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::disc::TrackType;
use crate::state::ScreenGeometry;

/// Kiln - disc project editor
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Kind of project to create.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectKind {
    Audio,
    Data,
}

impl From<ProjectKind> for TrackType {
    fn from(kind: ProjectKind) -> Self {
        match kind {
            ProjectKind::Audio => TrackType::Audio,
            ProjectKind::Data => TrackType::Data,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty project file
    #[command(name = "new")]
    New {
        /// Path for the new project
        path: PathBuf,

        /// Kind of project
        #[arg(short, long, value_enum, default_value_t = ProjectKind::Data)]
        kind: ProjectKind,
    },

    /// Add files, directories or songs to a project
    #[command(name = "add")]
    Add {
        /// Path to the project
        project: PathBuf,

        /// Locators to add (paths or file:// URIs)
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Check whether a locator could be added, without adding it
    #[command(name = "check")]
    Check {
        /// Path to the project
        project: PathBuf,

        /// Locator to check
        uri: String,
    },

    /// Remove an entry (disc path for data projects, song number for audio)
    #[command(name = "remove")]
    Remove {
        /// Path to the project
        project: PathBuf,

        /// Disc path (e.g. /photos/a.jpg) or 1-based song number
        target: String,
    },

    /// Create an empty folder at the root of a data project
    #[command(name = "mkdir")]
    Mkdir {
        /// Path to the project
        project: PathBuf,

        /// Folder name
        name: String,
    },

    /// Leave a file out of a grafted directory
    #[command(name = "exclude")]
    Exclude {
        /// Path to the project
        project: PathBuf,

        /// Source locator of the entry
        uri: String,
    },

    /// Bring back an excluded or filtered file
    #[command(name = "restore")]
    Restore {
        /// Path to the project
        project: PathBuf,

        /// Source locator of the entry
        uri: String,
    },

    /// Print project content and status
    #[command(name = "show")]
    Show {
        /// Path to the project
        project: PathBuf,
    },

    /// Prepare a burn session (dry run)
    #[command(name = "burn")]
    Burn {
        /// Path to the project
        project: PathBuf,

        /// Free space of the target medium in bytes
        #[arg(long)]
        capacity: Option<u64>,
    },

    /// Inspect or write the persisted session
    #[command(name = "session")]
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Print the window geometry the next start would use
    #[command(name = "show")]
    Show {
        /// Screen size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_screen, default_value = "1920x1080")]
        screen: ScreenGeometry,
    },

    /// Save a window geometry, and optionally a project to resume
    #[command(name = "save")]
    Save {
        #[arg(long)]
        width: i32,

        #[arg(long)]
        height: i32,

        #[arg(long)]
        maximized: bool,

        /// Project to reopen at the next start
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Restore the session as a start would
    #[command(name = "restore")]
    Restore {
        /// Screen size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_screen, default_value = "1920x1080")]
        screen: ScreenGeometry,

        /// Do not reopen the saved project
        #[arg(long)]
        no_project: bool,
    },
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_screen(value: &str) -> Result<ScreenGeometry, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<i32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| format!("invalid screen dimension '{s}'"))
    };
    Ok(ScreenGeometry {
        width: parse(width)?,
        height: parse(height)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_screen() {
        assert_eq!(
            parse_screen("1000x800"),
            Ok(ScreenGeometry {
                width: 1000,
                height: 800
            })
        );
        assert!(parse_screen("1000").is_err());
        assert!(parse_screen("0x800").is_err());
    }

    #[test]
    fn test_cli_parses_session_save() {
        let cli = Cli::parse_from([
            "kiln", "session", "save", "--width", "800", "--height", "600", "--maximized",
        ]);
        match cli.command {
            Some(Commands::Session {
                action:
                    SessionAction::Save {
                        width,
                        height,
                        maximized,
                        project,
                    },
            }) => {
                assert_eq!((width, height, maximized), (800, 600, true));
                assert!(project.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
