//! Kiln CLI - Disc Project Editor
//!
//! Command-line interface for building audio and data disc projects.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use kiln::cli::commands::{self, Context};
use kiln::cli::{Cli, Commands, SessionAction};
use kiln::state::WindowGeometry;
use kiln::KilnConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Kiln v{}", env!("CARGO_PKG_VERSION"));

    let config = KilnConfig::load()?;
    config.validate()?;
    debug!("configuration: {config:?}");
    let mut ctx = Context::new(config);

    match cli.command {
        Some(cmd) => handle_command(&mut ctx, cmd),
        None => {
            println!("Kiln v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(ctx: &mut Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::New { path, kind } => commands::new_project(ctx, &path, kind.into()),
        Commands::Add { project, uris } => commands::add(ctx, &project, &uris),
        Commands::Check { project, uri } => commands::check(ctx, &project, &uri),
        Commands::Remove { project, target } => commands::remove(ctx, &project, &target),
        Commands::Mkdir { project, name } => commands::mkdir(ctx, &project, &name),
        Commands::Exclude { project, uri } => commands::set_excluded(ctx, &project, &uri, true),
        Commands::Restore { project, uri } => commands::set_excluded(ctx, &project, &uri, false),
        Commands::Show { project } => commands::show(ctx, &project),
        Commands::Burn { project, capacity } => commands::burn(ctx, &project, capacity),
        Commands::Session { action } => match action {
            SessionAction::Show { screen } => commands::session_show(ctx, screen),
            SessionAction::Save {
                width,
                height,
                maximized,
                project,
            } => commands::session_save(
                ctx,
                WindowGeometry {
                    width,
                    height,
                    maximized,
                },
                project,
            ),
            SessionAction::Restore { screen, no_project } => {
                commands::session_restore(ctx, screen, !no_project)
            }
        },
    }
}
