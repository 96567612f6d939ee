mod app;
mod cli;
mod command;
mod concat;
mod drivers;
mod error;
mod filters;
mod notify;
mod picker;
mod plan;
mod probe;
mod progress;
mod runner;
mod timestamp;
mod tools;
mod tui;

use crate::app::{App, Settings};
use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::KitError;
use crate::picker::Picker;
use crate::plan::OverwritePolicy;
use crate::runner::Runner;
use crate::tools::{FFMPEG, FFPROBE, SOX, Tools};
use crate::tui::TerminalPicker;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing(verbose: bool) {
    let default = if verbose { "videokit=debug" } else { "videokit=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn build_app(global: &GlobalArgs, wants_picker: bool) -> App {
    let tools = Tools::new()
        .with_override(FFMPEG, global.ffmpeg.clone())
        .with_override(FFPROBE, global.ffprobe.clone())
        .with_override(SOX, global.sox.clone());
    // rofi is only looked up when a prompt will actually be shown
    let picker: Box<dyn Picker> = if wants_picker {
        picker::detect()
    } else {
        Box::new(TerminalPicker::default())
    };
    let settings = Settings {
        overwrite: if global.no_overwrite {
            OverwritePolicy::Fail
        } else {
            OverwritePolicy::Overwrite
        },
        keep_partial: global.keep_partial,
        show_progress: !global.no_progress,
    };
    App::new(
        Runner::new(tools, global.verbose),
        notify::detect(!global.no_notify),
        picker,
        settings,
    )
}

fn dispatch(app: &App, command: &Commands) -> Result<()> {
    match command {
        Commands::ApplyVhsEffect(args) => drivers::vhs::run(app, args),
        Commands::TrimVideo(args) => drivers::trim::run(app, args),
        Commands::ConcatVideos(args) => drivers::join::run(app, args),
        Commands::FadeVideo(args) => drivers::fade::run(app, args),
        Commands::ExtractAudio(args) => drivers::audio::run(app, args),
        Commands::ConvertToUtvideo(args) => drivers::utvideo::run(app, args),
        Commands::PrepareYoutube(args) => drivers::youtube::run(app, args),
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<KitError>()
        .map(KitError::exit_code)
        .unwrap_or(1);
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let wants_picker = matches!(&cli.command, Commands::TrimVideo(t) if t.interactive);
    let app = build_app(&cli.global, wants_picker);

    match dispatch(&app, &cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("❌ Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}
