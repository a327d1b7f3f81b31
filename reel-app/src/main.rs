//! Reel Application
//!
//! Command-line player for point-cloud videos.
//!
//! Features:
//! - Timed playback of compressed video directories and PLY snapshots
//! - Sequence inspection (frame count, rate, bounds)
//! - Discovery of recorded videos under a library root

mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use config::AppConfig;
use std::path::PathBuf;
use tracing::warn;

/// Reel - Point Cloud Video Player
#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter, overriding the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a video directory, frame payload or PLY snapshot
    Play {
        path: PathBuf,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        seconds: Option<f64>,

        /// Playback rate, overriding the recorded one
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Print frame count, rate and bounds of a source
    Info {
        path: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recorded videos under a directory
    List { root: PathBuf },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let (mut config, problem) = AppConfig::load(args.config.as_deref());
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    logging::init_logging(&config.logging);
    if let Some(e) = problem {
        warn!("{}; using defaults", e);
    }

    let result = match args.command {
        Command::Play { path, seconds, fps } => commands::play(&path, seconds, fps, &config)
            .await
            .map(|_| ()),
        Command::Info { path, json } => commands::info(&path, json, &config).await,
        Command::List { root } => commands::list(&root, &config),
    };

    if let Err(e) = result {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
