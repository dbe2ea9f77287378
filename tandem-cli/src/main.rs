mod console;
mod media;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tandem::TandemConfig;
use tandem::engine::{MediaElement, MediaTracks, PairIndex, RtcTransportFactory, Session};
use tracing_subscriber::EnvFilter;

use crate::console::{ConsoleDisplay, ConsoleRender};
use crate::media::{SimulatedMedia, spawn_feeders};
use crate::prompt::{HELP, UserCommand};

const PAIRS: usize = 2;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Two synchronised WebRTC pairs with a shared playback control channel")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start both pairs in-process and read commands from the terminal.
    Run {
        /// JSON configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides the time broadcast interval.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Run {
            config,
            interval_ms,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => TandemConfig::default(),
            };
            if let Some(ms) = interval_ms {
                config.sync.broadcast_interval_ms = ms;
            }
            run(config).await
        }
    }
}

fn load_config(path: &Path) -> Result<TandemConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

async fn run(config: TandemConfig) -> Result<()> {
    println!("{}", "🚀 Starting tandem...".green().bold());

    let session = Session::new(
        config.clone(),
        Arc::new(RtcTransportFactory::new(config.transport.clone())),
        Arc::new(ConsoleDisplay),
        Arc::new(ConsoleRender),
    );

    let mut media = Vec::new();
    let mut feeders = Vec::new();
    for i in 0..PAIRS {
        let element = Arc::new(SimulatedMedia::new(i as f64 * 60.0));
        let handle = session
            .add_pair(element.clone())
            .await
            .context("Failed to create peer connections")?;

        let tracks = MediaTracks::audio_video();
        feeders.extend(spawn_feeders(&tracks));
        handle.tracks_ready(tracks).await?;
        media.push(element);
    }

    println!("{}", "📡 Negotiating...".cyan());
    for handle in session.pairs() {
        match handle.wait_connected(CONNECT_TIMEOUT).await {
            Ok(_) => println!("   {} {} connected", "✔".green(), handle.index()),
            Err(e) => println!("   {} {}", "✘".red(), e),
        }
    }

    let broadcast = session.start_broadcast();
    println!("{}", HELP.dimmed());

    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("tandem")
                .allow_empty(true)
                .interact_text()
        })
        .await??;
        if line.trim().is_empty() {
            continue;
        }

        let command = match UserCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {:#}", "?".yellow(), e);
                continue;
            }
        };

        let controller = session.controller();
        let delivered = match command {
            UserCommand::Seek(seconds) => controller.seek(seconds).await,
            UserCommand::Play => controller.play().await,
            UserCommand::Pause => controller.pause().await,
            UserCommand::Select(index) => {
                if !controller.select_pair(PairIndex(index)) {
                    println!("{}", format!("pair {index} cannot be selected").yellow());
                }
                true
            }
            UserCommand::Status => {
                print_status(&session, &media);
                true
            }
            UserCommand::Help => {
                println!("{}", HELP);
                true
            }
            UserCommand::Quit => break,
        };
        if !delivered {
            println!("{}", "dropped: no selected pair with an open control channel".yellow());
        }
    }

    broadcast.abort();
    for feeder in feeders {
        feeder.abort();
    }
    session.shutdown().await;
    println!("{}", "✨ Bye".green().bold());
    Ok(())
}

fn print_status(session: &Session, media: &[Arc<SimulatedMedia>]) {
    let selected = session.controller().selected();
    for handle in session.pairs() {
        let status = handle.status();
        let marker = if selected == Some(handle.index()) { "*" } else { " " };
        let position = media
            .get(handle.index().get())
            .map(|m| format!("{:.1}s{}", m.current_time(), if m.is_playing() { "" } else { " (paused)" }))
            .unwrap_or_default();
        let setup = status
            .setup_ms
            .map(|ms| format!("  setup {ms}ms"))
            .unwrap_or_default();
        let errors = match status.candidate_errors {
            0 => String::new(),
            n => format!("  {}", format!("{n} candidate errors").yellow()),
        };
        println!(
            "{} {}  offerer={} answerer={} channel={}  local {}{}{}",
            marker,
            handle.index(),
            status.offerer,
            status.answerer,
            status.channel,
            position,
            setup,
            errors
        );
    }
}
