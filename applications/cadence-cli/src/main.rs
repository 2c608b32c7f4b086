/// Cadence - multi-source playback from the terminal
use anyhow::bail;
use cadence_core::PlaybackState;
use cadence_playback::{CadenceConfig, Player};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod console;

use console::{describe, ConsoleObserver};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Play local files and remote catalog tracks from one queue", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every configured source
    Search {
        /// Text matched against title, artist and album
        query: String,
    },
    /// List recommendations from every configured source
    Recommend,
    /// Queue matching tracks and play them
    Play {
        /// Text matched against title, artist and album
        query: String,
        /// Queue every match instead of only the first
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence_cli=info,cadence_playback=info,cadence_sources=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = CadenceConfig::load(cli.config.as_deref())?;
    let player = Player::from_config(&config)?;

    let outcome = match cli.command {
        Commands::Search { query } => search(&player, &query).await,
        Commands::Recommend => recommend(&player).await,
        Commands::Play { query, all } => play(&player, &query, all).await,
    };

    if let Err(e) = player.shutdown().await {
        tracing::warn!(error = %e, "Shutdown incomplete");
    }
    outcome
}

async fn search(player: &Player, query: &str) -> anyhow::Result<()> {
    let tracks = player.search(query).await?;
    if tracks.is_empty() {
        println!("No tracks match \"{query}\"");
    }
    for (n, track) in tracks.iter().enumerate() {
        println!("{:>3}. {}", n + 1, describe(track));
    }
    Ok(())
}

async fn recommend(player: &Player) -> anyhow::Result<()> {
    let tracks = player.recommendations().await?;
    for (n, track) in tracks.iter().enumerate() {
        println!("{:>3}. {}", n + 1, describe(track));
    }
    Ok(())
}

async fn play(player: &Player, query: &str, all: bool) -> anyhow::Result<()> {
    let mut tracks = player.search(query).await?;
    if tracks.is_empty() {
        bail!("No tracks match \"{query}\"");
    }
    if !all {
        tracks.truncate(1);
    }

    let (observer, mut playback) = ConsoleObserver::new(player.config().error_display());
    player.subscribe(Arc::new(observer));

    let first = tracks[0].clone();
    player.set_queue(tracks);
    player.play_song(first, Some(0)).await;

    if *playback.borrow_and_update() == PlaybackState::Stopped {
        bail!("Playback did not start");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = playback.changed() => {
                if changed.is_err() || *playback.borrow_and_update() == PlaybackState::Stopped {
                    tracing::info!("Queue finished");
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, stopping playback");
                player.stop().await;
                break;
            }
        }
    }

    Ok(())
}
