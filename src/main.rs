//! battlesim - run one battle from the command line

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use battlesim::{
    BattleEngine, BattleEvent, BattleOutcome, ChannelSink, RngSource, Settings, TracingSink,
};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Round-based dice combat simulator
#[derive(Parser, Debug)]
#[command(name = "battlesim", version, about = "Simulate a dice combat battle")]
struct Args {
    /// TOML settings file (defaults to ./battlesim.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pause between rounds in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// RNG seed for a reproducible battle
    #[arg(long)]
    seed: Option<u64>,

    /// Print battle events to stdout as JSON lines
    #[arg(long)]
    json: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "battlesim=info".into());
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(delay_ms) = args.delay_ms {
        settings.turn_delay_ms = delay_ms;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let config = settings.battle_config();
    let rng = match settings.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };
    let (hero, enemies) = settings.roster.into_combatants()?;

    // Ctrl-C cancels between rounds
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping battle");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = if args.json {
        let (sink, mut rx) = ChannelSink::channel();
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                print_event(&event);
            }
        });

        let mut engine = BattleEngine::new(hero, enemies, sink, rng);
        let outcome = engine.run_until_cancelled(&config, cancel_rx).await;
        // Closing the sink lets the printer drain and exit
        drop(engine);
        let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
        outcome?
    } else {
        let mut engine = BattleEngine::new(hero, enemies, TracingSink, rng);
        engine.run_until_cancelled(&config, cancel_rx).await?
    };

    match outcome {
        BattleOutcome::Victory { rounds } => info!(rounds, "protagonist victorious"),
        BattleOutcome::Defeat { rounds } => info!(rounds, "protagonist defeated"),
        BattleOutcome::Cancelled { rounds } => warn!(rounds, "battle cancelled"),
    }

    Ok(())
}

fn print_event(event: &BattleEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to encode event: {}", e),
    }
}
