//! Tower Clash Server - runs a single bot-vs-bot match
//!
//! Process entry for local play-testing. It handles:
//! - Environment configuration and tracing setup
//! - Catalog and profile loading
//! - Spawning the match task plus two bots
//! - Crediting experience once the match is decided

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tower_clash_server::config::Config;
use tower_clash_server::game::bot::Bot;
use tower_clash_server::game::{Catalog, MatchSession};
use tower_clash_server::protocol::{Envelope, MessageType};
use tower_clash_server::store::ProfileStore;

const BOT_NAMES: [&str; 2] = ["bot_red", "bot_blue"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };
    let catalog = Arc::new(catalog);
    let mut profiles = ProfileStore::load(&config.profiles_path)?;

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    info!(seed, mode = ?config.match_config.mode, "Starting Tower Clash match");

    // Outbound channels stand in for client connections
    let (tx0, rx0) = mpsc::unbounded_channel();
    let (tx1, rx1) = mpsc::unbounded_channel();

    let (session, handle) = MatchSession::new(
        Uuid::new_v4(),
        config.match_config.clone(),
        catalog.clone(),
        [Some(tx0), Some(tx1)],
        ChaCha8Rng::seed_from_u64(rng.gen()),
    );

    for player in 0..2 {
        let bot = Bot::new(
            player,
            catalog.troop_names(),
            config.bot_interval,
            ChaCha8Rng::seed_from_u64(rng.gen()),
        );
        tokio::spawn(bot.run(handle.clone()));
    }
    let drains = [
        tokio::spawn(drain_outbound(BOT_NAMES[0], rx0)),
        tokio::spawn(drain_outbound(BOT_NAMES[1], rx1)),
    ];

    let match_task = tokio::spawn(session.run());

    tokio::select! {
        _ = handle.finished() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, cancelling match");
            handle.cancel();
        }
    }

    let result = match_task.await?;
    // connections close with the session, so the drains finish on their own
    for drain in drains {
        drain.await?;
    }
    info!(
        match_id = %result.id,
        reason = ?result.reason,
        final_state = ?result.final_state,
        "Match finished"
    );

    if let Some(outcomes) = result.outcomes {
        for (name, outcome) in BOT_NAMES.iter().zip(outcomes.iter()) {
            let profile = profiles.record_outcome(name, outcome);
            info!(
                player = %name,
                result = ?outcome.result,
                total_exp = profile.exp,
                "Experience credited"
            );
        }
        profiles.save()?;
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Log what a participant would receive on the wire
async fn drain_outbound(player: &'static str, mut rx: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = rx.recv().await {
        match envelope.encode() {
            Ok(frame) if envelope.kind == MessageType::GameEnd => {
                info!(player, frame = %frame, "Game end delivered")
            }
            Ok(frame) => debug!(player, frame = %frame, "State update delivered"),
            Err(e) => warn!(player, error = %e, "Failed to encode outbound frame"),
        }
    }
}
