//! Computer-controlled command producer

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::{DeployCommand, MatchHandle};

/// Fires a random troop at a fixed cadence until the match ends.
///
/// The bot does not track mana or turns; the session discards anything it
/// cannot play.
pub struct Bot {
    player: usize,
    troops: Vec<String>,
    cadence: Duration,
    rng: ChaCha8Rng,
}

impl Bot {
    pub fn new(player: usize, troops: Vec<String>, cadence: Duration, rng: ChaCha8Rng) -> Self {
        Self {
            player,
            troops,
            cadence,
            rng,
        }
    }

    /// Pick the next troop to deploy
    fn choose(&mut self) -> Option<String> {
        self.troops.choose(&mut self.rng).cloned()
    }

    pub async fn run(mut self, handle: MatchHandle) {
        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = handle.finished() => break,
                _ = ticker.tick() => {
                    let Some(troop) = self.choose() else { break };
                    if handle.deploy(DeployCommand::new(self.player, troop)).await.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(match_id = %handle.id, player = self.player, "Bot stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn choices_come_from_the_roster() {
        let roster = vec!["Pawn".to_string(), "Queen".to_string()];
        let mut bot = Bot::new(
            0,
            roster.clone(),
            Duration::from_millis(10),
            ChaCha8Rng::seed_from_u64(3),
        );

        for _ in 0..20 {
            assert!(roster.contains(&bot.choose().unwrap()));
        }
    }

    #[test]
    fn empty_roster_yields_nothing() {
        let mut bot = Bot::new(
            1,
            Vec::new(),
            Duration::from_millis(10),
            ChaCha8Rng::seed_from_u64(3),
        );
        assert!(bot.choose().is_none());
    }
}
