//! Snapshot building and broadcast

use tracing::warn;

use crate::protocol::{Envelope, GameStateSnapshot, MessageType};

use super::model::Player;

/// Builds `state_update` messages for both participants
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    /// Snapshots that made it to the outbound channels
    sent: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project current state, labelled from player 0's side
    pub fn build(&self, players: &[Player; 2]) -> GameStateSnapshot {
        GameStateSnapshot {
            your_mana: players[0].mana(),
            opponent_mana: players[1].mana(),
            your_towers: players[0].tower_views(),
            opponent_towers: players[1].tower_views(),
        }
    }

    /// Serialize once and send the same envelope to both sides.
    ///
    /// A serialization failure drops this broadcast only and returns false.
    pub fn broadcast(&mut self, players: &[Player; 2]) -> bool {
        let snapshot = self.build(players);
        let envelope = match Envelope::new(MessageType::StateUpdate, &snapshot) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Failed to serialize state update, skipping broadcast");
                return false;
            }
        };

        for player in players {
            player.send(envelope.clone());
        }
        self.sent += 1;
        true
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}
