//! Outbound message definitions
//! These are the wire types the match engine hands to the transport layer

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Outbound connection handle for one participant.
///
/// Unbounded so the match loop never waits on a slow reader; the transport
/// owns the receiving end and frames envelopes however it likes.
pub type Connection = mpsc::UnboundedSender<Envelope>;

/// Envelope type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Periodic mana/tower state
    StateUpdate,
    /// Final per-participant result
    GameEnd,
}

/// Typed envelope: `{"type": "...", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: serde_json::Value,
}

impl Envelope {
    /// Serialize a payload into an envelope
    pub fn new<T: Serialize>(kind: MessageType, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind,
            data: serde_json::to_value(payload)?,
        })
    }

    /// Decode the payload back into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Encode the whole envelope as a JSON text frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A living tower as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerView {
    pub name: String,
    pub hp: i32,
}

/// Game state snapshot (`state_update` payload).
///
/// Labels are from player 0's point of view and the same snapshot goes to
/// both participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub your_mana: u32,
    pub opponent_mana: u32,
    /// Alive towers of player 0
    pub your_towers: Vec<TowerView>,
    /// Alive towers of player 1
    pub opponent_towers: Vec<TowerView>,
}

/// Match result tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResultKind {
    Win,
    Loss,
    Draw,
}

/// Per-participant match outcome (`game_end` payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub result: MatchResultKind,
    pub exp: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_end_wire_shape() {
        let outcome = MatchOutcome {
            result: MatchResultKind::Draw,
            exp: 10,
        };
        let envelope = Envelope::new(MessageType::GameEnd, &outcome).unwrap();
        let json: serde_json::Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "type": "game_end", "data": { "result": "draw", "exp": 10 } })
        );
    }

    #[test]
    fn state_update_payload_decodes() {
        let snapshot = GameStateSnapshot {
            your_mana: 4,
            opponent_mana: 7,
            your_towers: vec![TowerView {
                name: "King Tower".to_string(),
                hp: 2000,
            }],
            opponent_towers: Vec::new(),
        };
        let envelope = Envelope::new(MessageType::StateUpdate, &snapshot).unwrap();

        assert_eq!(envelope.kind, MessageType::StateUpdate);
        assert_eq!(envelope.data["your_mana"], 4);
        assert_eq!(envelope.decode::<GameStateSnapshot>().unwrap(), snapshot);
    }
}
