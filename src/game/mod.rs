//! Match engine modules

pub mod bot;
pub mod catalog;
pub mod combat;
pub mod r#match;
pub mod model;
pub mod scoring;
pub mod snapshot;

pub use catalog::{Catalog, TowerSpec, TroopSpec};
pub use r#match::{
    EndReason, MatchClosed, MatchConfig, MatchHandle, MatchMode, MatchResult, MatchSession,
};

use serde::{Deserialize, Serialize};

/// Deploy request pushed by a client or bot, validated only when processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployCommand {
    /// Player index, 0 or 1
    pub player: usize,
    /// Troop name as it appears in the catalog
    pub troop: String,
}

impl DeployCommand {
    pub fn new(player: usize, troop: impl Into<String>) -> Self {
        Self {
            player,
            troop: troop.into(),
        }
    }
}
