//! Tower Clash match engine
//!
//! Runs one authoritative task per two-player match:
//! - turn-based or real-time dispatch over deploy commands
//! - combat resolution against guard and king towers
//! - state snapshots and per-player results pushed to outbound channels
//! - atomic JSON persistence for player experience

pub mod config;
pub mod game;
pub mod protocol;
pub mod store;
