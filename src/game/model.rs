//! Player and tower state (authoritative, owned by the match task)

use crate::protocol::{Connection, Envelope, TowerView};

use super::catalog::TowerSpec;

/// Mana ceiling
pub const MAX_MANA: u32 = 10;

/// A structure on one side of the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tower {
    pub name: String,
    /// Current HP, zero or below means destroyed
    pub hp: i32,
    pub def: i32,
    pub king: bool,
}

impl Tower {
    pub fn from_spec(spec: &TowerSpec) -> Self {
        Self {
            name: spec.name.clone(),
            hp: spec.hp,
            def: spec.def,
            king: spec.king,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn view(&self) -> TowerView {
        TowerView {
            name: self.name.clone(),
            hp: self.hp,
        }
    }
}

/// One participant's mana, towers and outbound connection
#[derive(Debug)]
pub struct Player {
    mana: u32,
    pub towers: Vec<Tower>,
    conn: Option<Connection>,
}

impl Player {
    pub fn new(mana: u32, towers: Vec<Tower>, conn: Option<Connection>) -> Self {
        Self {
            mana: mana.min(MAX_MANA),
            towers,
            conn,
        }
    }

    /// Build a side from the catalog's tower layout
    pub fn from_layout(layout: &[TowerSpec], mana: u32, conn: Option<Connection>) -> Self {
        Self::new(mana, layout.iter().map(Tower::from_spec).collect(), conn)
    }

    pub fn mana(&self) -> u32 {
        self.mana
    }

    /// Deduct mana if affordable; returns false and leaves mana untouched otherwise
    pub fn spend_mana(&mut self, cost: u32) -> bool {
        match self.mana.checked_sub(cost) {
            Some(rest) => {
                self.mana = rest;
                true
            }
            None => false,
        }
    }

    /// Add one mana point, capped at [`MAX_MANA`]
    pub fn regen_mana(&mut self) {
        if self.mana < MAX_MANA {
            self.mana += 1;
        }
    }

    /// Next attack target: guard towers in order, then the king once every guard is down
    pub fn next_alive_tower(&mut self) -> Option<&mut Tower> {
        let guard = self.towers.iter().position(|t| !t.king && t.is_alive());
        let idx = guard.or_else(|| self.towers.iter().position(|t| t.king && t.is_alive()))?;
        self.towers.get_mut(idx)
    }

    /// Living tower with the lowest HP (first one on ties)
    pub fn weakest_tower(&mut self) -> Option<&mut Tower> {
        self.towers
            .iter_mut()
            .filter(|t| t.is_alive())
            .min_by_key(|t| t.hp)
    }

    pub fn alive_towers(&self) -> usize {
        self.towers.iter().filter(|t| t.is_alive()).count()
    }

    pub fn king_destroyed(&self) -> bool {
        self.towers.iter().any(|t| t.king && !t.is_alive())
    }

    pub fn tower_views(&self) -> Vec<TowerView> {
        self.towers
            .iter()
            .filter(|t| t.is_alive())
            .map(Tower::view)
            .collect()
    }

    /// Fire-and-forget send; a missing or closed connection drops the message
    pub fn send(&self, envelope: Envelope) {
        if let Some(conn) = &self.conn {
            let _ = conn.send(envelope);
        }
    }
}
