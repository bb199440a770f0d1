//! Troop and tower stat tables

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Troop stats looked up by name on deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroopSpec {
    pub name: String,
    /// Mana spent to deploy
    pub mana: u32,
    /// Attack value before the target's defense is subtracted
    pub atk: i32,
}

/// Tower stats used to build each side at match start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerSpec {
    pub name: String,
    pub hp: i32,
    pub def: i32,
    #[serde(default)]
    pub king: bool,
}

/// On-disk catalog layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    troops: Vec<TroopSpec>,
    towers: Vec<TowerSpec>,
}

/// Static stat tables for one match
#[derive(Debug, Clone)]
pub struct Catalog {
    troops: HashMap<String, TroopSpec>,
    /// Tower layout per side, in placement order
    towers: Vec<TowerSpec>,
}

impl Catalog {
    /// Build a catalog, validating the tower layout
    pub fn new(troops: Vec<TroopSpec>, towers: Vec<TowerSpec>) -> Result<Self, CatalogError> {
        let kings = towers.iter().filter(|t| t.king).count();
        if kings != 1 {
            return Err(CatalogError::KingCount(kings));
        }

        if let Some(tower) = towers.iter().find(|t| t.hp <= 0 || t.def < 0) {
            return Err(CatalogError::InvalidStats(tower.name.clone()));
        }

        let mut by_name = HashMap::with_capacity(troops.len());
        for troop in troops {
            if troop.atk < 0 {
                return Err(CatalogError::InvalidStats(troop.name));
            }
            if by_name.contains_key(&troop.name) {
                return Err(CatalogError::DuplicateTroop(troop.name));
            }
            by_name.insert(troop.name.clone(), troop);
        }

        Ok(Self {
            troops: by_name,
            towers,
        })
    }

    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.troops, file.towers)
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn troop(&self, name: &str) -> Option<&TroopSpec> {
        self.troops.get(name)
    }

    /// Troop names in a stable order
    pub fn troop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.troops.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn towers(&self) -> &[TowerSpec] {
        &self.towers
    }
}

impl Default for Catalog {
    /// Standard roster: five attackers, the Queen healer, two guard towers and a king
    fn default() -> Self {
        let troop = |name: &str, mana, atk| TroopSpec {
            name: name.to_string(),
            mana,
            atk,
        };
        let tower = |name: &str, hp, def, king| TowerSpec {
            name: name.to_string(),
            hp,
            def,
            king,
        };

        let troops = vec![
            troop("Pawn", 3, 150),
            troop("Bishop", 4, 200),
            troop("Rook", 5, 200),
            troop("Knight", 5, 300),
            troop("Prince", 6, 400),
            troop("Queen", 5, 0),
        ];
        let towers = vec![
            tower("Guard Tower 1", 1000, 100, false),
            tower("Guard Tower 2", 1000, 100, false),
            tower("King Tower", 2000, 300, true),
        ];

        Self {
            troops: troops.into_iter().map(|t| (t.name.clone(), t)).collect(),
            towers,
        }
    }
}

/// Catalog loading errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog must define exactly one king tower, found {0}")]
    KingCount(usize),

    #[error("Duplicate troop name: {0}")]
    DuplicateTroop(String),

    #[error("Invalid stats for {0}: hp must be positive, atk and def non-negative")]
    InvalidStats(String),
}
