//! Player profile management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::protocol::MatchOutcome;

use super::atomic::atomic_write_json;
use super::StoreError;

/// Persisted player profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub username: String,
    #[serde(default)]
    pub exp: u64,
    #[serde(default)]
    pub matches_played: u32,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
}

impl PlayerProfile {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            exp: 0,
            matches_played: 0,
            last_played: None,
        }
    }
}

/// Profile file (`players.json`) held in memory between saves
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<PlayerProfile>,
}

impl ProfileStore {
    /// Load profiles from `path`; a missing file starts an empty store
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let display = path.display().to_string();
        let profiles = match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| StoreError::Decode {
                path: display,
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: display,
                    source,
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    pub fn get(&self, username: &str) -> Option<&PlayerProfile> {
        self.profiles.iter().find(|p| p.username == username)
    }

    pub fn profiles(&self) -> &[PlayerProfile] {
        &self.profiles
    }

    /// Get or create a profile
    pub fn ensure_profile(&mut self, username: &str) -> &mut PlayerProfile {
        let idx = match self.profiles.iter().position(|p| p.username == username) {
            Some(idx) => idx,
            None => {
                self.profiles.push(PlayerProfile::new(username));
                self.profiles.len() - 1
            }
        };
        &mut self.profiles[idx]
    }

    /// Credit a finished match to a player
    pub fn record_outcome(&mut self, username: &str, outcome: &MatchOutcome) -> &PlayerProfile {
        let profile = self.ensure_profile(username);
        profile.exp += u64::from(outcome.exp);
        profile.matches_played += 1;
        profile.last_played = Some(Utc::now());
        profile
    }

    /// Persist every profile with an atomic replace
    pub fn save(&self) -> Result<(), StoreError> {
        atomic_write_json(&self.path, &self.profiles)
    }
}
