//! Combat system - deploy validation, attacks and heals

use super::catalog::{Catalog, TroopSpec};
use super::model::Player;
use super::DeployCommand;

/// Troop that heals its own side instead of attacking
pub const HEALER_TROOP: &str = "Queen";
/// HP restored by one healer deploy (no max-HP ceiling is applied)
pub const HEAL_AMOUNT: i32 = 300;

/// Why a deploy was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownPlayer,
    UnknownTroop,
    InsufficientMana,
}

/// Result of resolving one deploy command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Nothing changed
    Rejected(RejectReason),
    /// Own weakest tower healed
    Healed { tower: String, hp: i32 },
    /// Opposing tower hit
    Hit {
        tower: String,
        damage: i32,
        hp: i32,
        destroyed: bool,
    },
    /// Mana spent but there was no living tower to act on
    NoTarget,
}

impl DeployOutcome {
    /// True when the deploy destroyed a structure
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::Hit { destroyed: true, .. })
    }
}

/// Combat system for resolving deploys against the two sides
pub struct CombatSystem;

impl CombatSystem {
    /// Damage dealt by an attack, never negative
    pub fn damage(atk: i32, def: i32) -> i32 {
        atk.saturating_sub(def).max(0)
    }

    /// Validate and apply one deploy.
    ///
    /// Rejections leave every player untouched. Snapshots are the caller's
    /// concern.
    pub fn deploy(
        players: &mut [Player; 2],
        catalog: &Catalog,
        cmd: &DeployCommand,
    ) -> DeployOutcome {
        if cmd.player > 1 {
            return DeployOutcome::Rejected(RejectReason::UnknownPlayer);
        }
        let Some(spec) = catalog.troop(&cmd.troop) else {
            return DeployOutcome::Rejected(RejectReason::UnknownTroop);
        };

        let (own, opponent) = Self::split(players, cmd.player);
        if !own.spend_mana(spec.mana) {
            return DeployOutcome::Rejected(RejectReason::InsufficientMana);
        }

        if spec.name == HEALER_TROOP {
            Self::heal_weakest(own)
        } else {
            Self::attack(opponent, spec)
        }
    }

    /// Restore [`HEAL_AMOUNT`] to the lowest-HP living tower
    fn heal_weakest(own: &mut Player) -> DeployOutcome {
        match own.weakest_tower() {
            Some(tower) => {
                tower.hp = tower.hp.saturating_add(HEAL_AMOUNT);
                DeployOutcome::Healed {
                    tower: tower.name.clone(),
                    hp: tower.hp,
                }
            }
            None => DeployOutcome::NoTarget,
        }
    }

    /// Hit the opponent's next living tower
    fn attack(opponent: &mut Player, spec: &TroopSpec) -> DeployOutcome {
        let Some(target) = opponent.next_alive_tower() else {
            return DeployOutcome::NoTarget;
        };

        let damage = Self::damage(spec.atk, target.def);
        target.hp = target.hp.saturating_sub(damage);

        DeployOutcome::Hit {
            tower: target.name.clone(),
            damage,
            hp: target.hp,
            destroyed: !target.is_alive(),
        }
    }

    /// Borrow (deploying side, opposing side)
    fn split(players: &mut [Player; 2], idx: usize) -> (&mut Player, &mut Player) {
        let [first, second] = players;
        if idx == 0 {
            (first, second)
        } else {
            (second, first)
        }
    }
}
