//! Match outcome policies and reward schedule

use crate::protocol::{MatchOutcome, MatchResultKind};

use super::model::Player;

pub const WIN_EXP: u32 = 30;
pub const LOSS_EXP: u32 = 5;
pub const DRAW_EXP: u32 = 10;

/// Decided match result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Winner(usize),
    Draw,
}

impl Verdict {
    /// Per-participant outcomes, indexed by player
    pub fn outcomes(self) -> [MatchOutcome; 2] {
        let win = MatchOutcome {
            result: MatchResultKind::Win,
            exp: WIN_EXP,
        };
        let loss = MatchOutcome {
            result: MatchResultKind::Loss,
            exp: LOSS_EXP,
        };
        let draw = MatchOutcome {
            result: MatchResultKind::Draw,
            exp: DRAW_EXP,
        };

        match self {
            Self::Winner(0) => [win, loss],
            Self::Winner(_) => [loss, win],
            Self::Draw => [draw, draw],
        }
    }
}

/// Turn-based check, run after every deploy: a fallen king ends the match.
/// Guard tower counts are irrelevant here.
pub fn immediate(players: &[Player; 2]) -> Option<Verdict> {
    players
        .iter()
        .position(Player::king_destroyed)
        .map(|loser| Verdict::Winner(1 - loser))
}

/// Timeout check: more surviving towers wins, equal counts draw
pub fn tally(players: &[Player; 2]) -> Verdict {
    let alive0 = players[0].alive_towers();
    let alive1 = players[1].alive_towers();

    match alive0.cmp(&alive1) {
        std::cmp::Ordering::Greater => Verdict::Winner(0),
        std::cmp::Ordering::Less => Verdict::Winner(1),
        std::cmp::Ordering::Equal => Verdict::Draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::model::Tower;

    fn side(hps: [i32; 3]) -> Player {
        let towers = hps
            .iter()
            .enumerate()
            .map(|(i, &hp)| Tower {
                name: format!("T{i}"),
                hp,
                def: 0,
                king: i == 2,
            })
            .collect();
        Player::new(0, towers, None)
    }

    #[test]
    fn immediate_ignores_guard_counts() {
        let players = [side([0, 0, 10]), side([100, 100, 100])];
        assert_eq!(immediate(&players), None);

        let players = [side([100, 100, 100]), side([500, 500, 0])];
        assert_eq!(immediate(&players), Some(Verdict::Winner(0)));

        let players = [side([1, 1, -5]), side([0, 0, 100])];
        assert_eq!(immediate(&players), Some(Verdict::Winner(1)));
    }

    #[test]
    fn tally_counts_survivors() {
        let players = [side([100, 0, 100]), side([0, 0, 100])];
        assert_eq!(tally(&players), Verdict::Winner(0));

        let players = [side([0, 0, 100]), side([100, 0, 100])];
        assert_eq!(tally(&players), Verdict::Winner(1));

        let players = [side([100, 0, 100]), side([0, 100, 100])];
        assert_eq!(tally(&players), Verdict::Draw);
    }

    #[test]
    fn reward_schedule() {
        let [a, b] = Verdict::Winner(1).outcomes();
        assert_eq!((a.result, a.exp), (MatchResultKind::Loss, 5));
        assert_eq!((b.result, b.exp), (MatchResultKind::Win, 30));

        let [a, b] = Verdict::Draw.outcomes();
        assert_eq!(a, b);
        assert_eq!(a.exp, 10);
    }
}
