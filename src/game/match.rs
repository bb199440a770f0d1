//! Match session and its dispatch loops

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{Connection, Envelope, GameStateSnapshot, MatchOutcome, MessageType};

use super::catalog::Catalog;
use super::combat::{CombatSystem, DeployOutcome};
use super::model::Player;
use super::scoring::{self, Verdict};
use super::snapshot::SnapshotBuilder;
use super::DeployCommand;

/// Inbound queue depth per match
const COMMAND_QUEUE: usize = 256;
/// Longest tick or match span honored; anything above is treated as never
const MAX_SPAN: Duration = Duration::from_secs(86_400 * 365 * 30);
/// Shortest tick period, `interval_at` rejects zero
const MIN_TICK: Duration = Duration::from_millis(1);

/// Which dispatch loop a match runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Turn-based, ends when a king tower falls
    Simple,
    /// Real-time with mana ticks, ends on timeout
    Enhanced,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" | "turn" | "turn_based" => Ok(Self::Simple),
            "enhanced" | "realtime" | "real_time" => Ok(Self::Enhanced),
            other => Err(format!("unknown match mode: {other}")),
        }
    }
}

/// Per-match timing and economy settings
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub mode: MatchMode,
    /// Mana regen and broadcast period (enhanced mode)
    pub tick_interval: Duration,
    /// Absolute match length from session start (enhanced mode)
    pub duration: Duration,
    pub starting_mana: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::Enhanced,
            tick_interval: Duration::from_secs(1),
            duration: Duration::from_secs(3 * 60),
            starting_mana: 5,
        }
    }
}

/// Why a match stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    KingDestroyed,
    Timeout,
    Cancelled,
}

/// Final report handed back by [`MatchSession::run`]
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub id: Uuid,
    pub reason: EndReason,
    /// Per-participant outcomes, absent when the match was cancelled
    pub outcomes: Option<[MatchOutcome; 2]>,
    pub final_state: GameStateSnapshot,
}

/// Everything the dispatch loop can wake up for
#[derive(Debug)]
enum MatchEvent {
    Tick,
    Command(DeployCommand),
    /// Every command producer has gone away
    CommandsClosed,
    Timeout,
    Cancelled,
}

/// Inbound command queue closed
#[derive(Debug, thiserror::Error)]
#[error("Match {0} is no longer accepting commands")]
pub struct MatchClosed(pub Uuid);

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    command_tx: mpsc::Sender<DeployCommand>,
    terminal_tx: Arc<watch::Sender<bool>>,
    terminal_rx: watch::Receiver<bool>,
}

impl MatchHandle {
    /// Queue a deploy. Success means the command was enqueued, not that it was valid.
    pub async fn deploy(&self, cmd: DeployCommand) -> Result<(), MatchClosed> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| MatchClosed(self.id))
    }

    /// Raise the terminal signal
    pub fn cancel(&self) {
        self.terminal_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        *self.terminal_rx.borrow()
    }

    /// Resolves once the terminal signal has been raised
    pub async fn finished(&self) {
        let mut rx = self.terminal_rx.clone();
        loop {
            let done = *rx.borrow_and_update();
            if done || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Turn arbitration for simple mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    current: usize,
}

/// What one inbound command did in simple mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStep {
    /// Not this player's turn, dropped
    OffTurn,
    Played(DeployOutcome),
    Finished(DeployOutcome, Verdict),
}

impl TurnState {
    pub fn new(first: usize) -> Self {
        Self { current: first % 2 }
    }

    /// Draw the opening player from the injected RNG
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(rng.gen_range(0..2))
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Apply an inbound command. A decisive deploy keeps the turn; anything
    /// else played on-turn passes it.
    pub fn handle(
        &mut self,
        players: &mut [Player; 2],
        catalog: &Catalog,
        cmd: &DeployCommand,
    ) -> TurnStep {
        if cmd.player != self.current {
            return TurnStep::OffTurn;
        }

        let outcome = CombatSystem::deploy(players, catalog, cmd);
        if !outcome.is_decisive() {
            self.current = 1 - self.current;
        }

        match scoring::immediate(players) {
            Some(verdict) => TurnStep::Finished(outcome, verdict),
            None => TurnStep::Played(outcome),
        }
    }
}

/// The authoritative match: sole owner of both players' state
pub struct MatchSession {
    id: Uuid,
    config: MatchConfig,
    catalog: Arc<Catalog>,
    players: [Player; 2],
    rng: ChaCha8Rng,
    command_rx: mpsc::Receiver<DeployCommand>,
    commands_open: bool,
    terminal_tx: Arc<watch::Sender<bool>>,
    terminal_rx: watch::Receiver<bool>,
    snapshots: SnapshotBuilder,
}

impl MatchSession {
    /// Create a new match with both sides built from the catalog's tower layout
    pub fn new(
        id: Uuid,
        config: MatchConfig,
        catalog: Arc<Catalog>,
        connections: [Option<Connection>; 2],
        rng: ChaCha8Rng,
    ) -> (Self, MatchHandle) {
        let [conn0, conn1] = connections;
        let players = [
            Player::from_layout(catalog.towers(), config.starting_mana, conn0),
            Player::from_layout(catalog.towers(), config.starting_mana, conn1),
        ];
        Self::with_players(id, config, catalog, players, rng)
    }

    /// Create a match from pre-built players
    pub fn with_players(
        id: Uuid,
        config: MatchConfig,
        catalog: Arc<Catalog>,
        players: [Player; 2],
        rng: ChaCha8Rng,
    ) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let (terminal_tx, terminal_rx) = watch::channel(false);
        let terminal_tx = Arc::new(terminal_tx);

        let handle = MatchHandle {
            id,
            command_tx,
            terminal_tx: terminal_tx.clone(),
            terminal_rx: terminal_rx.clone(),
        };

        let session = Self {
            id,
            config,
            catalog,
            players,
            rng,
            command_rx,
            commands_open: true,
            terminal_tx,
            terminal_rx,
            snapshots: SnapshotBuilder::new(),
        };

        (session, handle)
    }

    /// Run the configured dispatch loop to completion
    pub async fn run(mut self) -> MatchResult {
        info!(match_id = %self.id, mode = ?self.config.mode, "Match started");

        let (reason, verdict) = match self.config.mode {
            MatchMode::Simple => self.run_simple().await,
            MatchMode::Enhanced => self.run_enhanced().await,
        };

        let outcomes = verdict.map(|v| self.announce(v));
        self.terminal_tx.send_replace(true);

        info!(
            match_id = %self.id,
            reason = ?reason,
            verdict = ?verdict,
            snapshots = self.snapshots.sent(),
            "Match ended"
        );

        MatchResult {
            id: self.id,
            reason,
            outcomes,
            final_state: self.snapshots.build(&self.players),
        }
    }

    /// Turn-based loop
    async fn run_simple(&mut self) -> (EndReason, Option<Verdict>) {
        let mut turn = TurnState::random(&mut self.rng);
        info!(match_id = %self.id, first_turn = turn.current(), "Turn order drawn");

        loop {
            match self.next_simple_event().await {
                MatchEvent::Command(cmd) => {
                    match turn.handle(&mut self.players, &self.catalog, &cmd) {
                        TurnStep::OffTurn => {
                            debug!(
                                match_id = %self.id,
                                player = cmd.player,
                                "Ignoring off-turn command"
                            );
                        }
                        TurnStep::Played(outcome) => {
                            debug!(
                                match_id = %self.id,
                                player = cmd.player,
                                troop = %cmd.troop,
                                outcome = ?outcome,
                                next_turn = turn.current(),
                                "Deploy resolved"
                            );
                        }
                        TurnStep::Finished(outcome, verdict) => {
                            debug!(
                                match_id = %self.id,
                                player = cmd.player,
                                outcome = ?outcome,
                                "Deploy resolved"
                            );
                            return (EndReason::KingDestroyed, Some(verdict));
                        }
                    }
                }
                MatchEvent::CommandsClosed => {
                    // nothing can ever take a turn again
                    info!(match_id = %self.id, "All command producers gone, abandoning match");
                    return (EndReason::Cancelled, None);
                }
                MatchEvent::Cancelled => return (EndReason::Cancelled, None),
                MatchEvent::Tick | MatchEvent::Timeout => {}
            }
        }
    }

    /// Real-time loop
    async fn run_enhanced(&mut self) -> (EndReason, Option<Verdict>) {
        let start = Instant::now();
        let period = self.config.tick_interval.clamp(MIN_TICK, MAX_SPAN);
        let mut ticker = interval_at(start + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let deadline = sleep_until(start + self.config.duration.min(MAX_SPAN));
        tokio::pin!(deadline);

        loop {
            match self.next_enhanced_event(&mut ticker, deadline.as_mut()).await {
                MatchEvent::Tick => self.tick(),
                MatchEvent::Command(cmd) => {
                    let outcome = CombatSystem::deploy(&mut self.players, &self.catalog, &cmd);
                    debug!(
                        match_id = %self.id,
                        player = cmd.player,
                        troop = %cmd.troop,
                        outcome = ?outcome,
                        "Deploy resolved"
                    );
                }
                MatchEvent::CommandsClosed => {
                    debug!(match_id = %self.id, "Command queue closed, running out the clock");
                    self.commands_open = false;
                }
                MatchEvent::Timeout => {
                    return (EndReason::Timeout, Some(scoring::tally(&self.players)));
                }
                MatchEvent::Cancelled => return (EndReason::Cancelled, None),
            }
        }
    }

    /// Regenerate mana and broadcast state
    fn tick(&mut self) {
        for player in &mut self.players {
            player.regen_mana();
        }
        self.snapshots.broadcast(&self.players);
    }

    /// Send each participant its own `game_end`
    fn announce(&self, verdict: Verdict) -> [MatchOutcome; 2] {
        let outcomes = verdict.outcomes();
        for (player, outcome) in self.players.iter().zip(outcomes.iter()) {
            match Envelope::new(MessageType::GameEnd, outcome) {
                Ok(envelope) => player.send(envelope),
                Err(e) => warn!(match_id = %self.id, error = %e, "Failed to serialize game end"),
            }
        }
        outcomes
    }

    fn terminal_raised(&self) -> bool {
        *self.terminal_rx.borrow()
    }

    /// Wait on commands and the terminal signal.
    ///
    /// Ready sources are picked at random, so a pending command and a
    /// raised terminal signal may resolve in either order.
    async fn next_simple_event(&mut self) -> MatchEvent {
        if self.terminal_raised() {
            return MatchEvent::Cancelled;
        }

        tokio::select! {
            cmd = self.command_rx.recv(), if self.commands_open => match cmd {
                Some(cmd) => MatchEvent::Command(cmd),
                None => MatchEvent::CommandsClosed,
            },
            _ = self.terminal_rx.changed() => MatchEvent::Cancelled,
        }
    }

    /// Wait on ticks, commands, the match deadline and the terminal signal
    async fn next_enhanced_event(
        &mut self,
        ticker: &mut Interval,
        deadline: Pin<&mut Sleep>,
    ) -> MatchEvent {
        if self.terminal_raised() {
            return MatchEvent::Cancelled;
        }

        tokio::select! {
            _ = ticker.tick() => MatchEvent::Tick,
            cmd = self.command_rx.recv(), if self.commands_open => match cmd {
                Some(cmd) => MatchEvent::Command(cmd),
                None => MatchEvent::CommandsClosed,
            },
            _ = deadline => MatchEvent::Timeout,
            _ = self.terminal_rx.changed() => MatchEvent::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::model::Tower;
    use rand::SeedableRng;

    fn side(mana: u32, hps: [i32; 3]) -> Player {
        let towers = hps
            .iter()
            .enumerate()
            .map(|(i, &hp)| Tower {
                name: if i == 2 {
                    "King Tower".to_string()
                } else {
                    format!("Guard Tower {}", i + 1)
                },
                hp,
                def: 100,
                king: i == 2,
            })
            .collect();
        Player::new(mana, towers, None)
    }

    fn cmd(player: usize, troop: &str) -> DeployCommand {
        DeployCommand::new(player, troop)
    }

    #[test]
    fn parses_modes() {
        assert_eq!("simple".parse::<MatchMode>(), Ok(MatchMode::Simple));
        assert_eq!("Enhanced".parse::<MatchMode>(), Ok(MatchMode::Enhanced));
        assert!("chaos".parse::<MatchMode>().is_err());
    }

    #[test]
    fn seeded_rng_fixes_opening_turn() {
        let first = TurnState::random(&mut ChaCha8Rng::seed_from_u64(11)).current();
        for _ in 0..5 {
            assert_eq!(
                TurnState::random(&mut ChaCha8Rng::seed_from_u64(11)).current(),
                first
            );
        }
    }

    #[test]
    fn non_decisive_deploy_passes_turn() {
        let catalog = Catalog::default();
        let mut players = [side(10, [1000, 1000, 2000]), side(10, [1000, 1000, 2000])];
        let mut turn = TurnState::new(0);

        let step = turn.handle(&mut players, &catalog, &cmd(0, "Pawn"));

        assert!(matches!(step, TurnStep::Played(DeployOutcome::Hit { destroyed: false, .. })));
        assert_eq!(turn.current(), 1);
    }

    #[test]
    fn decisive_deploy_keeps_turn() {
        let catalog = Catalog::default();
        let mut players = [side(10, [1000, 1000, 2000]), side(10, [40, 1000, 2000])];
        let mut turn = TurnState::new(0);

        let step = turn.handle(&mut players, &catalog, &cmd(0, "Pawn"));

        assert!(matches!(step, TurnStep::Played(DeployOutcome::Hit { destroyed: true, .. })));
        assert_eq!(turn.current(), 0);
    }

    #[test]
    fn off_turn_command_is_dropped() {
        let catalog = Catalog::default();
        let mut players = [side(10, [1000, 1000, 2000]), side(10, [1000, 1000, 2000])];
        let mut turn = TurnState::new(1);

        let step = turn.handle(&mut players, &catalog, &cmd(0, "Knight"));

        assert_eq!(step, TurnStep::OffTurn);
        assert_eq!(turn.current(), 1);
        assert_eq!(players[0].mana(), 10);
        assert_eq!(players[1].towers[0].hp, 1000);
    }

    #[test]
    fn rejected_on_turn_deploy_passes_turn() {
        let catalog = Catalog::default();
        let mut players = [side(2, [1000, 1000, 2000]), side(10, [1000, 1000, 2000])];
        let mut turn = TurnState::new(0);

        let step = turn.handle(&mut players, &catalog, &cmd(0, "Pawn"));

        assert!(matches!(step, TurnStep::Played(DeployOutcome::Rejected(_))));
        assert_eq!(turn.current(), 1);
        assert_eq!(players[0].mana(), 2);
    }

    #[test]
    fn fallen_king_finishes_match() {
        let catalog = Catalog::default();
        let mut players = [side(10, [1000, 1000, 2000]), side(10, [0, 0, 50])];
        let mut turn = TurnState::new(0);

        let step = turn.handle(&mut players, &catalog, &cmd(0, "Prince"));

        match step {
            TurnStep::Finished(outcome, verdict) => {
                assert!(outcome.is_decisive());
                assert_eq!(verdict, Verdict::Winner(0));
            }
            other => panic!("expected finished match, got {other:?}"),
        }
    }

    #[test]
    fn guard_kill_does_not_finish_match() {
        let catalog = Catalog::default();
        let mut players = [side(10, [1000, 1000, 2000]), side(10, [10, 1000, 2000])];
        let mut turn = TurnState::new(0);

        let step = turn.handle(&mut players, &catalog, &cmd(0, "Pawn"));

        assert!(matches!(step, TurnStep::Played(_)));
    }
}
