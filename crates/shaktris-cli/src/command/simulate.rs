use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use shaktris_engine::{
    BagSeed, CoreConfig, CoreEvent, DiscardReason, EventLog, FallTimer, GameCore, Operation,
    OperationOutcome, PlayerId, ProcessedOperation, RotationDirection, core::legality,
};

use crate::{
    schema::record::{RecordedMatch, TurnOutcome, TurnRecord},
    setup::Table,
    util::Output,
};

/// Input strategy of the simulated players.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum BotStyle {
    /// Steers towards the king until connected, then lets the piece fall.
    #[default]
    Careful,
    /// A few random moves, then an immediate hard drop.
    Reckless,
}

const MAX_STEERING_MOVES: usize = 40;
const MAX_WANDER_MOVES: usize = 4;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of players seated around the board (1-4)
    #[arg(long, default_value_t = 2)]
    players: usize,
    /// Number of falling-piece turns to play
    #[arg(long, default_value_t = 20)]
    turns: usize,
    #[arg(long, default_value = "careful")]
    bot: BotStyle,
    /// Probability that the simulated authority rejects a placement
    #[arg(long, default_value_t = 0.0)]
    reject_rate: f64,
    /// Frames per second of the simulated clock
    #[arg(long, default_value_t = 60)]
    fps: u64,
    /// Automatic fall interval in milliseconds
    #[arg(long, default_value_t = 250)]
    fall_interval_ms: u64,
    /// Random seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg, config: CoreConfig) -> anyhow::Result<()> {
    let SimulateArg {
        players,
        turns,
        bot,
        reject_rate,
        fps,
        fall_interval_ms,
        seed,
        output,
    } = arg;
    anyhow::ensure!(
        (0.0..=1.0).contains(reject_rate),
        "reject rate must be within 0.0..=1.0, got {reject_rate}"
    );

    let sim_seed = seed.unwrap_or_else(|| rand::rng().random());
    let table = Table::around(config.initial_bounds, *players)?;
    let timer = FallTimer::new(*fps, Duration::from_millis(*fall_interval_ms));
    let mut simulation = Simulation::new(config, table, timer, *bot, *reject_rate, sim_seed);

    eprintln!("Simulating {turns} turns for {players} players (seed {sim_seed})...");
    let mut records = Vec::with_capacity(*turns);
    for turn in 0..*turns {
        let record = simulation.play_turn(turn)?;
        let kind = record
            .kind
            .map_or_else(|| "-".to_owned(), |kind| kind.to_string());
        eprintln!(
            "Turn #{turn} ({}, {kind}): {}",
            record.player,
            outcome_label(&record.outcome)
        );
        records.push(record);
    }

    let placed = records.iter().filter(|r| r.outcome.is_placed()).count();
    let exploded = records.iter().filter(|r| r.outcome.is_exploded()).count();
    let rejected = records.iter().filter(|r| r.outcome.is_rejected()).count();
    eprintln!(
        "Placed {placed}, exploded {exploded}, rejected {rejected}, resynced {} times",
        simulation.resyncs
    );

    let recorded = RecordedMatch {
        recorded_at: Utc::now(),
        sim_seed,
        bag_seed: simulation.bag_seed,
        config: simulation.core.config().clone(),
        bot: *bot,
        seats: simulation.table.seats().to_vec(),
        turns: records,
        final_snapshot: simulation.core.snapshot(),
    };
    Output::save_json(&recorded, output.clone())?;
    Ok(())
}

fn outcome_label(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Placed { cells } => format!("placed {} cells", cells.len()),
        TurnOutcome::Rejected { .. } => "placement rejected".to_owned(),
        TurnOutcome::Exploded { at, reason } => format!("exploded at {at}: {reason}"),
        TurnOutcome::TimedOut => "timed out".to_owned(),
        TurnOutcome::SpawnFailed { error } => format!("spawn failed: {error}"),
    }
}

/// Core plus the simulated players and chess authority around it.
#[derive(Debug)]
struct Simulation {
    core: GameCore,
    table: Table,
    timer: FallTimer,
    log: EventLog,
    rng: Pcg32,
    bot: BotStyle,
    reject_rate: f64,
    bag_seed: BagSeed,
    resyncs: usize,
}

impl Simulation {
    fn new(
        config: CoreConfig,
        table: Table,
        timer: FallTimer,
        bot: BotStyle,
        reject_rate: f64,
        seed: u64,
    ) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let bag_seed = rng.random();
        let board = table.board(config.initial_bounds);
        let mut core = GameCore::with_board(config, bag_seed, board);
        let log = EventLog::new();
        core.add_observer(Box::new(log.clone()));
        Self {
            core,
            table,
            timer,
            log,
            rng,
            bot,
            reject_rate,
            bag_seed,
            resyncs: 0,
        }
    }

    fn play_turn(&mut self, turn: usize) -> anyhow::Result<TurnRecord> {
        let player = self
            .table
            .player_for_turn(turn)
            .ok_or_else(|| anyhow::anyhow!("no players seated"))?;
        let mut operations = Vec::new();
        self.log.take();

        let kind = match self.core.spawn_piece(player, self.table.kings()) {
            Ok(plan) => plan.kind,
            Err(e) => {
                return Ok(TurnRecord {
                    turn,
                    player,
                    kind: None,
                    outcome: TurnOutcome::SpawnFailed {
                        error: e.to_string(),
                    },
                    operations,
                });
            }
        };
        self.timer.reset();

        match self.bot {
            BotStyle::Careful => self.steer_towards_king(player, &mut operations),
            BotStyle::Reckless => self.wander(&mut operations),
        }
        self.fall(&mut operations);

        let events = self.log.take();
        let outcome = self.settle(&events)?;
        Ok(TurnRecord {
            turn,
            player,
            kind: Some(kind),
            outcome,
            operations,
        })
    }

    /// Enqueues and drains a single operation, returning its outcome.
    fn step(
        &mut self,
        operation: Operation,
        operations: &mut Vec<ProcessedOperation>,
    ) -> Option<OperationOutcome> {
        if !self.core.enqueue(operation) {
            return None;
        }
        let report = self.core.drain();
        let outcome = report.processed.first().map(|p| p.outcome);
        operations.extend(report.processed);
        outcome
    }

    /// Moves the airborne piece towards the owner's king until it touches existing cells.
    fn steer_towards_king(&mut self, player: PlayerId, operations: &mut Vec<ProcessedOperation>) {
        let Some(king) = self.table.kings().get(&player).copied() else {
            return;
        };
        for _ in 0..MAX_STEERING_MOVES {
            let Some(&piece) = self.core.active_piece() else {
                return;
            };
            let anchor = piece.anchor();
            if legality::touches_occupied(self.core.board(), piece.shape(), anchor) {
                return;
            }
            let distance = |dx: i32, dz: i32| {
                let target = anchor.offset(dx, dz);
                target.x.abs_diff(king.position.x) + target.z.abs_diff(king.position.z)
            };
            let mut moves: Vec<_> = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .into_iter()
                .filter(|&(dx, dz)| distance(dx, dz) < distance(0, 0))
                .collect();
            moves.sort_by_key(|&(dx, dz)| distance(dx, dz));

            let moved = moves.into_iter().any(|(dx, dz)| {
                let operation = if dx == 0 {
                    Operation::TranslateZ { dir: dz }
                } else {
                    Operation::TranslateX { dir: dx }
                };
                self.step(operation, operations)
                    .is_some_and(|outcome| outcome.is_applied())
            });
            if !moved {
                return;
            }
        }
    }

    fn wander(&mut self, operations: &mut Vec<ProcessedOperation>) {
        let count = self.rng.random_range(0..=MAX_WANDER_MOVES);
        for _ in 0..count {
            let operation = match self.rng.random_range(0..5) {
                0 => Operation::TranslateX { dir: 1 },
                1 => Operation::TranslateX { dir: -1 },
                2 => Operation::TranslateZ { dir: 1 },
                3 => Operation::TranslateZ { dir: -1 },
                _ => Operation::Rotate {
                    direction: if self.rng.random_bool(0.5) {
                        RotationDirection::Clockwise
                    } else {
                        RotationDirection::CounterClockwise
                    },
                },
            };
            self.step(operation, operations);
        }
        self.step(Operation::HardDrop, operations);
    }

    /// Runs the fall clock until the piece is gone or the turn runs out of time.
    fn fall(&mut self, operations: &mut Vec<ProcessedOperation>) {
        let max_frames =
            (u64::from(self.core.config().start_height) + 2) * self.timer.interval_frames();
        for _ in 0..max_frames {
            if self.core.active_piece().is_none() {
                return;
            }
            if self.timer.increment_frame(&mut self.core) {
                operations.extend(self.core.drain().processed);
            }
        }
        if self.core.active_piece().is_some() {
            self.step(
                Operation::Cleanup {
                    reason: DiscardReason::Other("turn time limit".to_owned()),
                },
                operations,
            );
        }
    }

    /// Plays the authority's side: accept or reject a placement, answer resync requests.
    fn settle(&mut self, events: &[CoreEvent]) -> anyhow::Result<TurnOutcome> {
        for event in events {
            match event {
                CoreEvent::PiecePlaced { cells, .. } => {
                    if self.rng.random_bool(self.reject_rate) {
                        let cells = self.core.undo_last_placement()?;
                        return Ok(TurnOutcome::Rejected { cells });
                    }
                    if events.iter().any(CoreEvent::is_resync_requested) {
                        self.core.apply_board_resync(self.core.board_snapshot());
                        self.resyncs += 1;
                    }
                    return Ok(TurnOutcome::Placed {
                        cells: cells.clone(),
                    });
                }
                CoreEvent::Exploded { at, reason } => {
                    return Ok(TurnOutcome::Exploded {
                        at: *at,
                        reason: reason.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(TurnOutcome::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use shaktris_engine::TurnPhase;

    use super::*;

    fn simulation(players: usize, bot: BotStyle, reject_rate: f64) -> Simulation {
        let config = CoreConfig::default();
        let table = Table::around(config.initial_bounds, players).unwrap();
        let timer = FallTimer::new(60, Duration::from_millis(100));
        Simulation::new(config, table, timer, bot, reject_rate, 7)
    }

    #[test]
    fn test_careful_bot_places_first_piece() {
        let mut simulation = simulation(1, BotStyle::Careful, 0.0);
        let record = simulation.play_turn(0).unwrap();

        let TurnOutcome::Placed { cells } = &record.outcome else {
            panic!("unexpected outcome: {:?}", record.outcome);
        };
        assert_eq!(cells.len(), 4);
        assert_eq!(simulation.core.board().count_owned_by(PlayerId(1)), 12);
        assert_eq!(simulation.core.phase(), TurnPhase::PiecePlacement);
        assert!(
            record
                .operations
                .iter()
                .any(|p| p.operation == Operation::Place)
        );
    }

    #[test]
    fn test_rejected_placement_is_reverted() {
        let mut simulation = simulation(1, BotStyle::Careful, 1.0);
        let record = simulation.play_turn(0).unwrap();

        assert!(record.outcome.is_rejected());
        assert_eq!(simulation.core.board().count_owned_by(PlayerId(1)), 8);
        assert_eq!(simulation.core.phase(), TurnPhase::FallingPiece);
        assert!(simulation.core.active_piece().is_none());
    }

    #[test]
    fn test_every_turn_ends_without_active_piece() {
        let mut simulation = simulation(4, BotStyle::Reckless, 0.0);
        for turn in 0..12 {
            let record = simulation.play_turn(turn).unwrap();
            assert!(!record.outcome.is_spawn_failed());
            assert!(simulation.core.active_piece().is_none());
            assert!(simulation.core.queue().is_empty());
        }
    }

    #[test]
    fn test_same_seed_same_match() {
        let mut first = simulation(2, BotStyle::Reckless, 0.5);
        let mut second = simulation(2, BotStyle::Reckless, 0.5);
        for turn in 0..6 {
            let a = first.play_turn(turn).unwrap();
            let b = second.play_turn(turn).unwrap();
            assert_eq!(a.outcome, b.outcome);
            assert_eq!(a.kind, b.kind);
        }
        assert_eq!(first.core.snapshot(), second.core.snapshot());
    }
}
