use std::{path::PathBuf, time::Duration};

use shaktris_engine::{Board, CoreConfig, EventLog, FallTimer, GameCore};

use crate::{
    schema::script::{ReplayResult, ReplayScript, ScriptStep, StepOutcome, StepResult},
    setup::Table,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Script JSON file
    script: PathBuf,
    /// Frames per second of the fall clock used by `tick` steps
    #[arg(long, default_value_t = 60)]
    fps: u64,
    /// Automatic fall interval in milliseconds
    #[arg(long, default_value_t = 500)]
    fall_interval_ms: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReplayArg, config: CoreConfig) -> anyhow::Result<()> {
    let ReplayArg {
        script,
        fps,
        fall_interval_ms,
        output,
    } = arg;

    eprintln!("Loading script from {}...", script.display());
    let script: ReplayScript = util::read_json_file("script", script)?;
    eprintln!("Loaded {} steps", script.steps.len());

    let timer = FallTimer::new(*fps, Duration::from_millis(*fall_interval_ms));
    let result = replay(script, config, timer);
    let failed = result
        .steps
        .iter()
        .filter(|step| matches!(step.outcome, StepOutcome::Failed { .. }))
        .count();
    eprintln!("Replayed {} steps ({failed} failed)", result.steps.len());

    Output::save_json(&result, output.clone())?;
    Ok(())
}

fn replay(script: ReplayScript, config: CoreConfig, mut timer: FallTimer) -> ReplayResult {
    let ReplayScript {
        seed,
        seats,
        board,
        steps,
    } = script;
    let table = Table::new(seats);
    let board = match board {
        Some(snapshot) => {
            let mut board = Board::new(snapshot.bounds);
            board.rebuild(
                snapshot.bounds,
                snapshot.cells.into_iter().map(|entry| (entry.at, entry.cell)),
            );
            board
        }
        None => table.board(config.initial_bounds),
    };

    let mut core = GameCore::with_board(config, seed, board);
    let log = EventLog::new();
    core.add_observer(Box::new(log.clone()));

    let results = steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| {
            let outcome = run_step(&mut core, &table, &mut timer, step);
            StepResult {
                index,
                outcome,
                events: log.take(),
            }
        })
        .collect();

    ReplayResult {
        steps: results,
        final_snapshot: core.snapshot(),
    }
}

fn run_step(
    core: &mut GameCore,
    table: &Table,
    timer: &mut FallTimer,
    step: ScriptStep,
) -> StepOutcome {
    match step {
        ScriptStep::Spawn { player } => match core.spawn_piece(player, table.kings()) {
            Ok(plan) => {
                timer.reset();
                StepOutcome::Spawned { plan }
            }
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
            },
        },
        ScriptStep::Enqueue { operation } => StepOutcome::Enqueued {
            accepted: core.enqueue(operation),
        },
        ScriptStep::Drain => StepOutcome::Drained {
            processed: core.drain().processed,
        },
        ScriptStep::Tick { frames } => {
            let mut processed = Vec::new();
            for _ in 0..frames {
                if timer.increment_frame(core) {
                    processed.extend(core.drain().processed);
                }
            }
            StepOutcome::Ticked { processed }
        }
        ScriptStep::UndoLastPlacement => match core.undo_last_placement() {
            Ok(cells) => StepOutcome::Reverted { cells },
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
            },
        },
        ScriptStep::Resync { board } => {
            core.apply_board_resync(board);
            StepOutcome::Resynced
        }
    }
}

#[cfg(test)]
mod tests {
    use shaktris_engine::{BoardCoord, CoreEvent, Operation, PlayerId, TurnPhase};

    use super::*;

    const SCRIPT: &str = r#"{
        "seed": "000102030405060708090a0b0c0d0e0f",
        "seats": [
            { "player": 1, "king": { "position": { "x": 11, "z": 1 }, "facing": "south" } }
        ],
        "steps": [
            { "step": "enqueue", "operation": { "op": "hard_drop" } },
            { "step": "spawn", "player": 2 },
            { "step": "spawn", "player": 1 },
            { "step": "enqueue", "operation": { "op": "set_height", "value": 5 } },
            { "step": "drain" },
            { "step": "tick", "frames": 3 },
            { "step": "enqueue", "operation": { "op": "cleanup", "reason": "not_connected" } },
            { "step": "drain" },
            { "step": "undo_last_placement" }
        ]
    }"#;

    fn run_script() -> ReplayResult {
        let script: ReplayScript = serde_json::from_str(SCRIPT).unwrap();
        replay(
            script,
            CoreConfig::default(),
            FallTimer::new(10, Duration::from_millis(100)),
        )
    }

    #[test]
    fn test_script_steps() {
        let result = run_script();
        let outcomes: Vec<_> = result.steps.iter().map(|s| &s.outcome).collect();

        assert!(matches!(
            outcomes[0],
            StepOutcome::Enqueued { accepted: false }
        ));
        assert!(matches!(outcomes[1], StepOutcome::Failed { .. }));
        let StepOutcome::Spawned { plan } = outcomes[2] else {
            panic!("unexpected outcome: {:?}", outcomes[2]);
        };
        assert_eq!(plan.owner, PlayerId(1));
        assert!(matches!(outcomes[3], StepOutcome::Enqueued { accepted: true }));
        assert!(matches!(outcomes[4], StepOutcome::Drained { processed } if processed.len() == 1));
        let StepOutcome::Ticked { processed } = outcomes[5] else {
            panic!("unexpected outcome: {:?}", outcomes[5]);
        };
        assert_eq!(
            processed.iter().map(|p| &p.operation).collect::<Vec<_>>(),
            vec![&Operation::SetHeight {
                value: -1,
                relative: true
            }; 3]
        );
        assert!(matches!(outcomes[8], StepOutcome::Failed { .. }));
        assert!(result.final_snapshot.active_piece.is_none());
    }

    #[test]
    fn test_events_are_split_per_step() {
        let result = run_script();
        assert!(result.steps[0].events.is_empty());
        assert!(
            result.steps[2]
                .events
                .iter()
                .any(CoreEvent::is_active_piece_changed)
        );
        assert!(
            result.steps[7]
                .events
                .contains(&CoreEvent::PhaseChanged {
                    from: TurnPhase::FallingPiece,
                    to: TurnPhase::PiecePlacement,
                })
        );
        assert_eq!(result.final_snapshot.phase, TurnPhase::PiecePlacement);
        assert!(result.final_snapshot.active_piece.is_none());
    }

    #[test]
    fn test_board_is_built_from_seats() {
        let result = run_script();
        let board = &result.final_snapshot.board;
        assert!(board.get(BoardCoord::new(11, 1)).is_some());
        assert!(board.get(BoardCoord::new(10, 1)).is_some());
    }
}
