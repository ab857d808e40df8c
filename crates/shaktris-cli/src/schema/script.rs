use serde::{Deserialize, Serialize};
use shaktris_engine::{
    BagSeed, BoardCoord, BoardSnapshot, CoreEvent, CoreSnapshot, Operation, PlayerId,
    ProcessedOperation, SpawnPlan,
};

use crate::setup::Seat;

/// Input of the `replay` command.
///
/// ```json
/// {
///   "seed": "000102030405060708090a0b0c0d0e0f",
///   "seats": [{ "player": 1, "king": { "position": { "x": 11, "z": 1 }, "facing": "south" } }],
///   "steps": [
///     { "step": "spawn", "player": 1 },
///     { "step": "enqueue", "operation": { "op": "translate_z", "dir": -1 } },
///     { "step": "drain" },
///     { "step": "tick", "frames": 600 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub seed: BagSeed,
    #[serde(default)]
    pub seats: Vec<Seat>,
    /// Starting board. Built from `seats` when absent.
    #[serde(default)]
    pub board: Option<BoardSnapshot>,
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    Spawn { player: PlayerId },
    Enqueue { operation: Operation },
    Drain,
    /// Advance the automatic fall clock, draining after each frame.
    Tick { frames: u64 },
    UndoLastPlacement,
    Resync { board: BoardSnapshot },
}

/// Output of the `replay` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    pub steps: Vec<StepResult>,
    pub final_snapshot: CoreSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub outcome: StepOutcome,
    /// Events the core emitted while running the step
    pub events: Vec<CoreEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    Spawned { plan: SpawnPlan },
    Enqueued { accepted: bool },
    Drained { processed: Vec<ProcessedOperation> },
    Ticked { processed: Vec<ProcessedOperation> },
    Reverted { cells: Vec<BoardCoord> },
    Resynced,
    Failed { error: String },
}
