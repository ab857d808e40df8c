use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shaktris_engine::{
    BagSeed, BoardCoord, CoreConfig, CoreSnapshot, DiscardReason, PieceKind, PlayerId,
    ProcessedOperation,
};

use crate::{command::simulate::BotStyle, setup::Seat};

/// Recorded simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedMatch {
    /// Timestamp when recording was created (ISO 8601 format)
    pub recorded_at: DateTime<Utc>,
    /// Seed of the bot and simulated-authority decisions
    pub sim_seed: u64,
    /// Seed of the piece bag and spawn lanes
    pub bag_seed: BagSeed,
    pub config: CoreConfig,
    pub bot: BotStyle,
    pub seats: Vec<Seat>,
    pub turns: Vec<TurnRecord>,
    /// Core state after the last turn
    pub final_snapshot: CoreSnapshot,
}

/// One falling-piece turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Turn number (0-indexed)
    pub turn: usize,
    pub player: PlayerId,
    /// Kind of the spawned piece, if the spawn succeeded
    pub kind: Option<PieceKind>,
    pub outcome: TurnOutcome,
    /// Every operation the core processed during the turn, in order
    pub operations: Vec<ProcessedOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The piece was placed and accepted by the authority.
    Placed { cells: Vec<BoardCoord> },
    /// The piece was placed, then rejected by the authority and reverted.
    Rejected { cells: Vec<BoardCoord> },
    Exploded { at: BoardCoord, reason: DiscardReason },
    /// The piece never landed within the turn's time limit.
    TimedOut,
    SpawnFailed { error: String },
}
