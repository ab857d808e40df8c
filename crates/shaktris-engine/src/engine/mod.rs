//! Turn engine built on the core data structures.
//!
//! - [`GameCore`] - Board, falling piece, turn phase and the operation queue
//! - [`MovementQueue`] - FIFO of pending [`Operation`]s with a single-flight drain
//! - [`PieceBag`] - 7-bag piece generation, seeded by [`BagSeed`]
//! - [`SpawnPlanner`] - King-relative spawn positions
//! - [`CoreEvent`] / [`CoreObserver`] - Change notifications for renderers and the network
//! - [`FallTimer`] - Frame-based automatic fall
//! - [`CoreSnapshot`] - Owned read-only copy of the state
//!
//! # Turn Flow
//!
//! 1. [`GameCore::spawn_piece`] puts the owner's next piece in front of their king
//! 2. Input and [`FallTimer`] enqueue operations; [`GameCore::drain`] applies them
//! 3. A hard drop lands and places the piece, or the piece explodes
//! 4. The phase switches to [`TurnPhase::PiecePlacement`] for the chess move
//! 5. The remote authority confirms the placement, or the client calls
//!    [`GameCore::undo_last_placement`] / [`GameCore::apply_board_resync`]

pub use self::{
    config::*, event::*, fall_timer::*, game_core::*, movement_queue::*, operation::*,
    piece_bag::*, snapshot::*, spawn_planner::*,
};

mod config;
mod event;
mod fall_timer;
mod game_core;
mod movement_queue;
mod operation;
mod piece_bag;
mod snapshot;
mod spawn_planner;
