pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SpawnError {
    #[display("a piece is already in play")]
    PieceInPlay,
    #[display("no king found for player {owner}")]
    NoKing { owner: PlayerId },
    #[display("no free spawn cell in front of player {owner}'s king")]
    NoFreeCell { owner: PlayerId },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum UndoPlacementError {
    #[display("no placement to undo")]
    NothingToUndo,
    #[display("cannot undo while a piece is in play")]
    PieceInPlay,
}
