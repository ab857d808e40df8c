use std::{cell::RefCell, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{ActivePiece, BoardCoord, Bounds, BoundsExpansion, PieceKind, PlayerId};

use super::{
    game_core::TurnPhase,
    operation::{DiscardReason, Operation},
};

/// Change notification emitted by [`GameCore`](super::GameCore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoreEvent {
    /// Cells at these coordinates were written or cleared.
    BoardChanged { changed: Vec<BoardCoord> },
    /// The active piece moved, turned, landed, or went away.
    ActivePieceChanged { piece: Option<ActivePiece> },
    PhaseChanged { from: TurnPhase, to: TurnPhase },
    /// The falling piece was destroyed at `at`. Renderers play the effect here.
    Exploded { at: BoardCoord, reason: DiscardReason },
    /// A piece was locked into the board. Sent to the remote authority for approval.
    PiecePlaced {
        owner: PlayerId,
        kind: PieceKind,
        cells: Vec<BoardCoord>,
    },
    BoundsExpanded(BoundsExpansion),
    /// Local data no longer covers the board; the authority should push a full board.
    ResyncRequested { bounds: Bounds },
    /// A rejected placement was removed again.
    PlacementReverted { cells: Vec<BoardCoord> },
    /// The board was replaced by the authority's copy.
    BoardResynced { bounds: Bounds },
}

/// Operations an observer asks to run after a notification.
///
/// They go through the same acceptance check as
/// [`GameCore::enqueue`](super::GameCore::enqueue) and, during a drain,
/// are processed in the same pass.
#[derive(Debug, Default)]
pub struct FollowUps {
    operations: Vec<Operation>,
}

impl FollowUps {
    pub fn enqueue(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub(crate) fn take(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }
}

/// Receiver of [`CoreEvent`]s: renderer, network bridge, UI.
///
/// Observers see the state through the event only and cannot mutate the
/// core directly; they may request operations through [`FollowUps`].
pub trait CoreObserver: fmt::Debug {
    fn on_event(&mut self, event: &CoreEvent, follow_ups: &mut FollowUps);
}

/// Observer that records every event into a shared buffer.
///
/// Clones share the same buffer, so one clone can be registered with the
/// core while another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<CoreEvent>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<CoreEvent> {
        self.events.borrow().clone()
    }

    /// Removes and returns the recorded events.
    pub fn take(&self) -> Vec<CoreEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl CoreObserver for EventLog {
    fn on_event(&mut self, event: &CoreEvent, _follow_ups: &mut FollowUps) {
        self.events.borrow_mut().push(event.clone());
    }
}
