use std::collections::HashMap;

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    ActivePiece, Board, BoardCoord, BoundsExpansion, Cell, PieceKind, PlayerId, RotationDirection,
    SpawnError, UndoPlacementError, core::legality,
};

use super::{
    config::CoreConfig,
    event::{CoreEvent, CoreObserver, FollowUps},
    movement_queue::MovementQueue,
    operation::{DiscardReason, DrainReport, Operation, OperationOutcome, ProcessedOperation},
    piece_bag::{BagSeed, PieceBag},
    snapshot::{BoardSnapshot, CoreSnapshot},
    spawn_planner::{KingPlacement, SpawnPlan, SpawnPlanner},
};

/// Random stream used for spawn lanes, separate from the bag's.
const SPAWN_STREAM: u64 = 1;

/// Which half of a turn is in progress.
///
/// Serialized with the names the UI shows: `"tetris"` and `"chess"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
pub enum TurnPhase {
    /// A piece is (or is about to be) falling.
    #[serde(rename = "tetris")]
    #[display("tetris")]
    FallingPiece,
    /// The falling piece is gone; the chess move is up.
    #[serde(rename = "chess")]
    #[display("chess")]
    PiecePlacement,
}

/// Source of king locations, backed by the chess-state authority.
pub trait KingLocator {
    fn locate_king(&self, owner: PlayerId) -> Option<KingPlacement>;
}

impl KingLocator for HashMap<PlayerId, KingPlacement> {
    fn locate_king(&self, owner: PlayerId) -> Option<KingPlacement> {
        self.get(&owner).copied()
    }
}

impl<F> KingLocator for F
where
    F: Fn(PlayerId) -> Option<KingPlacement>,
{
    fn locate_king(&self, owner: PlayerId) -> Option<KingPlacement> {
        self(owner)
    }
}

#[derive(Debug, Clone)]
struct PlacementRecord {
    owner: PlayerId,
    kind: PieceKind,
    cells: Vec<BoardCoord>,
}

/// Active-piece state machine: board, falling piece, turn phase and the
/// movement queue that serializes every change to them.
///
/// # Turn cycle
///
/// 1. [`Self::spawn_piece`] draws the next kind from the bag and places a
///    new piece in front of the owner's king (phase becomes
///    [`TurnPhase::FallingPiece`])
/// 2. Input and automatic fall call [`Self::enqueue`]; [`Self::drain`]
///    applies queued operations in order
/// 3. `Place` or `Explode` removes the piece and switches to
///    [`TurnPhase::PiecePlacement`]
/// 4. The chess move happens outside the core, then the next spawn
///
/// Illegal requests never produce errors: they are dropped, or the piece
/// explodes. Observers registered with [`Self::add_observer`] receive a
/// [`CoreEvent`] for every change.
///
/// # Example
///
/// ```
/// use shaktris_engine::{
///     BagSeed, BoardCoord, CoreConfig, Direction, GameCore, KingPlacement, Operation,
///     PlayerId, TurnPhase,
/// };
///
/// let mut core = GameCore::new(CoreConfig::default(), BagSeed::from_bytes([1; 16]));
/// let king = KingPlacement { position: BoardCoord::new(12, 2), facing: Direction::South };
/// let kings = |_: PlayerId| Some(king);
///
/// core.spawn_piece(PlayerId(1), &kings).unwrap();
/// assert!(core.enqueue(Operation::HardDrop));
/// core.drain();
///
/// assert_eq!(core.phase(), TurnPhase::PiecePlacement);
/// assert!(core.active_piece().is_none());
/// assert_eq!(core.board().count_owned_by(PlayerId(1)), 4);
/// ```
#[derive(Debug)]
pub struct GameCore {
    config: CoreConfig,
    board: Board,
    active_piece: Option<ActivePiece>,
    phase: TurnPhase,
    bag: PieceBag,
    spawn_rng: Pcg32,
    planner: SpawnPlanner,
    queue: MovementQueue,
    observers: Vec<Box<dyn CoreObserver>>,
    last_placement: Option<PlacementRecord>,
}

impl GameCore {
    /// Creates a core with an empty board.
    #[must_use]
    pub fn new(config: CoreConfig, seed: BagSeed) -> Self {
        let board = Board::new(config.initial_bounds);
        Self::with_board(config, seed, board)
    }

    /// Creates a core starting from an existing board.
    #[must_use]
    pub fn with_board(config: CoreConfig, seed: BagSeed, board: Board) -> Self {
        Self {
            planner: SpawnPlanner::new(&config),
            bag: PieceBag::with_seed(seed),
            spawn_rng: seed.rng(SPAWN_STREAM),
            board,
            active_piece: None,
            phase: TurnPhase::FallingPiece,
            queue: MovementQueue::new(),
            observers: Vec::new(),
            last_placement: None,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.active_piece.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn queue(&self) -> &MovementQueue {
        &self.queue
    }

    #[must_use]
    pub fn bag(&self) -> &PieceBag {
        &self.bag
    }

    #[must_use]
    pub fn board_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from(&self.board)
    }

    #[must_use]
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            phase: self.phase,
            active_piece: self.active_piece,
            board: self.board_snapshot(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn CoreObserver>) {
        self.observers.push(observer);
    }

    /// Queues `operation`.
    ///
    /// Everything except `Explode` and `Cleanup` is rejected (returns
    /// `false`) unless a piece is falling. Nothing is applied until
    /// [`Self::drain`] runs.
    pub fn enqueue(&mut self, operation: Operation) -> bool {
        if operation.requires_falling_piece()
            && (self.active_piece.is_none() || !self.phase.is_falling_piece())
        {
            return false;
        }
        self.queue.push(operation);
        true
    }

    /// Applies queued operations one at a time until the queue is empty.
    ///
    /// Operations queued while draining (explosions substituted for
    /// illegal moves, observer follow-ups) run in the same pass.
    pub fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        if !self.queue.begin_drain() {
            return report;
        }
        while let Some(operation) = self.queue.pop() {
            let outcome = self.apply(&operation);
            report.processed.push(ProcessedOperation { operation, outcome });
        }
        self.queue.end_drain();
        report
    }

    /// [`Self::enqueue`] followed by [`Self::drain`].
    pub fn submit(&mut self, operation: Operation) -> bool {
        let accepted = self.enqueue(operation);
        self.drain();
        accepted
    }

    /// Starts a falling-piece turn for `owner`.
    ///
    /// The next kind is only drawn from the bag when the spawn succeeds. On
    /// failure the phase is left as it was. A successful spawn settles the
    /// previous placement, which can no longer be undone.
    pub fn spawn_piece<K>(&mut self, owner: PlayerId, kings: &K) -> Result<SpawnPlan, SpawnError>
    where
        K: KingLocator + ?Sized,
    {
        if self.active_piece.is_some() {
            return Err(SpawnError::PieceInPlay);
        }
        let king = kings.locate_king(owner);
        let kind = self.bag.peek();
        let Some(plan) = self
            .planner
            .plan(&self.board, owner, kind, king, &mut self.spawn_rng)
        else {
            return Err(if king.is_none() {
                SpawnError::NoKing { owner }
            } else {
                SpawnError::NoFreeCell { owner }
            });
        };
        self.bag.next_kind();
        self.last_placement = None;
        self.update_piece(plan.into_piece());
        self.set_phase(TurnPhase::FallingPiece);
        Ok(plan)
    }

    /// Reverts the last placement after the remote authority rejected it.
    ///
    /// Only cells still holding the placed piece are cleared. The phase
    /// returns to [`TurnPhase::FallingPiece`] with no active piece, waiting
    /// for a new spawn. Returns the cleared coordinates.
    pub fn undo_last_placement(&mut self) -> Result<Vec<BoardCoord>, UndoPlacementError> {
        if self.active_piece.is_some() {
            return Err(UndoPlacementError::PieceInPlay);
        }
        let record = self
            .last_placement
            .take()
            .ok_or(UndoPlacementError::NothingToUndo)?;
        let placed = Cell::Tetromino {
            owner: record.owner,
            kind: record.kind,
        };
        let reverted: Vec<_> = record
            .cells
            .into_iter()
            .filter(|&coord| self.board.get(coord) == Some(&placed))
            .collect();
        for &coord in &reverted {
            self.board.remove(coord);
        }
        self.emit(CoreEvent::BoardChanged {
            changed: reverted.clone(),
        });
        self.emit(CoreEvent::PlacementReverted {
            cells: reverted.clone(),
        });
        self.set_phase(TurnPhase::FallingPiece);
        Ok(reverted)
    }

    /// Replaces the board with the authority's full copy. Local markers are kept.
    pub fn apply_board_resync(&mut self, snapshot: BoardSnapshot) {
        self.board.rebuild(
            snapshot.bounds,
            snapshot.cells.into_iter().map(|entry| (entry.at, entry.cell)),
        );
        self.last_placement = None;
        self.emit(CoreEvent::BoardResynced {
            bounds: self.board.bounds(),
        });
    }

    fn apply(&mut self, operation: &Operation) -> OperationOutcome {
        match operation {
            Operation::TranslateX { dir } => self.translate(*dir, 0),
            Operation::TranslateZ { dir } => self.translate(0, *dir),
            Operation::SetHeight { value, relative } => self.set_height(*value, *relative),
            Operation::Rotate { direction } => self.rotate(*direction),
            Operation::HardDrop => self.hard_drop(),
            Operation::Place => self.place(),
            Operation::Explode { at, reason } => self.explode(*at, reason.clone()),
            Operation::Cleanup { .. } => self.cleanup(),
        }
    }

    fn emit(&mut self, event: CoreEvent) {
        let mut follow_ups = FollowUps::default();
        for observer in &mut self.observers {
            observer.on_event(&event, &mut follow_ups);
        }
        for operation in follow_ups.take() {
            self.enqueue(operation);
        }
    }

    fn update_piece(&mut self, piece: ActivePiece) {
        self.active_piece = Some(piece);
        self.emit(CoreEvent::ActivePieceChanged { piece: Some(piece) });
    }

    fn clear_piece(&mut self) -> bool {
        if self.active_piece.take().is_none() {
            return false;
        }
        self.emit(CoreEvent::ActivePieceChanged { piece: None });
        true
    }

    fn set_phase(&mut self, phase: TurnPhase) {
        if self.phase == phase {
            return;
        }
        let from = self.phase;
        self.phase = phase;
        self.emit(CoreEvent::PhaseChanged { from, to: phase });
    }

    fn queue_explosion(&mut self, at: BoardCoord, reason: DiscardReason) -> OperationOutcome {
        self.queue.push(Operation::Explode { at, reason });
        OperationOutcome::Exploded
    }

    fn is_near_board(&self, piece: &ActivePiece) -> bool {
        piece.height() <= self.config.landing_height
    }

    fn translate(&mut self, dx: i32, dz: i32) -> OperationOutcome {
        let Some(mut piece) = self.active_piece else {
            return OperationOutcome::Ignored;
        };
        let Some(candidate) = piece
            .anchor()
            .checked_offset(dx, dz)
            .filter(|&anchor| piece.shape().fits_at(anchor))
        else {
            return OperationOutcome::Discarded;
        };
        if legality::collides(&self.board, piece.shape(), candidate) {
            return OperationOutcome::Discarded;
        }
        if self.is_near_board(&piece)
            && !legality::is_adjacent(&self.board, piece.shape(), candidate, piece.owner())
        {
            return self.queue_explosion(piece.anchor(), DiscardReason::NotConnected);
        }
        piece.set_anchor(candidate);
        self.update_piece(piece);
        OperationOutcome::Applied
    }

    fn set_height(&mut self, value: i32, relative: bool) -> OperationOutcome {
        let Some(mut piece) = self.active_piece else {
            return OperationOutcome::Ignored;
        };
        let requested = if relative {
            i64::from(piece.height()) + i64::from(value)
        } else {
            i64::from(value)
        };
        let target = u32::try_from(requested.clamp(0, i64::from(self.config.start_height)))
            .unwrap_or_default();

        if target <= self.config.landing_height {
            if legality::collides(&self.board, piece.shape(), piece.anchor()) {
                return OperationOutcome::Discarded;
            }
            if target == 0
                && !legality::is_adjacent(&self.board, piece.shape(), piece.anchor(), piece.owner())
            {
                return self.queue_explosion(piece.anchor(), DiscardReason::NotConnected);
            }
        }
        if target != piece.height() {
            piece.set_height(target);
            self.update_piece(piece);
        }
        OperationOutcome::Applied
    }

    fn rotate(&mut self, direction: RotationDirection) -> OperationOutcome {
        let Some(mut piece) = self.active_piece else {
            return OperationOutcome::Ignored;
        };
        let shape = legality::rotate_shape(piece.shape(), direction);
        if legality::collides(&self.board, &shape, piece.anchor()) {
            return OperationOutcome::Discarded;
        }
        if self.is_near_board(&piece)
            && !legality::is_adjacent(&self.board, &shape, piece.anchor(), piece.owner())
        {
            if piece.height() == 0 {
                return self.queue_explosion(piece.anchor(), DiscardReason::NotConnected);
            }
            return OperationOutcome::Discarded;
        }
        piece.set_shape(shape);
        self.update_piece(piece);
        OperationOutcome::Applied
    }

    fn hard_drop(&mut self) -> OperationOutcome {
        let Some(mut piece) = self.active_piece else {
            return OperationOutcome::Ignored;
        };
        let shape = *piece.shape();
        let mut anchor = piece.anchor();
        if legality::collides(&self.board, &shape, anchor) {
            return self.queue_explosion(anchor, DiscardReason::LandingOccupied);
        }
        if !legality::is_adjacent(&self.board, &shape, anchor, piece.owner()) {
            return self.queue_explosion(anchor, DiscardReason::NotConnected);
        }

        // Slide forward while the piece keeps touching existing cells
        for _ in 0..self.config.slide_limit {
            let next = anchor.offset(0, 1);
            if legality::collides(&self.board, &shape, next)
                || !legality::touches_occupied(&self.board, &shape, next)
            {
                break;
            }
            anchor = next;
        }

        piece.set_height(0);
        piece.set_anchor(anchor);
        self.update_piece(piece);
        self.queue.push(Operation::Place);
        OperationOutcome::Applied
    }

    fn place(&mut self) -> OperationOutcome {
        let Some(piece) = self.active_piece else {
            return OperationOutcome::Ignored;
        };
        let (owner, kind) = (piece.owner(), piece.kind());
        let cell = Cell::Tetromino { owner, kind };
        let cells: Vec<_> = piece.cells().collect();

        let previous = self.board.bounds();
        for &coord in &cells {
            self.board.set(coord, cell);
        }
        let current = self.board.bounds();
        self.last_placement = Some(PlacementRecord {
            owner,
            kind,
            cells: cells.clone(),
        });

        self.clear_piece();
        self.emit(CoreEvent::BoardChanged {
            changed: cells.clone(),
        });
        if previous != current {
            self.emit(CoreEvent::BoundsExpanded(BoundsExpansion { previous, current }));
            self.emit(CoreEvent::ResyncRequested { bounds: current });
        }
        self.emit(CoreEvent::PiecePlaced { owner, kind, cells });
        self.set_phase(TurnPhase::PiecePlacement);
        OperationOutcome::Applied
    }

    fn explode(&mut self, at: BoardCoord, reason: DiscardReason) -> OperationOutcome {
        if !self.clear_piece() {
            return OperationOutcome::Ignored;
        }
        self.emit(CoreEvent::Exploded {
            at,
            reason: reason.clone(),
        });
        self.queue.push(Operation::Cleanup { reason });
        OperationOutcome::Applied
    }

    fn cleanup(&mut self) -> OperationOutcome {
        self.clear_piece();
        self.set_phase(TurnPhase::PiecePlacement);
        OperationOutcome::Applied
    }
}
