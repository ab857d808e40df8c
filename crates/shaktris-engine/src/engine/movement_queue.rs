use std::collections::VecDeque;

use super::operation::Operation;

/// Drain state of a [`MovementQueue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::IsVariant)]
pub enum QueueState {
    #[default]
    Idle,
    Draining,
}

/// FIFO of pending operations with a single-flight drain flag.
///
/// Pushing never processes anything. A push while [`QueueState::Idle`]
/// schedules a drain; a push while [`QueueState::Draining`] is appended and
/// picked up by the running drain before it finishes.
///
/// # Example
///
/// ```
/// use shaktris_engine::{MovementQueue, Operation};
///
/// let mut queue = MovementQueue::new();
/// queue.push(Operation::TranslateX { dir: 1 });
/// assert!(queue.is_drain_scheduled());
///
/// assert!(queue.begin_drain());
/// queue.push(Operation::HardDrop);
/// assert_eq!(queue.pop(), Some(Operation::TranslateX { dir: 1 }));
/// assert_eq!(queue.pop(), Some(Operation::HardDrop));
/// assert_eq!(queue.pop(), None);
/// queue.end_drain();
/// assert!(!queue.is_drain_scheduled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MovementQueue {
    pending: VecDeque<Operation>,
    state: QueueState,
    drain_scheduled: bool,
}

impl MovementQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> QueueState {
        self.state
    }

    #[must_use]
    pub fn is_drain_scheduled(&self) -> bool {
        self.drain_scheduled
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.pending.iter()
    }

    /// Appends `operation`, scheduling a drain if none is running.
    pub fn push(&mut self, operation: Operation) {
        self.pending.push_back(operation);
        if self.state.is_idle() {
            self.drain_scheduled = true;
        }
    }

    /// Enters [`QueueState::Draining`].
    ///
    /// Returns `false` if a drain is already running.
    pub fn begin_drain(&mut self) -> bool {
        if self.state.is_draining() {
            return false;
        }
        self.state = QueueState::Draining;
        self.drain_scheduled = false;
        true
    }

    pub fn pop(&mut self) -> Option<Operation> {
        self.pending.pop_front()
    }

    /// Returns to [`QueueState::Idle`].
    pub fn end_drain(&mut self) {
        debug_assert!(self.pending.is_empty(), "drain ended with pending operations");
        self.state = QueueState::Idle;
    }
}
