use std::time::Duration;

use super::{game_core::GameCore, operation::Operation};

/// Frame-driven automatic fall.
///
/// Every interval the falling piece is lowered by one; a piece already at
/// height 0 is hard-dropped instead. The timer only enqueues, the caller
/// drains.
#[derive(Debug, Clone)]
pub struct FallTimer {
    fps: u64,
    interval_frames: u64,
    total_frames: u64,
    countdown: u64,
}

fn interval_frames(interval: Duration, fps: u64) -> u64 {
    let frames = interval.as_millis() * u128::from(fps) / 1000;
    u64::try_from(frames).unwrap_or(u64::MAX).max(1)
}

impl FallTimer {
    /// Creates a timer ticking at `fps` frames per second that fires every `interval`.
    #[must_use]
    pub fn new(fps: u64, interval: Duration) -> Self {
        let fps = fps.max(1);
        let interval_frames = interval_frames(interval, fps);
        Self {
            fps,
            interval_frames,
            total_frames: 0,
            countdown: interval_frames,
        }
    }

    #[must_use]
    pub fn fps(&self) -> u64 {
        self.fps
    }

    #[must_use]
    pub fn interval_frames(&self) -> u64 {
        self.interval_frames
    }

    /// Time elapsed since the timer was created.
    #[must_use]
    pub fn duration(&self) -> Duration {
        const NANOS_PER_SEC: u64 = 1_000_000_000;
        let secs = self.total_frames / self.fps;
        let nanos = (self.total_frames % self.fps) * NANOS_PER_SEC / self.fps;
        Duration::new(secs, u32::try_from(nanos).unwrap_or_default())
    }

    /// Restarts the countdown, e.g. after a new piece spawned.
    pub fn reset(&mut self) {
        self.countdown = self.interval_frames;
    }

    /// Advances one frame.
    ///
    /// Returns `true` if a fall operation was enqueued on `core`.
    pub fn increment_frame(&mut self, core: &mut GameCore) -> bool {
        self.total_frames += 1;
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return false;
        }
        self.countdown = self.interval_frames;

        let Some(piece) = core.active_piece() else {
            return false;
        };
        let operation = if piece.height() > 0 {
            Operation::SetHeight {
                value: -1,
                relative: true,
            }
        } else {
            Operation::HardDrop
        };
        core.enqueue(operation)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        BagSeed, BoardCoord, CoreConfig, Direction, KingPlacement, PlayerId, TurnPhase,
    };

    use super::*;

    const P1: PlayerId = PlayerId(1);

    fn spawned_core() -> GameCore {
        let mut core = GameCore::new(CoreConfig::default(), BagSeed::from_bytes([3; 16]));
        let king = KingPlacement {
            position: BoardCoord::new(12, 2),
            facing: Direction::South,
        };
        core.spawn_piece(P1, &|_: PlayerId| Some(king)).unwrap();
        core
    }

    #[test]
    fn test_interval_in_frames() {
        assert_eq!(FallTimer::new(60, Duration::from_millis(500)).interval_frames(), 30);
        assert_eq!(FallTimer::new(60, Duration::ZERO).interval_frames(), 1);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut core = spawned_core();
        let mut timer = FallTimer::new(60, Duration::from_millis(500));

        for _ in 0..29 {
            assert!(!timer.increment_frame(&mut core));
        }
        assert!(timer.increment_frame(&mut core));
        core.drain();
        assert_eq!(core.active_piece().unwrap().height(), 9);

        for _ in 0..29 {
            assert!(!timer.increment_frame(&mut core));
        }
        assert!(timer.increment_frame(&mut core));
        core.drain();
        assert_eq!(core.active_piece().unwrap().height(), 8);
    }

    #[test]
    fn test_hard_drops_grounded_piece() {
        let mut core = spawned_core();
        core.submit(Operation::SetHeight {
            value: 0,
            relative: false,
        });
        let mut timer = FallTimer::new(10, Duration::from_millis(100));

        assert!(timer.increment_frame(&mut core));
        assert_eq!(core.queue().pending().next(), Some(&Operation::HardDrop));
        core.drain();
        assert_eq!(core.phase(), TurnPhase::PiecePlacement);
        assert_eq!(core.board().count_owned_by(P1), 4);
    }

    #[test]
    fn test_nothing_enqueued_without_piece() {
        let mut core = GameCore::new(CoreConfig::default(), BagSeed::from_bytes([3; 16]));
        let mut timer = FallTimer::new(10, Duration::from_millis(100));
        assert!(!timer.increment_frame(&mut core));
        assert!(core.queue().is_empty());
    }

    #[test]
    fn test_duration() {
        let mut core = GameCore::new(CoreConfig::default(), BagSeed::from_bytes([3; 16]));
        let mut timer = FallTimer::new(60, Duration::from_secs(1));
        for _ in 0..90 {
            timer.increment_frame(&mut core);
        }
        assert_eq!(timer.duration(), Duration::from_millis(1500));
    }
}
