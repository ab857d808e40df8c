use serde::{Deserialize, Serialize};

use crate::{BoardCoord, RotationDirection};

/// Why a falling piece was discarded instead of placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    #[display("must connect to existing cells")]
    NotConnected,
    #[display("landing cells are occupied")]
    LandingOccupied,
    /// Reason supplied by an external caller.
    #[display("{_0}")]
    Other(String),
}

/// A mutating request against the active piece and the board.
///
/// Operations are queued and applied one at a time, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Move the piece by `dir` along the x axis.
    TranslateX { dir: i32 },
    /// Move the piece by `dir` along the z axis.
    TranslateZ { dir: i32 },
    /// Change the altitude to `value`, or by `value` when `relative`.
    SetHeight {
        value: i32,
        #[serde(default)]
        relative: bool,
    },
    Rotate { direction: RotationDirection },
    /// Land the piece, slide it forward while it stays connected, then place it.
    HardDrop,
    /// Lock the piece's cells into the board.
    Place,
    /// Discard the piece without touching the board.
    Explode { at: BoardCoord, reason: DiscardReason },
    /// End the falling-piece phase. Always valid.
    Cleanup { reason: DiscardReason },
}

impl Operation {
    /// Returns whether the operation is only accepted while a piece is falling.
    #[must_use]
    pub fn requires_falling_piece(&self) -> bool {
        !matches!(self, Operation::Explode { .. } | Operation::Cleanup { .. })
    }
}

/// Result of applying one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The state changed as requested.
    Applied,
    /// The request was illegal and dropped without any change.
    Discarded,
    /// The request was illegal and an explosion was queued in its place.
    Exploded,
    /// There was no active piece to act on.
    Ignored,
}

/// One entry of a [`DrainReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedOperation {
    pub operation: Operation,
    pub outcome: OperationOutcome,
}

/// Operations processed by one drain pass, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub processed: Vec<ProcessedOperation>,
}

impl DrainReport {
    pub fn operations(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.processed.iter().map(|p| &p.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explode_and_cleanup_skip_phase_check() {
        let reason = DiscardReason::NotConnected;
        assert!(!Operation::Cleanup {
            reason: reason.clone()
        }
        .requires_falling_piece());
        assert!(!Operation::Explode {
            at: BoardCoord::new(0, 0),
            reason
        }
        .requires_falling_piece());
        assert!(Operation::Place.requires_falling_piece());
        assert!(Operation::HardDrop.requires_falling_piece());
        assert!(Operation::TranslateX { dir: 1 }.requires_falling_piece());
    }

    #[test]
    fn test_operation_json_format() {
        let op: Operation = serde_json::from_str(r#"{"op":"set_height","value":-1}"#).unwrap();
        assert_eq!(
            op,
            Operation::SetHeight {
                value: -1,
                relative: false
            }
        );

        let op: Operation =
            serde_json::from_str(r#"{"op":"rotate","direction":"counter_clockwise"}"#).unwrap();
        assert_eq!(
            op,
            Operation::Rotate {
                direction: RotationDirection::CounterClockwise
            }
        );

        let json = serde_json::to_string(&Operation::HardDrop).unwrap();
        assert_eq!(json, r#"{"op":"hard_drop"}"#);
    }

    #[test]
    fn test_discard_reason_display() {
        assert_eq!(
            DiscardReason::NotConnected.to_string(),
            "must connect to existing cells"
        );
        assert_eq!(
            DiscardReason::Other("timeout".to_owned()).to_string(),
            "timeout"
        );
    }
}
