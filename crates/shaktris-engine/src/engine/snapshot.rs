use serde::{Deserialize, Serialize};

use crate::{ActivePiece, Board, BoardCoord, Bounds, Cell};

use super::game_core::TurnPhase;

/// One stored board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub at: BoardCoord,
    pub cell: Cell,
}

/// Owned, read-only copy of a board.
///
/// This is also the format in which the remote authority pushes a full
/// board resynchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub bounds: Bounds,
    pub cells: Vec<BoardEntry>,
}

impl BoardSnapshot {
    #[must_use]
    pub fn get(&self, at: BoardCoord) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|entry| entry.at == at)
            .map(|entry| &entry.cell)
    }
}

impl From<&Board> for BoardSnapshot {
    fn from(board: &Board) -> Self {
        Self {
            bounds: board.bounds(),
            cells: board
                .cells()
                .map(|(at, cell)| BoardEntry { at, cell: *cell })
                .collect(),
        }
    }
}

/// Owned copy of everything renderers and UI read from the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSnapshot {
    pub phase: TurnPhase,
    pub active_piece: Option<ActivePiece>,
    pub board: BoardSnapshot,
}

#[cfg(test)]
mod tests {
    use crate::{PieceKind, PlayerId};

    use super::*;

    #[test]
    fn test_snapshot_copies_cells_and_bounds() {
        let mut board = Board::new(Bounds::new(0, 3, 0, 3));
        let cell = Cell::Tetromino {
            owner: PlayerId(1),
            kind: PieceKind::L,
        };
        board.set(BoardCoord::new(1, 2), cell);

        let snapshot = BoardSnapshot::from(&board);
        board.remove(BoardCoord::new(1, 2));

        assert_eq!(snapshot.bounds, Bounds::new(0, 3, 0, 3));
        assert_eq!(snapshot.get(BoardCoord::new(1, 2)), Some(&cell));
        assert_eq!(snapshot.get(BoardCoord::new(0, 0)), None);
    }

    #[test]
    fn test_snapshot_roundtrip_json() {
        let mut board = Board::new(Bounds::new(-2, 3, 0, 3));
        board.set(
            BoardCoord::new(-1, 0),
            Cell::HomeZone {
                owner: PlayerId(2),
            },
        );
        let snapshot = BoardSnapshot::from(&board);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: BoardSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
