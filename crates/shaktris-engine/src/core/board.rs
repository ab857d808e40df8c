use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use super::piece::PieceKind;

/// Identifier of a player taking part in the match.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("P{_0}")]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Opaque reference to a chess piece owned by the chess-state authority.
///
/// The engine never interprets this value; it is stored and handed back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct ChessPieceRef(pub u64);

/// Integer board coordinate.
///
/// The board is a horizontal plane: `x` runs across, `z` runs forward/back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BoardCoord {
    pub x: i32,
    pub z: i32,
}

impl BoardCoord {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Shifts the coordinate, saturating at the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.z.saturating_add(dz))
    }

    /// Shifts the coordinate, or returns `None` if it would leave the `i32` range.
    #[must_use]
    pub const fn checked_offset(self, dx: i32, dz: i32) -> Option<Self> {
        match (self.x.checked_add(dx), self.z.checked_add(dz)) {
            (Some(x), Some(z)) => Some(Self::new(x, z)),
            _ => None,
        }
    }

    /// Returns the 8 surrounding coordinates (orthogonal and diagonal).
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        (-1..=1)
            .flat_map(|dz| (-1..=1).map(move |dx| (dx, dz)))
            .filter(|&(dx, dz)| dx != 0 || dz != 0)
            .map(move |(dx, dz)| self.offset(dx, dz))
    }
}

impl fmt::Display for BoardCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Inclusive rectangle of coordinates the board currently covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl Bounds {
    #[must_use]
    pub const fn new(min_x: i32, max_x: i32, min_z: i32, max_z: i32) -> Self {
        assert!(min_x <= max_x);
        assert!(min_z <= max_z);
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    #[must_use]
    pub const fn contains(&self, coord: BoardCoord) -> bool {
        self.min_x <= coord.x
            && coord.x <= self.max_x
            && self.min_z <= coord.z
            && coord.z <= self.max_z
    }

    /// Returns the smallest bounds covering both `self` and `coord`.
    #[must_use]
    pub fn including(self, coord: BoardCoord) -> Self {
        Self {
            min_x: self.min_x.min(coord.x),
            max_x: self.max_x.max(coord.x),
            min_z: self.min_z.min(coord.z),
            max_z: self.max_z.max(coord.z),
        }
    }
}

/// Kinds of reference markers kept on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Board-centre reference point.
    BoardCentre,
}

/// Content of an occupied board coordinate.
///
/// A coordinate with no entry in the board is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cell {
    /// Locked cell of a placed falling piece.
    Tetromino { owner: PlayerId, kind: PieceKind },
    /// Square holding a chess piece. The reference is passed through untouched.
    Chess { piece: ChessPieceRef },
    /// Square of a player's home zone.
    HomeZone { owner: PlayerId },
    /// Reference marker. Markers do not block pieces.
    Marker { kind: MarkerKind },
}

impl Cell {
    /// Returns whether this cell blocks pieces and counts as a neighbour.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        !matches!(self, Cell::Marker { .. })
    }

    #[must_use]
    pub const fn owner(&self) -> Option<PlayerId> {
        match self {
            Cell::Tetromino { owner, .. } | Cell::HomeZone { owner } => Some(*owner),
            Cell::Chess { .. } | Cell::Marker { .. } => None,
        }
    }
}

/// Growth of the board bounds caused by a write outside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsExpansion {
    pub previous: Bounds,
    pub current: Bounds,
}

/// Sparse board: only touched coordinates are stored.
///
/// Reads outside the bounds are valid and return empty. Every stored
/// coordinate lies within [`Board::bounds`]; writing outside grows them.
///
/// # Example
///
/// ```
/// use shaktris_engine::{Board, BoardCoord, Bounds, Cell, PieceKind, PlayerId};
///
/// let mut board = Board::new(Bounds::new(0, 7, 0, 7));
/// let cell = Cell::Tetromino { owner: PlayerId(1), kind: PieceKind::T };
///
/// assert!(board.set(BoardCoord::new(3, 3), cell).is_none());
/// assert!(board.set(BoardCoord::new(9, 3), cell).is_some());
/// assert_eq!(board.count_owned_by(PlayerId(1)), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: BTreeMap<BoardCoord, Cell>,
    bounds: Bounds,
}

impl Board {
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            cells: BTreeMap::new(),
            bounds,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn get(&self, coord: BoardCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// Writes a cell, growing the bounds when `coord` lies outside them.
    ///
    /// Returns the expansion when the bounds had to grow.
    pub fn set(&mut self, coord: BoardCoord, cell: Cell) -> Option<BoundsExpansion> {
        let expansion = (!self.bounds.contains(coord)).then(|| {
            let previous = self.bounds;
            self.bounds = previous.including(coord);
            BoundsExpansion {
                previous,
                current: self.bounds,
            }
        });
        self.cells.insert(coord, cell);
        expansion
    }

    pub fn remove(&mut self, coord: BoardCoord) -> Option<Cell> {
        self.cells.remove(&coord)
    }

    /// Returns whether a solid cell is stored at `coord`.
    #[must_use]
    pub fn is_occupied(&self, coord: BoardCoord) -> bool {
        self.get(coord).is_some_and(Cell::is_solid)
    }

    /// Number of solid cells on the board.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.values().filter(|cell| cell.is_solid()).count()
    }

    /// Number of cells (tetromino and home zone) owned by `owner`.
    #[must_use]
    pub fn count_owned_by(&self, owner: PlayerId) -> usize {
        self.cells
            .values()
            .filter(|cell| cell.owner() == Some(owner))
            .count()
    }

    pub fn cells(&self) -> impl Iterator<Item = (BoardCoord, &Cell)> + '_ {
        self.cells.iter().map(|(coord, cell)| (*coord, cell))
    }

    /// Replaces every cell and the bounds.
    ///
    /// Marker cells are kept. Bounds grow to cover any marker outside `bounds`.
    pub fn rebuild<I>(&mut self, bounds: Bounds, cells: I)
    where
        I: IntoIterator<Item = (BoardCoord, Cell)>,
    {
        let markers: Vec<_> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.is_marker())
            .map(|(coord, cell)| (*coord, *cell))
            .collect();
        self.bounds = bounds;
        self.cells.clear();
        for (coord, cell) in cells {
            self.set(coord, cell);
        }
        for (coord, cell) in markers {
            self.cells.entry(coord).or_insert(cell);
            self.bounds = self.bounds.including(coord);
        }
    }
}
