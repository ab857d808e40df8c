use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::board::{BoardCoord, PlayerId};

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::Display)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// J-piece.
    J = 1,
    /// L-piece.
    L = 2,
    /// O-piece.
    O = 3,
    /// S-piece.
    S = 4,
    /// T-piece.
    T = 5,
    /// Z-piece.
    Z = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All kinds in canonical order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Returns the spawn orientation of this kind.
    #[must_use]
    pub const fn shape(self) -> Shape {
        SPAWN_SHAPES[self as usize]
    }
}

/// Direction of a quarter turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Square boolean matrix describing which cells of a piece are filled.
///
/// Indexed as `[z][x]`; a filled cell at `(x, z)` covers board coordinate
/// `anchor + (x, z)`. The size is between [`Shape::MIN_SIZE`] and
/// [`Shape::MAX_SIZE`]; cells outside `size × size` are always empty.
///
/// Serialized as rows joined by `/`, `#` for filled and `.` for empty
/// (e.g. the T-piece is `".#./###/..."`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    size: u8,
    rows: [[bool; 4]; 4],
}

impl Shape {
    pub const MIN_SIZE: usize = 2;
    pub const MAX_SIZE: usize = 4;

    /// Builds a shape from `size` rows.
    ///
    /// Returns `None` if `rows` is not a square of a supported size.
    #[must_use]
    pub fn from_rows<R>(rows: &[R]) -> Option<Self>
    where
        R: AsRef<[bool]>,
    {
        let size = rows.len();
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return None;
        }
        let mut shape = Self::empty(size);
        for (z, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != size {
                return None;
            }
            shape.rows[z][..size].copy_from_slice(row);
        }
        Some(shape)
    }

    #[expect(clippy::cast_possible_truncation)]
    pub(crate) const fn empty(size: usize) -> Self {
        assert!(Self::MIN_SIZE <= size && size <= Self::MAX_SIZE);
        Self {
            size: size as u8,
            rows: [[false; 4]; 4],
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size as usize
    }

    #[must_use]
    pub const fn is_filled(&self, x: usize, z: usize) -> bool {
        x < self.size() && z < self.size() && self.rows[z][x]
    }

    pub(crate) fn fill(&mut self, x: usize, z: usize, filled: bool) {
        self.rows[z][x] = filled;
    }

    /// Returns the `(dx, dz)` offsets of filled cells in row-major order.
    #[must_use]
    #[expect(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn filled_offsets(&self) -> ArrayVec<(i32, i32), 16> {
        let size = self.size();
        let mut offsets = ArrayVec::new();
        for (z, row) in self.rows[..size].iter().enumerate() {
            for (x, &filled) in row[..size].iter().enumerate() {
                if filled {
                    offsets.push((x as i32, z as i32));
                }
            }
        }
        offsets
    }

    /// Returns the board coordinates covered when the shape is anchored at `anchor`.
    pub fn cells_at(&self, anchor: BoardCoord) -> impl Iterator<Item = BoardCoord> {
        self.filled_offsets()
            .into_iter()
            .map(move |(dx, dz)| anchor.offset(dx, dz))
    }

    /// Returns whether every filled cell at `anchor` stays within the `i32` coordinate range.
    #[must_use]
    pub fn fits_at(&self, anchor: BoardCoord) -> bool {
        self.filled_offsets()
            .iter()
            .all(|&(dx, dz)| anchor.checked_offset(dx, dz).is_some())
    }

    fn to_pattern(self) -> String {
        let size = self.size();
        let rows: Vec<String> = self.rows[..size]
            .iter()
            .map(|row| {
                row[..size]
                    .iter()
                    .map(|&filled| if filled { '#' } else { '.' })
                    .collect()
            })
            .collect();
        rows.join("/")
    }

    fn from_pattern(pattern: &str) -> Option<Self> {
        let rows: Vec<Vec<bool>> = pattern
            .split('/')
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        '#' => Some(true),
                        '.' => Some(false),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<_>>()?;
        Self::from_rows(&rows[..])
    }
}

impl Serialize for Shape {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_pattern())
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_pattern(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "expected square shape pattern of size {}-{} like '.#./###/...', got '{s}'",
                Self::MIN_SIZE,
                Self::MAX_SIZE
            ))
        })
    }
}

const SPAWN_SHAPES: [Shape; PieceKind::LEN] = {
    const fn s<const N: usize>(rows: [[bool; N]; N]) -> Shape {
        let mut shape = Shape::empty(N);
        let mut z = 0;
        while z < N {
            let mut x = 0;
            while x < N {
                shape.rows[z][x] = rows[z][x];
                x += 1;
            }
            z += 1;
        }
        shape
    }

    const C: bool = true;
    const E: bool = false;

    [
        // I-piece
        s([[E, E, E, E], [C, C, C, C], [E, E, E, E], [E, E, E, E]]),
        // J-piece
        s([[C, E, E], [C, C, C], [E, E, E]]),
        // L-piece
        s([[E, E, C], [C, C, C], [E, E, E]]),
        // O-piece
        s([[C, C], [C, C]]),
        // S-piece
        s([[E, C, C], [C, C, E], [E, E, E]]),
        // T-piece
        s([[E, C, E], [C, C, C], [E, E, E]]),
        // Z-piece
        s([[C, C, E], [E, C, C], [E, E, E]]),
    ]
};

/// The falling piece controlled by a player.
///
/// At most one exists at a time. It is created by a spawn, moved by the
/// movement queue, and removed when it is placed or explodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    kind: PieceKind,
    shape: Shape,
    anchor: BoardCoord,
    height: u32,
    owner: PlayerId,
}

impl ActivePiece {
    /// Creates a piece of `kind` in its spawn orientation.
    #[must_use]
    pub fn new(kind: PieceKind, owner: PlayerId, anchor: BoardCoord, height: u32) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            anchor,
            height,
            owner,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn anchor(&self) -> BoardCoord {
        self.anchor
    }

    /// Altitude above the board surface; `0` means landed.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Board coordinates covered by the piece's footprint.
    pub fn cells(&self) -> impl Iterator<Item = BoardCoord> {
        self.shape.cells_at(self.anchor)
    }

    pub(crate) fn set_anchor(&mut self, anchor: BoardCoord) {
        self.anchor = anchor;
    }

    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub(crate) fn set_height(&mut self, height: u32) {
        self.height = height;
    }
}
