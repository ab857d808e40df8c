use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shaktris_engine::{
    Board, BoardCoord, Bounds, Cell, ChessPieceRef, Direction, KingPlacement, MarkerKind,
    PlayerId,
};

pub const MAX_PLAYERS: usize = 4;

/// Home zone cells on each side of a king, along its row.
const HOME_ZONE_HALF_WIDTH: i32 = 4;

/// A player and where their king stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub player: PlayerId,
    pub king: KingPlacement,
}

/// Fixed-king stand-in for the chess authority.
#[derive(Debug, Clone)]
pub struct Table {
    seats: Vec<Seat>,
    kings: HashMap<PlayerId, KingPlacement>,
}

impl Table {
    pub fn new(seats: Vec<Seat>) -> Self {
        let kings = seats.iter().map(|seat| (seat.player, seat.king)).collect();
        Self { seats, kings }
    }

    /// Seats `players` players on the edges of `bounds`, each king facing the centre.
    pub fn around(bounds: Bounds, players: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (1..=MAX_PLAYERS).contains(&players),
            "player count must be between 1 and {MAX_PLAYERS}, got {players}"
        );
        let (mid_x, mid_z) = centre(bounds);
        let edges = [
            (BoardCoord::new(mid_x, bounds.min_z + 1), Direction::South),
            (BoardCoord::new(mid_x, bounds.max_z - 1), Direction::North),
            (BoardCoord::new(bounds.min_x + 1, mid_z), Direction::East),
            (BoardCoord::new(bounds.max_x - 1, mid_z), Direction::West),
        ];
        let seats = edges
            .into_iter()
            .take(players)
            .zip(1..)
            .map(|((position, facing), id)| Seat {
                player: PlayerId(id),
                king: KingPlacement { position, facing },
            })
            .collect();
        Ok(Self::new(seats))
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn kings(&self) -> &HashMap<PlayerId, KingPlacement> {
        &self.kings
    }

    /// Player whose falling-piece turn `turn` is.
    pub fn player_for_turn(&self, turn: usize) -> Option<PlayerId> {
        if self.seats.is_empty() {
            return None;
        }
        Some(self.seats[turn % self.seats.len()].player)
    }

    /// Board with every king, its home zone row, and a centre marker.
    pub fn board(&self, bounds: Bounds) -> Board {
        let mut board = Board::new(bounds);
        let (mid_x, mid_z) = centre(bounds);
        board.set(
            BoardCoord::new(mid_x, mid_z),
            Cell::Marker {
                kind: MarkerKind::BoardCentre,
            },
        );
        for (index, seat) in (0..).zip(&self.seats) {
            let KingPlacement { position, facing } = seat.king;
            board.set(
                position,
                Cell::Chess {
                    piece: ChessPieceRef(index),
                },
            );
            let (rx, rz) = facing.right().vector();
            for lateral in -HOME_ZONE_HALF_WIDTH..=HOME_ZONE_HALF_WIDTH {
                if lateral == 0 {
                    continue;
                }
                board.set(
                    position.offset(rx * lateral, rz * lateral),
                    Cell::HomeZone { owner: seat.player },
                );
            }
        }
        board
    }
}

fn centre(bounds: Bounds) -> (i32, i32) {
    (
        bounds.min_x + (bounds.max_x - bounds.min_x) / 2,
        bounds.min_z + (bounds.max_z - bounds.min_z) / 2,
    )
}
