use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    ActivePiece, Board, BoardCoord, CoreConfig, PieceKind, PlayerId, core::legality,
};

/// Cardinal direction a king faces on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards negative `z`.
    North,
    /// Towards positive `x`.
    East,
    /// Towards positive `z`.
    South,
    /// Towards negative `x`.
    West,
}

impl Direction {
    /// Unit vector `(dx, dz)` pointing this way.
    #[must_use]
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Direction a quarter turn clockwise from this one.
    #[must_use]
    pub const fn right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }
}

/// Location and facing of a player's king, as reported by the chess authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KingPlacement {
    pub position: BoardCoord,
    pub facing: Direction,
}

/// Where a new piece enters play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPlan {
    pub owner: PlayerId,
    pub kind: PieceKind,
    pub anchor: BoardCoord,
    pub height: u32,
}

impl SpawnPlan {
    #[must_use]
    pub fn into_piece(self) -> ActivePiece {
        ActivePiece::new(self.kind, self.owner, self.anchor, self.height)
    }
}

/// Computes king-relative spawn positions.
#[derive(Debug, Clone, Copy)]
pub struct SpawnPlanner {
    lateral_spread: i32,
    min_distance: i32,
    max_steps: u32,
    spawn_height: u32,
}

impl SpawnPlanner {
    #[must_use]
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            lateral_spread: config.lateral_spread.saturating_abs(),
            min_distance: config.spawn_min_distance,
            max_steps: config.spawn_max_steps,
            spawn_height: config.start_height,
        }
    }

    /// Plans a collision-free spawn for `owner`'s next piece of `kind`.
    ///
    /// A random lane is picked within the lateral spread to the king's right
    /// or left; the search then walks forward from the king along its facing
    /// and returns the first anchor where the piece's spawn shape does not
    /// collide. Adjacency is not required.
    ///
    /// Returns `None` when there is no king to anchor on or when every
    /// candidate in the lane collides.
    pub fn plan<R>(
        &self,
        board: &Board,
        owner: PlayerId,
        kind: PieceKind,
        king: Option<KingPlacement>,
        rng: &mut R,
    ) -> Option<SpawnPlan>
    where
        R: Rng,
    {
        let king = king?;
        let (fx, fz) = king.facing.vector();
        let (rx, rz) = king.facing.right().vector();
        let lateral = rng.random_range(-self.lateral_spread..=self.lateral_spread);
        let lane = king.position.offset(rx * lateral, rz * lateral);
        let shape = kind.shape();

        (0..self.max_steps)
            .filter_map(|step| i32::try_from(step).ok())
            .map(|step| {
                let distance = self.min_distance.saturating_add(step);
                lane.offset(fx.saturating_mul(distance), fz.saturating_mul(distance))
            })
            .find(|&anchor| !legality::collides(board, &shape, anchor))
            .map(|anchor| SpawnPlan {
                owner,
                kind,
                anchor,
                height: self.spawn_height,
            })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use crate::{Bounds, Cell};

    use super::*;

    const P1: PlayerId = PlayerId(1);

    fn planner() -> SpawnPlanner {
        SpawnPlanner::new(&CoreConfig {
            lateral_spread: 0,
            ..CoreConfig::default()
        })
    }

    fn king(x: i32, z: i32, facing: Direction) -> Option<KingPlacement> {
        Some(KingPlacement {
            position: BoardCoord::new(x, z),
            facing,
        })
    }

    fn fill(board: &mut Board, x: i32, z: i32) {
        board.set(
            BoardCoord::new(x, z),
            Cell::Tetromino {
                owner: P1,
                kind: PieceKind::I,
            },
        );
    }

    #[test]
    fn test_no_king_no_spawn() {
        let board = Board::new(Bounds::new(0, 23, 0, 23));
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(
            planner().plan(&board, P1, PieceKind::T, None, &mut rng),
            None
        );
    }

    #[test]
    fn test_spawn_starts_two_ahead_of_king() {
        let board = Board::new(Bounds::new(0, 23, 0, 23));
        let mut rng = Pcg32::seed_from_u64(0);
        let plan = planner()
            .plan(&board, P1, PieceKind::O, king(10, 10, Direction::South), &mut rng)
            .unwrap();
        assert_eq!(plan.anchor, BoardCoord::new(10, 12));
        assert_eq!(plan.height, CoreConfig::default().start_height);
        assert_eq!(plan.owner, P1);
        assert_eq!(plan.kind, PieceKind::O);
    }

    #[test]
    fn test_spawn_follows_facing() {
        let board = Board::new(Bounds::new(0, 23, 0, 23));
        let mut rng = Pcg32::seed_from_u64(0);
        let planner = planner();
        let expected = [
            (Direction::North, BoardCoord::new(10, 8)),
            (Direction::East, BoardCoord::new(12, 10)),
            (Direction::South, BoardCoord::new(10, 12)),
            (Direction::West, BoardCoord::new(8, 10)),
        ];
        for (facing, anchor) in expected {
            let plan = planner
                .plan(&board, P1, PieceKind::O, king(10, 10, facing), &mut rng)
                .unwrap();
            assert_eq!(plan.anchor, anchor, "facing {facing:?}");
        }
    }

    #[test]
    fn test_spawn_skips_colliding_cells() {
        let mut board = Board::new(Bounds::new(0, 23, 0, 23));
        // Block anchors at distance 2 and 3 in front of a south-facing king
        fill(&mut board, 10, 13);
        let mut rng = Pcg32::seed_from_u64(0);
        let plan = planner()
            .plan(&board, P1, PieceKind::O, king(10, 10, Direction::South), &mut rng)
            .unwrap();
        assert_eq!(plan.anchor, BoardCoord::new(10, 14));
    }

    #[test]
    fn test_spawn_ignores_adjacency() {
        let mut board = Board::new(Bounds::new(0, 23, 0, 23));
        fill(&mut board, 0, 0);
        let mut rng = Pcg32::seed_from_u64(0);
        let plan = planner().plan(&board, P1, PieceKind::O, king(10, 10, Direction::South), &mut rng);
        assert!(plan.is_some());
    }

    #[test]
    fn test_blocked_lane_gives_none() {
        let mut board = Board::new(Bounds::new(0, 40, 0, 40));
        for z in 12..=33 {
            fill(&mut board, 10, z);
        }
        let mut rng = Pcg32::seed_from_u64(0);
        let plan = planner().plan(&board, P1, PieceKind::O, king(10, 10, Direction::South), &mut rng);
        assert_eq!(plan, None);
    }

    #[test]
    fn test_lateral_offset_stays_within_spread() {
        let board = Board::new(Bounds::new(-30, 30, -30, 30));
        let planner = SpawnPlanner::new(&CoreConfig::default());
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let plan = planner
                .plan(&board, P1, PieceKind::O, king(0, 0, Direction::North), &mut rng)
                .unwrap();
            assert_eq!(plan.anchor.z, -2);
            assert!((-6..=6).contains(&plan.anchor.x));
            seen.insert(plan.anchor.x);
        }
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn test_extreme_config_does_not_overflow() {
        let planner = SpawnPlanner::new(&CoreConfig {
            lateral_spread: i32::MIN,
            spawn_min_distance: i32::MAX,
            ..CoreConfig::default()
        });
        let board = Board::new(Bounds::new(0, 23, 0, 23));
        let mut rng = Pcg32::seed_from_u64(0);
        let plan = planner
            .plan(&board, P1, PieceKind::O, king(10, 10, Direction::West), &mut rng)
            .unwrap();
        assert_eq!(plan.anchor.x, 10 - i32::MAX);
    }

    #[test]
    fn test_right_is_clockwise() {
        assert_eq!(Direction::North.right(), Direction::East);
        assert_eq!(Direction::West.right(), Direction::North);
        for facing in [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ] {
            let (fx, fz) = facing.vector();
            let (rx, rz) = facing.right().vector();
            assert_eq!(fx * rx + fz * rz, 0);
        }
    }
}
