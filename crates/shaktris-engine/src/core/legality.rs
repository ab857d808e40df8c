//! Placement rules shared by every piece operation and by spawn planning.
//!
//! All functions are pure: they read the board and never mutate it.
//!
//! - [`collides`] - a filled cell would land on an occupied coordinate
//! - [`in_bounds`] - every filled cell lies inside the current bounds
//! - [`is_adjacent`] - the piece connects to existing cells, with the two
//!   bootstrap exceptions for an empty board and a player's first piece
//! - [`touches_occupied`] - strict 8-neighbour contact, no exceptions
//! - [`rotate_shape`] - quarter turn of a shape matrix

use super::{
    board::{Board, BoardCoord, PlayerId},
    piece::{RotationDirection, Shape},
};

/// Returns whether any filled cell of `shape` at `anchor` maps to an occupied coordinate.
#[must_use]
pub fn collides(board: &Board, shape: &Shape, anchor: BoardCoord) -> bool {
    shape.cells_at(anchor).any(|coord| board.is_occupied(coord))
}

/// Returns whether every filled cell of `shape` at `anchor` lies within the board bounds.
#[must_use]
pub fn in_bounds(board: &Board, shape: &Shape, anchor: BoardCoord) -> bool {
    let bounds = board.bounds();
    shape.cells_at(anchor).all(|coord| bounds.contains(coord))
}

/// Returns whether `shape` at `anchor` may connect for `owner`.
///
/// Always `true` while the board has no occupied cells, or while `owner`
/// owns no cells. Otherwise `true` iff some filled cell has an occupied
/// coordinate among its 8 neighbours.
#[must_use]
pub fn is_adjacent(board: &Board, shape: &Shape, anchor: BoardCoord, owner: PlayerId) -> bool {
    if board.occupied_count() == 0 || board.count_owned_by(owner) == 0 {
        return true;
    }
    touches_occupied(board, shape, anchor)
}

/// Returns whether some filled cell of `shape` at `anchor` has an occupied 8-neighbour.
#[must_use]
pub fn touches_occupied(board: &Board, shape: &Shape, anchor: BoardCoord) -> bool {
    shape
        .cells_at(anchor)
        .any(|coord| coord.neighbors().any(|n| board.is_occupied(n)))
}

/// Rotates `shape` a quarter turn within its square.
///
/// Clockwise maps `new[x][size-1-z] = old[z][x]`; counter-clockwise maps
/// `new[size-1-x][z] = old[z][x]`. The size is preserved.
#[must_use]
pub fn rotate_shape(shape: &Shape, direction: RotationDirection) -> Shape {
    let size = shape.size();
    let mut rotated = Shape::empty(size);
    for z in 0..size {
        for x in 0..size {
            if !shape.is_filled(x, z) {
                continue;
            }
            // `fill(x, z)` addresses `[z][x]`
            match direction {
                RotationDirection::Clockwise => rotated.fill(size - 1 - z, x, true),
                RotationDirection::CounterClockwise => rotated.fill(z, size - 1 - x, true),
            }
        }
    }
    rotated
}

#[cfg(test)]
mod tests {
    use crate::core::{
        board::{Bounds, Cell},
        piece::PieceKind,
    };

    use super::*;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    fn board_with(cells: &[(i32, i32, PlayerId)]) -> Board {
        let mut board = Board::new(Bounds::new(0, 15, 0, 15));
        for &(x, z, owner) in cells {
            board.set(
                BoardCoord::new(x, z),
                Cell::Tetromino {
                    owner,
                    kind: PieceKind::I,
                },
            );
        }
        board
    }

    fn all_shapes() -> Vec<Shape> {
        let mut shapes: Vec<_> = PieceKind::ALL.iter().map(|kind| kind.shape()).collect();
        shapes.push(Shape::from_rows(&[[true, false], [false, false]]).unwrap());
        shapes.push(
            Shape::from_rows(&[
                [true, false, false, true],
                [false, true, false, false],
                [false, false, false, true],
                [true, true, false, false],
            ])
            .unwrap(),
        );
        shapes
    }

    mod collision {
        use super::*;

        #[test]
        fn test_collides_iff_filled_cell_is_occupied() {
            let board = board_with(&[(6, 6, P1)]);
            let shape = PieceKind::O.shape();

            assert!(collides(&board, &shape, BoardCoord::new(5, 5)));
            assert!(collides(&board, &shape, BoardCoord::new(6, 6)));
            assert!(!collides(&board, &shape, BoardCoord::new(7, 7)));
            assert!(!collides(&board, &shape, BoardCoord::new(4, 4)));
        }

        #[test]
        fn test_empty_shape_cells_do_not_collide() {
            // T-piece row 0 is `.#.`, so (0, 0) of the matrix is empty
            let board = board_with(&[(3, 3, P1)]);
            let shape = PieceKind::T.shape();
            assert!(!collides(&board, &shape, BoardCoord::new(3, 3)));
            assert!(collides(&board, &shape, BoardCoord::new(2, 3)));
        }

        #[test]
        fn test_collides_matches_cellwise_definition() {
            let board = board_with(&[(2, 2, P1), (5, 3, P2), (4, 7, P1)]);
            for shape in all_shapes() {
                for z in 0..10 {
                    for x in 0..10 {
                        let anchor = BoardCoord::new(x, z);
                        let expected = shape.cells_at(anchor).any(|c| board.get(c).is_some());
                        assert_eq!(collides(&board, &shape, anchor), expected);
                    }
                }
            }
        }

        #[test]
        fn test_markers_do_not_collide() {
            let mut board = board_with(&[]);
            board.set(
                BoardCoord::new(1, 1),
                Cell::Marker {
                    kind: crate::core::board::MarkerKind::BoardCentre,
                },
            );
            assert!(!collides(&board, &PieceKind::O.shape(), BoardCoord::new(0, 0)));
        }
    }

    mod bounds {
        use super::*;

        #[test]
        fn test_in_bounds() {
            let board = board_with(&[]);
            let shape = PieceKind::O.shape();
            assert!(in_bounds(&board, &shape, BoardCoord::new(0, 0)));
            assert!(in_bounds(&board, &shape, BoardCoord::new(14, 14)));
            assert!(!in_bounds(&board, &shape, BoardCoord::new(15, 14)));
            assert!(!in_bounds(&board, &shape, BoardCoord::new(-1, 0)));
        }

        #[test]
        fn test_in_bounds_ignores_empty_shape_cells() {
            // I-piece row 0 is empty, so the anchor row may be outside
            let board = board_with(&[]);
            let shape = PieceKind::I.shape();
            assert!(in_bounds(&board, &shape, BoardCoord::new(0, -1)));
            assert!(!in_bounds(&board, &shape, BoardCoord::new(0, -2)));
        }
    }

    mod adjacency {
        use super::*;

        #[test]
        fn test_empty_board_is_always_adjacent() {
            let board = board_with(&[]);
            for shape in all_shapes() {
                assert!(is_adjacent(&board, &shape, BoardCoord::new(100, -40), P1));
            }
        }

        #[test]
        fn test_first_piece_of_player_is_always_adjacent() {
            let board = board_with(&[(0, 0, P2)]);
            for shape in all_shapes() {
                assert!(is_adjacent(&board, &shape, BoardCoord::new(10, 10), P1));
            }
            assert!(!is_adjacent(&board, &PieceKind::O.shape(), BoardCoord::new(10, 10), P2));
        }

        #[test]
        fn test_isolated_piece_is_not_adjacent() {
            let board = board_with(&[(5, 5, P1)]);
            let shape = PieceKind::O.shape();
            assert!(!is_adjacent(&board, &shape, BoardCoord::new(10, 10), P1));
        }

        #[test]
        fn test_diagonal_neighbour_counts() {
            let board = board_with(&[(5, 5, P1)]);
            let shape = PieceKind::O.shape();
            // O at (6, 6) covers (6..=7, 6..=7); (6, 6) touches (5, 5) diagonally
            assert!(is_adjacent(&board, &shape, BoardCoord::new(6, 6), P1));
            assert!(!is_adjacent(&board, &shape, BoardCoord::new(7, 7), P1));
        }

        #[test]
        fn test_orthogonal_neighbour_counts() {
            let board = board_with(&[(5, 5, P1)]);
            let shape = PieceKind::O.shape();
            assert!(is_adjacent(&board, &shape, BoardCoord::new(6, 4), P1));
            assert!(is_adjacent(&board, &shape, BoardCoord::new(3, 5), P1));
        }

        #[test]
        fn test_other_players_cells_count_as_neighbours() {
            let board = board_with(&[(5, 5, P1), (0, 0, P2)]);
            let shape = PieceKind::O.shape();
            assert!(is_adjacent(&board, &shape, BoardCoord::new(1, 1), P1));
        }

        #[test]
        fn test_touches_occupied_has_no_bootstrap_exception() {
            let board = board_with(&[]);
            assert!(!touches_occupied(
                &board,
                &PieceKind::O.shape(),
                BoardCoord::new(5, 5)
            ));
        }
    }

    mod rotation {
        use super::*;

        #[test]
        fn test_four_clockwise_rotations_are_identity() {
            for shape in all_shapes() {
                let mut rotated = shape;
                for _ in 0..4 {
                    rotated = rotate_shape(&rotated, RotationDirection::Clockwise);
                }
                assert_eq!(rotated, shape);
            }
        }

        #[test]
        fn test_counter_clockwise_undoes_clockwise() {
            for shape in all_shapes() {
                let rotated = rotate_shape(&shape, RotationDirection::Clockwise);
                let back = rotate_shape(&rotated, RotationDirection::CounterClockwise);
                assert_eq!(back, shape);
            }
        }

        #[test]
        fn test_rotation_preserves_size_and_cell_count() {
            for shape in all_shapes() {
                let rotated = rotate_shape(&shape, RotationDirection::Clockwise);
                assert_eq!(rotated.size(), shape.size());
                assert_eq!(
                    rotated.filled_offsets().len(),
                    shape.filled_offsets().len()
                );
            }
        }

        #[test]
        fn test_clockwise_mapping() {
            // old[z][x] -> new[x][size-1-z]
            let shape = Shape::from_rows(&[
                [true, true, false],
                [false, false, false],
                [false, false, false],
            ])
            .unwrap();
            let expected = Shape::from_rows(&[
                [false, false, true],
                [false, false, true],
                [false, false, false],
            ])
            .unwrap();
            assert_eq!(rotate_shape(&shape, RotationDirection::Clockwise), expected);
        }

        #[test]
        fn test_counter_clockwise_mapping() {
            // old[z][x] -> new[size-1-x][z]
            let shape = Shape::from_rows(&[
                [true, true, false],
                [false, false, false],
                [false, false, false],
            ])
            .unwrap();
            let expected = Shape::from_rows(&[
                [false, false, false],
                [true, false, false],
                [true, false, false],
            ])
            .unwrap();
            assert_eq!(
                rotate_shape(&shape, RotationDirection::CounterClockwise),
                expected
            );
        }

        #[test]
        fn test_i_piece_turns_vertical() {
            let rotated = rotate_shape(&PieceKind::I.shape(), RotationDirection::Clockwise);
            let offsets: Vec<_> = rotated.filled_offsets().into_iter().collect();
            assert_eq!(offsets, vec![(2, 0), (2, 1), (2, 2), (2, 3)]);
        }
    }
}
