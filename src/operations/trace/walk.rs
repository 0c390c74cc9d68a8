use crate::contours::{pixel_beside, PolygonPoints};
use crate::error::{InvariantError, Result};
use crate::math::{Direction, GridPoint, Turn};

/// Follows one rim along pixel edges, keeping the pixels accepted by
/// `inside` on the right-hand side.
///
/// At every corner the two pixels ahead decide the turn: if the one ahead
/// on the left is inside, turn left (diagonal neighbors stay on the same
/// rim); otherwise go forward if the one ahead on the right is inside;
/// otherwise turn right. The walk ends when it is back at `start` heading
/// in `direction`.
///
/// # Errors
///
/// Returns `InvariantError::UnclosedLoop` if the rim has not closed after
/// `limit` moves.
pub(super) fn walk_rim<F>(
    start: GridPoint,
    direction: Direction,
    limit: usize,
    inside: F,
) -> Result<PolygonPoints>
where
    F: Fn(GridPoint) -> bool,
{
    let mut turns = Vec::new();
    let mut p = start;
    let mut d = direction;
    loop {
        p += d.vector();
        let ahead = d.vector();
        let turn = if inside(pixel_beside(p, ahead, d.left().vector())) {
            Turn::Left
        } else if inside(pixel_beside(p, ahead, d.right().vector())) {
            Turn::Forward
        } else {
            Turn::Right
        };
        turns.push(turn);
        d = d.turn(turn);

        if p == start && d == direction {
            break;
        }
        if turns.len() >= limit {
            return Err(InvariantError::UnclosedLoop {
                x: start.x,
                y: start.y,
            }
            .into());
        }
    }
    Ok(PolygonPoints::from_walk(start, direction, turns))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::grid::turn_string;

    #[test]
    fn walks_around_single_pixel() {
        let pixel = GridPoint::new(2, 3);
        let rim = walk_rim(pixel, Direction::East, 16, |p| p == pixel).unwrap();
        assert_eq!(turn_string(rim.turns()), "RRRR");
    }

    #[test]
    fn walks_around_single_hole_counter_clockwise() {
        let hole = GridPoint::new(2, 2);
        let rim = walk_rim(hole, Direction::South, 16, |p| p != hole).unwrap();
        assert_eq!(turn_string(rim.turns()), "LLLL");
        assert_eq!(rim.signed_area(), -1);
    }

    #[test]
    fn diagonal_neighbors_share_a_rim() {
        let a = GridPoint::new(0, 0);
        let b = GridPoint::new(1, 1);
        let rim = walk_rim(a, Direction::East, 32, |p| p == a || p == b).unwrap();
        assert_eq!(rim.voxel_count(), 2);
        assert_eq!(rim.pixels(), &[a, b]);
    }

    #[test]
    fn reports_unclosed_walk() {
        let pixel = GridPoint::new(0, 0);
        let err = walk_rim(pixel, Direction::East, 2, |p| p == pixel).unwrap_err();
        assert!(err.is_invariant_violation());
    }
}
