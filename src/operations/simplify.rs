//! Replaces pixel staircases in a turn walk with short polygon fragments.
//!
//! The catalog is matched by one greedy left-to-right scan. Longer patterns
//! come first, so `FRF` wins over `R` at the same position; a position, once
//! claimed by a fragment, is never revisited. Every fragment point lies on
//! the original pixel-edge walk. A fragment only applies where no pixel
//! center lies between its segments and the stretch of walk they replace,
//! so the smoothed outline encloses exactly the pixel centers of the walk.

use std::ops::Range;

use crate::math::polygon_2d::sweeps_pixel_center;
use crate::math::{to_point2, Direction, GridPoint, Point2, Turn};

use Turn::{Forward as F, Left as L, Right as R};

/// A turn pattern and the points that replace the ends of its moves.
///
/// Fragment offsets use a local frame anchored at the start of the first
/// matched move: `x` runs along that move, `y` points to its right (the
/// foreground side). A fragment never has more points than its pattern has
/// moves.
struct Pattern {
    turns: &'static [Turn],
    fragment: &'static [(f64, f64)],
}

/// Priority-ordered catalog.
const PATTERNS: &[Pattern] = &[
    // Isolated corners with straight arms: chamfer the corner.
    Pattern {
        turns: &[F, R, F],
        fragment: &[(1.5, 0.0), (2.0, 0.5), (2.0, 1.0)],
    },
    Pattern {
        turns: &[F, L, F],
        fragment: &[(1.5, 0.0), (2.0, -0.5), (2.0, -1.0)],
    },
    // Two-pixel steps.
    Pattern {
        turns: &[R, F, L],
        fragment: &[(1.0, 0.5), (1.0, 1.5)],
    },
    Pattern {
        turns: &[L, F, R],
        fragment: &[(1.0, -0.5), (1.0, -1.5)],
    },
    // One-pixel steps.
    Pattern {
        turns: &[R, L],
        fragment: &[(1.0, 0.5)],
    },
    Pattern {
        turns: &[L, R],
        fragment: &[(1.0, -0.5)],
    },
    // Remaining corners stay sharp.
    Pattern {
        turns: &[R],
        fragment: &[(1.0, 0.0)],
    },
    Pattern {
        turns: &[L],
        fragment: &[(1.0, 0.0)],
    },
];

/// Maps a local fragment offset to slice coordinates.
fn place(origin: GridPoint, direction: Direction, (along, across): (f64, f64)) -> Point2 {
    let forward = direction.vector();
    let right = direction.right().vector();
    let o = to_point2(origin);
    Point2::new(
        o.x + along * f64::from(forward.x) + across * f64::from(right.x),
        o.y + along * f64::from(forward.y) + across * f64::from(right.y),
    )
}

/// The unit moves of a walk, addressed by half-move position: `2 * i` is the
/// start corner of move `i` and `2 * i + 1` its midpoint.
struct Walk {
    origins: Vec<GridPoint>,
    headings: Vec<Direction>,
    end: GridPoint,
}

impl Walk {
    fn new(start: GridPoint, direction: Direction, turns: &[Turn]) -> Self {
        let mut origins = Vec::with_capacity(turns.len());
        let mut headings = Vec::with_capacity(turns.len());
        let mut p = start;
        let mut d = direction;
        for &turn in turns {
            origins.push(p);
            headings.push(d);
            p += d.vector();
            d = d.turn(turn);
        }
        Self {
            origins,
            headings,
            end: p,
        }
    }

    fn len(&self) -> usize {
        self.origins.len()
    }

    /// Point at half-move position `at`; positions past the last move give
    /// the end of the walk.
    fn point_at(&self, at: usize) -> Point2 {
        let i = at / 2;
        if i >= self.len() {
            return to_point2(self.end);
        }
        let origin = to_point2(self.origins[i]);
        if at % 2 == 0 {
            return origin;
        }
        let v = self.headings[i].vector();
        Point2::new(
            origin.x + 0.5 * f64::from(v.x),
            origin.y + 0.5 * f64::from(v.y),
        )
    }

    /// Position of `p` on one of `moves`.
    fn locate(&self, p: Point2, moves: Range<usize>) -> Option<usize> {
        moves
            .flat_map(|i| 2 * i + 1..=2 * i + 2)
            .find(|&at| self.point_at(at) == p)
    }

    /// The walk from position `from` to `to` through every corner in between.
    fn path(&self, from: usize, to: usize) -> Vec<Point2> {
        let mut path = vec![self.point_at(from)];
        let mut corner = from / 2 * 2 + 2;
        while corner < to {
            path.push(self.point_at(corner));
            corner += 2;
        }
        path.push(self.point_at(to));
        path
    }
}

/// An output point and its position on the walk.
#[derive(Debug, Clone, Copy)]
struct Placed {
    point: Point2,
    at: usize,
}

struct Simplifier<'a> {
    turns: &'a [Turn],
    walk: Walk,
    out: Vec<Placed>,
}

impl<'a> Simplifier<'a> {
    fn new(start: GridPoint, direction: Direction, turns: &'a [Turn]) -> Self {
        let mut out = Vec::with_capacity(turns.len() + 1);
        out.push(Placed {
            point: to_point2(start),
            at: 0,
        });
        Self {
            turns,
            walk: Walk::new(start, direction, turns),
            out,
        }
    }

    fn run(mut self) -> (Walk, Vec<Placed>) {
        let n = self.turns.len();
        let mut claimed = vec![false; n];
        for i in 0..n {
            if claimed[i] {
                continue;
            }
            let applied = PATTERNS
                .iter()
                .filter(|pattern| {
                    let k = pattern.turns.len();
                    i + k <= n
                        && !claimed[i..i + k].contains(&true)
                        && self.turns[i..i + k] == *pattern.turns
                })
                .find_map(|pattern| {
                    let k = pattern.turns.len();
                    let placed = self.fragment(pattern, i, i..i + k)?;
                    self.keeps_centers(&placed).then_some((k, placed))
                });
            match applied {
                Some((k, placed)) => {
                    claimed[i..i + k].fill(true);
                    placed.into_iter().for_each(|p| self.push(p));
                }
                None => {
                    // Forward move, or a corner no fragment can cut: keep
                    // the raw grid vertices.
                    claimed[i] = true;
                    let end = self.raw(2 * i + 2);
                    if !self.keeps_centers(&[end]) {
                        self.push(self.raw(2 * i));
                    }
                    self.push(end);
                }
            }
        }
        (self.walk, self.out)
    }

    fn fragment(&self, pattern: &Pattern, i: usize, moves: Range<usize>) -> Option<Vec<Placed>> {
        let (origin, heading) = (self.walk.origins[i], self.walk.headings[i]);
        pattern
            .fragment
            .iter()
            .map(|&offset| {
                let point = place(origin, heading, offset);
                let at = self.walk.locate(point, moves.clone())?;
                Some(Placed { point, at })
            })
            .collect()
    }

    fn raw(&self, at: usize) -> Placed {
        Placed {
            point: self.walk.point_at(at),
            at,
        }
    }

    /// Returns `true` if appending `placed` leaves every pixel center on its
    /// side of the walk.
    fn keeps_centers(&self, placed: &[Placed]) -> bool {
        let Some(mut last) = self.out.last().copied() else {
            return true;
        };
        for &p in placed {
            if p.point == last.point {
                continue;
            }
            if sweeps_pixel_center(&self.walk.path(last.at, p.at)) {
                return false;
            }
            last = p;
        }
        true
    }

    fn push(&mut self, p: Placed) {
        if self.out.last().map(|last| last.point) != Some(p.point) {
            self.out.push(p);
        }
    }
}

/// Simplifies the walk that starts at `start`, first moves in `direction`,
/// and turns by `turns[i]` at the end of move `i`.
///
/// The result begins with `start` and has at most `turns.len() + 1` points,
/// with consecutive duplicates collapsed. The walk is not assumed to be
/// closed. The output depends only on the arguments.
#[must_use]
pub fn simplify(start: GridPoint, direction: Direction, turns: &[Turn]) -> Vec<Point2> {
    let (_, out) = Simplifier::new(start, direction, turns).run();
    out.into_iter().map(|p| p.point).collect()
}

/// Simplifies a closed walk into a polygon whose last point connects back to
/// its first.
///
/// The start corner is dropped when the closing segment that replaces it
/// keeps every pixel center on its side.
#[must_use]
pub(crate) fn simplify_closed(
    start: GridPoint,
    direction: Direction,
    turns: &[Turn],
) -> Vec<Point2> {
    let (walk, mut out) = Simplifier::new(start, direction, turns).run();
    let end = 2 * walk.len();
    let drop_start = match out.as_slice() {
        [_, first, .., last] => {
            last.at == end || {
                let mut closing = walk.path(last.at, end);
                closing.extend(walk.path(0, first.at).into_iter().skip(1));
                !sweeps_pixel_center(&closing)
            }
        }
        _ => out.len() > 1,
    };
    if drop_start {
        out.remove(0);
    }
    out.into_iter().map(|p| p.point).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;
    use approx::assert_relative_eq;

    fn run(x: i32, y: i32, d: Direction, turns: &str) -> Vec<Point2> {
        simplify(GridPoint::new(x, y), d, &Turn::parse_sequence(turns).unwrap())
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn straight_run_passes_through() {
        let out = run(0, 0, Direction::East, "FFF");
        assert_eq!(out, pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]));
    }

    #[test]
    fn single_pixel_keeps_sharp_corners() {
        let out = run(0, 0, Direction::East, "RRRR");
        assert_eq!(
            out,
            pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
        );
    }

    #[test]
    fn isolated_corner_is_chamfered() {
        let out = run(0, 0, Direction::East, "FRF");
        assert_eq!(out, pts(&[(0.0, 0.0), (1.5, 0.0), (2.0, 0.5), (2.0, 1.0)]));
    }

    #[test]
    fn one_pixel_staircase_becomes_diagonal() {
        let out = run(0, 0, Direction::East, "RLRL");
        assert_eq!(out, pts(&[(0.0, 0.0), (1.0, 0.5), (2.0, 1.5)]));
    }

    #[test]
    fn one_pixel_notch_keeps_its_corners() {
        // Bridging the notch at mid height would run through the center of
        // the background pixel at (1, 0).
        let out = run(0, 0, Direction::East, "RLLR");
        assert_eq!(out, pts(&[(0.0, 0.0), (1.0, 0.5), (2.0, 1.0), (2.0, 0.0)]));
    }

    #[test]
    fn one_pixel_bump_keeps_its_corners() {
        let out = run(0, 0, Direction::East, "LRRL");
        assert_eq!(out, pts(&[(0.0, 0.0), (1.0, -0.5), (2.0, -1.0), (2.0, 0.0)]));
    }

    #[test]
    fn every_fragment_lies_on_its_walk() {
        for pattern in PATTERNS {
            let k = pattern.turns.len();
            let walk = Walk::new(GridPoint::new(0, 0), Direction::East, pattern.turns);
            for &offset in pattern.fragment {
                let p = place(GridPoint::new(0, 0), Direction::East, offset);
                assert!(walk.locate(p, 0..k).is_some(), "{p:?}");
            }
        }
    }

    #[test]
    fn closed_walk_drops_start_when_closing_chord_is_clean() {
        // 2x2 block: the final turn is a plain corner at the start.
        let turns = Turn::parse_sequence("FRFRFRFR").unwrap();
        let out = simplify_closed(GridPoint::new(0, 0), Direction::East, &turns);
        assert_eq!(out.first(), Some(&Point2::new(1.5, 0.0)));
        assert_eq!(out.last(), Some(&Point2::new(0.0, 0.0)));
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn fragments_follow_the_active_direction() {
        // Same step heading south: the frame's right-hand side is west.
        let out = run(5, 5, Direction::South, "RL");
        assert_eq!(out, pts(&[(5.0, 5.0), (4.5, 6.0)]));
    }

    #[test]
    fn longer_pattern_wins() {
        // "RFL" must be preferred over "R" followed by "F" and "L".
        let out = run(0, 0, Direction::East, "RFL");
        assert_eq!(out, pts(&[(0.0, 0.0), (1.0, 0.5), (1.0, 1.5)]));
    }

    #[test]
    fn square_block_keeps_its_area_roughly() {
        // 2x2 block traced clockwise from its top-left corner.
        let mut out = run(0, 0, Direction::East, "FRFRFRFR");
        out.remove(0);
        assert!(out.len() <= 8);
        let area = signed_area_2d(&out);
        assert!(area > 3.5 && area <= 4.0, "area {area}");
        assert_relative_eq!(area, 3.75);
    }

    #[test]
    fn output_length_is_bounded() {
        let turns = "FRFLFRLRLFFRRLFRFLLR";
        let out = run(0, 0, Direction::North, turns);
        assert!(out.len() <= turns.len() + 1);
    }

    #[test]
    fn deterministic() {
        let a = run(3, 1, Direction::West, "RLFRFLLRFRF");
        let b = run(3, 1, Direction::West, "RLFRFLLRFRF");
        assert_eq!(a, b);
    }
}
