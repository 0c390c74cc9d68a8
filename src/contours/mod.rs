//! Vector representation of mask slices.
//!
//! A traced rim is stored losslessly as a start corner, a start direction and
//! a turn sequence ([`PolygonPoints`]). Consumers receive floating-point
//! [`ContourPolygon`]s, either the exact pixel-corner outline or a smoothed
//! outline produced by the simplifier.

mod per_slice;

pub use per_slice::{ContoursChange, ContoursPerSlice, ListenerId};

use crate::math::polygon_2d::{dedup_points, grid_signed_area, signed_area_2d};
use crate::math::{to_point2, Direction, GridPoint, GridVector, Point2, Turn};
use crate::operations::simplify::simplify_closed;

/// How traced rims are turned into contour polygons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContourSmoothing {
    /// Exact pixel-corner outline: only the vertices where the rim turns.
    None,
    /// Pattern-based smoothing of pixel staircases.
    #[default]
    Small,
}

/// A closed polygon in slice-local coordinates.
///
/// The last point connects back to the first implicitly. An empty polygon
/// stands for "no contour".
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPolygon {
    points: Vec<Point2>,
    signed_area: f64,
}

impl ContourPolygon {
    /// Creates a polygon and derives its area.
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        let signed_area = signed_area_2d(&points);
        Self {
            points,
            signed_area,
        }
    }

    /// The "no contour" polygon.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[must_use]
    pub fn into_points(self) -> Vec<Point2> {
        self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area, always non-negative.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area.abs()
    }

    /// Shoelace area: positive for outer rims, negative for holes.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        self.signed_area
    }

    /// Returns `true` if the polygon runs clockwise on screen (an outer rim).
    #[must_use]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area > 0.0
    }
}

/// Pixel whose center is at `vertex + (step + side) / 2`, where both steps
/// are axis-aligned and perpendicular.
pub(crate) fn pixel_beside(vertex: GridPoint, step: GridVector, side: GridVector) -> GridPoint {
    let diagonal = step + side;
    GridPoint::new(
        vertex.x + if diagonal.x > 0 { 0 } else { -1 },
        vertex.y + if diagonal.y > 0 { 0 } else { -1 },
    )
}

/// One traced rim: a closed walk along pixel edges.
///
/// Move `i` goes from vertex `i` one unit in its direction; `turns[i]` is
/// the turn taken at the end of move `i`. The first move heads in
/// `direction`. The blob being traced is always on the right-hand side, so
/// outer rims run clockwise and hole rims counter-clockwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonPoints {
    start: GridPoint,
    direction: Direction,
    turns: Vec<Turn>,
    pixels: Vec<GridPoint>,
    voxel_count: usize,
}

impl PolygonPoints {
    /// Builds a rim from its walk and derives the boundary pixel loop and
    /// enclosed pixel count.
    #[must_use]
    pub fn from_walk(start: GridPoint, direction: Direction, turns: Vec<Turn>) -> Self {
        let mut pixels: Vec<GridPoint> = Vec::new();
        let mut p = start;
        let mut d = direction;
        for &turn in &turns {
            let pixel = pixel_beside(p, d.vector(), d.right().vector());
            if pixels.last() != Some(&pixel) {
                pixels.push(pixel);
            }
            p += d.vector();
            d = d.turn(turn);
        }
        if pixels.len() > 1 && pixels.first() == pixels.last() {
            pixels.pop();
        }

        let mut rim = Self {
            start,
            direction,
            turns,
            pixels,
            voxel_count: 0,
        };
        rim.voxel_count = usize::try_from(rim.signed_area().unsigned_abs()).unwrap_or(usize::MAX);
        rim
    }

    /// Corner where the walk starts and ends.
    #[must_use]
    pub fn start(&self) -> GridPoint {
        self.start
    }

    /// Direction of the first move.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Ordered 8-connected loop of the blob pixels along this rim.
    #[must_use]
    pub fn pixels(&self) -> &[GridPoint] {
        &self.pixels
    }

    /// Number of pixels enclosed by the rim.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    /// Number of unit moves in the walk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Every pixel corner visited, starting with [`PolygonPoints::start`].
    #[must_use]
    pub fn vertices(&self) -> Vec<GridPoint> {
        let mut out = Vec::with_capacity(self.turns.len());
        let mut p = self.start;
        let mut d = self.direction;
        for &turn in &self.turns {
            out.push(p);
            p += d.vector();
            d = d.turn(turn);
        }
        out
    }

    /// Only the corners where the walk changes direction.
    #[must_use]
    pub fn corners(&self) -> Vec<GridPoint> {
        let mut out = Vec::new();
        let mut p = self.start;
        let mut d = self.direction;
        for &turn in &self.turns {
            p += d.vector();
            if turn != Turn::Forward {
                out.push(p);
            }
            d = d.turn(turn);
        }
        out
    }

    /// Shoelace area of the walk in whole pixels.
    #[must_use]
    pub fn signed_area(&self) -> i64 {
        grid_signed_area(&self.vertices())
    }

    /// Returns `true` for clockwise (outer) rims.
    #[must_use]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() > 0
    }

    /// Net quarter turns; `4` for an outer rim and `-4` for a hole.
    #[must_use]
    pub fn winding(&self) -> i32 {
        self.turns.iter().map(|t| t.winding()).sum()
    }

    /// Converts the rim to a contour polygon.
    #[must_use]
    pub fn to_contour(&self, smoothing: ContourSmoothing) -> ContourPolygon {
        let points = match smoothing {
            ContourSmoothing::None => self.corners().into_iter().map(to_point2).collect(),
            ContourSmoothing::Small => {
                let mut points = simplify_closed(self.start, self.direction, &self.turns);
                dedup_points(&mut points, true);
                points
            }
        };
        ContourPolygon::new(points)
    }
}

/// One blob: its outer rim, its hole rims and its own pixel count.
///
/// Foreground nested inside a hole is reported as a separate
/// `InnerOuterPolygon`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerOuterPolygon {
    outer: PolygonPoints,
    inner: Vec<PolygonPoints>,
    voxel_count: usize,
}

impl InnerOuterPolygon {
    #[must_use]
    pub fn new(outer: PolygonPoints, inner: Vec<PolygonPoints>, voxel_count: usize) -> Self {
        Self {
            outer,
            inner,
            voxel_count,
        }
    }

    #[must_use]
    pub fn outer(&self) -> &PolygonPoints {
        &self.outer
    }

    #[must_use]
    pub fn inner(&self) -> &[PolygonPoints] {
        &self.inner
    }

    /// Foreground pixels of this blob, excluding its holes.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    /// The outer rim followed by every hole rim, as contour polygons.
    #[must_use]
    pub fn contours(&self, smoothing: ContourSmoothing) -> Vec<ContourPolygon> {
        std::iter::once(&self.outer)
            .chain(&self.inner)
            .map(|rim| rim.to_contour(smoothing))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rim(x: i32, y: i32, dir: Direction, turns: &str) -> PolygonPoints {
        PolygonPoints::from_walk(GridPoint::new(x, y), dir, Turn::parse_sequence(turns).unwrap())
    }

    #[test]
    fn single_pixel_rim() {
        let r = rim(2, 3, Direction::East, "RRRR");
        assert_eq!(r.pixels(), &[GridPoint::new(2, 3)]);
        assert_eq!(r.voxel_count(), 1);
        assert_eq!(r.winding(), 4);
        assert!(r.is_clockwise());
        assert_eq!(
            r.corners(),
            vec![
                GridPoint::new(3, 3),
                GridPoint::new(3, 4),
                GridPoint::new(2, 4),
                GridPoint::new(2, 3)
            ]
        );
    }

    #[test]
    fn rectangle_rim_pixels() {
        // 3x2 block with its top-left pixel at the origin.
        let r = rim(0, 0, Direction::East, "FFRFRFFRFR");
        assert_eq!(r.voxel_count(), 6);
        assert_eq!(r.pixels().len(), 6);
        assert_eq!(r.corners().len(), 4);
    }

    #[test]
    fn hole_rim_is_counter_clockwise() {
        let r = rim(1, 1, Direction::South, "LLLL");
        assert!(!r.is_clockwise());
        assert_eq!(r.signed_area(), -1);
        assert_eq!(r.voxel_count(), 1);
        assert_eq!(r.winding(), -4);
    }

    #[test]
    fn exact_contour_area_matches_pixels() {
        let r = rim(0, 0, Direction::East, "FFRFRFFRFR");
        let c = r.to_contour(ContourSmoothing::None);
        assert_eq!(c.len(), 4);
        assert_relative_eq!(c.area(), 6.0);
        assert!(c.is_clockwise());
    }

    #[test]
    fn smoothed_contour_drops_start_duplicate() {
        let r = rim(0, 0, Direction::East, "RRRR");
        let c = r.to_contour(ContourSmoothing::Small);
        assert_eq!(c.len(), 4);
        assert_relative_eq!(c.area(), 1.0);
    }

    #[test]
    fn empty_polygon() {
        let c = ContourPolygon::empty();
        assert!(c.is_empty());
        assert_relative_eq!(c.area(), 0.0);
    }
}
