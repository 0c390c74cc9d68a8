pub mod grid;
pub mod polygon_2d;

pub use grid::{Direction, Turn};

/// 2D point type for contour coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// Integer pixel or pixel-corner coordinate within a slice.
pub type GridPoint = nalgebra::Point2<i32>;

/// Integer step between two grid points.
pub type GridVector = nalgebra::Vector2<i32>;

/// Integer offset between two voxels.
pub type VoxelOffset = nalgebra::Vector3<i32>;

/// Global tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Converts an integer grid point to a floating-point contour point.
#[must_use]
pub fn to_point2(p: GridPoint) -> Point2 {
    Point2::new(f64::from(p.x), f64::from(p.y))
}
