//! Rasterization: polygon scan fill and hole flood fill.

mod flood_fill;
mod scan_fill;

pub use flood_fill::{flood_fill_holes, FloodFillHoles};
pub use scan_fill::FillPolygon;

pub(crate) use scan_fill::check_finite;
