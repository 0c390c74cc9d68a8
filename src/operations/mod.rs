pub mod components;
pub mod extract;
pub mod fill;
pub mod morphology;
pub mod simplify;
pub mod trace;

pub use components::{ComponentLabeling, ComponentStatistics, ConnectedComponents};
pub use extract::{
    ExtractContours, ExtractionParams, FillContours, RoundTrip, RoundTripReport,
    SMOOTHED_ROUND_TRIP_TOLERANCE,
};
pub use fill::{flood_fill_holes, FillPolygon, FloodFillHoles};
pub use morphology::{Dilate, Erode, StructuringElement};
pub use simplify::simplify;
pub use trace::TraceBoundaries;
