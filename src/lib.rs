pub mod contours;
pub mod error;
pub mod math;
pub mod operations;
pub mod parallel;
pub mod volume;

pub use error::{MasktraceError, Result};
