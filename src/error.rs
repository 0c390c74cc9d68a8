use thiserror::Error;

/// Top-level error type for masktrace.
#[derive(Debug, Error)]
pub enum MasktraceError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl MasktraceError {
    /// Returns `true` if the error is a rejected precondition.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }

    /// Returns `true` if the error reports a violated internal invariant.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Precondition violations. Raised before any buffer is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("region {0} lies outside the buffer")]
    RegionOutOfBounds(String),

    #[error("foreground and background labels are identical")]
    SameForegroundBackground,

    #[error("no label greater than both foreground and background is available")]
    NoSentinelAvailable,

    #[error("flood-fill sentinel value is already present in the fill region")]
    SentinelInUse,

    #[error("polygon point {index} is not finite")]
    NonFinitePoint { index: usize },

    #[error("invalid structuring element radius: {0}")]
    InvalidRadius(String),

    #[error("volume with {0} voxels is too large to label")]
    VolumeTooLarge(usize),
}

/// Internal invariant violations. These indicate a logic defect, not bad input.
#[derive(Debug, Error, PartialEq)]
pub enum InvariantError {
    #[error("traced area {actual} does not match foreground pixel count {expected}")]
    AreaMismatch { expected: usize, actual: usize },

    #[error("union-find rank overflow")]
    RankOverflow,

    #[error("boundary loop starting at ({x}, {y}) did not close")]
    UnclosedLoop { x: i32, y: i32 },
}

/// Errors raised by the parallel execution adapter.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience type alias for results using [`MasktraceError`].
pub type Result<T> = std::result::Result<T, MasktraceError>;
