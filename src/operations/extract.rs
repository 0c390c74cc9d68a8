//! Mask volume to contours and back.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::contours::{ContourPolygon, ContourSmoothing, ContoursPerSlice, InnerOuterPolygon};
use crate::error::{ArgumentError, Result};
use crate::operations::fill::{check_finite, FillPolygon};
use crate::operations::trace::TraceBoundaries;
use crate::parallel::{for_each_chunk_mut, map_index};
use crate::volume::{Region3D, SliceView, SliceViewMut, Volume2D, Volume3D, VoxelLabel};

/// Largest fraction of foreground pixels that may change when a slice is
/// traced with [`ContourSmoothing::Small`] and filled again.
///
/// Smoothing never moves a polygon edge across a pixel center, so smoothed
/// round trips are exact like unsmoothed ones.
pub const SMOOTHED_ROUND_TRIP_TOLERANCE: f64 = 0.0;

/// Parameters controlling contour extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionParams {
    /// How rims are turned into polygons.
    pub smoothing: ContourSmoothing,
    /// Only voxels inside this box are traced; the rest is background.
    pub region: Option<Region3D>,
    /// Store an empty polygon list for slices without foreground.
    pub keep_empty_slices: bool,
    /// Upper bound on slices traced concurrently.
    pub max_workers: Option<usize>,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            smoothing: ContourSmoothing::Small,
            region: None,
            keep_empty_slices: false,
            max_workers: None,
        }
    }
}

/// Extracts contour polygons from the foreground of a mask.
///
/// Each blob contributes its outer rim followed by its hole rims; foreground
/// nested inside a hole follows as further blobs.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContours<T> {
    foreground: T,
    params: ExtractionParams,
}

impl<T: VoxelLabel> ExtractContours<T> {
    #[must_use]
    pub fn new(foreground: T) -> Self {
        Self {
            foreground,
            params: ExtractionParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: ExtractionParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    /// Traces one slice without converting the rims.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`TraceBoundaries::execute`].
    pub fn trace_slice(&self, slice: &SliceView<'_, T>) -> Result<Vec<InnerOuterPolygon>> {
        let mut tracer = TraceBoundaries::new(self.foreground);
        if let Some(region) = self.params.region {
            tracer = tracer.with_region(region.slice_region());
        }
        tracer.execute(slice)
    }

    /// Contour polygons of one slice.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`TraceBoundaries::execute`].
    pub fn execute_slice(&self, slice: &SliceView<'_, T>) -> Result<Vec<ContourPolygon>> {
        Ok(self
            .trace_slice(slice)?
            .iter()
            .flat_map(|blob| blob.contours(self.params.smoothing))
            .collect())
    }

    /// Contour polygons of every slice of `volume`.
    ///
    /// Slices are traced in parallel; results are stored by a single writer
    /// in ascending slice order.
    ///
    /// # Errors
    ///
    /// Returns the first error of any slice in slice order, or
    /// `ExecutionError::WorkerPool` if the pool cannot be built.
    pub fn execute(&self, volume: &Volume3D<T>) -> Result<ContoursPerSlice> {
        let slices: Vec<usize> = (0..volume.dim_z())
            .filter(|&z| self.includes_slice(z))
            .collect();
        let traced = map_index(slices.len(), self.params.max_workers, |i| {
            self.execute_slice(&volume.slice(slices[i]))
        })?;

        let contours = ContoursPerSlice::new();
        let mut polygons = 0;
        for (&z, result) in slices.iter().zip(traced) {
            let slice_polygons = result?;
            if slice_polygons.is_empty() && !self.params.keep_empty_slices {
                continue;
            }
            polygons += slice_polygons.len();
            contours.insert(z, slice_polygons);
        }
        debug!(
            slices = contours.len(),
            polygons,
            smoothing = ?self.params.smoothing,
            "extracted contours"
        );
        Ok(contours)
    }

    fn includes_slice(&self, z: usize) -> bool {
        match self.params.region {
            None => true,
            Some(region) => i32::try_from(z).is_ok_and(|z| region.contains_slice(z)),
        }
    }
}

/// Rasterizes stored contours back into a volume.
///
/// Each slice's polygons are combined with even-odd parity, so outer rims,
/// holes and nested blobs come out right when passed together. Voxels not
/// covered are left untouched.
#[derive(Debug, Clone, Copy)]
pub struct FillContours<T> {
    value: T,
    max_workers: Option<usize>,
}

impl<T: VoxelLabel> FillContours<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            max_workers: None,
        }
    }

    /// Caps the number of slices filled concurrently.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    /// Fills every slice of `contours` into `volume` and returns the number
    /// of voxels set.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::RegionOutOfBounds` if a slice index is beyond
    /// the volume or `ArgumentError::NonFinitePoint` for a bad coordinate.
    /// Nothing is written in either case.
    pub fn execute(&self, volume: &mut Volume3D<T>, contours: &ContoursPerSlice) -> Result<usize> {
        let snapshot = contours.snapshot();
        let dim_z = volume.dim_z();
        for (&z, polygons) in &snapshot {
            if z >= dim_z {
                return Err(ArgumentError::RegionOutOfBounds(format!(
                    "slice {z} of a volume with {dim_z} slices"
                ))
                .into());
            }
            check_finite(polygons)?;
        }

        let (dim_x, dim_y) = (volume.dim_x(), volume.dim_y());
        let fill = FillPolygon::new(self.value).with_max_workers(1);
        let written = AtomicUsize::new(0);
        for_each_chunk_mut(volume.data_mut(), dim_x * dim_y, self.max_workers, |z, chunk| {
            let Some(polygons) = snapshot.get(&z) else {
                return Ok(());
            };
            let mut slice = SliceViewMut::from_slice(dim_x, dim_y, chunk)?;
            written.fetch_add(fill.execute(&mut slice, polygons)?, Ordering::Relaxed);
            Ok(())
        })?;

        let written = written.into_inner();
        debug!(slices = snapshot.len(), voxels = written, "filled contours");
        Ok(written)
    }
}

/// Outcome of tracing a slice and filling the contours again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTripReport {
    pub foreground_pixels: usize,
    /// Pixels whose foreground membership changed.
    pub mismatched_pixels: usize,
}

impl RoundTripReport {
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.mismatched_pixels == 0
    }

    /// Mismatched pixels relative to the original foreground.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mismatch_ratio(&self) -> f64 {
        match (self.foreground_pixels, self.mismatched_pixels) {
            (_, 0) => 0.0,
            (0, _) => f64::INFINITY,
            (fg, bad) => bad as f64 / fg as f64,
        }
    }

    #[must_use]
    pub fn is_within(&self, tolerance: f64) -> bool {
        self.mismatch_ratio() <= tolerance
    }
}

/// Traces a slice, fills the contours into an empty raster and compares.
#[derive(Debug, Clone, Copy)]
pub struct RoundTrip<T> {
    foreground: T,
    smoothing: ContourSmoothing,
}

impl<T: VoxelLabel> RoundTrip<T> {
    #[must_use]
    pub fn new(foreground: T, smoothing: ContourSmoothing) -> Self {
        Self {
            foreground,
            smoothing,
        }
    }

    /// Rasterizes the contours of `slice` into a `0`/`1` mask.
    ///
    /// # Errors
    ///
    /// Propagates tracing and fill errors.
    pub fn rasterize(&self, slice: &SliceView<'_, T>) -> Result<Volume2D<u8>> {
        let params = ExtractionParams {
            smoothing: self.smoothing,
            max_workers: Some(1),
            ..ExtractionParams::default()
        };
        let contours = ExtractContours::new(self.foreground)
            .with_params(params)
            .execute_slice(slice)?;
        let mut raster = Volume2D::new_fill(slice.dim_x(), slice.dim_y(), 0u8);
        FillPolygon::new(1u8)
            .with_max_workers(1)
            .execute(&mut raster.as_view_mut(), &contours)?;
        Ok(raster)
    }

    /// Runs the round trip and counts the differences.
    ///
    /// # Errors
    ///
    /// Propagates tracing and fill errors.
    pub fn execute(&self, slice: &SliceView<'_, T>) -> Result<RoundTripReport> {
        let raster = self.rasterize(slice)?;
        let mut report = RoundTripReport {
            foreground_pixels: 0,
            mismatched_pixels: 0,
        };
        for (&original, &filled) in slice.data().iter().zip(raster.data()) {
            let was = original == self.foreground;
            report.foreground_pixels += usize::from(was);
            report.mismatched_pixels += usize::from(was != (filled == 1));
        }

        let tolerance = match self.smoothing {
            ContourSmoothing::None => 0.0,
            ContourSmoothing::Small => SMOOTHED_ROUND_TRIP_TOLERANCE,
        };
        if !report.is_within(tolerance) {
            warn!(
                mismatched = report.mismatched_pixels,
                smoothing = ?self.smoothing,
                "round trip exceeds tolerance"
            );
        }
        debug!(
            foreground = report.foreground_pixels,
            mismatched = report.mismatched_pixels,
            smoothing = ?self.smoothing,
            "round trip"
        );
        Ok(report)
    }
}
