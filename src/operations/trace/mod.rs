//! Boundary tracing of one mask slice.
//!
//! Foreground blobs are 8-connected, background (and therefore holes) is
//! 4-connected. Each blob yields one [`InnerOuterPolygon`]: its outer rim,
//! traced clockwise, and one counter-clockwise rim per hole. Foreground that
//! sits inside a hole is traced later as a blob of its own, so nesting depth
//! is unbounded without recursion.

mod walk;

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::contours::{InnerOuterPolygon, PolygonPoints};
use crate::error::{ArgumentError, InvariantError, Result};
use crate::math::{Direction, GridPoint};
use crate::operations::fill::flood_fill_holes;
use crate::volume::{Region2D, SliceView, VoxelLabel};

use walk::walk_rim;

/// Part of the slice still to be scanned for blobs.
///
/// Only pixels whose owner equals `owner` are eligible: `0` is the top
/// level, any other value is the hole that encloses them.
#[derive(Debug, Clone, Copy)]
struct Window {
    region: Region2D,
    owner: u32,
}

/// Traces every foreground blob of a slice.
///
/// # Example
///
/// ```
/// use masktrace::operations::TraceBoundaries;
/// use masktrace::volume::Volume2D;
///
/// let mut slice = Volume2D::new_fill(4, 4, 0u8);
/// slice.fill_rect(1, 1, 2, 2, 1);
/// let blobs = TraceBoundaries::new(1u8).execute(&slice.as_view()).unwrap();
/// assert_eq!(blobs.len(), 1);
/// assert_eq!(blobs[0].voxel_count(), 4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TraceBoundaries<T> {
    foreground: T,
    region: Option<Region2D>,
}

impl<T: VoxelLabel> TraceBoundaries<T> {
    /// Traces pixels equal to `foreground`; every other value is background.
    #[must_use]
    pub fn new(foreground: T) -> Self {
        Self {
            foreground,
            region: None,
        }
    }

    /// Restricts tracing to `region`. Pixels outside it count as background.
    #[must_use]
    pub fn with_region(mut self, region: Region2D) -> Self {
        self.region = Some(region);
        self
    }

    /// Traces the slice.
    ///
    /// Blobs are reported in discovery order: row-major over the slice first,
    /// then row-major within each hole that contains foreground, holes taken
    /// in the order they were found.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::VolumeTooLarge` if the slice has more pixels
    /// than blob ids can address, or an `InvariantError` if a traced rim does
    /// not close or does not enclose the pixel count it should.
    pub fn execute(&self, slice: &SliceView<'_, T>) -> Result<Vec<InnerOuterPolygon>> {
        let full = slice.bounds();
        let bounds = self.region.map_or(full, |r| r.intersect(&full));
        if bounds.is_empty() {
            return Ok(Vec::new());
        }
        let len = slice.data().len();
        if u32::try_from(len).is_err() {
            return Err(ArgumentError::VolumeTooLarge(len).into());
        }

        let mut tracer = Tracer {
            slice: *slice,
            foreground: self.foreground,
            bounds,
            blob: vec![0; len],
            owner: vec![0; len],
            next_blob: 1,
            next_hole: 1,
        };
        let mut windows = VecDeque::from([Window {
            region: bounds,
            owner: 0,
        }]);
        let mut blobs = Vec::new();

        while let Some(window) = windows.pop_front() {
            let region = window.region;
            for y in region.min_y..=region.max_y {
                for x in region.min_x..=region.max_x {
                    let p = GridPoint::new(x, y);
                    let idx = tracer.index(p);
                    if tracer.blob[idx] == 0
                        && tracer.owner[idx] == window.owner
                        && tracer.is_foreground(p)
                    {
                        let (blob, nested) = tracer.trace_blob(p)?;
                        blobs.push(blob);
                        windows.extend(nested);
                    }
                }
            }
        }

        debug!(
            blobs = blobs.len(),
            nested_holes = tracer.next_hole - 1,
            region = %bounds,
            "traced slice"
        );
        Ok(blobs)
    }
}

struct Tracer<'a, T> {
    slice: SliceView<'a, T>,
    foreground: T,
    bounds: Region2D,
    /// Blob id per pixel, `0` if untraced.
    blob: Vec<u32>,
    /// Id of the foreground-holding hole each pixel lies in, `0` for none.
    owner: Vec<u32>,
    next_blob: u32,
    next_hole: u32,
}

impl<T: VoxelLabel> Tracer<'_, T> {
    #[allow(clippy::cast_sign_loss)]
    fn index(&self, p: GridPoint) -> usize {
        p.x as usize + p.y as usize * self.slice.dim_x()
    }

    fn is_foreground(&self, p: GridPoint) -> bool {
        self.bounds.contains(p.x, p.y) && self.slice.get(p.x, p.y) == Some(self.foreground)
    }

    fn in_blob(&self, p: GridPoint, id: u32) -> bool {
        self.bounds.contains(p.x, p.y) && self.blob[self.index(p)] == id
    }

    /// Traces the blob whose first pixel in row-major order is `seed`.
    fn trace_blob(&mut self, seed: GridPoint) -> Result<(InnerOuterPolygon, Vec<Window>)> {
        let id = self.next_blob;
        self.next_blob += 1;
        let (count, bbox) = self.label_blob(seed, id);
        let limit = 4 * count + 4;

        let outer = walk_rim(seed, Direction::East, limit, |p| self.in_blob(p, id))?;
        let (inner, nested) = self.trace_holes(id, bbox, limit)?;

        let hole_pixels: usize = inner.iter().map(PolygonPoints::voxel_count).sum();
        if outer.voxel_count() != count + hole_pixels {
            return Err(InvariantError::AreaMismatch {
                expected: count + hole_pixels,
                actual: outer.voxel_count(),
            }
            .into());
        }
        trace!(
            blob = id,
            x = seed.x,
            y = seed.y,
            pixels = count,
            holes = inner.len(),
            "traced blob"
        );
        Ok((InnerOuterPolygon::new(outer, inner, count), nested))
    }

    /// Marks the 8-connected blob around `seed` with `id`. Returns its pixel
    /// count and bounding box.
    fn label_blob(&mut self, seed: GridPoint, id: u32) -> (usize, Region2D) {
        let mut count = 0;
        let mut bbox = Region2D::EMPTY;
        let idx = self.index(seed);
        self.blob[idx] = id;
        let mut stack = vec![seed];
        while let Some(p) = stack.pop() {
            count += 1;
            bbox.include(p.x, p.y);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let q = GridPoint::new(p.x + dx, p.y + dy);
                    if (dx != 0 || dy != 0) && self.is_foreground(q) {
                        let qi = self.index(q);
                        if self.blob[qi] == 0 {
                            self.blob[qi] = id;
                            stack.push(q);
                        }
                    }
                }
            }
        }
        (count, bbox)
    }

    /// Finds the holes of blob `id` and traces their rims.
    ///
    /// Returns the rims in row-major order of their first pixel, plus a scan
    /// window for every hole that contains foreground.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn trace_holes(
        &mut self,
        id: u32,
        bbox: Region2D,
        limit: usize,
    ) -> Result<(Vec<PolygonPoints>, Vec<Window>)> {
        // Local mask of the blob with a one-pixel background margin.
        let frame = bbox.inflate(1);
        let (w, h) = (frame.width(), frame.height());
        let local = |x: usize, y: usize| GridPoint::new(frame.min_x + x as i32, frame.min_y + y as i32);
        let mut mask = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                if self.in_blob(local(x, y), id) {
                    mask[x + y * w] = 1;
                }
            }
        }
        let mut filled = mask.clone();
        flood_fill_holes(&mut filled, w, h, Region2D::from_dims(w, h), 1, 0)?;

        let is_hole = |i: usize| filled[i] == 1 && mask[i] == 0;
        let mut seen = vec![false; w * h];
        let mut rims = Vec::new();
        let mut nested = Vec::new();

        for start in 0..w * h {
            if seen[start] || !is_hole(start) {
                continue;
            }
            // 4-connected hole component.
            seen[start] = true;
            let mut stack = vec![start];
            let mut pixels = Vec::new();
            let mut region = Region2D::EMPTY;
            while let Some(i) = stack.pop() {
                let p = local(i % w, i / w);
                pixels.push(p);
                region.include(p.x, p.y);
                let (x, y) = (i % w, i / w);
                let neighbors = [
                    (x > 0).then(|| i - 1),
                    (x + 1 < w).then(|| i + 1),
                    (y > 0).then(|| i - w),
                    (y + 1 < h).then(|| i + w),
                ];
                for n in neighbors.into_iter().flatten() {
                    if !seen[n] && is_hole(n) {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }

            let corner = local(start % w, start / w);
            let rim = walk_rim(corner, Direction::South, limit, |p| self.in_blob(p, id))?;
            if rim.voxel_count() != pixels.len() {
                return Err(InvariantError::AreaMismatch {
                    expected: pixels.len(),
                    actual: rim.voxel_count(),
                }
                .into());
            }
            rims.push(rim);

            if pixels.iter().any(|&p| self.is_foreground(p)) {
                let owner = self.next_hole;
                self.next_hole += 1;
                for &p in &pixels {
                    let idx = self.index(p);
                    self.owner[idx] = owner;
                }
                nested.push(Window { region, owner });
            }
        }
        Ok((rims, nested))
    }
}
