use tracing::debug;

use crate::error::{ArgumentError, Result};
use crate::parallel::for_each_chunk_mut;
use crate::volume::{Region2D, Volume3D, VoxelLabel};

/// Checks every precondition of [`flood_fill_holes`] and returns the
/// sentinel label. Never writes.
fn validate<T: VoxelLabel>(
    buffer: &[T],
    dim_x: usize,
    dim_y: usize,
    bounds: Region2D,
    foreground: T,
    background: T,
) -> Result<T> {
    let expected = dim_x
        .checked_mul(dim_y)
        .ok_or(ArgumentError::SizeMismatch {
            expected: usize::MAX,
            actual: buffer.len(),
        })?;
    if buffer.len() < expected {
        return Err(ArgumentError::SizeMismatch {
            expected,
            actual: buffer.len(),
        }
        .into());
    }
    if buffer.len() != expected {
        return Err(ArgumentError::DimensionMismatch(format!(
            "buffer of {} pixels for a {dim_x}x{dim_y} slice",
            buffer.len()
        ))
        .into());
    }
    if foreground == background {
        return Err(ArgumentError::SameForegroundBackground.into());
    }
    if !Region2D::from_dims(dim_x, dim_y).contains_region(&bounds) {
        return Err(ArgumentError::RegionOutOfBounds(bounds.to_string()).into());
    }
    let sentinel = foreground
        .max(background)
        .successor()
        .ok_or(ArgumentError::NoSentinelAvailable)?;
    if !bounds.is_empty() && region_pixels(buffer, dim_x, bounds).any(|v| v == sentinel) {
        return Err(ArgumentError::SentinelInUse.into());
    }
    Ok(sentinel)
}

#[allow(clippy::cast_sign_loss)]
fn region_pixels<T: Copy>(
    buffer: &[T],
    dim_x: usize,
    bounds: Region2D,
) -> impl Iterator<Item = T> + '_ {
    (bounds.min_y..=bounds.max_y).flat_map(move |y| {
        let start = y as usize * dim_x;
        buffer[start + bounds.min_x as usize..=start + bounds.max_x as usize]
            .iter()
            .copied()
    })
}

/// Fills enclosed background inside `bounds` with `foreground`.
///
/// Background pixels reachable from the border of `bounds` through
/// 4-connected background are the outside; every other background pixel in
/// `bounds` is a hole and becomes foreground. Pixels outside `bounds` are
/// never read or written. The outside is marked with a temporary sentinel,
/// `max(foreground, background) + 1`, which is restored to background
/// afterwards.
///
/// # Errors
///
/// Returns an `ArgumentError` without touching the buffer if its length does
/// not match `dim_x * dim_y`, `bounds` does not fit the slice, the two labels
/// are equal, no sentinel label exists, or the sentinel already occurs in
/// `bounds`.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub fn flood_fill_holes<T: VoxelLabel>(
    buffer: &mut [T],
    dim_x: usize,
    dim_y: usize,
    bounds: Region2D,
    foreground: T,
    background: T,
) -> Result<()> {
    let sentinel = validate(buffer, dim_x, dim_y, bounds, foreground, background)?;
    if bounds.is_empty() {
        return Ok(());
    }
    let at = |x: i32, y: i32| x as usize + y as usize * dim_x;

    // Seed from every border pixel of the box.
    let mut seeds: Vec<(i32, i32)> = Vec::new();
    for x in bounds.min_x..=bounds.max_x {
        seeds.push((x, bounds.min_y));
        seeds.push((x, bounds.max_y));
    }
    for y in bounds.min_y..=bounds.max_y {
        seeds.push((bounds.min_x, y));
        seeds.push((bounds.max_x, y));
    }

    while let Some((x, y)) = seeds.pop() {
        if buffer[at(x, y)] != background {
            continue;
        }
        // Extend the run left and right, recoloring as we go.
        let mut left = x;
        while left > bounds.min_x && buffer[at(left - 1, y)] == background {
            left -= 1;
        }
        let mut right = x;
        while right < bounds.max_x && buffer[at(right + 1, y)] == background {
            right += 1;
        }
        for rx in left..=right {
            buffer[at(rx, y)] = sentinel;
        }
        // Queue one seed per background run directly above and below.
        for ny in [y - 1, y + 1] {
            if ny < bounds.min_y || ny > bounds.max_y {
                continue;
            }
            let mut in_run = false;
            for rx in left..=right {
                let is_bg = buffer[at(rx, ny)] == background;
                if is_bg && !in_run {
                    seeds.push((rx, ny));
                }
                in_run = is_bg;
            }
        }
    }

    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let v = &mut buffer[at(x, y)];
            if *v == background {
                *v = foreground;
            } else if *v == sentinel {
                *v = background;
            }
        }
    }
    Ok(())
}

/// Fills enclosed background in every Z slice of a volume.
///
/// Each slice is flooded within the bounding box of its own foreground.
/// Slices are independent and may run in parallel.
#[derive(Debug, Clone, Copy)]
pub struct FloodFillHoles<T> {
    foreground: T,
    background: T,
    max_workers: Option<usize>,
}

impl<T: VoxelLabel> FloodFillHoles<T> {
    #[must_use]
    pub fn new(foreground: T, background: T) -> Self {
        Self {
            foreground,
            background,
            max_workers: None,
        }
    }

    /// Caps the number of slices processed concurrently.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    /// Fills the holes of every slice in place.
    ///
    /// # Errors
    ///
    /// Returns an `ArgumentError` if any slice fails validation; in that case
    /// no voxel has been written.
    pub fn execute(&self, volume: &mut Volume3D<T>) -> Result<()> {
        let (dim_x, dim_y) = (volume.dim_x(), volume.dim_y());
        let boxes: Vec<Region2D> = (0..volume.dim_z())
            .map(|z| volume.slice(z).bounding_box(self.foreground))
            .collect();
        for (z, &bounds) in boxes.iter().enumerate() {
            validate(
                volume.slice(z).data(),
                dim_x,
                dim_y,
                bounds,
                self.foreground,
                self.background,
            )?;
        }
        debug!(
            slices = boxes.iter().filter(|b| !b.is_empty()).count(),
            "filling slice holes"
        );

        let (fg, bg) = (self.foreground, self.background);
        for_each_chunk_mut(
            volume.data_mut(),
            dim_x * dim_y,
            self.max_workers,
            |z, slice| flood_fill_holes(slice, dim_x, dim_y, boxes[z], fg, bg),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::volume::Volume2D;

    fn ring(n: usize) -> Volume2D<u8> {
        let mut s = Volume2D::new_fill(n, n, 0u8);
        for i in 1..n - 1 {
            s.set(i, 1, 1);
            s.set(i, n - 2, 1);
            s.set(1, i, 1);
            s.set(n - 2, i, 1);
        }
        s
    }

    #[test]
    fn fills_enclosed_background() {
        let mut s = ring(6);
        let bounds = s.as_view().bounding_box(1);
        flood_fill_holes(s.data_mut(), 6, 6, bounds, 1, 0).unwrap();
        // The 4x4 ring plus its 2x2 interior.
        assert_eq!(s.data().iter().filter(|&&v| v == 1).count(), 16);
        assert_eq!(s.data()[0], 0);
    }

    #[test]
    fn leaves_open_shapes_alone() {
        let mut s = ring(6);
        s.set(1, 3, 0); // open the left wall
        let before = s.clone();
        let bounds = s.as_view().bounding_box(1);
        flood_fill_holes(s.data_mut(), 6, 6, bounds, 1, 0).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn diagonal_gap_does_not_leak() {
        // Background is 4-connected: a diagonal gap in the wall keeps the hole closed.
        #[rustfmt::skip]
        let data = vec![
            0, 1, 1, 0,
            1, 0, 0, 1,
            1, 0, 0, 1,
            0, 1, 1, 0u8,
        ];
        let mut s = Volume2D::from_vec(4, 4, data).unwrap();
        flood_fill_holes(s.data_mut(), 4, 4, Region2D::new(0, 3, 0, 3), 1, 0).unwrap();
        assert_eq!(s.data().iter().filter(|&&v| v == 1).count(), 12);
    }

    #[test]
    fn rejects_equal_labels_without_writing() {
        let mut s = ring(6);
        let before = s.clone();
        let err = flood_fill_holes(s.data_mut(), 6, 6, Region2D::from_dims(6, 6), 1, 1)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(s, before);
    }

    #[test]
    fn rejects_dimension_mismatch_without_writing() {
        let mut s = ring(6);
        let before = s.clone();
        assert!(flood_fill_holes(s.data_mut(), 6, 7, Region2D::from_dims(6, 6), 1, 0)
            .unwrap_err()
            .is_invalid_argument());
        assert!(flood_fill_holes(s.data_mut(), 5, 6, Region2D::from_dims(5, 6), 1, 0)
            .unwrap_err()
            .is_invalid_argument());
        assert!(flood_fill_holes(s.data_mut(), 6, 6, Region2D::new(0, 6, 0, 5), 1, 0)
            .unwrap_err()
            .is_invalid_argument());
        assert!(flood_fill_holes(&mut [], 6, 6, Region2D::from_dims(6, 6), 1u8, 0)
            .unwrap_err()
            .is_invalid_argument());
        assert_eq!(s, before);
    }

    #[test]
    fn rejects_missing_or_used_sentinel() {
        let mut s = ring(6);
        assert!(flood_fill_holes(s.data_mut(), 6, 6, Region2D::from_dims(6, 6), u8::MAX, 0)
            .unwrap_err()
            .is_invalid_argument());
        s.set(0, 0, 2);
        let before = s.clone();
        let err = flood_fill_holes(s.data_mut(), 6, 6, Region2D::from_dims(6, 6), 1, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::MasktraceError::Argument(ArgumentError::SentinelInUse)
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn volume_fill_matches_for_all_worker_counts() {
        let mut vol = Volume3D::new_fill(8, 8, 6, 0u8);
        for z in 0..6 {
            for i in 1..7 {
                vol.set(i, 1, z, 1);
                vol.set(i, 6, z, 1);
                vol.set(1, i, z, 1);
                vol.set(6, i, z, 1);
            }
            if z % 2 == 1 {
                vol.set(1, 3, z, 0);
            }
        }
        let mut expected = vol.clone();
        FloodFillHoles::new(1u8, 0).with_max_workers(1).execute(&mut expected).unwrap();
        assert_eq!(expected.slice(0).data().iter().filter(|&&v| v == 1).count(), 36);
        for workers in [2, 4, 10] {
            let mut v = vol.clone();
            FloodFillHoles::new(1u8, 0).with_max_workers(workers).execute(&mut v).unwrap();
            assert_eq!(v, expected);
        }
    }
}
