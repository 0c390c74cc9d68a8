use tracing::debug;

use super::{boundary_centers, paint, StructuringElement};
use crate::volume::{Volume3D, VoxelLabel};

/// Shrinks the foreground by a structuring element.
///
/// A foreground voxel becomes background when its element reaches a
/// non-foreground voxel of the volume. The outside of the volume does not
/// erode, and voxels with other labels are never changed.
#[derive(Debug, Clone, Copy)]
pub struct Erode<'a, T> {
    element: &'a StructuringElement,
    foreground: T,
    background: T,
}

impl<'a, T: VoxelLabel> Erode<'a, T> {
    #[must_use]
    pub fn new(element: &'a StructuringElement, foreground: T, background: T) -> Self {
        Self {
            element,
            foreground,
            background,
        }
    }

    /// Erodes `volume` in place and returns the number of voxels changed.
    pub fn execute(&self, volume: &mut Volume3D<T>) -> usize {
        let fg = self.foreground;
        let centers = boundary_centers(volume, |v| v != fg, |n| n == fg);
        let changed = paint(volume, &centers, self.element, self.background, |v| v == fg);
        debug!(
            centers = centers.iter().filter(|&&c| c).count(),
            changed, "eroded"
        );
        changed
    }
}
