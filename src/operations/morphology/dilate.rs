use tracing::debug;

use super::{boundary_centers, paint, StructuringElement};
use crate::volume::{Volume3D, VoxelLabel};

/// Grows the foreground by a structuring element.
///
/// Every voxel within the element of a foreground voxel becomes foreground,
/// whatever its previous value.
#[derive(Debug, Clone, Copy)]
pub struct Dilate<'a, T> {
    element: &'a StructuringElement,
    foreground: T,
}

impl<'a, T: VoxelLabel> Dilate<'a, T> {
    #[must_use]
    pub fn new(element: &'a StructuringElement, foreground: T) -> Self {
        Self {
            element,
            foreground,
        }
    }

    /// Dilates `volume` in place and returns the number of voxels changed.
    pub fn execute(&self, volume: &mut Volume3D<T>) -> usize {
        let fg = self.foreground;
        let centers = boundary_centers(volume, |v| v == fg, |n| n != fg);
        let changed = paint(volume, &centers, self.element, fg, |v| v != fg);
        debug!(
            centers = centers.iter().filter(|&&c| c).count(),
            changed, "dilated"
        );
        changed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::morphology::test_support::speckle;

    /// Paints the full element around every foreground voxel.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn reference(volume: &Volume3D<u8>, element: &StructuringElement) -> Volume3D<u8> {
        let mut out = volume.clone();
        for z in 0..volume.dim_z() {
            for y in 0..volume.dim_y() {
                for x in 0..volume.dim_x() {
                    if volume.get(x, y, z) != Some(&1) {
                        continue;
                    }
                    for d in element.offsets() {
                        let (px, py, pz) = (x as i32 + d.x, y as i32 + d.y, z as i32 + d.z);
                        if volume.contains(px, py, pz) {
                            out.set(px as usize, py as usize, pz as usize, 1);
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn single_voxel_takes_element_shape() {
        let element = StructuringElement::sphere(2.0).unwrap();
        let mut vol = Volume3D::new_fill(7, 7, 7, 0u8);
        vol.set(3, 3, 3, 1);
        let changed = Dilate::new(&element, 1u8).execute(&mut vol);
        assert_eq!(changed, 32);
        assert_eq!(vol.count(1), 33);
    }

    #[test]
    fn bar_with_unit_cross() {
        let element = StructuringElement::sphere(1.0).unwrap();
        let mut vol = Volume3D::new_fill(7, 7, 7, 0u8);
        for x in 2..=4 {
            vol.set(x, 3, 3, 1);
        }
        Dilate::new(&element, 1u8).execute(&mut vol);
        assert_eq!(vol.count(1), 17);
    }

    #[test]
    fn cube_grows_by_face_layers() {
        let element = StructuringElement::sphere(1.0).unwrap();
        let mut vol = Volume3D::new_fill(7, 7, 7, 0u8);
        for z in 2..=4 {
            for y in 2..=4 {
                for x in 2..=4 {
                    vol.set(x, y, z, 1);
                }
            }
        }
        Dilate::new(&element, 1u8).execute(&mut vol);
        assert_eq!(vol.count(1), 27 + 6 * 9);
        assert_eq!(vol.get(1, 1, 3), Some(&0));
    }

    #[test]
    fn painting_is_clipped_to_the_volume() {
        let element = StructuringElement::sphere(1.0).unwrap();
        let mut vol = Volume3D::new_fill(3, 3, 3, 0u8);
        vol.set(0, 0, 0, 1);
        Dilate::new(&element, 1u8).execute(&mut vol);
        assert_eq!(vol.count(1), 4);
    }

    #[test]
    fn overwrites_other_labels() {
        let element = StructuringElement::sphere(1.0).unwrap();
        let mut vol = Volume3D::from_vec(3, 1, 1, vec![1u8, 3, 0]).unwrap();
        Dilate::new(&element, 1u8).execute(&mut vol);
        assert_eq!(vol.data(), &[1, 1, 0]);
    }

    #[test]
    fn matches_full_painting() {
        for (seed, element) in [
            (3, StructuringElement::sphere(1.0).unwrap()),
            (5, StructuringElement::new(1.5, 1.5, 1.0).unwrap()),
            (9, StructuringElement::new(2.5, 1.0, 0.0).unwrap()),
        ] {
            let vol = speckle(12, seed, 4);
            let expected = reference(&vol, &element);
            let mut actual = vol.clone();
            Dilate::new(&element, 1u8).execute(&mut actual);
            assert_eq!(actual, expected);
        }
    }
}
