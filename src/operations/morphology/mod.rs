//! Binary dilation and erosion with ellipsoidal structuring elements.
//!
//! Both operations paint the element only around boundary voxels of the
//! unmodified input, which gives the same result as painting around every
//! voxel because the element is symmetric and shrinks monotonically towards
//! its center along every axis.

mod dilate;
mod element;
mod erode;

pub use dilate::Dilate;
pub use element::StructuringElement;
pub use erode::Erode;

use crate::volume::{Volume3D, VoxelLabel};

/// Marks every voxel accepted by `is_center` that has an in-volume face
/// neighbor accepted by `is_neighbor`.
fn boundary_centers<T, C, N>(volume: &Volume3D<T>, is_center: C, is_neighbor: N) -> Vec<bool>
where
    T: VoxelLabel,
    C: Fn(T) -> bool,
    N: Fn(T) -> bool,
{
    let (dx, dy, dz) = (volume.dim_x(), volume.dim_y(), volume.dim_z());
    let plane = dx * dy;
    let data = volume.data();
    let mut centers = vec![false; data.len()];
    let mut i = 0;
    for z in 0..dz {
        for y in 0..dy {
            for x in 0..dx {
                if is_center(data[i]) {
                    let neighbors = [
                        (x > 0).then(|| i - 1),
                        (x + 1 < dx).then(|| i + 1),
                        (y > 0).then(|| i - dx),
                        (y + 1 < dy).then(|| i + dx),
                        (z > 0).then(|| i - plane),
                        (z + 1 < dz).then(|| i + plane),
                    ];
                    centers[i] = neighbors.into_iter().flatten().any(|n| is_neighbor(data[n]));
                }
                i += 1;
            }
        }
    }
    centers
}

/// Paints `value` with `element` around every center onto voxels accepted
/// by `target`, clipped to the volume. A center whose backward face neighbor
/// is also a center only paints the element surface. Returns the number of
/// voxels changed.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn paint<T, F>(
    volume: &mut Volume3D<T>,
    centers: &[bool],
    element: &StructuringElement,
    value: T,
    target: F,
) -> usize
where
    T: VoxelLabel,
    F: Fn(T) -> bool,
{
    let (dx, dy, dz) = (volume.dim_x(), volume.dim_y(), volume.dim_z());
    let plane = dx * dy;
    let mut changed = 0;
    let mut i = 0;
    for z in 0..dz {
        for y in 0..dy {
            for x in 0..dx {
                if centers[i] {
                    let follows = (x > 0 && centers[i - 1])
                        || (y > 0 && centers[i - dx])
                        || (z > 0 && centers[i - plane]);
                    let offsets = if follows {
                        element.surface_offsets()
                    } else {
                        element.offsets()
                    };
                    for d in offsets {
                        let (px, py, pz) = (x as i32 + d.x, y as i32 + d.y, z as i32 + d.z);
                        if !volume.contains(px, py, pz) {
                            continue;
                        }
                        let j = volume.index(px as usize, py as usize, pz as usize);
                        let voxel = &mut volume.data_mut()[j];
                        if target(*voxel) {
                            *voxel = value;
                            changed += 1;
                        }
                    }
                }
                i += 1;
            }
        }
    }
    changed
}
