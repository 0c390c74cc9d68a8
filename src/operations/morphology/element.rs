use tracing::debug;

use crate::error::{ArgumentError, Result};
use crate::math::VoxelOffset;
use crate::operations::components::ConnectedComponents;
use crate::volume::Volume3D;

/// Ellipsoidal structuring element in voxel units.
///
/// The offset `d` belongs to the element when `Σ (dᵢ / rᵢ)² <= 1`. Along an
/// axis whose radius is below one voxel the element is flat. The surface is
/// the part of the element face-adjacent to its outside; painting an element
/// next to an already painted one only needs the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuringElement {
    radius: [f64; 3],
    extent: [i32; 3],
    offsets: Vec<VoxelOffset>,
    surface_offsets: Vec<VoxelOffset>,
}

impl StructuringElement {
    /// Builds the element for the given per-axis radii.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::InvalidRadius` if a radius is negative, NaN or
    /// infinite.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(radius_x: f64, radius_y: f64, radius_z: f64) -> Result<Self> {
        let radius = [radius_x, radius_y, radius_z];
        if let Some(bad) = radius.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(ArgumentError::InvalidRadius(bad.to_string()).into());
        }
        let extent = radius.map(|r| r.floor() as i32);

        let mut offsets = Vec::new();
        for z in -extent[2]..=extent[2] {
            for y in -extent[1]..=extent[1] {
                for x in -extent[0]..=extent[0] {
                    let d = VoxelOffset::new(x, y, z);
                    if Self::inside(&radius, d) {
                        offsets.push(d);
                    }
                }
            }
        }
        let surface_offsets = Self::surface(extent, &offsets)?;

        debug!(
            rx = radius_x,
            ry = radius_y,
            rz = radius_z,
            voxels = offsets.len(),
            surface = surface_offsets.len(),
            "built structuring element"
        );
        Ok(Self {
            radius,
            extent,
            offsets,
            surface_offsets,
        })
    }

    /// Element with the same radius along every axis.
    ///
    /// # Errors
    ///
    /// See [`StructuringElement::new`].
    pub fn sphere(radius: f64) -> Result<Self> {
        Self::new(radius, radius, radius)
    }

    fn inside(radius: &[f64; 3], d: VoxelOffset) -> bool {
        let mut sum = 0.0;
        for axis in 0..3 {
            if d[axis] != 0 {
                let t = f64::from(d[axis]) / radius[axis];
                sum += t * t;
            }
        }
        sum <= 1.0
    }

    /// Element voxels face-adjacent to the exterior component of the
    /// complement, computed in a box padded by one voxel.
    #[allow(clippy::cast_sign_loss)]
    fn surface(extent: [i32; 3], offsets: &[VoxelOffset]) -> Result<Vec<VoxelOffset>> {
        let dims = extent.map(|e| (2 * e + 3) as usize);
        let mut padded = Volume3D::new_fill(dims[0], dims[1], dims[2], 0u8);
        let at = |d: VoxelOffset| {
            (
                (d.x + extent[0] + 1) as usize,
                (d.y + extent[1] + 1) as usize,
                (d.z + extent[2] + 1) as usize,
            )
        };
        for &d in offsets {
            let (x, y, z) = at(d);
            padded.set(x, y, z, 1);
        }

        // Element voxels act as background so only the complement is labeled.
        let labeling = ConnectedComponents::new(1u8).execute(&padded)?;
        let labels = labeling.labels();
        let exterior = labels.get(0, 0, 0).copied().unwrap_or(0);

        let faces = [
            VoxelOffset::new(1, 0, 0),
            VoxelOffset::new(-1, 0, 0),
            VoxelOffset::new(0, 1, 0),
            VoxelOffset::new(0, -1, 0),
            VoxelOffset::new(0, 0, 1),
            VoxelOffset::new(0, 0, -1),
        ];
        Ok(offsets
            .iter()
            .copied()
            .filter(|&d| {
                faces.iter().any(|&f| {
                    let (x, y, z) = at(d + f);
                    labels.get(x, y, z) == Some(&exterior)
                })
            })
            .collect())
    }

    #[must_use]
    pub fn radius(&self) -> [f64; 3] {
        self.radius
    }

    /// Largest offset along each axis.
    #[must_use]
    pub fn extent(&self) -> [i32; 3] {
        self.extent
    }

    /// Every element voxel relative to the center, in Z, Y, X order.
    #[must_use]
    pub fn offsets(&self) -> &[VoxelOffset] {
        &self.offsets
    }

    #[must_use]
    pub fn surface_offsets(&self) -> &[VoxelOffset] {
        &self.surface_offsets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
