//! Dense voxel storage.
//!
//! Volumes are row-major: the voxel `(x, y, z)` lives at
//! `x + y * dim_x + z * dim_x * dim_y`. A Z plane is a contiguous
//! `dim_x * dim_y` block, so slices can be borrowed without copying and
//! split into disjoint mutable chunks for per-slice parallel work.

mod region;

pub use region::{Region2D, Region3D};

use std::fmt::Debug;

use crate::error::ArgumentError;

/// Label type stored in a mask volume.
pub trait VoxelLabel: Copy + Eq + Ord + Default + Send + Sync + Debug + 'static {
    /// The next larger label, or `None` at the top of the range.
    fn successor(self) -> Option<Self>;
}

macro_rules! impl_voxel_label {
    ($($t:ty),*) => {
        $(
            impl VoxelLabel for $t {
                fn successor(self) -> Option<Self> {
                    self.checked_add(1)
                }
            }
        )*
    };
}

impl_voxel_label!(u8, u16, u32, u64, i8, i16, i32);

fn checked_len(dims: &[usize], actual: usize) -> Result<usize, ArgumentError> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ArgumentError::SizeMismatch {
            expected: usize::MAX,
            actual,
        })
}

/// An owned 3D voxel volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume3D<T> {
    dim_x: usize,
    dim_y: usize,
    dim_z: usize,
    data: Vec<T>,
}

impl<T> Volume3D<T> {
    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::SizeMismatch` if `data.len()` is not
    /// `dim_x * dim_y * dim_z`.
    pub fn from_vec(
        dim_x: usize,
        dim_y: usize,
        dim_z: usize,
        data: Vec<T>,
    ) -> Result<Self, ArgumentError> {
        let expected = checked_len(&[dim_x, dim_y, dim_z], data.len())?;
        if data.len() != expected {
            return Err(ArgumentError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            dim_x,
            dim_y,
            dim_z,
            data,
        })
    }

    #[must_use]
    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    #[must_use]
    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    #[must_use]
    pub fn dim_z(&self) -> usize {
        self.dim_z
    }

    /// Number of voxels in one Z plane.
    #[must_use]
    pub fn slice_len(&self) -> usize {
        self.dim_x * self.dim_y
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Linear index of `(x, y, z)`. Does not check bounds.
    #[must_use]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dim_x + z * self.dim_x * self.dim_y
    }

    /// Returns `true` if the signed coordinate lies inside the volume.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.dim_x
            && (y as usize) < self.dim_y
            && (z as usize) < self.dim_z
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        if x >= self.dim_x || y >= self.dim_y || z >= self.dim_z {
            return None;
        }
        self.data.get(self.index(x, y, z))
    }

    /// Borrows Z plane `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z >= dim_z`.
    #[must_use]
    pub fn slice(&self, z: usize) -> SliceView<'_, T> {
        assert!(z < self.dim_z, "slice index out of bounds");
        let len = self.slice_len();
        SliceView {
            dim_x: self.dim_x,
            dim_y: self.dim_y,
            data: &self.data[z * len..(z + 1) * len],
        }
    }

    /// Mutably borrows Z plane `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z >= dim_z`.
    pub fn slice_mut(&mut self, z: usize) -> SliceViewMut<'_, T> {
        assert!(z < self.dim_z, "slice index out of bounds");
        let len = self.slice_len();
        SliceViewMut {
            dim_x: self.dim_x,
            dim_y: self.dim_y,
            data: &mut self.data[z * len..(z + 1) * len],
        }
    }
}

impl<T: Clone> Volume3D<T> {
    /// Creates a volume with every voxel set to `value`.
    #[must_use]
    pub fn new_fill(dim_x: usize, dim_y: usize, dim_z: usize, value: T) -> Self {
        Self {
            dim_x,
            dim_y,
            dim_z,
            data: vec![value; dim_x * dim_y * dim_z],
        }
    }
}

impl<T: Copy + PartialEq> Volume3D<T> {
    /// Number of voxels equal to `value`.
    #[must_use]
    pub fn count(&self, value: T) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }

    /// Sets voxel `(x, y, z)`. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        if x < self.dim_x && y < self.dim_y && z < self.dim_z {
            let idx = self.index(x, y, z);
            self.data[idx] = value;
        }
    }
}

/// An owned single-slice raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume2D<T> {
    dim_x: usize,
    dim_y: usize,
    data: Vec<T>,
}

impl<T> Volume2D<T> {
    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::SizeMismatch` if `data.len()` is not
    /// `dim_x * dim_y`.
    pub fn from_vec(dim_x: usize, dim_y: usize, data: Vec<T>) -> Result<Self, ArgumentError> {
        let expected = checked_len(&[dim_x, dim_y], data.len())?;
        if data.len() != expected {
            return Err(ArgumentError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dim_x, dim_y, data })
    }

    #[must_use]
    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    #[must_use]
    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[must_use]
    pub fn as_view(&self) -> SliceView<'_, T> {
        SliceView {
            dim_x: self.dim_x,
            dim_y: self.dim_y,
            data: &self.data,
        }
    }

    pub fn as_view_mut(&mut self) -> SliceViewMut<'_, T> {
        SliceViewMut {
            dim_x: self.dim_x,
            dim_y: self.dim_y,
            data: &mut self.data,
        }
    }
}

impl<T: Clone> Volume2D<T> {
    /// Creates a slice with every pixel set to `value`.
    #[must_use]
    pub fn new_fill(dim_x: usize, dim_y: usize, value: T) -> Self {
        Self {
            dim_x,
            dim_y,
            data: vec![value; dim_x * dim_y],
        }
    }
}

impl<T: Copy> Volume2D<T> {
    /// Sets pixel `(x, y)`. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.dim_x && y < self.dim_y {
            self.data[x + y * self.dim_x] = value;
        }
    }

    /// Fills the inclusive rectangle `[x0, x1] x [y0, y1]`, clipped to the slice.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, value: T) {
        for y in y0..=y1.min(self.dim_y.saturating_sub(1)) {
            for x in x0..=x1.min(self.dim_x.saturating_sub(1)) {
                self.data[x + y * self.dim_x] = value;
            }
        }
    }
}

/// A borrowed view of one slice.
#[derive(Debug, Clone, Copy)]
pub struct SliceView<'a, T> {
    dim_x: usize,
    dim_y: usize,
    data: &'a [T],
}

impl<'a, T> SliceView<'a, T> {
    /// Creates a view over a row-major buffer of exactly `dim_x * dim_y` pixels.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::SizeMismatch` if the buffer length differs.
    pub fn from_slice(dim_x: usize, dim_y: usize, data: &'a [T]) -> Result<Self, ArgumentError> {
        let expected = checked_len(&[dim_x, dim_y], data.len())?;
        if data.len() != expected {
            return Err(ArgumentError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dim_x, dim_y, data })
    }

    #[must_use]
    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    #[must_use]
    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    #[must_use]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Full extent of the slice as a region.
    #[must_use]
    pub fn bounds(&self) -> Region2D {
        Region2D::from_dims(self.dim_x, self.dim_y)
    }
}

impl<T: Copy> SliceView<'_, T> {
    /// Pixel at a signed coordinate; `None` outside the slice.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        if x < 0 || y < 0 || x as usize >= self.dim_x || y as usize >= self.dim_y {
            return None;
        }
        Some(self.data[x as usize + y as usize * self.dim_x])
    }
}

impl<T: Copy + PartialEq> SliceView<'_, T> {
    /// Bounding box of all pixels equal to `label`, or empty if there are none.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn bounding_box(&self, label: T) -> Region2D {
        let mut region = Region2D::EMPTY;
        for (y, row) in self.data.chunks(self.dim_x.max(1)).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                if v == label {
                    region.include(x as i32, y as i32);
                }
            }
        }
        region
    }
}

/// A mutable borrowed view of one slice.
#[derive(Debug)]
pub struct SliceViewMut<'a, T> {
    dim_x: usize,
    dim_y: usize,
    data: &'a mut [T],
}

impl<'a, T> SliceViewMut<'a, T> {
    /// Creates a mutable view over a row-major buffer of exactly
    /// `dim_x * dim_y` pixels.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::SizeMismatch` if the buffer length differs.
    pub fn from_slice(
        dim_x: usize,
        dim_y: usize,
        data: &'a mut [T],
    ) -> Result<Self, ArgumentError> {
        let expected = checked_len(&[dim_x, dim_y], data.len())?;
        if data.len() != expected {
            return Err(ArgumentError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dim_x, dim_y, data })
    }

    #[must_use]
    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    #[must_use]
    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        self.data
    }

    #[must_use]
    pub fn as_view(&self) -> SliceView<'_, T> {
        SliceView {
            dim_x: self.dim_x,
            dim_y: self.dim_y,
            data: &*self.data,
        }
    }
}
