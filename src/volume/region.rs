use std::fmt;

/// Axis-aligned integer box within a slice (inclusive bounds).
///
/// Either `min <= max` on both axes, or the region is [`Region2D::EMPTY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region2D {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Region2D {
    /// The empty region. Growing it with [`Region2D::include`] yields a
    /// one-pixel box.
    pub const EMPTY: Self = Self {
        min_x: i32::MAX,
        max_x: i32::MIN,
        min_y: i32::MAX,
        max_y: i32::MIN,
    };

    /// Creates a region from inclusive bounds. Inverted bounds give
    /// [`Region2D::EMPTY`].
    #[must_use]
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        if min_x > max_x || min_y > max_y {
            return Self::EMPTY;
        }
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// The full extent of a `dim_x` by `dim_y` slice.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn from_dims(dim_x: usize, dim_y: usize) -> Self {
        if dim_x == 0 || dim_y == 0 {
            return Self::EMPTY;
        }
        Self::new(0, dim_x as i32 - 1, 0, dim_y as i32 - 1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grows the region to contain `(x, y)`.
    pub fn include(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Intersection of two regions; empty if they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.max(other.min_x),
            self.max_x.min(other.max_x),
            self.min_y.max(other.min_y),
            self.max_y.min(other.max_y),
        )
    }

    /// Returns `true` if `other` lies entirely inside this region.
    #[must_use]
    pub fn contains_region(&self, other: &Self) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && self.contains(other.min_x, other.min_y)
                && self.contains(other.max_x, other.max_y))
    }

    /// Grows the region by `margin` pixels on every side.
    #[must_use]
    pub fn inflate(&self, margin: i32) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(
            self.min_x - margin,
            self.max_x + margin,
            self.min_y - margin,
            self.max_y + margin,
        )
    }

    /// Number of columns, zero for the empty region.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.max_x) - i64::from(self.min_x) + 1) as usize
        }
    }

    /// Number of rows, zero for the empty region.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.max_y) - i64::from(self.min_y) + 1) as usize
        }
    }
}

impl fmt::Display for Region2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "[empty]");
        }
        write!(
            f,
            "[{}..={}, {}..={}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// Axis-aligned integer box within a volume (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region3D {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl Region3D {
    pub const EMPTY: Self = Self {
        min_x: i32::MAX,
        max_x: i32::MIN,
        min_y: i32::MAX,
        max_y: i32::MIN,
        min_z: i32::MAX,
        max_z: i32::MIN,
    };

    /// Creates a region from inclusive bounds. Inverted bounds give
    /// [`Region3D::EMPTY`].
    #[must_use]
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32, min_z: i32, max_z: i32) -> Self {
        if min_x > max_x || min_y > max_y || min_z > max_z {
            return Self::EMPTY;
        }
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_z > self.max_z
    }

    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= self.min_x
            && x <= self.max_x
            && y >= self.min_y
            && y <= self.max_y
            && z >= self.min_z
            && z <= self.max_z
    }

    /// Returns `true` if slice `z` intersects the region.
    #[must_use]
    pub fn contains_slice(&self, z: i32) -> bool {
        !self.is_empty() && z >= self.min_z && z <= self.max_z
    }

    /// The in-plane part of the region.
    #[must_use]
    pub fn slice_region(&self) -> Region2D {
        if self.is_empty() {
            return Region2D::EMPTY;
        }
        Region2D::new(self.min_x, self.max_x, self.min_y, self.max_y)
    }
}
