//! Rectilinear image geometry.

use glam::{U64Vec3, Vec3};
use std::fmt;

use crate::util::{Axis, Error, Result};

/// Dimensions, spacing and origin of a regular 3D grid of cells.
///
/// Cells are stored row-major with `i` (X) varying fastest, then `j`, then `k`.
/// A geometry is immutable; resampling produces a new one.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawGridGeometry")
)]
pub struct GridGeometry {
    dims: U64Vec3,
    spacing: Vec3,
    origin: Vec3,
}

/// Unchecked wire form; deserialized geometries go through [`GridGeometry::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawGridGeometry {
    dims: U64Vec3,
    spacing: Vec3,
    origin: Vec3,
}

#[cfg(feature = "serde")]
impl TryFrom<RawGridGeometry> for GridGeometry {
    type Error = Error;

    fn try_from(raw: RawGridGeometry) -> Result<Self> {
        Self::new(raw.dims, raw.spacing, raw.origin)
    }
}

/// Reject spacing components that are not strictly positive (NaN included).
pub(crate) fn check_spacing(spacing: Vec3) -> Result<()> {
    for axis in Axis::ALL {
        let value = spacing[axis.index()];
        if !(value > 0.0) {
            return Err(Error::InvalidSpacing { axis, value });
        }
    }
    Ok(())
}

impl GridGeometry {
    /// Create a geometry, validating every invariant.
    ///
    /// Each dimension must be at least 1, each spacing component strictly
    /// positive, and the cell count must fit in a `usize`.
    pub fn new(dims: impl Into<U64Vec3>, spacing: impl Into<Vec3>, origin: impl Into<Vec3>) -> Result<Self> {
        let dims = dims.into();
        let spacing = spacing.into();
        if dims.min_element() == 0 {
            return Err(Error::InvalidGeometry(format!(
                "dimensions ({}, {}, {}) must all be at least 1",
                dims.x, dims.y, dims.z
            )));
        }
        check_spacing(spacing)?;
        let cells = dims
            .x
            .checked_mul(dims.y)
            .and_then(|n| n.checked_mul(dims.z))
            .filter(|&n| usize::try_from(n).is_ok());
        if cells.is_none() {
            return Err(Error::InvalidGeometry(format!(
                "cell count of ({}, {}, {}) overflows",
                dims.x, dims.y, dims.z
            )));
        }
        Ok(Self {
            dims,
            spacing,
            origin: origin.into(),
        })
    }

    /// Cells per axis.
    #[inline]
    pub fn dims(&self) -> U64Vec3 {
        self.dims
    }

    /// Cell size per axis.
    #[inline]
    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    /// Physical position of the lower corner of cell (0, 0, 0).
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Total number of cells.
    #[inline]
    pub fn num_cells(&self) -> u64 {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Total number of cells as an index type. Construction guarantees it fits.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.num_cells() as usize
    }

    /// Cells per axis as a tuple shape (nx, ny, nz).
    pub fn tuple_dims(&self) -> (usize, usize, usize) {
        (self.dims.x as usize, self.dims.y as usize, self.dims.z as usize)
    }

    /// Physical size per axis.
    pub fn extent(&self) -> Vec3 {
        self.dims.as_vec3() * self.spacing
    }

    /// True if `spacing` equals this geometry's spacing bit for bit.
    pub fn has_spacing(&self, spacing: Vec3) -> bool {
        self.spacing.to_array().map(f32::to_bits) == spacing.to_array().map(f32::to_bits)
    }

    fn check_cell(&self, i: u64, j: u64, k: u64) -> Result<()> {
        for (index, count) in [(i, self.dims.x), (j, self.dims.y), (k, self.dims.z)] {
            if index >= count {
                return Err(Error::OutOfBounds { index, count });
            }
        }
        Ok(())
    }

    /// Linear index of cell (i, j, k).
    pub fn linear_index(&self, i: u64, j: u64, k: u64) -> Result<u64> {
        self.check_cell(i, j, k)?;
        Ok((k * self.dims.y + j) * self.dims.x + i)
    }

    /// Inverse of [`GridGeometry::linear_index`].
    pub fn decompose(&self, index: u64) -> Result<(u64, u64, u64)> {
        if index >= self.num_cells() {
            return Err(Error::OutOfBounds { index, count: self.num_cells() });
        }
        let plane = self.dims.x * self.dims.y;
        let k = index / plane;
        let rem = index % plane;
        Ok((rem % self.dims.x, rem / self.dims.x, k))
    }

    /// Physical position of the lower corner of cell (i, j, k).
    pub fn cell_corner(&self, i: u64, j: u64, k: u64) -> Result<Vec3> {
        self.check_cell(i, j, k)?;
        Ok(self.origin + U64Vec3::new(i, j, k).as_vec3() * self.spacing)
    }

    /// Physical position of the center of cell (i, j, k).
    pub fn cell_center(&self, i: u64, j: u64, k: u64) -> Result<Vec3> {
        self.check_cell(i, j, k)?;
        Ok(self.origin + (U64Vec3::new(i, j, k).as_vec3() + Vec3::splat(0.5)) * self.spacing)
    }

    /// Geometry covering the same extent at `target_spacing`.
    ///
    /// Each new dimension is `floor(extent / target_spacing)`, raised to 1 when
    /// that would be 0. Origin is kept.
    pub fn resampled(&self, target_spacing: impl Into<Vec3>) -> Result<Self> {
        let target = target_spacing.into();
        check_spacing(target)?;
        let raw = (self.spacing * self.dims.as_vec3()) / target;
        let dims = U64Vec3::new(raw.x as u64, raw.y as u64, raw.z as u64).max(U64Vec3::ONE);
        Self::new(dims, target, self.origin)
    }

    /// Human readable per-axis ranges.
    pub fn range_summary(&self) -> String {
        let mut out = String::new();
        let ext = self.extent();
        for axis in Axis::ALL {
            let a = axis.index();
            out.push_str(&format!(
                "{} Range: {} to {} (Delta: {}) 0-{} Voxels\n",
                axis,
                self.origin[a],
                self.origin[a] + ext[a],
                ext[a],
                self.dims[a] - 1
            ));
        }
        out
    }
}

impl fmt::Display for GridGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} cells @ ({}, {}, {}) from ({}, {}, {})",
            self.dims.x,
            self.dims.y,
            self.dims.z,
            self.spacing.x,
            self.spacing.y,
            self.spacing.z,
            self.origin.x,
            self.origin.y,
            self.origin.z
        )
    }
}
