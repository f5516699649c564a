//! Shape descriptors for tuples and components.
//!
//! A cell table is shaped (nx, ny, nz), a feature table (n). Component shapes
//! are (1) for scalars, (3) for Euler angles, (2, 3) for small matrices.

use std::fmt;

use smallvec::{smallvec, SmallVec};

/// Extent of each axis of a tuple or component shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    extents: SmallVec<[usize; 3]>,
}

impl Dimensions {
    /// Flat shape of `count` entries.
    pub fn d1(count: usize) -> Self {
        Self { extents: smallvec![count] }
    }

    /// Grid-shaped extent, x fastest.
    pub fn d3(nx: usize, ny: usize, nz: usize) -> Self {
        Self { extents: smallvec![nx, ny, nz] }
    }

    /// Axis extents, fastest first.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Product of the extents, saturating at `usize::MAX`.
    pub fn num_points(&self) -> usize {
        self.extents.iter().fold(1usize, |acc, &n| acc.saturating_mul(n))
    }

    /// Product of the extents, `None` on overflow.
    pub fn checked_num_points(&self) -> Option<usize> {
        self.extents.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }
}

impl From<usize> for Dimensions {
    fn from(count: usize) -> Self {
        Self::d1(count)
    }
}

impl From<(usize, usize)> for Dimensions {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self { extents: smallvec![rows, cols] }
    }
}

impl From<(usize, usize, usize)> for Dimensions {
    fn from((nx, ny, nz): (usize, usize, usize)) -> Self {
        Self::d3(nx, ny, nz)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut sep = "";
        for n in &self.extents {
            write!(f, "{sep}{n}")?;
            sep = " x ";
        }
        f.write_str("]")
    }
}
