//! Attribute tables - named arrays sharing one tuple count.

use indexmap::IndexMap;
use rayon::prelude::*;

use super::{CancelToken, TypedBuffer};
use crate::util::{Dimensions, Error, Result};

/// What the rows of a table stand for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableKind {
    /// One row per grid cell.
    Cell,
    /// One row per feature (label value).
    CellFeature,
    /// One row per ensemble (phase).
    CellEnsemble,
    /// Anything else.
    #[default]
    Generic,
}

/// How tuple gathers are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionMode {
    /// Copy on the calling thread.
    #[default]
    Serial,
    /// Copy tuple chunks on the rayon pool. Output is identical to `Serial`.
    Parallel,
}

/// Ordered collection of named [`TypedBuffer`]s that share one tuple count.
///
/// Every member buffer's tuple count equals [`AttributeTable::tuple_count`]
/// after each public mutation returns. Tables are never resized member by member:
/// resampling and compaction build a new table with [`AttributeTable::gather`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeTable {
    name: String,
    kind: TableKind,
    tuple_dims: Dimensions,
    arrays: IndexMap<String, TypedBuffer>,
}

impl AttributeTable {
    /// Create an empty table with the given tuple shape.
    pub fn new(name: impl Into<String>, kind: TableKind, tuple_dims: impl Into<Dimensions>) -> Self {
        Self {
            name: name.into(),
            kind,
            tuple_dims: tuple_dims.into(),
            arrays: IndexMap::new(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row semantics.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Tuple shape, e.g. (nx, ny, nz) for cell data.
    pub fn tuple_dims(&self) -> &Dimensions {
        &self.tuple_dims
    }

    /// Number of rows shared by every array.
    pub fn tuple_count(&self) -> usize {
        self.tuple_dims.num_points()
    }

    /// Number of arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// True if the table holds no arrays.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Array names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.arrays.keys().map(String::as_str)
    }

    /// `(name, buffer)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedBuffer)> + '_ {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check whether an array exists.
    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Look up an array.
    pub fn get(&self, name: &str) -> Option<&TypedBuffer> {
        self.arrays.get(name)
    }

    /// Look up an array, failing with `NotFound`.
    pub fn array(&self, name: &str) -> Result<&TypedBuffer> {
        self.get(name).ok_or_else(|| Error::array_not_found(name))
    }

    /// Add an array.
    ///
    /// A buffer whose tuple count matches the table keeps the declared tuple
    /// shape, so a (nx, ny, nz) cell table stays 3D. Only the first buffer of
    /// an empty table may disagree; the table then adopts its count as a flat
    /// (n) shape. Later mismatches fail with `TupleCountMismatch`.
    pub fn insert(&mut self, name: impl Into<String>, buffer: TypedBuffer) -> Result<()> {
        let name = name.into();
        if self.arrays.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        if buffer.tuple_count() != self.tuple_count() {
            if !self.arrays.is_empty() {
                return Err(Error::TupleCountMismatch {
                    name,
                    expected: self.tuple_count(),
                    actual: buffer.tuple_count(),
                });
            }
            self.tuple_dims = Dimensions::d1(buffer.tuple_count());
        }
        self.arrays.insert(name, buffer);
        Ok(())
    }

    /// Deep copy that reports allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self> {
        let mut arrays = IndexMap::new();
        arrays
            .try_reserve_exact(self.arrays.len())
            .map_err(|_| Error::AllocationFailure {
                bytes: self.arrays.len() * std::mem::size_of::<(String, TypedBuffer)>(),
            })?;
        for (name, buffer) in &self.arrays {
            arrays.insert(name.clone(), buffer.try_clone()?);
        }
        Ok(Self {
            name: self.name.clone(),
            kind: self.kind,
            tuple_dims: self.tuple_dims.clone(),
            arrays,
        })
    }

    /// Swap the contents of an existing array, returning the old buffer.
    pub fn replace(&mut self, name: &str, buffer: TypedBuffer) -> Result<TypedBuffer> {
        let expected = self.tuple_count();
        let slot = self.arrays.get_mut(name).ok_or_else(|| Error::array_not_found(name))?;
        if buffer.tuple_count() != expected {
            return Err(Error::TupleCountMismatch {
                name: name.to_string(),
                expected,
                actual: buffer.tuple_count(),
            });
        }
        Ok(std::mem::replace(slot, buffer))
    }

    /// Remove an array, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Result<TypedBuffer> {
        self.arrays
            .shift_remove(name)
            .ok_or_else(|| Error::array_not_found(name))
    }

    /// Build a new table whose row `t` is row `indices[t]` of this one, for every array.
    ///
    /// `tuple_dims` must describe exactly `indices.len()` rows. Cancellation is
    /// polled once per `chunk` rows. `self` is never modified.
    pub fn gather(
        &self,
        tuple_dims: impl Into<Dimensions>,
        indices: &[usize],
        chunk: usize,
        mode: ExecutionMode,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let tuple_dims = tuple_dims.into();
        if tuple_dims.checked_num_points() != Some(indices.len()) {
            return Err(Error::TupleCountMismatch {
                name: self.name.clone(),
                expected: tuple_dims.num_points(),
                actual: indices.len(),
            });
        }
        let count = self.tuple_count();
        if let Some(&bad) = indices.iter().find(|&&i| i >= count) {
            return Err(Error::OutOfBounds { index: bad as u64, count: count as u64 });
        }
        let chunk = chunk.max(1);

        let mut out = Self::new(self.name.clone(), self.kind, tuple_dims);
        for (name, src) in &self.arrays {
            tracing::trace!(array = %name, data_type = %src.data_type(), "gathering tuples");
            let mut dst = src.create_like(indices.len())?;
            match mode {
                ExecutionMode::Serial => gather_serial(&mut dst, src, indices, chunk, cancel)?,
                ExecutionMode::Parallel => gather_parallel(&mut dst, src, indices, chunk, cancel)?,
            }
            out.arrays.insert(name.clone(), dst);
        }
        Ok(out)
    }
}

fn gather_serial(
    dst: &mut TypedBuffer,
    src: &TypedBuffer,
    indices: &[usize],
    chunk: usize,
    cancel: &CancelToken,
) -> Result<()> {
    for (c, block) in indices.chunks(chunk).enumerate() {
        cancel.check()?;
        let base = c * chunk;
        for (k, &from) in block.iter().enumerate() {
            dst.copy_tuple(base + k, src, from)?;
        }
    }
    Ok(())
}

fn gather_parallel(
    dst: &mut TypedBuffer,
    src: &TypedBuffer,
    indices: &[usize],
    chunk: usize,
    cancel: &CancelToken,
) -> Result<()> {
    if !dst.data_type().same_layout(&src.data_type()) {
        return Err(Error::shape("gather", dst.data_type(), src.data_type()));
    }
    let size = dst.tuple_size();
    let src_bytes = src.as_bytes();
    dst.as_bytes_mut()
        .par_chunks_mut(size * chunk)
        .zip(indices.par_chunks(chunk))
        .try_for_each(|(out, block)| {
            cancel.check()?;
            for (tuple, &from) in out.chunks_mut(size).zip(block) {
                tuple.copy_from_slice(&src_bytes[from * size..(from + 1) * size]);
            }
            Ok(())
        })
}
