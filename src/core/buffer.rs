//! Type-erased attribute array storage.
//!
//! A [`TypedBuffer`] carries its element shape as plain data and exposes
//! byte-level tuple operations, so algorithms can resize and copy arrays
//! without knowing whether they hold labels, floats or colors.

use crate::util::{DataType, Dimensions, Element, ElementType, Error, Result};

/// Owned, resizable array of fixed-size tuples.
///
/// Invariant: `bytes.len() == tuple_count * components * element_size`.
#[derive(Clone, PartialEq, Eq)]
pub struct TypedBuffer {
    element: ElementType,
    component_dims: Dimensions,
    components: usize,
    tuple_count: usize,
    bytes: Vec<u8>,
}

/// Empty vector with room for `len` items, reporting failure instead of aborting.
pub(crate) fn try_with_capacity<T>(len: usize) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| Error::AllocationFailure {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    Ok(out)
}

/// Allocate `len` zeroed bytes.
fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut bytes = try_with_capacity(len)?;
    bytes.resize(len, 0);
    Ok(bytes)
}

fn byte_len(element: ElementType, components: usize, tuples: usize) -> Result<usize> {
    element
        .num_bytes()
        .checked_mul(components)
        .and_then(|n| n.checked_mul(tuples))
        .ok_or(Error::AllocationFailure { bytes: usize::MAX })
}

impl TypedBuffer {
    /// Create a zero-initialized buffer.
    ///
    /// `components` is the per-tuple component shape, e.g. `1` or `(3,)`.
    pub fn new(
        element: ElementType,
        components: impl Into<Dimensions>,
        tuple_count: usize,
    ) -> Result<Self> {
        let component_dims = components.into();
        let ncomp = component_dims
            .checked_num_points()
            .ok_or_else(|| Error::shape("component dimensions", "a finite count", &component_dims))?;
        let data_type = DataType::new(element, ncomp);
        if !data_type.is_valid() {
            return Err(Error::shape("new buffer", "a known element type with components", data_type));
        }
        let bytes = alloc_zeroed(byte_len(element, ncomp, tuple_count)?)?;
        Ok(Self {
            element,
            component_dims,
            components: ncomp,
            tuple_count,
            bytes,
        })
    }

    /// Create a buffer holding a copy of `values`, `components` scalars per tuple.
    pub fn from_values<T: Element>(values: &[T], components: usize) -> Result<Self> {
        if components == 0 || values.len() % components != 0 {
            return Err(Error::shape(
                "from_values",
                format!("a multiple of {} values", components),
                values.len(),
            ));
        }
        let raw: &[u8] = bytemuck::cast_slice(values);
        let mut bytes = try_with_capacity(raw.len())?;
        bytes.extend_from_slice(raw);
        Ok(Self {
            element: T::ELEMENT,
            component_dims: Dimensions::d1(components),
            components,
            tuple_count: values.len() / components,
            bytes,
        })
    }

    /// Same element shape, new tuple count, zero-initialized.
    pub fn create_like(&self, tuple_count: usize) -> Result<Self> {
        let bytes = alloc_zeroed(byte_len(self.element, self.components, tuple_count)?)?;
        Ok(Self {
            element: self.element,
            component_dims: self.component_dims.clone(),
            components: self.components,
            tuple_count,
            bytes,
        })
    }

    /// Deep copy that reports allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self> {
        let mut bytes = try_with_capacity(self.bytes.len())?;
        bytes.extend_from_slice(&self.bytes);
        Ok(Self {
            element: self.element,
            component_dims: self.component_dims.clone(),
            components: self.components,
            tuple_count: self.tuple_count,
            bytes,
        })
    }

    /// Scalar element type.
    #[inline]
    pub fn element(&self) -> ElementType {
        self.element
    }

    /// Bytes per scalar.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.element.num_bytes()
    }

    /// Scalars per tuple.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Per-tuple component shape.
    pub fn component_dims(&self) -> &Dimensions {
        &self.component_dims
    }

    /// Element type and components as one value.
    #[inline]
    pub fn data_type(&self) -> DataType {
        DataType::new(self.element, self.components)
    }

    /// Number of tuples.
    #[inline]
    pub fn tuple_count(&self) -> usize {
        self.tuple_count
    }

    /// Bytes per tuple.
    #[inline]
    pub fn tuple_size(&self) -> usize {
        self.element.num_bytes() * self.components
    }

    /// True if the buffer holds no tuples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tuple_count == 0
    }

    /// Raw storage.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Bytes of one tuple, or `None` if `index` is out of range.
    pub fn tuple_bytes(&self, index: usize) -> Option<&[u8]> {
        if index >= self.tuple_count {
            return None;
        }
        let size = self.tuple_size();
        self.bytes.get(index * size..(index + 1) * size)
    }

    /// Change the tuple count.
    ///
    /// With `preserve == false` the old contents are discarded and the buffer is
    /// zero-filled; callers are expected to repopulate every tuple. With
    /// `preserve == true` the first `min(old, new)` tuples are kept.
    pub fn resize(&mut self, new_tuple_count: usize, preserve: bool) -> Result<()> {
        let len = byte_len(self.element, self.components, new_tuple_count)?;
        if preserve {
            if len > self.bytes.len() {
                let extra = len - self.bytes.len();
                self.bytes
                    .try_reserve_exact(extra)
                    .map_err(|_| Error::AllocationFailure { bytes: len })?;
            }
            self.bytes.resize(len, 0);
        } else {
            self.bytes = alloc_zeroed(len)?;
        }
        self.tuple_count = new_tuple_count;
        Ok(())
    }

    /// Byte-copy tuple `src_index` of `src` into tuple `dst_index` of `self`.
    ///
    /// Both buffers must agree on element size and component count.
    pub fn copy_tuple(&mut self, dst_index: usize, src: &TypedBuffer, src_index: usize) -> Result<()> {
        if !self.data_type().same_layout(&src.data_type()) {
            return Err(Error::shape("copy_tuple", self.data_type(), src.data_type()));
        }
        if dst_index >= self.tuple_count {
            return Err(Error::OutOfBounds {
                index: dst_index as u64,
                count: self.tuple_count as u64,
            });
        }
        let from = src.tuple_bytes(src_index).ok_or(Error::OutOfBounds {
            index: src_index as u64,
            count: src.tuple_count as u64,
        })?;
        let size = self.tuple_size();
        self.bytes[dst_index * size..(dst_index + 1) * size].copy_from_slice(from);
        Ok(())
    }

    fn check_element<T: Element>(&self) -> Result<()> {
        if T::ELEMENT != self.element {
            return Err(Error::shape("typed access", T::ELEMENT, self.element));
        }
        Ok(())
    }

    /// Copy the contents out as a typed vector.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.check_element::<T>()?;
        Ok(bytemuck::pod_collect_to_vec(&self.bytes))
    }

    /// Read one scalar.
    pub fn value<T: Element>(&self, tuple: usize, component: usize) -> Result<T> {
        self.check_element::<T>()?;
        let offset = self.scalar_offset(tuple, component)?;
        Ok(bytemuck::pod_read_unaligned(&self.bytes[offset..offset + T::SIZE]))
    }

    /// Write one scalar.
    pub fn set_value<T: Element>(&mut self, tuple: usize, component: usize, value: T) -> Result<()> {
        self.check_element::<T>()?;
        let offset = self.scalar_offset(tuple, component)?;
        self.bytes[offset..offset + T::SIZE].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    fn scalar_offset(&self, tuple: usize, component: usize) -> Result<usize> {
        if tuple >= self.tuple_count {
            return Err(Error::OutOfBounds { index: tuple as u64, count: self.tuple_count as u64 });
        }
        if component >= self.components {
            return Err(Error::OutOfBounds { index: component as u64, count: self.components as u64 });
        }
        Ok((tuple * self.components + component) * self.element_size())
    }
}

impl std::fmt::Debug for TypedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedBuffer")
            .field("data_type", &self.data_type())
            .field("component_dims", &self.component_dims)
            .field("tuple_count", &self.tuple_count)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ErrorKind;

    #[test]
    fn test_new_is_zeroed() {
        let b = TypedBuffer::new(ElementType::Float32, 3, 4).unwrap();
        assert_eq!(b.tuple_count(), 4);
        assert_eq!(b.components(), 3);
        assert_eq!(b.as_bytes().len(), 4 * 3 * 4);
        assert!(b.as_bytes().iter().all(|&x| x == 0));
    }

    #[test]
    fn test_unknown_element_rejected() {
        let err = TypedBuffer::new(ElementType::Unknown, 1, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_from_values_and_back() {
        let b = TypedBuffer::from_values(&[1i32, 2, 3, 4, 5, 6], 2).unwrap();
        assert_eq!(b.tuple_count(), 3);
        assert_eq!(b.value::<i32>(1, 1).unwrap(), 4);
        assert_eq!(b.to_vec::<i32>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert!(b.to_vec::<f32>().is_err());
        assert!(TypedBuffer::from_values(&[1u8, 2, 3], 2).is_err());
    }

    #[test]
    fn test_resize_discard_zero_fills() {
        let mut b = TypedBuffer::from_values(&[7u8, 8, 9], 1).unwrap();
        b.resize(5, false).unwrap();
        assert_eq!(b.tuple_count(), 5);
        assert_eq!(b.to_vec::<u8>().unwrap(), vec![0; 5]);
    }

    #[test]
    fn test_resize_preserve_keeps_prefix() {
        let mut b = TypedBuffer::from_values(&[7u16, 8, 9], 1).unwrap();
        b.resize(5, true).unwrap();
        assert_eq!(b.to_vec::<u16>().unwrap(), vec![7, 8, 9, 0, 0]);
        b.resize(2, true).unwrap();
        assert_eq!(b.to_vec::<u16>().unwrap(), vec![7, 8]);
        assert_eq!(b.as_bytes().len(), 4);
    }

    #[test]
    fn test_copy_tuple_moves_whole_tuple() {
        let src = TypedBuffer::from_values(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], 3).unwrap();
        let mut dst = src.create_like(3).unwrap();
        dst.copy_tuple(2, &src, 1).unwrap();
        assert_eq!(
            dst.to_vec::<f32>().unwrap(),
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_copy_tuple_shape_mismatch() {
        let src = TypedBuffer::from_values(&[1u8, 2, 3], 1).unwrap();
        let mut dst = TypedBuffer::new(ElementType::Int32, 1, 3).unwrap();
        let err = dst.copy_tuple(0, &src, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let mut wide = TypedBuffer::new(ElementType::UInt8, 3, 3).unwrap();
        assert_eq!(wide.copy_tuple(0, &src, 0).unwrap_err().kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_copy_tuple_same_size_different_type_allowed() {
        let src = TypedBuffer::from_values(&[-1i32], 1).unwrap();
        let mut dst = TypedBuffer::new(ElementType::UInt32, 1, 1).unwrap();
        dst.copy_tuple(0, &src, 0).unwrap();
        assert_eq!(dst.value::<u32>(0, 0).unwrap(), u32::MAX);
    }

    #[test]
    fn test_copy_tuple_out_of_bounds() {
        let src = TypedBuffer::from_values(&[1u8, 2], 1).unwrap();
        let mut dst = src.create_like(2).unwrap();
        assert_eq!(dst.copy_tuple(2, &src, 0).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(dst.copy_tuple(0, &src, 2).unwrap_err().kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn test_set_value() {
        let mut b = TypedBuffer::new(ElementType::Int32, 1, 3).unwrap();
        b.set_value(2, 0, 42i32).unwrap();
        assert_eq!(b.to_vec::<i32>().unwrap(), vec![0, 0, 42]);
        assert!(b.set_value(3, 0, 1i32).is_err());
        assert!(b.set_value(0, 1, 1i32).is_err());
        assert!(b.set_value(0, 0, 1u32).is_err());
    }

    #[test]
    fn test_create_like_keeps_component_dims() {
        let b = TypedBuffer::new(ElementType::Float32, (2, 3), 1).unwrap();
        let c = b.create_like(10).unwrap();
        assert_eq!(c.component_dims(), &Dimensions::from((2, 3)));
        assert_eq!(c.components(), 6);
        assert_eq!(c.tuple_count(), 10);
    }

    #[test]
    fn test_try_clone_is_independent() {
        let src = TypedBuffer::new(ElementType::Float32, (2, 3), 2).unwrap();
        let mut copy = src.try_clone().unwrap();
        assert_eq!(copy, src);
        copy.set_value(1, 5, 9.5f32).unwrap();
        assert_eq!(src.value::<f32>(1, 5).unwrap(), 0.0);
        assert_eq!(copy.component_dims(), &Dimensions::from((2, 3)));
    }
}
