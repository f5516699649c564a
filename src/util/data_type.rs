//! DataType - combines an element type with a per-tuple component count.

use super::ElementType;
use std::fmt;

/// DataType describes how one tuple of an attribute array is stored.
///
/// It combines an [`ElementType`] with the number of scalar components per
/// tuple. For example, a per-cell Euler angle triple is Float32 with 3 components.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    /// The scalar element type
    pub element: ElementType,
    /// Number of scalars per tuple (1 for scalar arrays, 3 for vectors, etc.)
    pub components: usize,
}

impl DataType {
    /// Create a new DataType with given element type and component count.
    #[inline]
    pub const fn new(element: ElementType, components: usize) -> Self {
        Self { element, components }
    }

    /// Create a single-component DataType.
    #[inline]
    pub const fn scalar(element: ElementType) -> Self {
        Self { element, components: 1 }
    }

    /// Size in bytes of a single element.
    #[inline]
    pub const fn element_size(&self) -> usize {
        self.element.num_bytes()
    }

    /// Size in bytes of one whole tuple.
    #[inline]
    pub const fn tuple_size(&self) -> usize {
        self.element.num_bytes() * self.components
    }

    /// Returns true if this is a valid (known) type.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        !matches!(self.element, ElementType::Unknown) && self.components > 0
    }

    /// Returns true if tuples of both types occupy the same bytes, which is
    /// all a tuple copy needs.
    #[inline]
    pub const fn same_layout(&self, other: &Self) -> bool {
        self.element_size() == other.element_size() && self.components == other.components
    }

    /// Unknown/invalid DataType.
    pub const UNKNOWN: Self = Self::new(ElementType::Unknown, 0);

    /// Cell labels (feature ids).
    pub const INT32: Self = Self::scalar(ElementType::Int32);

    /// Three floats per tuple (Euler angles, centroids).
    pub const VEC3F: Self = Self::new(ElementType::Float32, 3);
}

impl Default for DataType {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components == 1 {
            write!(f, "{}", self.element.name())
        } else {
            write!(f, "{}[{}]", self.element.name(), self.components)
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(DataType::scalar(ElementType::Bool).tuple_size(), 1);
        assert_eq!(DataType::INT32.tuple_size(), 4);
        assert_eq!(DataType::VEC3F.tuple_size(), 12);
        assert_eq!(DataType::new(ElementType::UInt8, 3).element_size(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DataType::scalar(ElementType::Float32)), "float");
        assert_eq!(format!("{}", DataType::VEC3F), "float[3]");
        assert_eq!(format!("{}", DataType::new(ElementType::UInt8, 3)), "uint8_t[3]");
    }

    #[test]
    fn test_same_layout_ignores_signedness() {
        let uint32 = DataType::scalar(ElementType::UInt32);
        assert!(DataType::INT32.same_layout(&uint32));
        assert!(DataType::INT32.same_layout(&DataType::scalar(ElementType::Float32)));
        assert!(!DataType::INT32.same_layout(&DataType::scalar(ElementType::UInt8)));
        assert!(!DataType::VEC3F.same_layout(&DataType::scalar(ElementType::Float32)));
    }

    #[test]
    fn test_validity() {
        assert!(DataType::VEC3F.is_valid());
        assert!(!DataType::UNKNOWN.is_valid());
        assert!(!DataType::new(ElementType::Int32, 0).is_valid());
    }
}
