//! Element types - the scalar storage types an attribute array may hold.

use bytemuck::{Pod, Zeroable};
use half::f16;
use std::fmt;

/// Scalar element type of an attribute array.
///
/// Each type has a fixed size and a well-defined little-endian in-memory
/// representation, so arrays of any of them can be moved around as raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ElementType {
    /// Boolean (stored as u8: 0 = false, non-zero = true)
    Bool = 0,
    /// Unsigned 8-bit integer
    UInt8 = 1,
    /// Signed 8-bit integer
    Int8 = 2,
    /// Unsigned 16-bit integer
    UInt16 = 3,
    /// Signed 16-bit integer
    Int16 = 4,
    /// Unsigned 32-bit integer
    UInt32 = 5,
    /// Signed 32-bit integer
    Int32 = 6,
    /// Unsigned 64-bit integer
    UInt64 = 7,
    /// Signed 64-bit integer
    Int64 = 8,
    /// 16-bit floating point (IEEE 754 half precision)
    Float16 = 9,
    /// 32-bit floating point
    Float32 = 10,
    /// 64-bit floating point
    Float64 = 11,
    /// Unknown/invalid type
    #[default]
    Unknown = 127,
}

impl ElementType {
    /// Returns the size in bytes of a single element of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Bool | Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 | Self::Float16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 => 8,
            Self::Unknown => 0,
        }
    }

    /// Returns the name of this type as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UInt8 => "uint8_t",
            Self::Int8 => "int8_t",
            Self::UInt16 => "uint16_t",
            Self::Int16 => "int16_t",
            Self::UInt32 => "uint32_t",
            Self::Int32 => "int32_t",
            Self::UInt64 => "uint64_t",
            Self::Int64 => "int64_t",
            Self::Float16 => "float16",
            Self::Float32 => "float",
            Self::Float64 => "double",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// === Element trait for typed access to byte storage ===

/// Rust types that can be stored in a [`TypedBuffer`](crate::core::TypedBuffer).
pub trait Element: Pod + Zeroable + Copy + Default {
    /// The corresponding [`ElementType`] value.
    const ELEMENT: ElementType;

    /// Size of this type in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

impl Element for u8 {
    const ELEMENT: ElementType = ElementType::UInt8;
}

impl Element for i8 {
    const ELEMENT: ElementType = ElementType::Int8;
}

impl Element for u16 {
    const ELEMENT: ElementType = ElementType::UInt16;
}

impl Element for i16 {
    const ELEMENT: ElementType = ElementType::Int16;
}

impl Element for u32 {
    const ELEMENT: ElementType = ElementType::UInt32;
}

impl Element for i32 {
    const ELEMENT: ElementType = ElementType::Int32;
}

impl Element for u64 {
    const ELEMENT: ElementType = ElementType::UInt64;
}

impl Element for i64 {
    const ELEMENT: ElementType = ElementType::Int64;
}

impl Element for f16 {
    const ELEMENT: ElementType = ElementType::Float16;
}

impl Element for f32 {
    const ELEMENT: ElementType = ElementType::Float32;
}

impl Element for f64 {
    const ELEMENT: ElementType = ElementType::Float64;
}

/// Boolean with guaranteed 1-byte storage, used for flag arrays such as
/// a feature table's "active" column.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Bool(u8);

impl Bool {
    #[inline]
    pub const fn new(v: bool) -> Self {
        Self(v as u8)
    }

    #[inline]
    pub const fn get(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Bool {
    #[inline]
    fn from(v: bool) -> Self {
        Self::new(v)
    }
}

impl From<Bool> for bool {
    #[inline]
    fn from(v: Bool) -> Self {
        v.get()
    }
}

impl fmt::Debug for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Element for Bool {
    const ELEMENT: ElementType = ElementType::Bool;
}
