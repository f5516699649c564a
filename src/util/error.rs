//! Error types for grid, array and resampling operations.

use thiserror::Error;

/// Grid axis, used to name the offending component of a triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All three axes in order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index of this axis in a triple.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        };
        f.write_str(s)
    }
}

/// Coarse classification of an [`Error`], for hosts that only branch on kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidSpacing,
    InvalidGeometry,
    ShapeMismatch,
    DuplicateName,
    InvalidName,
    NotFound,
    TupleCountMismatch,
    OutOfBounds,
    LabelOutOfRange,
    EmptyFeatureTable,
    Cancelled,
    AllocationFailure,
}

/// Main error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A requested spacing component is not strictly positive
    #[error("The {axis} spacing ({value}) must be positive")]
    InvalidSpacing { axis: Axis, value: f32 },

    /// Geometry dimensions are zero or their product does not fit in memory indices
    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),

    /// Two buffers expected to share a tuple layout do not
    #[error("Shape mismatch for '{context}': expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// The name of an array or container is already taken
    #[error("The name '{0}' is already in use")]
    DuplicateName(String),

    /// A name supplied for something to be created is unusable
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A named array, table or container does not exist
    #[error("{what} '{name}' was not found")]
    NotFound { what: &'static str, name: String },

    /// Inserted array's tuple count disagrees with its table
    #[error("Array '{name}' has {actual} tuples but the table holds {expected}")]
    TupleCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Cell or tuple index outside its valid range
    #[error("Index {index} out of bounds (count: {count})")]
    OutOfBounds { index: u64, count: u64 },

    /// A cell label indexes outside the feature table
    #[error("Label {label} at cell {cell} is outside the feature table (0..{feature_count})")]
    LabelOutOfRange {
        label: i64,
        cell: usize,
        feature_count: usize,
    },

    /// Renumbering was requested against a feature table without rows
    #[error("The number of Features is 0 and should be greater than 0")]
    EmptyFeatureTable,

    /// Cooperative cancellation was observed
    #[error("Operation was cancelled")]
    Cancelled,

    /// A buffer allocation could not be satisfied
    #[error("Failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },
}

impl Error {
    /// Create a not-found error for an array.
    pub fn array_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { what: "Array", name: name.into() }
    }

    /// Create a not-found error for an attribute table.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { what: "Attribute table", name: name.into() }
    }

    /// Create a not-found error for the feature table consulted during renumbering.
    pub fn feature_table_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { what: "Feature attribute table", name: name.into() }
    }

    /// Create a not-found error for a data container.
    pub fn container_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { what: "Data container", name: name.into() }
    }

    /// Create a shape mismatch error.
    pub fn shape(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSpacing { .. } => ErrorKind::InvalidSpacing,
            Self::InvalidGeometry(_) => ErrorKind::InvalidGeometry,
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::InvalidName { .. } => ErrorKind::InvalidName,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TupleCountMismatch { .. } => ErrorKind::TupleCountMismatch,
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::LabelOutOfRange { .. } => ErrorKind::LabelOutOfRange,
            Self::EmptyFeatureTable => ErrorKind::EmptyFeatureTable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::AllocationFailure { .. } => ErrorKind::AllocationFailure,
        }
    }

    /// Numeric error code, compatible with the codes pipeline hosts already display.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidSpacing { axis: Axis::X, .. } => -5555,
            Self::InvalidSpacing { axis: Axis::Y, .. } => -5556,
            Self::InvalidSpacing { axis: Axis::Z, .. } => -5557,
            Self::InvalidGeometry(_) => -385,
            Self::ShapeMismatch { .. } => -501,
            Self::DuplicateName(_) => -502,
            Self::InvalidName { .. } => -507,
            Self::NotFound { what: "Attribute table", .. } => -46500,
            Self::NotFound { what: "Feature attribute table", .. } => -46501,
            Self::NotFound { .. } => -503,
            Self::TupleCountMismatch { .. } => -504,
            Self::OutOfBounds { .. } => -505,
            Self::LabelOutOfRange { .. } => -506,
            Self::EmptyFeatureTable => -600,
            Self::Cancelled => -1,
            Self::AllocationFailure { .. } => -999,
        }
    }

    /// Only allocation failures are fatal; everything else is a validation result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AllocationFailure { .. })
    }
}

/// Result type alias for cellgrid operations.
pub type Result<T> = std::result::Result<T, Error>;
