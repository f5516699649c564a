//! Core layer - grid geometry, attribute storage and the data store.
//!
//! This module provides:
//! - [`GridGeometry`] - Dimensions, spacing and origin of a cell grid
//! - [`TypedBuffer`] - Type-erased array of fixed-size tuples
//! - [`AttributeTable`] - Named buffers sharing one tuple count
//! - [`DataContainer`] / [`DataStore`] - Geometry plus tables, shared by name
//! - [`CancelToken`] - Cooperative cancellation flag

mod buffer;
mod cancel;
mod container;
mod geometry;
mod path;
mod table;

pub use buffer::TypedBuffer;
pub(crate) use buffer::try_with_capacity;
pub use cancel::CancelToken;
pub use container::{DataContainer, DataStore};
pub use geometry::GridGeometry;
pub(crate) use geometry::check_spacing;
pub use path::DataArrayPath;
pub use table::{AttributeTable, ExecutionMode, TableKind};
