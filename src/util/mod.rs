//! Utility types shared by the whole crate.
//!
//! - [`ElementType`] / [`Element`] - scalar storage types
//! - [`DataType`] - element type + components per tuple
//! - [`Dimensions`] - tuple and component shapes
//! - [`Error`] / [`Result`] - error handling

mod pod;
mod data_type;
mod error;
mod dimensions;

pub use pod::*;
pub use data_type::*;
pub use error::*;
pub use dimensions::*;
