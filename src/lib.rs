//! # cellgrid
//!
//! Spacing changes for regular 3D cell grids.
//!
//! A grid is described by a [`GridGeometry`](core::GridGeometry) and carries
//! per-cell data in an [`AttributeTable`](core::AttributeTable) of type-erased
//! [`TypedBuffer`](core::TypedBuffer)s. Changing the spacing copies, for every
//! new cell, the tuple of the source cell containing its lower corner. Feature
//! tables referenced by a label array can then be compacted so that only rows
//! still in use remain.
//!
//! ## Modules
//!
//! - [`util`] - Element types, shapes and errors
//! - [`core`] - Geometry, buffers, tables, containers and the data store
//! - [`resample`] - Resampling engine and label compaction
//! - [`job`] - Request configuration and the preflight/execute state machine
//!
//! ## Example
//!
//! ```ignore
//! use cellgrid::prelude::*;
//!
//! let mut job = TransformJob::new(ResampleRequest::new((0.5, 0.5, 0.5)));
//! let preview = job.preflight(&store)?;
//! println!("{}", preview.new_summary);
//! job.execute(&store)?;
//! ```

pub mod util;
pub mod core;
pub mod resample;
pub mod job;

// Re-export commonly used types
pub use util::{DataType, ElementType, Error, ErrorKind, Result};

/// Build date of this crate, set by the build script.
pub const BUILD_DATE: &str = env!("CELLGRID_BUILD_DATE");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Axis, DataType, ElementType, Error, ErrorKind, Result};
    pub use crate::core::{
        AttributeTable, CancelToken, DataArrayPath, DataContainer, DataStore, ExecutionMode,
        GridGeometry, TableKind, TypedBuffer,
    };
    pub use crate::resample::{LabelCompactor, RemapTable, ResampleEngine};
    pub use crate::job::{ExecuteReport, JobState, PreflightReport, ResampleRequest, TransformJob};
}
