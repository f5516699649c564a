//! Job layer - request configuration and the preflight/execute state machine.
//!
//! - [`ResampleRequest`] - What to resample, where the labels live, where to write
//! - [`TransformJob`] - Validates, runs and commits a request against a [`DataStore`](crate::core::DataStore)

mod request;
mod transform;

pub use request::{defaults, ResampleRequest};
pub use transform::{ExecuteReport, JobState, PreflightReport, TransformJob};
