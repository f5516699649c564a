//! Resampling layer - spacing changes and feature compaction.
//!
//! - [`ResampleEngine`] - Copies cell data onto a grid with a new spacing
//! - [`LabelCompactor`] / [`RemapTable`] - Drops unreferenced feature rows

mod compact;
mod engine;

pub use compact::{LabelCompactor, RemapTable};
pub use engine::{build_index_map, ResampleEngine};
