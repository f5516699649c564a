//! Configuration for a spacing change.

use glam::Vec3;

use crate::core::{DataArrayPath, ExecutionMode};

/// Default names used by [`ResampleRequest::default`].
pub mod defaults {
    pub const CONTAINER: &str = "ImageDataContainer";
    pub const NEW_CONTAINER: &str = "NewImageDataContainer";
    pub const CELL_TABLE: &str = "CellData";
    pub const FEATURE_TABLE: &str = "CellFeatureData";
    pub const FEATURE_IDS: &str = "FeatureIds";
}

/// Everything a [`TransformJob`](super::TransformJob) needs to know.
///
/// Plain values only; validation happens in preflight and again in execute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResampleRequest {
    /// Target cell size per axis.
    pub spacing: Vec3,
    /// Drop unreferenced feature rows and renumber labels afterwards.
    pub renumber_features: bool,
    /// Write the result into a new container instead of replacing the source.
    pub save_as_new_container: bool,
    /// Container and table holding per-cell data. The array part is unused.
    pub cell_table_path: DataArrayPath,
    /// `int32_t[1]` label array inside the cell table.
    pub feature_ids_path: DataArrayPath,
    /// Container and table holding per-feature data.
    pub feature_table_path: DataArrayPath,
    /// Name of the created container when `save_as_new_container` is set.
    pub new_container_name: String,
    pub execution: ExecutionMode,
}

impl Default for ResampleRequest {
    fn default() -> Self {
        Self {
            spacing: Vec3::ONE,
            renumber_features: false,
            save_as_new_container: false,
            cell_table_path: DataArrayPath::table(defaults::CONTAINER, defaults::CELL_TABLE),
            feature_ids_path: DataArrayPath::new(
                defaults::CONTAINER,
                defaults::CELL_TABLE,
                defaults::FEATURE_IDS,
            ),
            feature_table_path: DataArrayPath::table(defaults::CONTAINER, defaults::FEATURE_TABLE),
            new_container_name: defaults::NEW_CONTAINER.to_string(),
            execution: ExecutionMode::Serial,
        }
    }
}

impl ResampleRequest {
    /// Request with default paths and the given spacing.
    pub fn new(spacing: impl Into<Vec3>) -> Self {
        Self {
            spacing: spacing.into(),
            ..Self::default()
        }
    }

    pub fn with_spacing(mut self, spacing: impl Into<Vec3>) -> Self {
        self.spacing = spacing.into();
        self
    }

    /// Renumber features using `feature_ids` (a cell array) against `feature_table`.
    pub fn with_renumbering(mut self, feature_ids: DataArrayPath, feature_table: DataArrayPath) -> Self {
        self.renumber_features = true;
        self.feature_ids_path = feature_ids;
        self.feature_table_path = feature_table;
        self
    }

    pub fn with_renumber_features(mut self, on: bool) -> Self {
        self.renumber_features = on;
        self
    }

    pub fn with_cell_table(mut self, path: DataArrayPath) -> Self {
        self.cell_table_path = path;
        self
    }

    /// Save the result as a new container called `name`.
    pub fn save_as(mut self, name: impl Into<String>) -> Self {
        self.save_as_new_container = true;
        self.new_container_name = name.into();
        self
    }

    pub fn with_execution(mut self, mode: ExecutionMode) -> Self {
        self.execution = mode;
        self
    }

    /// Container the source data is read from.
    pub fn source_container(&self) -> &str {
        &self.cell_table_path.container
    }

    /// Container the result is written to.
    pub fn target_container(&self) -> &str {
        if self.save_as_new_container {
            &self.new_container_name
        } else {
            self.source_container()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let r = ResampleRequest::default();
        assert_eq!(r.spacing, Vec3::ONE);
        assert_eq!(r.cell_table_path.to_string(), "ImageDataContainer/CellData/");
        assert_eq!(r.feature_ids_path.to_string(), "ImageDataContainer/CellData/FeatureIds");
        assert_eq!(r.target_container(), "ImageDataContainer");
        assert!(!r.renumber_features);
    }

    #[test]
    fn test_builder() {
        let r = ResampleRequest::new((0.5, 0.5, 2.0))
            .with_cell_table(DataArrayPath::table("dc", "cells"))
            .save_as("dc2")
            .with_execution(ExecutionMode::Parallel);
        assert_eq!(r.spacing, Vec3::new(0.5, 0.5, 2.0));
        assert_eq!(r.source_container(), "dc");
        assert_eq!(r.target_container(), "dc2");
        assert_eq!(r.execution, ExecutionMode::Parallel);
    }
}
