//! Preflight / execute state machine around the resampling engine.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::ResampleRequest;
use crate::core::{check_spacing, AttributeTable, CancelToken, DataContainer, DataStore, GridGeometry, TypedBuffer};
use crate::resample::{build_index_map, LabelCompactor, RemapTable, ResampleEngine};
use crate::util::{DataType, Error, Result};

/// Where a [`TransformJob`] is in its life cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JobState {
    #[default]
    Idle,
    /// Last preflight passed.
    Preflighted,
    /// Last execute committed its results.
    Executed,
    /// Last preflight or execute failed; see [`TransformJob::last_error`].
    Failed,
}

/// What an execute would produce, computed without touching the store.
#[derive(Clone, Debug, PartialEq)]
pub struct PreflightReport {
    pub current: GridGeometry,
    pub target: GridGeometry,
    /// [`GridGeometry::range_summary`] of `current`.
    pub current_summary: String,
    /// [`GridGeometry::range_summary`] of `target`.
    pub new_summary: String,
    /// Tuple count of the resampled cell table.
    pub cell_tuples: usize,
    /// Feature rows left after compaction, when renumbering.
    pub feature_count: Option<usize>,
    /// Target spacing equals the current one.
    pub noop: bool,
}

/// What an execute committed.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecuteReport {
    /// Container holding the result.
    pub container: String,
    pub geometry: GridGeometry,
    pub cell_tuples: usize,
    /// Feature renumbering applied, when requested.
    pub remap: Option<RemapTable>,
    pub noop: bool,
}

/// Everything validation resolves from the store.
struct Plan {
    container: Arc<DataContainer>,
    target: GridGeometry,
    noop: bool,
}

impl Plan {
    fn geometry(&self) -> &GridGeometry {
        self.container.geometry()
    }
}

/// Runs one [`ResampleRequest`] against a [`DataStore`].
///
/// `preflight` and `execute` run the same validation; `execute` never relies
/// on an earlier preflight. Results are committed by swapping whole
/// containers, so on any error the store is left as it was.
#[derive(Debug)]
pub struct TransformJob {
    request: ResampleRequest,
    state: JobState,
    cancel: CancelToken,
    last_error: Option<Error>,
}

impl TransformJob {
    pub fn new(request: ResampleRequest) -> Self {
        Self {
            request,
            state: JobState::Idle,
            cancel: CancelToken::new(),
            last_error: None,
        }
    }

    pub fn request(&self) -> &ResampleRequest {
        &self.request
    }

    /// Change the request. The job returns to `Idle`.
    pub fn set_request(&mut self, request: ResampleRequest) {
        self.request = request;
        self.state = JobState::Idle;
        self.last_error = None;
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Error from the last failed preflight or execute.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Token observed by `execute`. Cancel a clone from another thread to stop it.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn finish<T>(&mut self, result: Result<T>, ok: JobState) -> Result<T> {
        match result {
            Ok(value) => {
                self.state = ok;
                self.last_error = None;
                Ok(value)
            }
            Err(err) => {
                warn!(code = err.code(), "{err}");
                self.state = JobState::Failed;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Validate the request and report the would-be result.
    ///
    /// Never modifies the store; repeated calls against the same store
    /// contents give the same report.
    #[instrument(skip_all)]
    pub fn preflight(&mut self, store: &DataStore) -> Result<PreflightReport> {
        let result = self.validate(store).and_then(|plan| self.report(&plan));
        self.finish(result, JobState::Preflighted)
    }

    /// Validate again, resample, optionally compact features, then commit.
    #[instrument(skip_all, fields(container = %self.request.source_container()))]
    pub fn execute(&mut self, store: &DataStore) -> Result<ExecuteReport> {
        let result = self.validate(store).and_then(|plan| self.run(store, plan));
        self.finish(result, JobState::Executed)
    }

    fn cell_table<'a>(&self, container: &'a DataContainer) -> Result<&'a AttributeTable> {
        let name = &self.request.cell_table_path.table;
        container.table(name).ok_or_else(|| Error::table_not_found(name))
    }

    fn feature_table<'a>(&self, container: &'a DataContainer) -> Result<&'a AttributeTable> {
        let path = &self.request.feature_table_path;
        if path.container != container.name() {
            return Err(Error::feature_table_not_found(path.to_string()));
        }
        container
            .table(&path.table)
            .ok_or_else(|| Error::feature_table_not_found(path.to_string()))
    }

    fn labels<'a>(&self, cells: &'a AttributeTable) -> Result<&'a TypedBuffer> {
        let ids = &self.request.feature_ids_path;
        if !ids.same_table(&self.request.cell_table_path) {
            return Err(Error::shape("feature ids location", &self.request.cell_table_path, ids));
        }
        let labels = cells.array(&ids.array)?;
        if labels.data_type() != DataType::INT32 {
            return Err(Error::shape(ids.to_string(), DataType::INT32, labels.data_type()));
        }
        Ok(labels)
    }

    fn validate(&self, store: &DataStore) -> Result<Plan> {
        let req = &self.request;
        check_spacing(req.spacing)?;

        let container = store.container(req.source_container())?;
        let geometry = *container.geometry();
        let cells = self.cell_table(&container)?;
        if cells.tuple_count() != geometry.cell_count() {
            return Err(Error::TupleCountMismatch {
                name: cells.name().to_string(),
                expected: geometry.cell_count(),
                actual: cells.tuple_count(),
            });
        }
        let noop = geometry.has_spacing(req.spacing);
        let target = geometry.resampled(req.spacing)?;

        if req.renumber_features {
            let labels = self.labels(cells)?;
            let features = self.feature_table(&container)?;
            // resampling only repeats source labels, so checking them covers the result
            LabelCompactor::new().active_rows(labels, features.tuple_count())?;
        }

        if req.save_as_new_container {
            let name = &req.new_container_name;
            if name.trim().is_empty() {
                return Err(Error::InvalidName {
                    name: name.clone(),
                    reason: "a new data container needs a name",
                });
            }
            if store.contains(name) {
                return Err(Error::DuplicateName(name.clone()));
            }
        }

        Ok(Plan { container, target, noop })
    }

    fn report(&self, plan: &Plan) -> Result<PreflightReport> {
        let feature_count = if self.request.renumber_features {
            Some(self.referenced_features(plan)?)
        } else {
            None
        };
        Ok(PreflightReport {
            current: *plan.geometry(),
            target: plan.target,
            current_summary: plan.geometry().range_summary(),
            new_summary: plan.target.range_summary(),
            cell_tuples: plan.target.cell_count(),
            feature_count,
            noop: plan.noop,
        })
    }

    /// Rows of the feature table that the resampled labels would reference, row 0 included.
    ///
    /// Runs under its own cancel token, so a cancelled job can still be previewed.
    fn referenced_features(&self, plan: &Plan) -> Result<usize> {
        let cells = self.cell_table(&plan.container)?;
        let labels = self.labels(cells)?;
        let rows = self.feature_table(&plan.container)?.tuple_count();
        let compactor = LabelCompactor::new();
        let remap = if plan.noop {
            compactor.plan(labels, rows)?
        } else {
            let map = build_index_map(plan.geometry(), &plan.target, &CancelToken::new())?;
            compactor.plan_mapped(labels, &map, rows)?
        };
        Ok(remap.new_count())
    }

    fn run(&self, store: &DataStore, plan: Plan) -> Result<ExecuteReport> {
        let req = &self.request;
        let source = &plan.container;
        let cells = self.cell_table(source)?;

        let engine = ResampleEngine::new()
            .with_mode(req.execution)
            .with_cancel(self.cancel.clone());
        let (mut new_cells, geometry) = engine.resample(cells, source.geometry(), req.spacing)?;

        let mut new_features = None;
        let mut remap = None;
        if req.renumber_features {
            let mut features = self.feature_table(source)?.try_clone()?;
            let mut labels = self.labels(&new_cells)?.try_clone()?;
            let compactor = LabelCompactor::new()
                .with_mode(req.execution)
                .with_cancel(self.cancel.clone());
            let table = compactor.compact(&labels, &mut features)?;
            table.apply(&mut labels)?;
            new_cells.replace(&req.feature_ids_path.array, labels)?;
            new_features = Some(features);
            remap = Some(table);
        }
        self.cancel.check()?;

        let name = req.target_container().to_string();
        let mut container = DataContainer::new(name.clone(), geometry);
        let mut new_cells = Some(new_cells);
        for table in source.tables() {
            let replacement = if table.name() == cells.name() {
                new_cells.take()
            } else if table.name() == req.feature_table_path.table {
                new_features.take()
            } else {
                None
            };
            let table = match replacement {
                Some(table) => table,
                None => table.try_clone()?,
            };
            container.insert_table(table);
        }
        debug!(tables = source.tables().count(), "container assembled");

        if req.save_as_new_container {
            store.insert_new(container)?;
        } else {
            store.insert(container);
        }
        info!(container = %name, dims = ?geometry.dims(), "resample committed");

        Ok(ExecuteReport {
            container: name,
            geometry,
            cell_tuples: geometry.cell_count(),
            remap,
            noop: plan.noop,
        })
    }
}
