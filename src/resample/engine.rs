//! Nearest-lower-cell resampling of cell attribute tables.

use glam::Vec3;
use tracing::{debug, instrument};

use crate::core::{AttributeTable, CancelToken, ExecutionMode, GridGeometry};
use crate::util::{Error, Result};

/// Source cell index along one axis for every target cell along it.
fn axis_map(target_count: u64, target_spacing: f32, source_count: u64, source_spacing: f32) -> Vec<usize> {
    let last = source_count.saturating_sub(1) as usize;
    (0..target_count)
        .map(|i| {
            let pos = i as f32 * target_spacing;
            let src = (pos / source_spacing).floor();
            // f32 -> usize saturates, negative and NaN land on 0
            (src as usize).min(last)
        })
        .collect()
}

/// Map every target cell to the source cell containing its lower corner.
///
/// `map[t]` is the source linear index for target linear index `t`. Positions
/// are computed in `f32` per axis and clamped to the source grid. Cancellation
/// is polled once per target z-plane.
pub fn build_index_map(
    source: &GridGeometry,
    target: &GridGeometry,
    cancel: &CancelToken,
) -> Result<Vec<usize>> {
    let (sd, ss) = (source.dims(), source.spacing());
    let (td, ts) = (target.dims(), target.spacing());
    let xs = axis_map(td.x, ts.x, sd.x, ss.x);
    let ys = axis_map(td.y, ts.y, sd.y, ss.y);
    let zs = axis_map(td.z, ts.z, sd.z, ss.z);

    let (snx, sny) = (sd.x as usize, sd.y as usize);
    let total = target.cell_count();
    let mut map = Vec::new();
    map.try_reserve_exact(total)
        .map_err(|_| Error::AllocationFailure { bytes: total * std::mem::size_of::<usize>() })?;

    for (k, &sk) in zs.iter().enumerate() {
        cancel.check()?;
        for &sj in &ys {
            let row = (sk * sny + sj) * snx;
            map.extend(xs.iter().map(|&si| row + si));
        }
        if k % 64 == 0 {
            debug!(plane = k, planes = zs.len(), "index map progress");
        }
    }
    Ok(map)
}

/// Resamples cell tables onto a grid with a different spacing.
///
/// The engine never mutates its inputs. Results are returned as a fresh table
/// and geometry, and the caller decides when to swap them in.
#[derive(Clone, Debug, Default)]
pub struct ResampleEngine {
    mode: ExecutionMode,
    cancel: CancelToken,
}

impl ResampleEngine {
    /// Serial engine with its own cancel token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how tuples are copied.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Share a cancel token with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resample `table`, defined on `geometry`, to `target_spacing`.
    ///
    /// Returns the new table and geometry. When `target_spacing` equals the
    /// current spacing bit for bit, both inputs are returned unchanged.
    #[instrument(skip_all, fields(table = %table.name(), arrays = table.len()))]
    pub fn resample(
        &self,
        table: &AttributeTable,
        geometry: &GridGeometry,
        target_spacing: impl Into<Vec3>,
    ) -> Result<(AttributeTable, GridGeometry)> {
        let target_spacing = target_spacing.into();
        let target = geometry.resampled(target_spacing)?;
        if table.tuple_count() != geometry.cell_count() {
            return Err(Error::TupleCountMismatch {
                name: table.name().to_string(),
                expected: geometry.cell_count(),
                actual: table.tuple_count(),
            });
        }
        if geometry.has_spacing(target_spacing) {
            debug!("spacing unchanged, nothing to resample");
            return Ok((table.try_clone()?, *geometry));
        }

        debug!(from = %geometry, to = %target, "resampling");
        let map = build_index_map(geometry, &target, &self.cancel)?;
        let plane = (target.dims().x * target.dims().y) as usize;
        let out = table.gather(target.tuple_dims(), &map, plane, self.mode, &self.cancel)?;
        Ok((out, target))
    }
}
