//! Removal of unused feature rows and dense renumbering of labels.

use tracing::{debug, instrument};

use crate::core::{try_with_capacity, AttributeTable, CancelToken, ExecutionMode, TypedBuffer};
use crate::util::{DataType, Error, Result};

/// Labels scanned between cancellation checks.
const SCAN_CHUNK: usize = 1 << 16;

fn check_labels(labels: &TypedBuffer) -> Result<()> {
    if labels.data_type() != DataType::INT32 {
        return Err(Error::shape("cell labels", DataType::INT32, labels.data_type()));
    }
    Ok(())
}

/// Label values of an `int32_t[1]` buffer, in cell order.
fn label_values(labels: &TypedBuffer) -> impl Iterator<Item = i32> + '_ {
    labels.as_bytes().chunks_exact(4).map(bytemuck::pod_read_unaligned::<i32>)
}

/// Old feature row -> new feature row, `None` for removed rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapTable {
    map: Vec<Option<usize>>,
    new_count: usize,
}

impl RemapTable {
    /// Mapping that keeps `count` rows in place.
    pub fn identity(count: usize) -> Self {
        Self {
            map: (0..count).map(Some).collect(),
            new_count: count,
        }
    }

    fn from_active(active: &[bool]) -> Result<Self> {
        let mut map = try_with_capacity(active.len())?;
        let mut next = 0;
        for &keep in active {
            map.push(keep.then(|| {
                next += 1;
                next - 1
            }));
        }
        Ok(Self { map, new_count: next })
    }

    /// New row for `old`, if it survived.
    pub fn get(&self, old: usize) -> Option<usize> {
        self.map.get(old).copied().flatten()
    }

    /// Number of rows before compaction.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of rows after compaction.
    pub fn new_count(&self) -> usize {
        self.new_count
    }

    /// True if every row maps to itself.
    pub fn is_identity(&self) -> bool {
        self.new_count == self.map.len()
    }

    /// `(old, new)` pairs in old-row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        self.map.iter().copied().enumerate()
    }

    /// Old rows that survived, ascending.
    pub fn kept_rows(&self) -> Result<Vec<usize>> {
        let mut rows = try_with_capacity(self.new_count)?;
        rows.extend(self.iter().filter_map(|(old, new)| new.map(|_| old)));
        Ok(rows)
    }

    /// Rewrite an `int32_t[1]` label buffer in place.
    ///
    /// Every label is validated before any is rewritten; on error `labels`
    /// is left unchanged.
    pub fn apply(&self, labels: &mut TypedBuffer) -> Result<()> {
        check_labels(labels)?;
        for (cell, label) in label_values(labels).enumerate() {
            let mapped = usize::try_from(label).ok().and_then(|old| self.get(old));
            if mapped.is_none() {
                return Err(Error::LabelOutOfRange {
                    label: label as i64,
                    cell,
                    feature_count: self.map.len(),
                });
            }
        }
        if self.is_identity() {
            return Ok(());
        }
        for raw in labels.as_bytes_mut().chunks_exact_mut(4) {
            let old = bytemuck::pod_read_unaligned::<i32>(raw) as usize;
            let new = self.map[old].unwrap_or(0) as i32;
            raw.copy_from_slice(bytemuck::bytes_of(&new));
        }
        Ok(())
    }
}

/// Drops feature rows that no cell references.
#[derive(Clone, Debug, Default)]
pub struct LabelCompactor {
    mode: ExecutionMode,
    cancel: CancelToken,
}

impl LabelCompactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Mark the rows of a `feature_count`-row table referenced by `labels`.
    ///
    /// Row 0 is always active.
    pub fn active_rows(&self, labels: &TypedBuffer, feature_count: usize) -> Result<Vec<bool>> {
        check_labels(labels)?;
        self.mark_active(label_values(labels), feature_count)
    }

    /// Scan labels in cell order, polling cancellation every `SCAN_CHUNK` cells.
    fn mark_active(&self, labels: impl Iterator<Item = i32>, feature_count: usize) -> Result<Vec<bool>> {
        if feature_count == 0 {
            return Err(Error::EmptyFeatureTable);
        }
        let mut active = try_with_capacity(feature_count)?;
        active.resize(feature_count, false);
        active[0] = true;
        for (cell, label) in labels.enumerate() {
            if cell % SCAN_CHUNK == 0 {
                self.cancel.check()?;
            }
            match usize::try_from(label) {
                Ok(row) if row < feature_count => active[row] = true,
                _ => {
                    return Err(Error::LabelOutOfRange {
                        label: label as i64,
                        cell,
                        feature_count,
                    })
                }
            }
        }
        Ok(active)
    }

    /// Remap for `labels` against a `feature_count`-row table, without touching any table.
    pub fn plan(&self, labels: &TypedBuffer, feature_count: usize) -> Result<RemapTable> {
        RemapTable::from_active(&self.active_rows(labels, feature_count)?)
    }

    /// Remap for the labels a gather by `map` would produce, without building them.
    ///
    /// Cell `t` of the gathered labels is `labels[map[t]]`; errors report `t`.
    pub fn plan_mapped(&self, labels: &TypedBuffer, map: &[usize], feature_count: usize) -> Result<RemapTable> {
        check_labels(labels)?;
        let count = labels.tuple_count();
        if let Some(&bad) = map.iter().find(|&&i| i >= count) {
            return Err(Error::OutOfBounds { index: bad as u64, count: count as u64 });
        }
        let bytes = labels.as_bytes();
        let gathered = map
            .iter()
            .map(|&src| bytemuck::pod_read_unaligned::<i32>(&bytes[src * 4..src * 4 + 4]));
        RemapTable::from_active(&self.mark_active(gathered, feature_count)?)
    }

    /// Remove every row of `features` that `labels` does not reference.
    ///
    /// Surviving rows keep their relative order. The remap is computed in
    /// full before `features` is touched, so on error it is unchanged.
    /// `labels` itself is not rewritten; see [`RemapTable::apply`].
    #[instrument(skip_all, fields(features = %features.name(), rows = features.tuple_count()))]
    pub fn compact(&self, labels: &TypedBuffer, features: &mut AttributeTable) -> Result<RemapTable> {
        let remap = self.plan(labels, features.tuple_count())?;
        if remap.is_identity() {
            debug!("every feature is referenced, nothing to remove");
            return Ok(remap);
        }
        let keep = remap.kept_rows()?;
        let compacted = features.gather(keep.len(), &keep, SCAN_CHUNK, self.mode, &self.cancel)?;
        debug!(removed = remap.len() - remap.new_count(), kept = remap.new_count(), "features compacted");
        *features = compacted;
        Ok(remap)
    }
}
