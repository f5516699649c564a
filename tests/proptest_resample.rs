//! Property-based tests for resampling and feature compaction.
//!
//! Run with: cargo test --test proptest_resample

use std::collections::BTreeSet;

use cellgrid::prelude::*;
use cellgrid::resample::build_index_map;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_dims() -> impl Strategy<Value = (u64, u64, u64)> {
    (1u64..6, 1u64..6, 1u64..5)
}

fn arb_spacing() -> impl Strategy<Value = (f32, f32, f32)> {
    let axis = || prop::sample::select(vec![0.25f32, 0.5, 0.7, 1.0, 1.5, 2.0, 3.0]);
    (axis(), axis(), axis())
}

/// A cell table with one u16 array of arbitrary content on a grid of `dims`.
fn arb_volume() -> impl Strategy<Value = (AttributeTable, GridGeometry)> {
    (arb_dims(), arb_spacing()).prop_flat_map(|(dims, spacing)| {
        let n = (dims.0 * dims.1 * dims.2) as usize;
        prop::collection::vec(any::<u16>(), n).prop_map(move |data| {
            let geom = GridGeometry::new(dims, spacing, (0.0, 0.0, 0.0)).unwrap();
            let mut cells = AttributeTable::new("CellData", TableKind::Cell, geom.tuple_dims());
            cells.insert("Data", TypedBuffer::from_values(&data, 1).unwrap()).unwrap();
            (cells, geom)
        })
    })
}

/// Feature table row count and labels that all fall inside it.
fn arb_labels() -> impl Strategy<Value = (usize, Vec<i32>)> {
    (1usize..40).prop_flat_map(|rows| {
        (Just(rows), prop::collection::vec(0..rows as i32, 0..200))
    })
}

fn feature_table(rows: usize) -> AttributeTable {
    let mut t = AttributeTable::new("Grain Data", TableKind::CellFeature, rows);
    let values: Vec<f64> = (0..rows).map(|r| r as f64 * 1.5).collect();
    t.insert("Value", TypedBuffer::from_values(&values, 1).unwrap()).unwrap();
    t
}

fn label_buffer(labels: &[i32]) -> TypedBuffer {
    TypedBuffer::from_values(labels, 1).unwrap()
}

// =============================================================================
// Property Tests: Resampling
// =============================================================================

proptest! {
    /// Resampling to the current spacing returns the input unchanged.
    #[test]
    fn same_spacing_is_noop((cells, geom) in arb_volume()) {
        let (out, out_geom) = ResampleEngine::new()
            .resample(&cells, &geom, geom.spacing())
            .unwrap();
        prop_assert_eq!(out, cells);
        prop_assert_eq!(out_geom, geom);
    }

    /// Every target cell maps to a valid source cell.
    #[test]
    fn index_map_stays_in_bounds((_, geom) in arb_volume(), target in arb_spacing()) {
        let target = geom.resampled(target).unwrap();
        let map = build_index_map(&geom, &target, &CancelToken::new()).unwrap();
        prop_assert_eq!(map.len(), target.cell_count());
        prop_assert!(map.iter().all(|&i| i < geom.cell_count()));
        prop_assert!(target.dims().min_element() >= 1);
    }

    /// Down by an integer factor and back up restores the dimensions.
    #[test]
    fn geometry_round_trip(m in (1u64..5, 1u64..5, 1u64..4), f in (1u64..5, 1u64..5, 1u64..5)) {
        let dims = (m.0 * f.0, m.1 * f.1, m.2 * f.2);
        let geom = GridGeometry::new(dims, (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        let coarse = geom.resampled((f.0 as f32, f.1 as f32, f.2 as f32)).unwrap();
        prop_assert_eq!(coarse.dims(), glam::U64Vec3::new(m.0, m.1, m.2));
        let fine = coarse.resampled((1.0, 1.0, 1.0)).unwrap();
        prop_assert_eq!(fine.dims(), geom.dims());
    }

    /// Parallel gathers produce exactly the serial result.
    #[test]
    fn parallel_matches_serial((cells, geom) in arb_volume(), target in arb_spacing()) {
        let serial = ResampleEngine::new().resample(&cells, &geom, target).unwrap();
        let parallel = ResampleEngine::new()
            .with_mode(ExecutionMode::Parallel)
            .resample(&cells, &geom, target)
            .unwrap();
        prop_assert_eq!(serial, parallel);
    }
}

// =============================================================================
// Property Tests: Compaction
// =============================================================================

proptest! {
    /// Compacted row count is the number of distinct labels plus row 0.
    #[test]
    fn compact_keeps_distinct_labels((rows, labels) in arb_labels()) {
        let mut features = feature_table(rows);
        let mut buf = label_buffer(&labels);
        let remap = LabelCompactor::new().compact(&buf, &mut features).unwrap();

        let mut distinct: BTreeSet<i32> = labels.iter().copied().collect();
        distinct.insert(0);
        prop_assert_eq!(features.tuple_count(), distinct.len());
        prop_assert_eq!(remap.new_count(), distinct.len());

        remap.apply(&mut buf).unwrap();
        let count = features.tuple_count() as i32;
        prop_assert!(buf.to_vec::<i32>().unwrap().iter().all(|&l| l < count));
    }

    /// An out-of-range label leaves the feature table as it was.
    #[test]
    fn compact_out_of_range_is_atomic((rows, mut labels) in arb_labels(), extra in 0i32..10, at in any::<prop::sample::Index>()) {
        let mut features = feature_table(rows);
        let before = features.clone();
        let bad = rows as i32 + extra;
        let pos = at.index(labels.len() + 1);
        labels.insert(pos, bad);

        let err = LabelCompactor::new().compact(&label_buffer(&labels), &mut features).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::LabelOutOfRange);
        prop_assert_eq!(features, before);
    }

    /// A second compaction of renumbered labels changes nothing.
    #[test]
    fn compact_is_idempotent((rows, labels) in arb_labels()) {
        let mut features = feature_table(rows);
        let mut buf = label_buffer(&labels);
        let compactor = LabelCompactor::new();
        compactor.compact(&buf, &mut features).unwrap().apply(&mut buf).unwrap();

        let after_first = features.clone();
        let second = compactor.compact(&buf, &mut features).unwrap();
        prop_assert!(second.is_identity());
        prop_assert_eq!(features, after_first);
    }
}
