//! Integration tests for resampling cell tables and compacting feature tables.

use cellgrid::prelude::*;
use glam::{U64Vec3, Vec3};

fn index_volume(n: u64) -> (AttributeTable, GridGeometry) {
    let geom = GridGeometry::new((n, n, n), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).expect("valid geometry");
    let data: Vec<u8> = (0..geom.cell_count()).map(|i| (i % 256) as u8).collect();
    let mut cells = AttributeTable::new("CellData", TableKind::Cell, geom.tuple_dims());
    cells
        .insert("Data", TypedBuffer::from_values(&data, 1).expect("buffer"))
        .expect("insert Data");
    (cells, geom)
}

#[test]
fn test_upsample_10_to_20() {
    let (cells, geom) = index_volume(10);
    let engine = ResampleEngine::new();
    let (out, target) = engine.resample(&cells, &geom, (0.5, 0.5, 0.5)).expect("resample");

    assert_eq!(target.dims(), U64Vec3::new(20, 20, 20));
    assert_eq!(target.num_cells(), 8000);
    assert_eq!(out.tuple_count(), 8000);

    let data = out.array("Data").expect("Data survives");
    assert_eq!(data.value::<u8>(0, 0).unwrap(), 0);
    assert_eq!(data.value::<u8>(7999, 0).unwrap(), 231, "cell (19,19,19) maps to source 999");

    // source untouched
    assert_eq!(cells.tuple_count(), 1000);
    assert_eq!(geom.dims(), U64Vec3::splat(10));
}

#[test]
fn test_zero_spacing_is_rejected() {
    let (cells, geom) = index_volume(10);
    let before = cells.clone();
    let err = ResampleEngine::new()
        .resample(&cells, &geom, (0.0, 1.0, 1.0))
        .expect_err("zero spacing");
    assert_eq!(err.kind(), ErrorKind::InvalidSpacing);
    assert_eq!(err.code(), -5555);
    assert!(err.to_string().contains("X spacing"));
    assert_eq!(cells, before);
    assert_eq!(geom.spacing(), Vec3::ONE);
}

#[test]
fn test_down_then_up_loses_values() {
    let (cells, geom) = index_volume(4);
    let engine = ResampleEngine::new();
    let (coarse, coarse_geom) = engine.resample(&cells, &geom, (2.0, 2.0, 2.0)).expect("down");
    let (fine, fine_geom) = engine.resample(&coarse, &coarse_geom, (1.0, 1.0, 1.0)).expect("up");

    assert_eq!(fine_geom.dims(), geom.dims());
    assert_eq!(fine.tuple_count(), cells.tuple_count());
    // nearest-cell sampling is lossy; odd cells now repeat their even neighbour
    assert_ne!(fine.array("Data").unwrap(), cells.array("Data").unwrap());
    assert_eq!(fine.array("Data").unwrap().value::<u8>(1, 0).unwrap(), 0);
}

#[test]
fn test_multi_component_arrays_follow_cells() {
    let geom = GridGeometry::new((2, 1, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
    let mut cells = AttributeTable::new("CellData", TableKind::Cell, geom.tuple_dims());
    cells
        .insert("Euler", TypedBuffer::from_values(&[0.1f32, 0.2, 0.3, 1.1, 1.2, 1.3], 3).unwrap())
        .unwrap();
    cells
        .insert("Phases", TypedBuffer::from_values(&[1i32, 2], 1).unwrap())
        .unwrap();

    let (out, _) = ResampleEngine::new()
        .resample(&cells, &geom, (0.5, 1.0, 1.0))
        .expect("resample");
    assert_eq!(out.names().collect::<Vec<_>>(), vec!["Euler", "Phases"]);
    assert_eq!(
        out.array("Euler").unwrap().to_vec::<f32>().unwrap(),
        vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 1.1, 1.2, 1.3, 1.1, 1.2, 1.3]
    );
    assert_eq!(out.array("Phases").unwrap().to_vec::<i32>().unwrap(), vec![1, 1, 2, 2]);
    assert_eq!(out.array("Euler").unwrap().data_type(), DataType::VEC3F);
}

#[test]
fn test_compact_keeps_referenced_rows() {
    let mut features = AttributeTable::new("Grain Data", TableKind::CellFeature, 5);
    features
        .insert("Id", TypedBuffer::from_values(&[100u32, 101, 102, 103, 104], 1).unwrap())
        .unwrap();
    let labels = TypedBuffer::from_values(&[0i32, 2, 4, 2, 0], 1).unwrap();

    let remap = LabelCompactor::new().compact(&labels, &mut features).expect("compact");
    assert_eq!(features.tuple_count(), 3);
    assert_eq!(remap.get(0), Some(0));
    assert_eq!(remap.get(2), Some(1));
    assert_eq!(remap.get(4), Some(2));
    assert_eq!(remap.get(1), None);
    assert_eq!(remap.get(3), None);
    assert_eq!(features.array("Id").unwrap().to_vec::<u32>().unwrap(), vec![100, 102, 104]);
}

#[test]
fn test_compact_keeps_row_zero_when_unused() {
    let mut features = AttributeTable::new("Grain Data", TableKind::CellFeature, 4);
    features
        .insert("Id", TypedBuffer::from_values(&[7u8, 8, 9, 10], 1).unwrap())
        .unwrap();
    let labels = TypedBuffer::from_values(&[3i32, 3, 1], 1).unwrap();
    let remap = LabelCompactor::new().compact(&labels, &mut features).unwrap();
    assert_eq!(remap.new_count(), 3);
    assert_eq!(features.array("Id").unwrap().to_vec::<u8>().unwrap(), vec![7, 8, 10]);
}

#[test]
fn test_resample_then_compact() {
    // two grains side by side, the right one only one cell wide
    let geom = GridGeometry::new((4, 1, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
    let mut cells = AttributeTable::new("CellData", TableKind::Cell, geom.tuple_dims());
    cells
        .insert("FeatureIds", TypedBuffer::from_values(&[1i32, 1, 1, 2], 1).unwrap())
        .unwrap();
    let mut grains = AttributeTable::new("Grain Data", TableKind::CellFeature, 3);
    grains
        .insert("Size", TypedBuffer::from_values(&[0.0f32, 3.0, 1.0], 1).unwrap())
        .unwrap();

    let (coarse, _) = ResampleEngine::new().resample(&cells, &geom, (2.0, 1.0, 1.0)).unwrap();
    let mut labels = coarse.array("FeatureIds").unwrap().clone();
    assert_eq!(labels.to_vec::<i32>().unwrap(), vec![1, 1]);

    let remap = LabelCompactor::new().compact(&labels, &mut grains).unwrap();
    remap.apply(&mut labels).unwrap();
    assert_eq!(grains.tuple_count(), 2);
    assert_eq!(grains.array("Size").unwrap().to_vec::<f32>().unwrap(), vec![0.0, 3.0]);
    assert_eq!(labels.to_vec::<i32>().unwrap(), vec![1, 1]);
}
