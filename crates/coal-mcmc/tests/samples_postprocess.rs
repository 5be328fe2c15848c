use coal_core::{CoalError, Value, VertexId};
use coal_mcmc::NetworkSamples;
use proptest::prelude::*;

fn store(values: &[i64]) -> NetworkSamples {
    let vertices = vec![VertexId::from_raw(0), VertexId::from_raw(1)];
    let labels = vec![Some("switchpoint".to_string()), None];
    let mut samples = NetworkSamples::new(vertices, labels).unwrap();
    for (i, v) in values.iter().enumerate() {
        samples.push(&[Value::Int(*v), Value::Real(i as f64)]).unwrap();
    }
    samples
}

proptest! {
    #[test]
    fn drop_removes_exactly_the_prefix(values in prop::collection::vec(-5i64..5, 0..200), n in 0usize..200) {
        let samples = store(&values);
        let n = n.min(values.len());
        let dropped = samples.drop(n).unwrap();
        prop_assert_eq!(dropped.len(), values.len() - n);
        prop_assert_eq!(dropped.snapshot(0), samples.snapshot(n));
    }

    #[test]
    fn down_sample_keeps_every_stride_th_snapshot(values in prop::collection::vec(-5i64..5, 0..200), stride in 1usize..12) {
        let samples = store(&values);
        let thinned = samples.down_sample(stride).unwrap();
        prop_assert_eq!(thinned.len(), (values.len() + stride - 1) / stride);
        for i in 0..thinned.len() {
            prop_assert_eq!(thinned.snapshot(i), samples.snapshot(i * stride));
        }
    }
}

#[test]
fn dropping_everything_is_allowed_but_not_more() {
    let samples = store(&[1, 2, 3]);
    assert!(samples.drop(3).unwrap().is_empty());
    let err = samples.drop(4).unwrap_err();
    assert!(matches!(&err, CoalError::Samples(info) if info.code == "drop-out-of-range"));
}

#[test]
fn zero_stride_is_rejected() {
    let err = store(&[1, 2]).down_sample(0).unwrap_err();
    assert_eq!(err.code(), "stride-out-of-range");
}

#[test]
fn mode_breaks_ties_towards_the_smallest_value() {
    let samples = store(&[7, 3, 7, 3, 9]);
    assert_eq!(samples.mode(VertexId::from_raw(0)).unwrap(), Value::Int(3));
    let samples = store(&[7, 3, 7, 3, 7]);
    assert_eq!(samples.get_by_label("switchpoint").unwrap().mode().unwrap(), Value::Int(7));
}

#[test]
fn mean_is_defined_for_real_vertices_only() {
    let samples = store(&[1, 2, 3, 4]);
    assert!((samples.mean(VertexId::from_raw(1)).unwrap() - 1.5).abs() < 1e-12);
    assert_eq!(samples.mean(VertexId::from_raw(0)).unwrap_err().code(), "unsupported-statistic");
    assert_eq!(store(&[]).mean(VertexId::from_raw(1)).unwrap_err().code(), "empty-samples");
    assert_eq!(store(&[]).mode(VertexId::from_raw(0)).unwrap_err().code(), "empty-samples");
}

#[test]
fn unknown_vertices_and_labels_are_reported() {
    let samples = store(&[1]);
    assert_eq!(samples.get(VertexId::from_raw(5)).unwrap_err().code(), "unknown-vertex");
    assert_eq!(samples.get_by_label("late_rate").unwrap_err().code(), "unknown-label");
}

#[test]
fn snapshots_must_match_the_vertex_count() {
    let mut samples = store(&[]);
    let err = samples.push(&[Value::Int(1)]).unwrap_err();
    assert_eq!(err.code(), "shape-mismatch");
}

#[test]
fn concat_appends_in_order_and_checks_vertices() {
    let merged = NetworkSamples::concat(&[store(&[1, 2]), store(&[3])]).unwrap();
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.snapshot(2).unwrap()[0], Value::Int(3));

    let other = NetworkSamples::new(vec![VertexId::from_raw(9)], vec![None]).unwrap();
    let err = NetworkSamples::concat(&[store(&[1]), other]).unwrap_err();
    assert_eq!(err.code(), "vertex-mismatch");
    assert_eq!(NetworkSamples::concat(&[]).unwrap_err().code(), "empty-concat");
}

#[test]
fn hash_tracks_content() {
    assert_eq!(store(&[1, 2]).canonical_hash(), store(&[1, 2]).canonical_hash());
    assert_ne!(store(&[1, 2]).canonical_hash(), store(&[2, 1]).canonical_hash());
}
