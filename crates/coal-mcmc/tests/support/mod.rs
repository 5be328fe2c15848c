#![allow(dead_code)]

use coal_core::{Value, VertexId};
use coal_graph::ModelGraph;

pub struct Changepoint {
    pub graph: ModelGraph,
    pub switchpoint: VertexId,
    pub early_rate: VertexId,
    pub late_rate: VertexId,
}

/// Small switchpoint model over years `0..counts.len()`.
pub fn changepoint(counts: &[i64]) -> Changepoint {
    let mut graph = ModelGraph::new();
    let start = graph.constant_int(0);
    let end = graph.constant_int(counts.len() as i64);
    let switchpoint = graph.uniform_int(start, end).unwrap();
    graph.set_label(switchpoint, "switchpoint").unwrap();
    let one = graph.constant_real(1.0);
    let early_rate = graph.exponential(one).unwrap();
    graph.set_label(early_rate, "early_rate").unwrap();
    let late_rate = graph.exponential(one).unwrap();
    graph.set_label(late_rate, "late_rate").unwrap();
    for (year, count) in counts.iter().enumerate() {
        let year = graph.constant_int(year as i64);
        let before = graph.greater_than(switchpoint, year).unwrap();
        let rate = graph.if_then_else(before, early_rate, late_rate).unwrap();
        let rate = graph.cast_to_real(rate).unwrap();
        let observed = graph.poisson(rate).unwrap();
        graph.observe(observed, Value::Int(*count)).unwrap();
    }
    Changepoint {
        graph,
        switchpoint,
        early_rate,
        late_rate,
    }
}

pub fn short_counts() -> Vec<i64> {
    vec![4, 5, 3, 4, 6, 3, 4, 1, 0, 1, 1, 0, 2, 1, 0]
}
