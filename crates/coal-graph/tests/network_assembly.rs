use coal_core::{Value, ValueKind, VertexId};
use coal_graph::{BayesianNetwork, ModelGraph, Role, VertexKind, VertexRecord};

struct Fixture {
    graph: ModelGraph,
    switchpoint: VertexId,
    rate: VertexId,
    counts: Vec<VertexId>,
}

fn changepoint_fixture() -> Fixture {
    let mut graph = ModelGraph::new();
    let start = graph.constant_int(0);
    let end = graph.constant_int(3);
    let switchpoint = graph.uniform_int(start, end).unwrap();
    let one = graph.constant_real(1.0);
    let early = graph.exponential(one).unwrap();
    let late = graph.exponential(one).unwrap();
    let mut counts = Vec::new();
    let mut last_rate = early;
    for (year, observed) in [(0, 4), (1, 3), (2, 1)] {
        let year = graph.constant_int(year);
        let before = graph.greater_than(switchpoint, year).unwrap();
        let selected = graph.if_then_else(before, early, late).unwrap();
        let rate = graph.cast_to_real(selected).unwrap();
        let count = graph.poisson(rate).unwrap();
        graph.observe(count, Value::Int(observed)).unwrap();
        counts.push(count);
        last_rate = rate;
    }
    Fixture {
        graph,
        switchpoint,
        rate: last_rate,
        counts,
    }
}

#[test]
fn partition_matches_roles() {
    let fixture = changepoint_fixture();
    let network = BayesianNetwork::assemble(&fixture.graph, &[fixture.switchpoint]).unwrap();

    assert_eq!(network.members().len(), fixture.graph.len());
    assert_eq!(network.latent_vertices().len(), 3);
    assert_eq!(network.observed_vertices(), fixture.counts.as_slice());
    assert_eq!(network.deterministic_vertices().len(), 9);
    assert_eq!(network.constant_vertices().len(), 6);
    for &id in network.latent_vertices() {
        assert_eq!(fixture.graph.role(id).unwrap(), Role::Latent);
    }
}

#[test]
fn assembly_is_independent_of_terminals() {
    let fixture = changepoint_fixture();
    let from_switch = BayesianNetwork::assemble(&fixture.graph, &[fixture.switchpoint]).unwrap();
    let from_count = BayesianNetwork::assemble(&fixture.graph, &[fixture.counts[2]]).unwrap();
    let from_many =
        BayesianNetwork::assemble(&fixture.graph, &[fixture.counts[1], fixture.rate, fixture.switchpoint])
            .unwrap();

    assert_eq!(from_switch.members(), from_count.members());
    assert_eq!(from_switch.members(), from_many.members());
    assert_eq!(from_switch.latent_vertices(), from_many.latent_vertices());
    assert_eq!(from_switch.topological_order(), from_count.topological_order());
}

#[test]
fn topological_order_puts_parents_first() {
    let fixture = changepoint_fixture();
    let network = BayesianNetwork::assemble(&fixture.graph, &[fixture.switchpoint]).unwrap();
    let order = network.topological_order();
    let position = |id: VertexId| order.iter().position(|v| *v == id).unwrap();
    for &id in order {
        for parent in fixture.graph.parents(id).unwrap() {
            assert!(position(parent) < position(id));
        }
    }
    let deterministic = network.deterministic_order();
    assert_eq!(deterministic.len(), network.deterministic_vertices().len());
}

#[test]
fn downstream_of_switchpoint_covers_comparisons_and_selectors() {
    let fixture = changepoint_fixture();
    let network = BayesianNetwork::assemble(&fixture.graph, &[fixture.switchpoint]).unwrap();
    let downstream = network.downstream_of(fixture.switchpoint);
    assert_eq!(downstream.len(), 9);
    assert!(downstream.contains(&fixture.rate));
    for &id in downstream {
        assert_eq!(fixture.graph.role(id).unwrap(), Role::Deterministic);
    }
}

#[test]
fn detached_observation_is_a_structural_error() {
    let mut fixture = changepoint_fixture();
    let rate = fixture.graph.constant_real(2.0);
    let stray = fixture.graph.poisson(rate).unwrap();
    fixture.graph.observe(stray, Value::Int(1)).unwrap();

    let err = BayesianNetwork::assemble(&fixture.graph, &[fixture.switchpoint]).unwrap_err();
    assert_eq!(err.code(), "detached-observation");
    assert_eq!(err.info().context["vertex"], stray.to_string());
}

#[test]
fn single_observation_network_assembles() {
    let mut graph = ModelGraph::new();
    let start = graph.constant_int(1851);
    let end = graph.constant_int(1852);
    let switchpoint = graph.uniform_int(start, end).unwrap();
    let one = graph.constant_real(1.0);
    let early = graph.exponential(one).unwrap();
    let late = graph.exponential(one).unwrap();
    let before = graph.greater_than(switchpoint, start).unwrap();
    let selected = graph.if_then_else(before, early, late).unwrap();
    let count = graph.poisson(selected).unwrap();
    graph.observe(count, Value::Int(2)).unwrap();

    let network = BayesianNetwork::assemble(&graph, &[switchpoint]).unwrap();
    assert_eq!(network.observed_vertices(), &[count]);
    assert_eq!(network.latent_vertices().len(), 3);
}

#[test]
fn cycles_fail_fast() {
    let v = VertexId::from_raw;
    let records = vec![
        VertexRecord {
            kind: VertexKind::Constant { value: Value::Real(1.0) },
            value_kind: ValueKind::Real,
            label: None,
            observation: None,
        },
        VertexRecord {
            kind: VertexKind::CastToReal { input: v(2) },
            value_kind: ValueKind::Real,
            label: None,
            observation: None,
        },
        VertexRecord {
            kind: VertexKind::CastToReal { input: v(1) },
            value_kind: ValueKind::Real,
            label: Some("loop".to_string()),
            observation: None,
        },
        VertexRecord {
            kind: VertexKind::Poisson { rate: v(2) },
            value_kind: ValueKind::Int,
            label: None,
            observation: Some(Value::Int(1)),
        },
    ];
    let graph = ModelGraph::from_records(records).unwrap();
    let err = BayesianNetwork::assemble(&graph, &[v(3)]).unwrap_err();
    assert_eq!(err.code(), "cycle-detected");
}

#[test]
fn unconstrained_latents_are_reported() {
    let mut graph = ModelGraph::new();
    let one = graph.constant_real(1.0);
    let free = graph.exponential(one).unwrap();
    let bound = graph.exponential(one).unwrap();
    let count = graph.poisson(bound).unwrap();
    graph.observe(count, Value::Int(1)).unwrap();

    let network = BayesianNetwork::assemble(&graph, &[count]).unwrap();
    assert_eq!(network.latent_vertices(), &[free, bound]);
    assert_eq!(network.unconstrained_latents().unwrap(), vec![free]);
}

#[test]
fn unknown_terminals_are_rejected() {
    let graph = ModelGraph::new();
    assert_eq!(
        BayesianNetwork::assemble(&graph, &[VertexId::from_raw(0)]).unwrap_err().code(),
        "unknown-vertex"
    );
    assert_eq!(BayesianNetwork::assemble(&graph, &[]).unwrap_err().code(), "no-terminals");
}
