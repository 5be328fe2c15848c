use coal_core::{RngHandle, Value, VertexId};
use coal_graph::{BayesianNetwork, ModelGraph, NetworkState, ProposalTuning, Undo};

fn model() -> (ModelGraph, VertexId, VertexId, VertexId) {
    let mut graph = ModelGraph::new();
    let low = graph.constant_int(0);
    let high = graph.constant_int(10);
    let switchpoint = graph.uniform_int(low, high).unwrap();
    let five = graph.constant_int(5);
    let before = graph.greater_than(switchpoint, five).unwrap();
    let early = graph.constant_real(3.0);
    let late = graph.constant_real(0.5);
    let rate = graph.if_then_else(before, early, late).unwrap();
    let count = graph.poisson(rate).unwrap();
    graph.observe(count, Value::Int(2)).unwrap();
    (graph, switchpoint, rate, count)
}

#[test]
fn apply_recomputes_descendants_and_rollback_restores_them() {
    let (graph, switchpoint, rate, _) = model();
    let network = BayesianNetwork::assemble(&graph, &[switchpoint]).unwrap();
    let mut state = NetworkState::initialise(&network, &mut RngHandle::from_seed(11)).unwrap();
    let mut undo = Undo::new();

    state.apply(&network, switchpoint, Value::Int(9), &mut undo).unwrap();
    assert_eq!(state.value(rate), Some(Value::Real(3.0)));
    state.apply(&network, switchpoint, Value::Int(2), &mut undo).unwrap();
    assert_eq!(state.value(rate), Some(Value::Real(0.5)));
    let log_prob_low = state.log_joint(&network).unwrap();

    state.apply(&network, switchpoint, Value::Int(7), &mut undo).unwrap();
    assert_eq!(state.value(rate), Some(Value::Real(3.0)));
    state.rollback(&mut undo);
    assert!(undo.is_empty());
    assert_eq!(state.value(switchpoint), Some(Value::Int(2)));
    assert_eq!(state.value(rate), Some(Value::Real(0.5)));
    assert_eq!(state.log_joint(&network).unwrap(), log_prob_low);
}

#[test]
fn apply_rejects_non_latent_targets_and_wrong_kinds() {
    let (graph, switchpoint, rate, count) = model();
    let network = BayesianNetwork::assemble(&graph, &[switchpoint]).unwrap();
    let mut state = NetworkState::initialise(&network, &mut RngHandle::from_seed(5)).unwrap();
    let mut undo = Undo::new();

    assert_eq!(
        state.apply(&network, count, Value::Int(1), &mut undo).unwrap_err().code(),
        "not-latent"
    );
    assert_eq!(
        state.apply(&network, rate, Value::Real(1.0), &mut undo).unwrap_err().code(),
        "not-latent"
    );
    assert_eq!(
        state.apply(&network, switchpoint, Value::Real(1.0), &mut undo).unwrap_err().code(),
        "kind-mismatch"
    );
}

#[test]
fn initialisation_is_reproducible() {
    let (graph, switchpoint, _, _) = model();
    let network = BayesianNetwork::assemble(&graph, &[switchpoint]).unwrap();
    let a = NetworkState::initialise(&network, &mut RngHandle::from_seed(99)).unwrap();
    let b = NetworkState::initialise(&network, &mut RngHandle::from_seed(99)).unwrap();
    assert_eq!(a, b);

    let tuning = ProposalTuning::default();
    let pa = a.propose(&network, switchpoint, &mut RngHandle::from_seed(3), &tuning).unwrap();
    let pb = b.propose(&network, switchpoint, &mut RngHandle::from_seed(3), &tuning).unwrap();
    assert_eq!(pa, pb);
}
