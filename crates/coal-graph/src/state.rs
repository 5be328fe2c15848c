use coal_core::errors::ErrorInfo;
use coal_core::{CoalError, RngHandle, Value, ValueKind, VertexId};

use crate::dispatch::{self, ProposalTuning};
use crate::network::BayesianNetwork;
use crate::vertex::Role;

/// Current values of one chain, indexed by arena slot.
///
/// The graph stays an immutable description; only this state changes while
/// sampling. Slots of vertices outside the network hold a placeholder of the
/// right kind and are never read.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    values: Vec<Value>,
}

/// Previous values overwritten by [`NetworkState::apply`], used to roll back a
/// rejected proposal.
#[derive(Debug, Clone, Default)]
pub struct Undo {
    entries: Vec<(VertexId, Value)>,
}

impl Undo {
    /// Creates an empty undo log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NetworkState {
    /// Fills every member in topological order: constants and observations are
    /// copied, latent vertices are drawn from their priors and deterministic
    /// vertices are computed from their parents.
    pub fn initialise(network: &BayesianNetwork<'_>, rng: &mut RngHandle) -> Result<Self, CoalError> {
        let graph = network.graph();
        let mut values: Vec<Value> = graph
            .records()
            .iter()
            .map(|record| placeholder(record.value_kind))
            .collect();
        for &id in network.topological_order() {
            let record = graph.vertex(id)?;
            let value = match record.role() {
                Role::Observed => record.observation.ok_or_else(|| {
                    CoalError::Graph(
                        ErrorInfo::new("missing-observation", "observed vertex has no value")
                            .with_context("vertex", id),
                    )
                })?,
                Role::Latent => dispatch::sample_from_prior(&record.kind, &values, rng)
                    .map_err(|err| err.with_context("vertex", id).with_context("name", graph.display_name(id)))?,
                Role::Constant | Role::Deterministic => {
                    dispatch::evaluate(&record.kind, &values).ok_or_else(|| evaluation_failed(network, id))?
                }
            };
            values[id.index()] = value;
        }
        Ok(Self { values })
    }

    /// Returns the current value of `id`.
    pub fn value(&self, id: VertexId) -> Option<Value> {
        self.values.get(id.index()).copied()
    }

    /// Returns the full value vector indexed by arena slot.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Log probability of a single vertex at the current values.
    pub fn log_probability_of(&self, network: &BayesianNetwork<'_>, id: VertexId) -> Result<f64, CoalError> {
        let record = network.graph().vertex(id)?;
        let value = self.values[id.index()];
        Ok(dispatch::log_probability(&record.kind, value, &self.values))
    }

    /// Joint log probability: the sum over latent and observed vertices.
    pub fn log_joint(&self, network: &BayesianNetwork<'_>) -> Result<f64, CoalError> {
        let mut total = 0.0;
        for id in network.probabilistic_vertices() {
            total += self.log_probability_of(network, id)?;
        }
        Ok(total)
    }

    /// Returns the first probabilistic vertex whose log probability is not
    /// finite, together with that log probability.
    pub fn first_non_finite(&self, network: &BayesianNetwork<'_>) -> Result<Option<(VertexId, f64)>, CoalError> {
        for id in network.probabilistic_vertices() {
            let log_prob = self.log_probability_of(network, id)?;
            if !log_prob.is_finite() {
                return Ok(Some((id, log_prob)));
            }
        }
        Ok(None)
    }

    /// Proposes a neighbouring value for `latent` from the current state.
    pub fn propose(
        &self,
        network: &BayesianNetwork<'_>,
        latent: VertexId,
        rng: &mut RngHandle,
        tuning: &ProposalTuning,
    ) -> Result<Value, CoalError> {
        let record = network.graph().vertex(latent)?;
        dispatch::propose_neighbor(&record.kind, self.values[latent.index()], &self.values, rng, tuning)
            .map_err(|err| err.with_context("vertex", latent))
    }

    /// Sets `latent` to `value` and recomputes its deterministic descendants in
    /// topological order. Overwritten values are recorded in `undo`.
    pub fn apply(
        &mut self,
        network: &BayesianNetwork<'_>,
        latent: VertexId,
        value: Value,
        undo: &mut Undo,
    ) -> Result<(), CoalError> {
        let graph = network.graph();
        let record = graph.vertex(latent)?;
        if record.role() != Role::Latent {
            return Err(CoalError::Sampler(
                ErrorInfo::new("not-latent", "only latent vertices accept proposals")
                    .with_context("vertex", latent)
                    .with_context("role", format!("{:?}", record.role())),
            ));
        }
        if value.kind() != record.value_kind {
            return Err(CoalError::Sampler(
                ErrorInfo::new("kind-mismatch", "proposed value kind differs from the vertex kind")
                    .with_context("vertex", latent)
                    .with_context("expected", record.value_kind)
                    .with_context("found", value.kind()),
            ));
        }
        undo.entries.clear();
        undo.entries.push((latent, self.values[latent.index()]));
        self.values[latent.index()] = value;
        for &id in network.downstream_of(latent) {
            let kind = &graph.vertex(id)?.kind;
            let recomputed = dispatch::evaluate(kind, &self.values).ok_or_else(|| evaluation_failed(network, id))?;
            undo.entries.push((id, self.values[id.index()]));
            self.values[id.index()] = recomputed;
        }
        Ok(())
    }

    /// Restores the values recorded by the last [`NetworkState::apply`].
    pub fn rollback(&mut self, undo: &mut Undo) {
        for (id, value) in undo.entries.drain(..).rev() {
            self.values[id.index()] = value;
        }
    }

    /// Copies the current values of `vertices` in the given order.
    pub fn snapshot(&self, vertices: &[VertexId]) -> Vec<Value> {
        vertices.iter().map(|id| self.values[id.index()]).collect()
    }
}

fn placeholder(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Int => Value::Int(0),
        ValueKind::Real => Value::Real(0.0),
        ValueKind::Bool => Value::Bool(false),
    }
}

fn evaluation_failed(network: &BayesianNetwork<'_>, id: VertexId) -> CoalError {
    CoalError::Graph(
        ErrorInfo::new("evaluation-failed", "deterministic vertex could not be computed from its parents")
            .with_context("vertex", id)
            .with_context("name", network.graph().display_name(id)),
    )
}
