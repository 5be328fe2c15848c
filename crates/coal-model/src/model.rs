use coal_core::errors::{CoalError, ErrorInfo};
use coal_core::{Value, VertexId};
use coal_graph::{BayesianNetwork, ModelGraph};
use coal_mcmc::{run_chains, PosteriorRun, RunSummary, SamplerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::DisasterData;

const SWITCHPOINT: &str = "switchpoint";
const EARLY_RATE: &str = "early_rate";
const LATE_RATE: &str = "late_rate";

/// Vertices built for a single observed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearObservation {
    /// Calendar year.
    pub year: i64,
    /// Real-valued rate selected for the year.
    pub rate: VertexId,
    /// Observed Poisson count.
    pub count: VertexId,
}

/// Two-regime Poisson model with an unknown switch year.
///
/// Year `y` uses the early rate iff `switchpoint > y`, so the switch year
/// itself already belongs to the late regime. The switchpoint is uniform over
/// the inclusive year range.
#[derive(Debug, Clone)]
pub struct SwitchpointModel {
    graph: ModelGraph,
    switchpoint: VertexId,
    early_rate: VertexId,
    late_rate: VertexId,
    observations: Vec<YearObservation>,
}

/// Posterior summary of a switchpoint run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchpointPosterior {
    /// Most frequent switchpoint among the retained samples.
    pub switch_year: i64,
    /// Posterior mean of the early rate.
    pub early_rate_mean: f64,
    /// Posterior mean of the late rate.
    pub late_rate_mean: f64,
    /// Sampler summary of the run.
    pub summary: RunSummary,
}

impl SwitchpointModel {
    /// Builds the model graph for `data`, observing every year of its range.
    pub fn new(data: &DisasterData) -> Result<Self, CoalError> {
        data.validate()?;
        let mut graph = ModelGraph::new();
        let start = graph.constant_int(data.start_year);
        let end = graph.constant_int(data.end_year + 1);
        let switchpoint = graph.uniform_int(start, end)?;
        graph.set_label(switchpoint, SWITCHPOINT)?;

        let prior_rate = graph.constant_real(1.0);
        let early_rate = graph.exponential(prior_rate)?;
        graph.set_label(early_rate, EARLY_RATE)?;
        let late_rate = graph.exponential(prior_rate)?;
        graph.set_label(late_rate, LATE_RATE)?;

        let mut observations = Vec::with_capacity(data.year_count());
        for (year, count) in data.years() {
            let year_vertex = graph.constant_int(year);
            let early = graph.greater_than(switchpoint, year_vertex)?;
            let selected = graph.if_then_else(early, early_rate, late_rate)?;
            let rate = graph.cast_to_real(selected)?;
            let count_vertex = graph.poisson(rate)?;
            graph.observe(count_vertex, Value::Int(count as i64))?;
            graph.set_label(count_vertex, format!("count_{year}"))?;
            observations.push(YearObservation {
                year,
                rate,
                count: count_vertex,
            });
        }
        debug!(
            start_year = data.start_year,
            end_year = data.end_year,
            vertices = graph.len(),
            "built switchpoint model"
        );
        Ok(Self {
            graph,
            switchpoint,
            early_rate,
            late_rate,
            observations,
        })
    }

    /// The underlying model graph.
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Uniform switch year vertex.
    pub fn switchpoint(&self) -> VertexId {
        self.switchpoint
    }

    /// Rate used before the switch year.
    pub fn early_rate(&self) -> VertexId {
        self.early_rate
    }

    /// Rate used from the switch year onwards.
    pub fn late_rate(&self) -> VertexId {
        self.late_rate
    }

    /// Per-year vertices in ascending year order.
    pub fn observations(&self) -> &[YearObservation] {
        &self.observations
    }

    /// Assembles the network around the switchpoint.
    pub fn network(&self) -> Result<BayesianNetwork<'_>, CoalError> {
        BayesianNetwork::assemble(&self.graph, &[self.switchpoint])
    }

    /// Samples the posterior with `config.chains` chains and keeps the
    /// post-processed samples.
    pub fn sample(&self, config: &SamplerConfig) -> Result<PosteriorRun, CoalError> {
        let network = self.network()?;
        run_chains(&network, config)
    }

    /// Samples the posterior and summarises the switch year and both rates.
    pub fn run(&self, config: &SamplerConfig) -> Result<SwitchpointPosterior, CoalError> {
        let posterior = self.sample(config)?;
        let switch_year = posterior.samples.mode(self.switchpoint)?.as_int().ok_or_else(|| {
            CoalError::Samples(
                ErrorInfo::new("kind-mismatch", "switchpoint samples are not integers")
                    .with_context("vertex", self.switchpoint),
            )
        })?;
        let early_rate_mean = posterior.samples.mean(self.early_rate)?;
        let late_rate_mean = posterior.samples.mean(self.late_rate)?;
        info!(switch_year, early_rate_mean, late_rate_mean, "switchpoint posterior");
        Ok(SwitchpointPosterior {
            switch_year,
            early_rate_mean,
            late_rate_mean,
            summary: posterior.summary,
        })
    }
}
