use std::collections::BTreeMap;
use std::thread;

use coal_core::errors::{CoalError, ErrorInfo};
use coal_core::{RngHandle, VertexId};
use coal_graph::{BayesianNetwork, NetworkState, Role, Undo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::{SamplerConfig, SitePolicy};
use crate::determinism;
use crate::metrics::AcceptanceRecorder;
use crate::samples::NetworkSamples;

/// Raw output of a single chain before burn-in removal and thinning.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// One snapshot per iteration, rejected proposals repeating the previous value.
    pub samples: NetworkSamples,
    /// Proposal statistics of the chain.
    pub acceptance: AcceptanceRecorder,
    /// Joint log probability of the final state.
    pub final_log_probability: f64,
}

/// Post-processed samples of a run together with its summary.
#[derive(Debug, Clone)]
pub struct PosteriorRun {
    /// Retained snapshots of every chain, concatenated in chain order.
    pub samples: NetworkSamples,
    /// Serializable description of the run.
    pub summary: RunSummary,
}

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Iterations recorded per chain.
    pub iterations: usize,
    /// Snapshots discarded per chain.
    pub burn_in: usize,
    /// Stride applied after burn-in removal.
    pub thinning: usize,
    /// Number of independent chains.
    pub chains: usize,
    /// Master seed of the run.
    pub master_seed: u64,
    /// Seed label copied from the configuration.
    pub seed_label: Option<String>,
    /// Snapshots retained across all chains.
    pub retained: usize,
    /// Acceptance rate per latent vertex, keyed by label or id.
    pub acceptance_rates: BTreeMap<String, f64>,
    /// Joint log probability of each chain's final state.
    pub final_log_probabilities: Vec<f64>,
    /// SHA-256 fingerprint of the retained samples.
    pub samples_hash: String,
}

/// Draws `config.num_samples` joint snapshots of `sample_from` with
/// single-site Metropolis-Hastings.
///
/// Every latent vertex of the network is initialised from its prior, then
/// each iteration proposes new values for the vertices in `sample_from`
/// following `config.site_policy`. Proposals are symmetric, so the acceptance
/// probability is `min(1, exp(proposed - current))` without a Hastings
/// correction. A proposed state with non-finite log probability is rejected;
/// a non-finite current state is a fatal invariant violation.
pub fn sample_posterior(
    network: &BayesianNetwork<'_>,
    sample_from: &[VertexId],
    config: &SamplerConfig,
    rng: &mut RngHandle,
) -> Result<ChainOutput, CoalError> {
    if sample_from.is_empty() {
        return Err(sampler_error("no-latent-vertices", "nothing to sample")
            .with_context("members", network.members().len()));
    }
    for &id in sample_from {
        if !network.contains(id) || network.graph().role(id)? != Role::Latent {
            return Err(sampler_error("not-latent", "only latent network members can be sampled")
                .with_context("vertex", id)
                .with_context("name", network.graph().display_name(id)));
        }
    }

    let graph = network.graph();
    let mut state = NetworkState::initialise(network, rng)?;
    let mut current = state.log_joint(network)?;
    ensure_valid_current(network, &state, current)?;

    let labels = sample_from
        .iter()
        .map(|id| graph.label(*id).map(str::to_string))
        .collect();
    let mut samples = NetworkSamples::new(sample_from.to_vec(), labels)?;
    let mut acceptance = AcceptanceRecorder::new(sample_from);
    let mut undo = Undo::new();

    for iteration in 0..config.num_samples {
        match config.site_policy {
            SitePolicy::Sweep => {
                for &latent in sample_from {
                    current = step(network, &mut state, latent, current, config, rng, &mut undo, &mut acceptance)?;
                }
            }
            SitePolicy::RandomScan => {
                let latent = sample_from[rng.index(sample_from.len())];
                current = step(network, &mut state, latent, current, config, rng, &mut undo, &mut acceptance)?;
            }
        }
        samples.push(&state.snapshot(sample_from))?;
        if iteration % 10_000 == 0 {
            debug!(iteration, log_probability = current, "sampler progress");
        }
    }

    Ok(ChainOutput {
        samples,
        acceptance,
        final_log_probability: current,
    })
}

#[allow(clippy::too_many_arguments)]
fn step(
    network: &BayesianNetwork<'_>,
    state: &mut NetworkState,
    latent: VertexId,
    current: f64,
    config: &SamplerConfig,
    rng: &mut RngHandle,
    undo: &mut Undo,
    acceptance: &mut AcceptanceRecorder,
) -> Result<f64, CoalError> {
    let proposal = state.propose(network, latent, rng, &config.proposal)?;
    state.apply(network, latent, proposal, undo)?;
    let proposed = state.log_joint(network)?;
    let finite = proposed.is_finite();
    let probability = if proposed.is_nan() {
        0.0
    } else {
        (proposed - current).exp().min(1.0)
    };
    let draw = rng.unit_interval();
    let accepted = draw < probability;
    acceptance.record(latent, accepted, finite);
    if !finite {
        trace!(vertex = %latent, value = %proposal, log_probability = proposed, "proposal outside support");
    }
    if accepted {
        ensure_valid_current(network, state, proposed)?;
        Ok(proposed)
    } else {
        state.rollback(undo);
        Ok(current)
    }
}

fn ensure_valid_current(network: &BayesianNetwork<'_>, state: &NetworkState, log_joint: f64) -> Result<(), CoalError> {
    if log_joint.is_finite() {
        return Ok(());
    }
    let mut info = ErrorInfo::new("invalid-current-state", "joint log probability of the current state is not finite")
        .with_context("log_probability", log_joint)
        .with_hint("check that every rate and bound is valid for the initial prior draws");
    if let Some((vertex, log_prob)) = state.first_non_finite(network)? {
        info = info
            .with_context("vertex", vertex)
            .with_context("name", network.graph().display_name(vertex))
            .with_context("vertex_log_probability", log_prob);
        if let Some(value) = state.value(vertex) {
            info = info.with_context("value", value);
        }
    }
    Err(CoalError::Sampler(info))
}

/// Runs a single chain seeded with the master seed, removes the burn-in prefix
/// and thins the rest. `config.chains` is ignored.
pub fn run(network: &BayesianNetwork<'_>, config: &SamplerConfig) -> Result<PosteriorRun, CoalError> {
    let single = SamplerConfig {
        chains: 1,
        ..config.clone()
    };
    run_chains(network, &single)
}

/// Runs `config.chains` independent chains over every latent vertex of the
/// network, removes `config.burn_in` snapshots from each, thins each by
/// `config.thinning` and concatenates the results in chain order.
///
/// Chains run on scoped threads with seeds from [`determinism::chain_seed`];
/// the merged output does not depend on thread timing.
pub fn run_chains(network: &BayesianNetwork<'_>, config: &SamplerConfig) -> Result<PosteriorRun, CoalError> {
    config.validate()?;
    let master_seed = config.seed_policy.master_seed;
    let latents = network.latent_vertices();
    info!(
        iterations = config.num_samples,
        chains = config.chains,
        latent = latents.len(),
        observed = network.observed_vertices().len(),
        seed = master_seed,
        "starting metropolis-hastings run"
    );

    let outputs = if config.chains == 1 {
        vec![run_chain(network, latents, config, 0)?]
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = (0..config.chains)
                .map(|chain| scope.spawn(move || run_chain(network, latents, config, chain)))
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(chain, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(sampler_error("chain-panicked", "sampling thread panicked").with_context("chain", chain))
                    })
                })
                .collect::<Result<Vec<_>, CoalError>>()
        })?
    };

    let mut retained = Vec::with_capacity(outputs.len());
    let mut acceptance = AcceptanceRecorder::new(latents);
    let mut final_log_probabilities = Vec::with_capacity(outputs.len());
    for output in &outputs {
        retained.push(output.samples.drop(config.burn_in)?.down_sample(config.thinning)?);
        acceptance.merge(&output.acceptance);
        final_log_probabilities.push(output.final_log_probability);
    }
    let samples = NetworkSamples::concat(&retained)?;

    let acceptance_rates = acceptance
        .iter()
        .map(|(id, counts)| (network.graph().display_name(id), counts.rate()))
        .collect::<BTreeMap<_, _>>();
    let summary = RunSummary {
        iterations: config.num_samples,
        burn_in: config.burn_in,
        thinning: config.thinning,
        chains: config.chains,
        master_seed,
        seed_label: config.seed_policy.label.clone(),
        retained: samples.len(),
        acceptance_rates,
        final_log_probabilities,
        samples_hash: samples.canonical_hash(),
    };
    info!(
        retained = summary.retained,
        proposals = acceptance.total_proposed(),
        rates = ?summary.acceptance_rates,
        "metropolis-hastings run complete"
    );
    Ok(PosteriorRun { samples, summary })
}

fn run_chain(
    network: &BayesianNetwork<'_>,
    latents: &[VertexId],
    config: &SamplerConfig,
    chain: usize,
) -> Result<ChainOutput, CoalError> {
    let seed = determinism::chain_seed(config.seed_policy.master_seed, chain);
    let mut rng = RngHandle::from_seed(seed);
    debug!(chain, seed, "starting chain");
    sample_posterior(network, latents, config, &mut rng).map_err(|err| err.with_context("chain", chain))
}

fn sampler_error(code: impl Into<String>, message: impl Into<String>) -> CoalError {
    CoalError::Sampler(ErrorInfo::new(code, message))
}
