#![deny(missing_docs)]

//! Deterministic Metropolis-Hastings sampler over coal model networks.

/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Sampling kernel and public `run` entry point.
pub mod kernel;
/// Per-vertex proposal statistics.
pub mod metrics;
/// Sample store and post-processing.
pub mod samples;

pub use config::{SamplerConfig, SeedPolicy, SitePolicy};
pub use kernel::{run, run_chains, sample_posterior, ChainOutput, PosteriorRun, RunSummary};
pub use metrics::{AcceptanceCounts, AcceptanceRecorder};
pub use samples::{NetworkSamples, VertexSamples};
