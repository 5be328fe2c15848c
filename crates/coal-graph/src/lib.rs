#![deny(missing_docs)]
//! Probabilistic computation graph for the changepoint engine.
//!
//! A [`ModelGraph`] is a flat arena of tagged vertices (constants, latent
//! distributions, deterministic operators and observed likelihoods) linked by
//! integer parent indices. [`BayesianNetwork::assemble`] extracts the
//! connected component around a set of vertices, partitions it by role and
//! derives a topological order. The per-chain values live in a separate
//! [`NetworkState`] so the graph itself never changes while sampling.

mod dispatch;
mod graph;
mod hash;
mod network;
mod serialization;
mod state;
mod vertex;

pub use dispatch::{
    evaluate, exponential_log_density, ln_factorial, log_probability, poisson_log_mass,
    propose_neighbor, sample_from_prior, ProposalTuning,
};
pub use graph::ModelGraph;
pub use hash::canonical_hash;
pub use network::BayesianNetwork;
pub use serialization::{graph_from_json, graph_to_json};
pub use state::{NetworkState, Undo};
pub use vertex::{Role, VertexKind, VertexRecord};
