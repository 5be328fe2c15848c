use std::fs;
use std::path::Path;

use coal_core::errors::{CoalError, ErrorInfo};
use coal_graph::ProposalTuning;
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing a sampler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Number of recorded iterations per chain.
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    /// Number of initial snapshots discarded from each chain.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
    /// Stride applied after burn-in removal.
    #[serde(default = "default_thinning")]
    pub thinning: usize,
    /// Master seed and labelling policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// How latent vertices are selected for proposals.
    #[serde(default)]
    pub site_policy: SitePolicy,
    /// Proposal kernel step sizes.
    #[serde(default)]
    pub proposal: ProposalTuning,
    /// Number of independent chains.
    #[serde(default = "default_chains")]
    pub chains: usize,
}

fn default_num_samples() -> usize {
    50_000
}

fn default_burn_in() -> usize {
    1_000
}

fn default_thinning() -> usize {
    5
}

fn default_chains() -> usize {
    1
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            burn_in: default_burn_in(),
            thinning: default_thinning(),
            seed_policy: SeedPolicy::default(),
            site_policy: SitePolicy::default(),
            proposal: ProposalTuning::default(),
            chains: default_chains(),
        }
    }
}

impl SamplerConfig {
    /// Parses a configuration from YAML text; missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoalError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|err| CoalError::Serde(ErrorInfo::new("config-parse", err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, CoalError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            CoalError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| err.with_context("path", path.display()))
    }

    /// Checks that the parameters describe a runnable configuration.
    pub fn validate(&self) -> Result<(), CoalError> {
        if self.num_samples == 0 {
            return Err(config_error("num-samples", "at least one iteration is required")
                .with_context("num_samples", self.num_samples));
        }
        if self.burn_in > self.num_samples {
            return Err(config_error("burn-in", "burn-in exceeds the number of iterations")
                .with_context("burn_in", self.burn_in)
                .with_context("num_samples", self.num_samples));
        }
        if self.thinning == 0 {
            return Err(config_error("thinning", "thinning stride must be positive")
                .with_context("thinning", self.thinning));
        }
        if self.chains == 0 {
            return Err(config_error("chains", "at least one chain is required"));
        }
        let step = self.proposal.exponential_step;
        if !step.is_finite() || step <= 0.0 {
            return Err(config_error("proposal-step", "exponential step must be positive and finite")
                .with_context("exponential_step", step));
        }
        if self.proposal.count_step < 1 {
            return Err(config_error("proposal-step", "count step must be at least one")
                .with_context("count_step", self.proposal.count_step));
        }
        Ok(())
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label echoed in run summaries.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    1
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Order in which latent vertices receive proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SitePolicy {
    /// Every iteration proposes once for each latent vertex in id order.
    #[default]
    Sweep,
    /// Every iteration proposes once for a latent vertex drawn uniformly.
    RandomScan,
}

fn config_error(code: impl Into<String>, message: impl Into<String>) -> CoalError {
    CoalError::Config(ErrorInfo::new(code, message))
}
