//! Free functions dispatching on [`VertexKind`] for evaluation, log
//! probability, prior sampling and proposals.
//!
//! Every function reads parent values from the full value vector of a chain,
//! indexed by arena slot. Parent kinds are checked when the graph is built, so
//! a parent of the wrong kind only shows up here as a NaN or an empty result.

use coal_core::errors::ErrorInfo;
use coal_core::{CoalError, RngHandle, Value, VertexId};
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal, Poisson};
use serde::{Deserialize, Serialize};

use crate::vertex::VertexKind;

/// Step sizes of the symmetric proposal kernels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalTuning {
    /// Standard deviation of the reflected Gaussian walk for positive reals.
    #[serde(default = "default_exponential_step")]
    pub exponential_step: f64,
    /// Maximum absolute step of the integer walk for unobserved counts.
    #[serde(default = "default_count_step")]
    pub count_step: i64,
}

fn default_exponential_step() -> f64 {
    0.5
}

fn default_count_step() -> i64 {
    1
}

impl Default for ProposalTuning {
    fn default() -> Self {
        Self {
            exponential_step: default_exponential_step(),
            count_step: default_count_step(),
        }
    }
}

fn real_at(values: &[Value], id: VertexId) -> f64 {
    values
        .get(id.index())
        .and_then(Value::to_f64)
        .unwrap_or(f64::NAN)
}

fn int_at(values: &[Value], id: VertexId) -> Option<i64> {
    values.get(id.index()).and_then(Value::as_int)
}

/// Computes the value of a constant or deterministic vertex from its parents.
///
/// Returns `None` for probabilistic kinds.
pub fn evaluate(kind: &VertexKind, values: &[Value]) -> Option<Value> {
    match *kind {
        VertexKind::Constant { value } => Some(value),
        VertexKind::GreaterThan { lhs, rhs } => {
            let (a, b) = (values.get(lhs.index())?, values.get(rhs.index())?);
            let greater = match (a, b) {
                (Value::Int(a), Value::Int(b)) => a > b,
                (a, b) => a.to_f64()? > b.to_f64()?,
            };
            Some(Value::Bool(greater))
        }
        VertexKind::If {
            condition,
            then,
            otherwise,
        } => {
            let selected = if values.get(condition.index())?.as_bool()? {
                then
            } else {
                otherwise
            };
            values.get(selected.index()).copied()
        }
        VertexKind::CastToReal { input } => {
            Some(Value::Real(values.get(input.index())?.to_f64()?))
        }
        VertexKind::UniformInt { .. } | VertexKind::Exponential { .. } | VertexKind::Poisson { .. } => {
            None
        }
    }
}

/// Log probability of `value` under the vertex distribution given its parents.
///
/// Constant and deterministic vertices contribute zero. Values outside the
/// support yield negative infinity.
pub fn log_probability(kind: &VertexKind, value: Value, values: &[Value]) -> f64 {
    match *kind {
        VertexKind::Constant { .. }
        | VertexKind::GreaterThan { .. }
        | VertexKind::If { .. }
        | VertexKind::CastToReal { .. } => 0.0,
        VertexKind::UniformInt { low, high } => {
            let (Some(low), Some(high), Some(k)) = (int_at(values, low), int_at(values, high), value.as_int())
            else {
                return f64::NAN;
            };
            if high <= low || k < low || k >= high {
                f64::NEG_INFINITY
            } else {
                -((high - low) as f64).ln()
            }
        }
        VertexKind::Exponential { rate } => {
            let rate = real_at(values, rate);
            let Some(x) = value.as_real() else {
                return f64::NAN;
            };
            exponential_log_density(rate, x)
        }
        VertexKind::Poisson { rate } => {
            let rate = real_at(values, rate);
            let Some(k) = value.as_int() else {
                return f64::NAN;
            };
            poisson_log_mass(rate, k)
        }
    }
}

/// `ln(rate) - rate * x` on the support `x >= 0`.
pub fn exponential_log_density(rate: f64, x: f64) -> f64 {
    if rate.is_nan() || x.is_nan() {
        return f64::NAN;
    }
    if rate <= 0.0 || x < 0.0 {
        return f64::NEG_INFINITY;
    }
    rate.ln() - rate * x
}

/// `-rate + k ln(rate) - ln(k!)` on the support `k >= 0`.
///
/// A zero rate puts all mass on `k == 0`.
pub fn poisson_log_mass(rate: f64, k: i64) -> f64 {
    if rate.is_nan() {
        return f64::NAN;
    }
    if k < 0 || rate < 0.0 {
        return f64::NEG_INFINITY;
    }
    if rate == 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    -rate + k as f64 * rate.ln() - ln_factorial(k as u64)
}

/// Natural logarithm of `n!`, with `ln(0!) = 0`.
pub fn ln_factorial(n: u64) -> f64 {
    const EXACT_LIMIT: u64 = 256;
    if n <= EXACT_LIMIT {
        return (2..=n).map(|i| (i as f64).ln()).sum();
    }
    // Stirling series for ln Γ(n + 1).
    let x = n as f64;
    x * x.ln() - x + 0.5 * (2.0 * std::f64::consts::PI * x).ln() + 1.0 / (12.0 * x)
        - 1.0 / (360.0 * x.powi(3))
        + 1.0 / (1260.0 * x.powi(5))
}

/// Draws a value for a latent vertex from its prior given its parents.
pub fn sample_from_prior(
    kind: &VertexKind,
    values: &[Value],
    rng: &mut RngHandle,
) -> Result<Value, CoalError> {
    match *kind {
        VertexKind::UniformInt { low, high } => {
            let (low, high) = int_bounds(values, low, high)?;
            Ok(Value::Int(rng.inner_mut().gen_range(low..high)))
        }
        VertexKind::Exponential { rate } => {
            let rate = real_at(values, rate);
            if !(rate > 0.0) {
                return Err(invalid_parameter("rate", rate, "rate must be positive"));
            }
            let dist = Exp::new(rate).map_err(|err| invalid_parameter("rate", rate, err))?;
            let draw: f64 = dist.sample(rng.inner_mut());
            Ok(Value::Real(draw.max(f64::MIN_POSITIVE)))
        }
        VertexKind::Poisson { rate } => {
            let rate = real_at(values, rate);
            if rate == 0.0 {
                return Ok(Value::Int(0));
            }
            let dist = Poisson::new(rate).map_err(|err| invalid_parameter("rate", rate, err))?;
            let draw: f64 = dist.sample(rng.inner_mut());
            Ok(Value::Int(draw as i64))
        }
        _ => Err(not_probabilistic(kind)),
    }
}

/// Proposes a neighbouring value for a latent vertex with a symmetric kernel.
///
/// * uniform integers are resampled uniformly within their bounds;
/// * positive reals take a Gaussian step reflected at zero;
/// * counts take a uniform nonzero integer step of at most `count_step`.
///
/// The proposal density is symmetric in every case, so the sampler does not
/// need a Hastings correction.
pub fn propose_neighbor(
    kind: &VertexKind,
    current: Value,
    values: &[Value],
    rng: &mut RngHandle,
    tuning: &ProposalTuning,
) -> Result<Value, CoalError> {
    match *kind {
        VertexKind::UniformInt { low, high } => {
            let (low, high) = int_bounds(values, low, high)?;
            Ok(Value::Int(rng.inner_mut().gen_range(low..high)))
        }
        VertexKind::Exponential { .. } => {
            let x = current
                .as_real()
                .ok_or_else(|| kind_mismatch(kind, current))?;
            let step = Normal::new(0.0, tuning.exponential_step).map_err(|err| {
                invalid_parameter("exponential_step", tuning.exponential_step, err)
            })?;
            let proposed = (x + step.sample(rng.inner_mut())).abs();
            Ok(Value::Real(proposed.max(f64::MIN_POSITIVE)))
        }
        VertexKind::Poisson { .. } => {
            let k = current.as_int().ok_or_else(|| kind_mismatch(kind, current))?;
            if tuning.count_step < 1 {
                return Err(invalid_parameter(
                    "count_step",
                    tuning.count_step as f64,
                    "step must be at least one",
                ));
            }
            let magnitude = rng.inner_mut().gen_range(1..=tuning.count_step);
            let step = if rng.inner_mut().gen_bool(0.5) {
                magnitude
            } else {
                -magnitude
            };
            Ok(Value::Int(k.saturating_add(step)))
        }
        _ => Err(not_probabilistic(kind)),
    }
}

fn int_bounds(values: &[Value], low: VertexId, high: VertexId) -> Result<(i64, i64), CoalError> {
    let (Some(lo), Some(hi)) = (int_at(values, low), int_at(values, high)) else {
        return Err(CoalError::Graph(
            ErrorInfo::new("kind-mismatch", "uniform bounds must be integers")
                .with_context("low", low)
                .with_context("high", high),
        ));
    };
    if hi <= lo {
        return Err(CoalError::Sampler(
            ErrorInfo::new("empty-support", "uniform integer bounds leave no admissible value")
                .with_context("low", lo)
                .with_context("high", hi),
        ));
    }
    Ok((lo, hi))
}

fn invalid_parameter(name: &str, value: f64, err: impl ToString) -> CoalError {
    CoalError::Sampler(
        ErrorInfo::new("invalid-parameter", err.to_string())
            .with_context("parameter", name)
            .with_context("value", value),
    )
}

fn not_probabilistic(kind: &VertexKind) -> CoalError {
    CoalError::Sampler(
        ErrorInfo::new("not-probabilistic", "vertex has no distribution to sample from")
            .with_context("kind", kind.name()),
    )
}

fn kind_mismatch(kind: &VertexKind, value: Value) -> CoalError {
    CoalError::Sampler(
        ErrorInfo::new("kind-mismatch", "current value does not match the vertex kind")
            .with_context("kind", kind.name())
            .with_context("value_kind", value.kind()),
    )
}
