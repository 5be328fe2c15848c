use coal_core::{Value, ValueKind, VertexId};
use serde::{Deserialize, Serialize};

/// Role of a vertex within a network, derived from its kind and observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unobserved probabilistic vertex whose value is sampled.
    Latent,
    /// Probabilistic vertex fixed to a measured value.
    Observed,
    /// Vertex computed purely from its parents.
    Deterministic,
    /// Fixed value without parents.
    Constant,
}

/// Distribution or operator tag of a vertex together with its parent slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VertexKind {
    /// Fixed value with zero log probability.
    Constant {
        /// Value held by the vertex.
        value: Value,
    },
    /// Integer uniformly distributed over `[low, high)`.
    UniformInt {
        /// Inclusive lower bound.
        low: VertexId,
        /// Exclusive upper bound.
        high: VertexId,
    },
    /// Positive real with density `rate * exp(-rate * x)`.
    Exponential {
        /// Rate parameter.
        rate: VertexId,
    },
    /// Non-negative count with mass `rate^k * exp(-rate) / k!`.
    Poisson {
        /// Rate parameter.
        rate: VertexId,
    },
    /// Boolean `lhs > rhs`.
    GreaterThan {
        /// Left operand.
        lhs: VertexId,
        /// Right operand.
        rhs: VertexId,
    },
    /// Selects `then` when `condition` holds, `otherwise` when it does not.
    If {
        /// Boolean selector.
        condition: VertexId,
        /// Value used when the condition is true.
        then: VertexId,
        /// Value used when the condition is false.
        otherwise: VertexId,
    },
    /// Converts a numeric parent to a real.
    CastToReal {
        /// Numeric input.
        input: VertexId,
    },
}

impl VertexKind {
    /// Returns the ordered parent list of the vertex.
    pub fn parents(&self) -> Vec<VertexId> {
        match *self {
            VertexKind::Constant { .. } => Vec::new(),
            VertexKind::UniformInt { low, high } => vec![low, high],
            VertexKind::Exponential { rate } | VertexKind::Poisson { rate } => vec![rate],
            VertexKind::GreaterThan { lhs, rhs } => vec![lhs, rhs],
            VertexKind::If {
                condition,
                then,
                otherwise,
            } => vec![condition, then, otherwise],
            VertexKind::CastToReal { input } => vec![input],
        }
    }

    /// Returns whether the vertex carries an intrinsic distribution.
    pub fn is_probabilistic(&self) -> bool {
        matches!(
            self,
            VertexKind::UniformInt { .. } | VertexKind::Exponential { .. } | VertexKind::Poisson { .. }
        )
    }

    /// Returns whether the vertex is a deterministic function of its parents.
    pub fn is_deterministic(&self) -> bool {
        matches!(
            self,
            VertexKind::GreaterThan { .. } | VertexKind::If { .. } | VertexKind::CastToReal { .. }
        )
    }

    /// Returns a stable name for diagnostics and hashing.
    pub fn name(&self) -> &'static str {
        match self {
            VertexKind::Constant { .. } => "constant",
            VertexKind::UniformInt { .. } => "uniform-int",
            VertexKind::Exponential { .. } => "exponential",
            VertexKind::Poisson { .. } => "poisson",
            VertexKind::GreaterThan { .. } => "greater-than",
            VertexKind::If { .. } => "if",
            VertexKind::CastToReal { .. } => "cast-to-real",
        }
    }
}

/// Static description of a vertex stored in the graph arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Distribution or operator tag.
    pub kind: VertexKind,
    /// Type of the values the vertex holds.
    pub value_kind: ValueKind,
    /// Optional human readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Observed value, if the vertex is evidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Value>,
}

impl VertexRecord {
    /// Returns the role implied by the kind and observation.
    pub fn role(&self) -> Role {
        match self.kind {
            VertexKind::Constant { .. } => Role::Constant,
            kind if kind.is_deterministic() => Role::Deterministic,
            _ if self.observation.is_some() => Role::Observed,
            _ => Role::Latent,
        }
    }
}
