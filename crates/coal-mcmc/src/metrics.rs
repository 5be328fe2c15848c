use coal_core::VertexId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Proposal statistics for one latent vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCounts {
    /// Number of proposals issued.
    pub proposed: usize,
    /// Number of proposals accepted.
    pub accepted: usize,
    /// Number of proposals whose joint log probability was not finite.
    pub non_finite: usize,
}

impl AcceptanceCounts {
    /// Fraction of accepted proposals, zero when nothing was proposed.
    pub fn rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// Collects per-vertex proposal statistics in first-proposal order.
#[derive(Debug, Clone, Default)]
pub struct AcceptanceRecorder {
    counts: IndexMap<VertexId, AcceptanceCounts>,
}

impl AcceptanceRecorder {
    /// Creates a recorder pre-populated with `vertices` so their order is stable.
    pub fn new(vertices: &[VertexId]) -> Self {
        Self {
            counts: vertices
                .iter()
                .map(|id| (*id, AcceptanceCounts::default()))
                .collect(),
        }
    }

    /// Records the outcome of one proposal.
    pub fn record(&mut self, vertex: VertexId, accepted: bool, finite: bool) {
        let entry = self.counts.entry(vertex).or_default();
        entry.proposed += 1;
        if accepted {
            entry.accepted += 1;
        }
        if !finite {
            entry.non_finite += 1;
        }
    }

    /// Adds the statistics of another recorder.
    pub fn merge(&mut self, other: &AcceptanceRecorder) {
        for (vertex, counts) in &other.counts {
            let entry = self.counts.entry(*vertex).or_default();
            entry.proposed += counts.proposed;
            entry.accepted += counts.accepted;
            entry.non_finite += counts.non_finite;
        }
    }

    /// Returns the statistics of `vertex`.
    pub fn counts(&self, vertex: VertexId) -> AcceptanceCounts {
        self.counts.get(&vertex).copied().unwrap_or_default()
    }

    /// Iterates over all recorded vertices.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, AcceptanceCounts)> + '_ {
        self.counts.iter().map(|(id, counts)| (*id, *counts))
    }

    /// Total number of proposals across all vertices.
    pub fn total_proposed(&self) -> usize {
        self.counts.values().map(|counts| counts.proposed).sum()
    }
}
