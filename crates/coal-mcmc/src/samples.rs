use std::cmp::Ordering;
use std::collections::BTreeMap;

use coal_core::errors::{CoalError, ErrorInfo};
use coal_core::{Value, VertexId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Ordered sequence of joint snapshots of the sampled vertices.
///
/// Stored column-wise: one value sequence per vertex, all of the same length.
/// Post-processing returns new stores and leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSamples {
    vertices: Vec<VertexId>,
    labels: Vec<Option<String>>,
    columns: Vec<Vec<Value>>,
}

/// Samples recorded for a single vertex.
#[derive(Debug, Clone, Copy)]
pub struct VertexSamples<'a> {
    vertex: VertexId,
    label: Option<&'a str>,
    values: &'a [Value],
}

impl NetworkSamples {
    /// Creates an empty store for the given vertices and their labels.
    pub fn new(vertices: Vec<VertexId>, labels: Vec<Option<String>>) -> Result<Self, CoalError> {
        if vertices.len() != labels.len() {
            return Err(samples_error("shape-mismatch", "every vertex needs a label slot")
                .with_context("vertices", vertices.len())
                .with_context("labels", labels.len()));
        }
        let columns = vec![Vec::new(); vertices.len()];
        Ok(Self {
            vertices,
            labels,
            columns,
        })
    }

    /// Appends a joint snapshot ordered like [`NetworkSamples::vertices`].
    pub fn push(&mut self, snapshot: &[Value]) -> Result<(), CoalError> {
        if snapshot.len() != self.vertices.len() {
            return Err(samples_error("shape-mismatch", "snapshot width differs from the vertex count")
                .with_context("expected", self.vertices.len())
                .with_context("found", snapshot.len()));
        }
        for (column, value) in self.columns.iter_mut().zip(snapshot) {
            column.push(*value);
        }
        Ok(())
    }

    /// Returns the number of recorded snapshots.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Returns whether no snapshot has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sampled vertices in snapshot order.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Returns the labels recorded for the sampled vertices.
    pub fn labels(&self) -> &[Option<String>] {
        &self.labels
    }

    /// Returns the joint snapshot at `index`.
    pub fn snapshot(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|column| column[index]).collect())
    }

    /// Discards the first `count` snapshots.
    ///
    /// Dropping exactly [`NetworkSamples::len`] snapshots yields an empty store;
    /// dropping more is an error.
    pub fn drop(&self, count: usize) -> Result<Self, CoalError> {
        if count > self.len() {
            return Err(samples_error("drop-out-of-range", "cannot drop more snapshots than recorded")
                .with_context("count", count)
                .with_context("len", self.len()));
        }
        Ok(self.map_columns(|column| column[count..].to_vec()))
    }

    /// Keeps every `stride`-th snapshot starting with the first.
    pub fn down_sample(&self, stride: usize) -> Result<Self, CoalError> {
        if stride == 0 {
            return Err(samples_error("stride-out-of-range", "down-sampling stride must be positive")
                .with_context("stride", stride));
        }
        Ok(self.map_columns(|column| column.iter().step_by(stride).copied().collect()))
    }

    /// Concatenates stores recorded for the same vertices, in the given order.
    pub fn concat(stores: &[NetworkSamples]) -> Result<Self, CoalError> {
        let Some(first) = stores.first() else {
            return Err(samples_error("empty-concat", "at least one store is required"));
        };
        let mut merged = first.clone();
        for store in &stores[1..] {
            if store.vertices != merged.vertices {
                return Err(samples_error("vertex-mismatch", "stores record different vertices")
                    .with_context("expected", format_ids(&merged.vertices))
                    .with_context("found", format_ids(&store.vertices)));
            }
            for (column, extra) in merged.columns.iter_mut().zip(&store.columns) {
                column.extend_from_slice(extra);
            }
        }
        Ok(merged)
    }

    /// Returns the samples recorded for `vertex`.
    pub fn get(&self, vertex: VertexId) -> Result<VertexSamples<'_>, CoalError> {
        let position = self
            .vertices
            .iter()
            .position(|id| *id == vertex)
            .ok_or_else(|| {
                samples_error("unknown-vertex", "vertex was not sampled").with_context("vertex", vertex)
            })?;
        Ok(self.column(position))
    }

    /// Returns the samples recorded for the vertex carrying `label`.
    pub fn get_by_label(&self, label: &str) -> Result<VertexSamples<'_>, CoalError> {
        let position = self
            .labels
            .iter()
            .position(|candidate| candidate.as_deref() == Some(label))
            .ok_or_else(|| {
                samples_error("unknown-label", "no sampled vertex carries this label").with_context("label", label)
            })?;
        Ok(self.column(position))
    }

    /// Most frequent value of `vertex`; ties resolve to the smallest value.
    pub fn mode(&self, vertex: VertexId) -> Result<Value, CoalError> {
        self.get(vertex)?.mode()
    }

    /// Mean of a real-valued `vertex`.
    pub fn mean(&self, vertex: VertexId) -> Result<f64, CoalError> {
        self.get(vertex)?.mean()
    }

    /// SHA-256 over vertex ids and every recorded value bit pattern.
    pub fn canonical_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.vertices.len() as u64).to_le_bytes());
        hasher.update((self.len() as u64).to_le_bytes());
        for (vertex, column) in self.vertices.iter().zip(&self.columns) {
            hasher.update(vertex.as_raw().to_le_bytes());
            for value in column {
                match value {
                    Value::Int(v) => hasher.update(v.to_le_bytes()),
                    Value::Real(v) => hasher.update(v.to_bits().to_le_bytes()),
                    Value::Bool(v) => hasher.update([u8::from(*v)]),
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }

    fn column(&self, position: usize) -> VertexSamples<'_> {
        VertexSamples {
            vertex: self.vertices[position],
            label: self.labels[position].as_deref(),
            values: &self.columns[position],
        }
    }

    fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&Vec<Value>) -> Vec<Value>,
    {
        Self {
            vertices: self.vertices.clone(),
            labels: self.labels.clone(),
            columns: self.columns.iter().map(f).collect(),
        }
    }
}

impl<'a> VertexSamples<'a> {
    /// Returns the vertex the samples belong to.
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Returns the vertex label, if any.
    pub fn label(&self) -> Option<&'a str> {
        self.label
    }

    /// Returns the recorded values in snapshot order.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Returns the number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no value was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most frequent value; ties resolve to the smallest value.
    pub fn mode(&self) -> Result<Value, CoalError> {
        let mut counts: BTreeMap<OrderedValue, usize> = BTreeMap::new();
        for value in self.values {
            *counts.entry(OrderedValue(*value)).or_insert(0) += 1;
        }
        let mut best: Option<(Value, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((value.0, count));
            }
        }
        best.map(|(value, _)| value).ok_or_else(|| self.empty_error("mode"))
    }

    /// Arithmetic mean. Defined for real-valued vertices only.
    pub fn mean(&self) -> Result<f64, CoalError> {
        if self.values.is_empty() {
            return Err(self.empty_error("mean"));
        }
        let mut sum = 0.0;
        for value in self.values {
            let Some(v) = value.as_real() else {
                return Err(samples_error("unsupported-statistic", "mean is defined for real-valued vertices only")
                    .with_context("vertex", self.vertex)
                    .with_context("value_kind", value.kind()));
            };
            sum += v;
        }
        Ok(sum / self.values.len() as f64)
    }

    fn empty_error(&self, statistic: &str) -> CoalError {
        samples_error("empty-samples", "statistic requested on an empty sample sequence")
            .with_context("vertex", self.vertex)
            .with_context("statistic", statistic)
    }
}

#[derive(Debug, Clone, Copy)]
struct OrderedValue(Value);

impl PartialEq for OrderedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedValue {}

impl PartialOrd for OrderedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn format_ids(ids: &[VertexId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn samples_error(code: impl Into<String>, message: impl Into<String>) -> CoalError {
    CoalError::Samples(ErrorInfo::new(code, message))
}
