use std::collections::BTreeSet;

use coal_core::errors::{CoalError, ErrorInfo};
use coal_core::{Value, ValueKind, VertexId};

use crate::vertex::{Role, VertexKind, VertexRecord};

/// Static description of a model: an arena of vertices addressed by
/// [`VertexId`] with parent and child edges stored as indices.
///
/// The builder methods only accept parents that already exist, so a graph
/// assembled through them is acyclic by construction. Descriptions restored
/// with [`ModelGraph::from_records`] may reference later slots; cycles in those
/// are reported by [`BayesianNetwork::assemble`](crate::BayesianNetwork::assemble).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelGraph {
    vertices: Vec<VertexRecord>,
    children: Vec<Vec<VertexId>>,
}

impl ModelGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from raw records, validating references, kinds and
    /// observations. Parents may point at any slot of the description.
    pub fn from_records(records: Vec<VertexRecord>) -> Result<Self, CoalError> {
        let len = records.len();
        for (index, record) in records.iter().enumerate() {
            let id = VertexId::from_index(index);
            for parent in record.kind.parents() {
                if parent.index() >= len {
                    return Err(unknown_vertex(parent).with_context("child", id));
                }
            }
            let inferred = infer_value_kind(&record.kind, |parent| {
                Ok(records[parent.index()].value_kind)
            })
            .map_err(|err| err.with_context("vertex", id))?;
            if inferred != record.value_kind {
                return Err(graph_error("kind-mismatch", "declared value kind differs from the kind implied by parents")
                    .with_context("vertex", id)
                    .with_context("declared", record.value_kind)
                    .with_context("inferred", inferred));
            }
            if let Some(observation) = record.observation {
                validate_observation(id, record, observation)?;
            }
        }
        let mut labels = BTreeSet::new();
        for (index, record) in records.iter().enumerate() {
            if let Some(label) = &record.label {
                if !labels.insert(label.clone()) {
                    return Err(graph_error("duplicate-label", "label is already in use")
                        .with_context("vertex", VertexId::from_index(index))
                        .with_context("label", label));
                }
            }
        }
        let mut children = vec![Vec::new(); len];
        for (index, record) in records.iter().enumerate() {
            for parent in record.kind.parents() {
                children[parent.index()].push(VertexId::from_index(index));
            }
        }
        Ok(Self {
            vertices: records,
            children,
        })
    }

    /// Returns the number of vertices in the arena.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns all vertex identifiers in arena order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::from_index)
    }

    /// Returns the raw records in arena order.
    pub fn records(&self) -> &[VertexRecord] {
        &self.vertices
    }

    /// Returns the record stored for `id`.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexRecord, CoalError> {
        self.vertices.get(id.index()).ok_or_else(|| unknown_vertex(id))
    }

    /// Returns the role of `id`.
    pub fn role(&self, id: VertexId) -> Result<Role, CoalError> {
        Ok(self.vertex(id)?.role())
    }

    /// Returns the ordered parents of `id`.
    pub fn parents(&self, id: VertexId) -> Result<Vec<VertexId>, CoalError> {
        Ok(self.vertex(id)?.kind.parents())
    }

    /// Returns the children of `id` in insertion order.
    pub fn children(&self, id: VertexId) -> Result<&[VertexId], CoalError> {
        self.children
            .get(id.index())
            .map(Vec::as_slice)
            .ok_or_else(|| unknown_vertex(id))
    }

    /// Returns the label of `id`, if any.
    pub fn label(&self, id: VertexId) -> Option<&str> {
        self.vertices
            .get(id.index())
            .and_then(|record| record.label.as_deref())
    }

    /// Returns a printable name for diagnostics: the label or the raw id.
    pub fn display_name(&self, id: VertexId) -> String {
        match self.label(id) {
            Some(label) => label.to_string(),
            None => id.to_string(),
        }
    }

    /// Finds the vertex carrying `label`.
    pub fn find_label(&self, label: &str) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|record| record.label.as_deref() == Some(label))
            .map(VertexId::from_index)
    }

    /// Attaches a unique label to `id`.
    pub fn set_label(&mut self, id: VertexId, label: impl Into<String>) -> Result<(), CoalError> {
        let label = label.into();
        if let Some(existing) = self.find_label(&label) {
            if existing != id {
                return Err(graph_error("duplicate-label", "label is already in use")
                    .with_context("vertex", existing)
                    .with_context("label", label));
            }
        }
        let record = self
            .vertices
            .get_mut(id.index())
            .ok_or_else(|| unknown_vertex(id))?;
        record.label = Some(label);
        Ok(())
    }

    /// Adds a vertex of the given kind after validating its parents.
    pub fn add(&mut self, kind: VertexKind) -> Result<VertexId, CoalError> {
        let id = VertexId::from_index(self.vertices.len());
        let value_kind = infer_value_kind(&kind, |parent| Ok(self.vertex(parent)?.value_kind))
            .map_err(|err| err.with_context("vertex", id))?;
        let parents = kind.parents();
        self.vertices.push(VertexRecord {
            kind,
            value_kind,
            label: None,
            observation: None,
        });
        self.children.push(Vec::new());
        for parent in parents {
            self.children[parent.index()].push(id);
        }
        Ok(id)
    }

    /// Adds a constant vertex.
    pub fn constant(&mut self, value: Value) -> VertexId {
        let id = VertexId::from_index(self.vertices.len());
        self.vertices.push(VertexRecord {
            kind: VertexKind::Constant { value },
            value_kind: value.kind(),
            label: None,
            observation: None,
        });
        self.children.push(Vec::new());
        id
    }

    /// Adds an integer constant.
    pub fn constant_int(&mut self, value: i64) -> VertexId {
        self.constant(Value::Int(value))
    }

    /// Adds a real constant.
    pub fn constant_real(&mut self, value: f64) -> VertexId {
        self.constant(Value::Real(value))
    }

    /// Adds an integer uniformly distributed over `[low, high)`.
    pub fn uniform_int(&mut self, low: VertexId, high: VertexId) -> Result<VertexId, CoalError> {
        self.add(VertexKind::UniformInt { low, high })
    }

    /// Adds an exponentially distributed positive real.
    pub fn exponential(&mut self, rate: VertexId) -> Result<VertexId, CoalError> {
        self.add(VertexKind::Exponential { rate })
    }

    /// Adds a Poisson distributed count.
    pub fn poisson(&mut self, rate: VertexId) -> Result<VertexId, CoalError> {
        self.add(VertexKind::Poisson { rate })
    }

    /// Adds the boolean comparison `lhs > rhs`.
    pub fn greater_than(&mut self, lhs: VertexId, rhs: VertexId) -> Result<VertexId, CoalError> {
        self.add(VertexKind::GreaterThan { lhs, rhs })
    }

    /// Adds a selector returning `then` when `condition` holds and `otherwise` when not.
    pub fn if_then_else(
        &mut self,
        condition: VertexId,
        then: VertexId,
        otherwise: VertexId,
    ) -> Result<VertexId, CoalError> {
        self.add(VertexKind::If {
            condition,
            then,
            otherwise,
        })
    }

    /// Adds a conversion of a numeric parent to a real.
    pub fn cast_to_real(&mut self, input: VertexId) -> Result<VertexId, CoalError> {
        self.add(VertexKind::CastToReal { input })
    }

    /// Fixes a probabilistic vertex to an observed value.
    pub fn observe(&mut self, id: VertexId, value: Value) -> Result<(), CoalError> {
        let record = self.vertex(id)?;
        validate_observation(id, record, value)?;
        self.vertices[id.index()].observation = Some(value);
        Ok(())
    }
}

/// Infers the value kind of a vertex from the kinds of its parents.
pub(crate) fn infer_value_kind<F>(kind: &VertexKind, parent_kind: F) -> Result<ValueKind, CoalError>
where
    F: Fn(VertexId) -> Result<ValueKind, CoalError>,
{
    let expect = |id: VertexId, accepted: &[ValueKind], slot: &str| -> Result<ValueKind, CoalError> {
        let found = parent_kind(id)?;
        if accepted.contains(&found) {
            Ok(found)
        } else {
            Err(graph_error("kind-mismatch", "parent has an unsupported value kind")
                .with_context("kind", kind.name())
                .with_context("slot", slot)
                .with_context("parent", id)
                .with_context("found", found))
        }
    };
    const NUMERIC: &[ValueKind] = &[ValueKind::Int, ValueKind::Real];
    match *kind {
        VertexKind::Constant { value } => Ok(value.kind()),
        VertexKind::UniformInt { low, high } => {
            expect(low, &[ValueKind::Int], "low")?;
            expect(high, &[ValueKind::Int], "high")?;
            Ok(ValueKind::Int)
        }
        VertexKind::Exponential { rate } => {
            expect(rate, NUMERIC, "rate")?;
            Ok(ValueKind::Real)
        }
        VertexKind::Poisson { rate } => {
            expect(rate, NUMERIC, "rate")?;
            Ok(ValueKind::Int)
        }
        VertexKind::GreaterThan { lhs, rhs } => {
            expect(lhs, NUMERIC, "lhs")?;
            expect(rhs, NUMERIC, "rhs")?;
            Ok(ValueKind::Bool)
        }
        VertexKind::If {
            condition,
            then,
            otherwise,
        } => {
            expect(condition, &[ValueKind::Bool], "condition")?;
            let then_kind = parent_kind(then)?;
            expect(otherwise, &[then_kind], "otherwise")?;
            Ok(then_kind)
        }
        VertexKind::CastToReal { input } => {
            expect(input, NUMERIC, "input")?;
            Ok(ValueKind::Real)
        }
    }
}

fn validate_observation(id: VertexId, record: &VertexRecord, value: Value) -> Result<(), CoalError> {
    if !record.kind.is_probabilistic() {
        return Err(graph_error("invalid-observation", "only probabilistic vertices can be observed")
            .with_context("vertex", id)
            .with_context("kind", record.kind.name()));
    }
    if value.kind() != record.value_kind {
        return Err(graph_error("kind-mismatch", "observed value kind differs from the vertex kind")
            .with_context("vertex", id)
            .with_context("expected", record.value_kind)
            .with_context("found", value.kind()));
    }
    let in_support = match (record.kind, value) {
        (VertexKind::Poisson { .. }, Value::Int(k)) => k >= 0,
        (VertexKind::Exponential { .. }, Value::Real(x)) => x.is_finite() && x >= 0.0,
        _ => true,
    };
    if !in_support {
        return Err(graph_error("invalid-observation", "observed value lies outside the distribution support")
            .with_context("vertex", id)
            .with_context("value", value));
    }
    Ok(())
}

pub(crate) fn graph_error(code: impl Into<String>, message: impl Into<String>) -> CoalError {
    CoalError::Graph(ErrorInfo::new(code, message))
}

pub(crate) fn unknown_vertex(id: VertexId) -> CoalError {
    graph_error("unknown-vertex", "vertex does not exist").with_context("vertex", id)
}
