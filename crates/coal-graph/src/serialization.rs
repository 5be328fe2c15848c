use coal_core::errors::{CoalError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::graph::ModelGraph;
use crate::vertex::VertexRecord;

const SCHEMA_VERSION: u32 = 1;

/// Serializes the graph description to a JSON string.
pub fn graph_to_json(graph: &ModelGraph) -> Result<String, CoalError> {
    let serializable = SerializableGraph {
        schema_version: SCHEMA_VERSION,
        vertices: graph.records().to_vec(),
    };
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| CoalError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph description from a JSON string.
///
/// Parent references, value kinds, labels and observations are validated.
/// Directed cycles are left for [`BayesianNetwork::assemble`](crate::BayesianNetwork::assemble) to report.
pub fn graph_from_json(json: &str) -> Result<ModelGraph, CoalError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| CoalError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    if serializable.schema_version != SCHEMA_VERSION {
        return Err(CoalError::Serde(
            ErrorInfo::new("schema-version", "unsupported graph schema version")
                .with_context("found", serializable.schema_version)
                .with_context("expected", SCHEMA_VERSION),
        ));
    }
    ModelGraph::from_records(serializable.vertices)
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    schema_version: u32,
    vertices: Vec<VertexRecord>,
}
