use coal_core::Value;
use sha2::{Digest, Sha256};

use crate::graph::ModelGraph;

/// Computes the canonical structural hash of a graph description.
///
/// Covers kinds, parent slots, value kinds, labels and observations in arena
/// order, so two graphs built by the same sequence of calls hash equally.
pub fn canonical_hash(graph: &ModelGraph) -> String {
    let mut hasher = Sha256::new();
    hasher.update((graph.len() as u64).to_le_bytes());
    for record in graph.records() {
        hasher.update(record.kind.name().as_bytes());
        let parents = record.kind.parents();
        hasher.update((parents.len() as u64).to_le_bytes());
        for parent in parents {
            hasher.update(parent.as_raw().to_le_bytes());
        }
        if let crate::VertexKind::Constant { value } = record.kind {
            update_value(&value, &mut hasher);
        }
        hasher.update(record.value_kind.as_str().as_bytes());
        match &record.label {
            Some(label) => {
                hasher.update(b"label:some");
                hasher.update((label.len() as u64).to_le_bytes());
                hasher.update(label.as_bytes());
            }
            None => hasher.update(b"label:none"),
        }
        match &record.observation {
            Some(value) => {
                hasher.update(b"observation:some");
                update_value(value, &mut hasher);
            }
            None => hasher.update(b"observation:none"),
        }
    }
    format!("{:x}", hasher.finalize())
}

fn update_value(value: &Value, hasher: &mut Sha256) {
    match value {
        Value::Int(v) => {
            hasher.update(b"int");
            hasher.update(v.to_le_bytes());
        }
        Value::Real(v) => {
            hasher.update(b"real");
            hasher.update(v.to_bits().to_le_bytes());
        }
        Value::Bool(v) => {
            hasher.update(b"bool");
            hasher.update([u8::from(*v)]);
        }
    }
}
