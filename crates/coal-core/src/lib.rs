#![deny(missing_docs)]
//! Core identifiers, typed values, structured errors and deterministic
//! randomness shared by every crate of the changepoint engine.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod rng;
mod value;

pub use errors::{CoalError, ErrorInfo};
pub use rng::{derive_substream_seed, RngHandle};
pub use value::{Value, ValueKind};

/// Identifier for a vertex within a model graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(u64);

impl VertexId {
    /// Creates a new identifier from its raw integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Returns the arena slot addressed by this identifier.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Creates an identifier addressing the given arena slot.
    pub fn from_index(index: usize) -> Self {
        Self(index as u64)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
