//! Structured error types shared across coal crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CoalError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (vertex ids, labels, sizes, years).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the changepoint engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CoalError {
    /// Structural errors in the vertex graph or its network partition.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Invariant violations detected while sampling.
    #[error("sampler error: {0}")]
    Sampler(ErrorInfo),
    /// Invalid post-processing requests on a sample store.
    #[error("samples error: {0}")]
    Samples(ErrorInfo),
    /// Observed data that does not satisfy the input contract.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Invalid run configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization and parsing errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl CoalError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CoalError::Graph(info)
            | CoalError::Sampler(info)
            | CoalError::Samples(info)
            | CoalError::Data(info)
            | CoalError::Config(info)
            | CoalError::Serde(info) => info,
        }
    }

    /// Returns the stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Adds a context entry to the payload, keeping the error family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        match self {
            CoalError::Graph(info) => CoalError::Graph(info.with_context(key, value)),
            CoalError::Sampler(info) => CoalError::Sampler(info.with_context(key, value)),
            CoalError::Samples(info) => CoalError::Samples(info.with_context(key, value)),
            CoalError::Data(info) => CoalError::Data(info.with_context(key, value)),
            CoalError::Config(info) => CoalError::Config(info.with_context(key, value)),
            CoalError::Serde(info) => CoalError::Serde(info.with_context(key, value)),
        }
    }
}
