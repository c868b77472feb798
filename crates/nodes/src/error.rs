//! Node-level error type.

use thiserror::Error;

use crate::step::StepError;

/// Errors returned by an executor's `execute` method.
///
/// The transport uses the variant to decide retry behaviour:
/// - `Transient` — the job is redelivered with back-off.
/// - `Config`    — the execution fails immediately; no retry.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    /// Missing or invalid node configuration; retrying cannot help.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transient failure (network, timeout, upstream 5xx); safe to retry.
    #[error("transient error: {0}")]
    Transient(String),
}

impl NodeError {
    /// Whether the transport may redeliver the execution after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Recover a typed `NodeError` from the boxed error a [`crate::Step`]
    /// passes through.  Anything that is not a `NodeError` came from the
    /// step infrastructure itself and is treated as transient.
    pub fn from_step(err: StepError) -> Self {
        match err.downcast::<NodeError>() {
            Ok(err) => *err,
            Err(other) => NodeError::Transient(other.to_string()),
        }
    }
}
