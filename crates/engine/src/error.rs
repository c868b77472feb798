//! Engine-level error types.
//!
//! The transport decides retry behaviour from [`EngineError::is_retriable`]:
//! configuration problems, cycles, and ownership failures are reported once
//! and never retried; node transients and infrastructure errors are
//! redelivered with back-off.

use thiserror::Error;

use nodes::{NodeError, StepError};

#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Trigger validation ------

    /// The trigger event carried no workflow id.
    #[error("trigger event is missing a workflow id")]
    MissingWorkflowId,

    /// The workflow is absent, or not owned by the caller.
    #[error("workflow not found")]
    WorkflowNotFound,

    /// The caller does not own the workflow.
    #[error("not authorized to access this workflow")]
    NotAuthorized,

    // ------ Graph validation ------

    /// Two or more nodes share the same id.
    #[error("duplicate node id '{0}' in workflow graph")]
    DuplicateNodeId(String),

    /// A connection references a node id that doesn't exist in the workflow.
    #[error("connection references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    /// Topological sort detected a cycle; nothing was executed.
    #[error("workflow graph contains a cycle")]
    Cycle,

    /// Missing or invalid configuration (unknown node type, unregistered
    /// executor, malformed stored data).
    #[error("configuration error: {0}")]
    Config(String),

    // ------ Execution ------

    /// A node's executor failed; the whole execution is aborted.
    #[error("node '{node_id}' failed: {source}")]
    Node {
        node_id: String,
        #[source]
        source: NodeError,
    },

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),

    /// Engine-side transient failure; safe to redeliver.
    #[error("transient engine failure: {0}")]
    Transient(String),
}

impl EngineError {
    /// Whether the transport may redeliver the execution after this error.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Node { source, .. } => source.is_retriable(),
            Self::Transient(_) => true,
            Self::Database(db::DbError::NotFound) => false,
            Self::Database(db::DbError::NotAuthorized) => false,
            Self::Database(_) => true,
            _ => false,
        }
    }

    /// Recover a typed `EngineError` from the boxed error a step passes
    /// through.  Anything else came from the step infrastructure and is
    /// treated as transient.
    pub fn from_step(err: StepError) -> Self {
        match err.downcast::<EngineError>() {
            Ok(err) => *err,
            Err(other) => EngineError::Transient(other.to_string()),
        }
    }
}
