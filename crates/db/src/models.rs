//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no domain behaviour.
//! Domain types live in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

/// A persisted workflow row.  The graph itself lives in the `nodes` and
/// `connections` tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// nodes
// ---------------------------------------------------------------------------

/// A persisted node row.
///
/// `id` is a client-generated string (the editor creates nodes offline) and
/// survives graph saves unchanged.  `position` and `data` are stored as
/// opaque JSON; the `engine` crate interprets them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodeRow {
    pub id: String,
    pub workflow_id: Uuid,
    pub name: String,
    pub node_type: String,
    pub position: serde_json::Value,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input shape for inserting a node during a graph save.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Client-supplied identifier, preserved verbatim.
    pub id: String,
    /// Display name; defaults to the type tag when absent.
    pub name: Option<String>,
    pub node_type: String,
    pub position: serde_json::Value,
    pub data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// connections
// ---------------------------------------------------------------------------

/// A persisted connection row (directed edge in storage form).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub from_node_id: String,
    pub to_node_id: String,
    pub from_output: String,
    pub to_input: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input shape for inserting a connection during a graph save.
///
/// Handle names default to `"main"` when the editor omits them.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub from_node_id: String,
    pub to_node_id: String,
    pub from_output: Option<String>,
    pub to_input: Option<String>,
}

// ---------------------------------------------------------------------------
// workflow_executions
// ---------------------------------------------------------------------------

/// Possible statuses for a workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A persisted workflow execution row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowExecutionRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// job_queue
// ---------------------------------------------------------------------------

/// Possible statuses for a queued job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    DeadLettered,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::DeadLettered => write!(f, "dead_lettered"),
        }
    }
}

/// A job row fetched from the queue table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub workflow_id: Uuid,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// step_checkpoints
// ---------------------------------------------------------------------------

/// A durable step result, keyed by `(execution_id, step_name)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepCheckpointRow {
    pub execution_id: Uuid,
    pub step_name: String,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
