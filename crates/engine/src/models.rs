//! Core domain models for the workflow engine.
//!
//! These types are the in-memory source of truth for what a workflow graph
//! looks like.  The storage form (`Connection`) and the execution form
//! (`Edge`) of a directed link differ only in field names; the engine works
//! on edges, the database stores connections.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::EngineError;

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// The closed set of node types the platform can execute.
///
/// Extending the platform means adding a variant here and registering an
/// executor for it; registration is static, at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Workflow entry point invoked by a user action; outputs only.
    ManualTrigger,
    /// Placeholder entry seeded when a workflow is created; executes
    /// exactly like `ManualTrigger`.
    Initial,
    /// One outbound HTTP call; inputs and outputs.
    HttpRequest,
}

impl NodeType {
    /// The wire/storage tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManualTrigger => "MANUAL_TRIGGER",
            Self::Initial => "INITIAL",
            Self::HttpRequest => "HTTP_REQUEST",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL_TRIGGER" => Ok(Self::ManualTrigger),
            "INITIAL" => Ok(Self::Initial),
            "HTTP_REQUEST" => Ok(Self::HttpRequest),
            other => Err(EngineError::Config(format!("unknown node type '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Canvas coordinates.  Opaque to the engine; stored and round-tripped for
/// the editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A vertex in the workflow graph.
///
/// `id` is client-generated (the editor creates nodes offline) and stable
/// across saves.  `data` is node-type-specific configuration; its shape is
/// the executor's responsibility and validated at execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub node_type: NodeType,
    pub position: Position,
    pub data: Value,
}

// ---------------------------------------------------------------------------
// Connection / Edge
// ---------------------------------------------------------------------------

/// A directed link in storage form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub from_node_id: String,
    pub to_node_id: String,
    pub from_output: String,
    pub to_input: String,
}

/// A directed link in execution form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
}

/// Rename connections into edges.  Identity-preserving:
/// `from_node_id→source`, `to_node_id→target`, `from_output→source_handle`,
/// `to_input→target_handle`.
pub fn to_execution_edges(connections: &[Connection]) -> Vec<Edge> {
    connections
        .iter()
        .map(|connection| Edge {
            source: connection.from_node_id.clone(),
            target: connection.to_node_id.clone(),
            source_handle: connection.from_output.clone(),
            target_handle: connection.to_input.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// WorkflowGraph
// ---------------------------------------------------------------------------

/// The immutable execution view of a stored workflow: everything the
/// scheduler and runner need, loaded once at the top of an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub id: Uuid,
    pub name: String,
    pub user_id: String,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}
