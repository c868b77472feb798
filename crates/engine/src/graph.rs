//! Graph loading — the storage→execution boundary.
//!
//! `GraphSource` is the seam between the runner and persistence: production
//! code goes through [`PgGraphSource`], tests use [`InMemoryGraphSource`].
//! Shape invariants are enforced on load: node type tags must parse, and
//! every connection must reference nodes present in the workflow.  Both are
//! configuration failures — fail-fast, never retried.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use db::models::{ConnectionRow, NodeRow};
use db::repository::workflows::WorkflowGraphRecord;
use db::{DbError, DbPool};

use crate::models::{Connection, Node, NodeType, Position, WorkflowGraph};
use crate::EngineError;

/// Read access to a workflow's full graph, scoped to the owning user.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Fetch the graph.  Fails with [`EngineError::WorkflowNotFound`] when
    /// the workflow is absent or owned by a different user.
    async fn load(&self, workflow_id: Uuid, user_id: &str) -> Result<WorkflowGraph, EngineError>;
}

// ---------------------------------------------------------------------------
// Postgres-backed source
// ---------------------------------------------------------------------------

pub struct PgGraphSource {
    pool: DbPool,
}

impl PgGraphSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GraphSource for PgGraphSource {
    async fn load(&self, workflow_id: Uuid, user_id: &str) -> Result<WorkflowGraph, EngineError> {
        let record =
            db::repository::workflows::get_workflow_with_graph(&self.pool, workflow_id, user_id)
                .await
                .map_err(|err| match err {
                    DbError::NotFound => EngineError::WorkflowNotFound,
                    other => EngineError::Database(other),
                })?;

        graph_from_record(record)
    }
}

fn graph_from_record(record: WorkflowGraphRecord) -> Result<WorkflowGraph, EngineError> {
    let nodes = record
        .nodes
        .into_iter()
        .map(node_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let connections = record
        .connections
        .into_iter()
        .map(connection_from_row)
        .collect();

    let graph = WorkflowGraph {
        id: record.workflow.id,
        name: record.workflow.name,
        user_id: record.workflow.user_id,
        nodes,
        connections,
    };

    check_connection_endpoints(&graph)?;
    Ok(graph)
}

fn node_from_row(row: NodeRow) -> Result<Node, EngineError> {
    let node_type: NodeType = row.node_type.parse()?;
    let position: Position = serde_json::from_value(row.position).map_err(|err| {
        EngineError::Config(format!("node '{}' has a malformed position: {err}", row.id))
    })?;

    Ok(Node {
        id: row.id,
        name: row.name,
        node_type,
        position,
        data: row.data,
    })
}

fn connection_from_row(row: ConnectionRow) -> Connection {
    Connection {
        id: row.id,
        from_node_id: row.from_node_id,
        to_node_id: row.to_node_id,
        from_output: row.from_output,
        to_input: row.to_input,
    }
}

fn check_connection_endpoints(graph: &WorkflowGraph) -> Result<(), EngineError> {
    let node_ids: std::collections::HashSet<&str> =
        graph.nodes.iter().map(|node| node.id.as_str()).collect();

    for connection in &graph.connections {
        if !node_ids.contains(connection.from_node_id.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: connection.from_node_id.clone(),
                side: "source",
            });
        }
        if !node_ids.contains(connection.to_node_id.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: connection.to_node_id.clone(),
                side: "target",
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory source for tests
// ---------------------------------------------------------------------------

/// A `GraphSource` over a plain map, for unit-testing the runner without a
/// database.  `insert` replaces any graph stored under the same id.
#[derive(Debug, Default)]
pub struct InMemoryGraphSource {
    graphs: Mutex<HashMap<Uuid, WorkflowGraph>>,
}

impl InMemoryGraphSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, graph: WorkflowGraph) {
        self.graphs.lock().unwrap().insert(graph.id, graph);
    }
}

#[async_trait]
impl GraphSource for InMemoryGraphSource {
    async fn load(&self, workflow_id: Uuid, user_id: &str) -> Result<WorkflowGraph, EngineError> {
        let graphs = self.graphs.lock().unwrap();
        match graphs.get(&workflow_id) {
            Some(graph) if graph.user_id == user_id => Ok(graph.clone()),
            _ => Err(EngineError::WorkflowNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use db::models::WorkflowRow;
    use serde_json::json;

    fn record_with_node_type(node_type: &str) -> WorkflowGraphRecord {
        let workflow_id = Uuid::new_v4();
        let now = Utc::now();
        WorkflowGraphRecord {
            workflow: WorkflowRow {
                id: workflow_id,
                name: "wf".into(),
                user_id: "user-1".into(),
                created_at: now,
                updated_at: now,
            },
            nodes: vec![NodeRow {
                id: "n1".into(),
                workflow_id,
                name: "n1".into(),
                node_type: node_type.into(),
                position: json!({"x": 0.0, "y": 0.0}),
                data: json!({}),
                created_at: now,
                updated_at: now,
            }],
            connections: vec![],
        }
    }

    #[test]
    fn rows_map_into_a_graph() {
        let graph = graph_from_record(record_with_node_type("MANUAL_TRIGGER")).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].node_type, NodeType::ManualTrigger);
    }

    #[test]
    fn unknown_stored_node_type_fails_fast() {
        let err = graph_from_record(record_with_node_type("TIME_MACHINE")).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(!err.is_retriable());
    }

    #[test]
    fn dangling_connection_endpoint_fails_fast() {
        let mut record = record_with_node_type("MANUAL_TRIGGER");
        let now = Utc::now();
        record.connections.push(ConnectionRow {
            id: Uuid::new_v4(),
            workflow_id: record.workflow.id,
            from_node_id: "n1".into(),
            to_node_id: "ghost".into(),
            from_output: "main".into(),
            to_input: "main".into(),
            created_at: now,
            updated_at: now,
        });

        let err = graph_from_record(record).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownNodeReference { node_id, .. } if node_id == "ghost"
        ));
    }

    #[tokio::test]
    async fn in_memory_source_scopes_by_owner() {
        let source = InMemoryGraphSource::new();
        let workflow_id = Uuid::new_v4();
        source.insert(WorkflowGraph {
            id: workflow_id,
            name: "wf".into(),
            user_id: "owner".into(),
            nodes: vec![],
            connections: vec![],
        });

        assert!(source.load(workflow_id, "owner").await.is_ok());
        assert!(matches!(
            source.load(workflow_id, "intruder").await,
            Err(EngineError::WorkflowNotFound)
        ));
    }
}
