//! Workflow CRUD and graph saves.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use db::models::{ConnectionRow, NewConnection, NewNode, NodeRow, WorkflowRow};
use db::repository::workflows as wf_repo;
use engine::{NodeType, Position};

use super::{caller_id, db_error_status};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateWorkflowDto {
    pub name: String,
}

/// Graph save payload, exactly as the editor submits it.
#[derive(Deserialize)]
pub struct SaveGraphDto {
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub edges: Vec<EdgeDto>,
}

#[derive(Deserialize)]
pub struct NodeDto {
    pub id: String,
    /// Must be a known node type tag; anything else is a validation error.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub position: Position,
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default)]
    pub name: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDto {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// A workflow together with its graph, as returned to the editor.
#[derive(Serialize)]
pub struct WorkflowDetailDto {
    #[serde(flatten)]
    pub workflow: WorkflowRow,
    pub nodes: Vec<NodeRow>,
    pub connections: Vec<ConnectionRow>,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<WorkflowRow>>, StatusCode> {
    let user_id = caller_id(&headers)?;

    match wf_repo::list_workflows(&state.pool, &user_id).await {
        Ok(workflows) => Ok(Json(workflows)),
        Err(err) => Err(db_error_status(&err)),
    }
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateWorkflowDto>,
) -> Result<(StatusCode, Json<WorkflowRow>), StatusCode> {
    let user_id = caller_id(&headers)?;

    // Every new workflow starts with a single placeholder entry node at the
    // canvas origin; the editor replaces it on the first real save.
    let seed = NewNode {
        id: Uuid::new_v4().to_string(),
        name: None,
        node_type: NodeType::Initial.to_string(),
        position: json!({"x": 0.0, "y": 0.0}),
        data: json!({}),
    };

    match wf_repo::create_workflow(&state.pool, &payload.name, &user_id, seed).await {
        Ok(workflow) => Ok((StatusCode::CREATED, Json(workflow))),
        Err(err) => Err(db_error_status(&err)),
    }
}

pub async fn get(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WorkflowDetailDto>, StatusCode> {
    let user_id = caller_id(&headers)?;

    match wf_repo::get_workflow_with_graph(&state.pool, id, &user_id).await {
        Ok(record) => Ok(Json(WorkflowDetailDto {
            workflow: record.workflow,
            nodes: record.nodes,
            connections: record.connections,
        })),
        Err(err) => Err(db_error_status(&err)),
    }
}

pub async fn save_graph(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SaveGraphDto>,
) -> Result<Json<WorkflowRow>, StatusCode> {
    let user_id = caller_id(&headers)?;

    let nodes: Vec<NewNode> = payload
        .nodes
        .into_iter()
        .map(|node| NewNode {
            id: node.id,
            name: node.name,
            node_type: node.node_type.to_string(),
            position: json!({"x": node.position.x, "y": node.position.y}),
            data: node.data,
        })
        .collect();

    let connections: Vec<NewConnection> = payload
        .edges
        .into_iter()
        .map(|edge| NewConnection {
            from_node_id: edge.source,
            to_node_id: edge.target,
            from_output: edge.source_handle,
            to_input: edge.target_handle,
        })
        .collect();

    match wf_repo::replace_graph(&state.pool, id, &user_id, nodes, connections).await {
        Ok(workflow) => Ok(Json(workflow)),
        Err(err) => Err(db_error_status(&err)),
    }
}

pub async fn delete(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let user_id = caller_id(&headers)?;

    match wf_repo::delete_workflow(&state.pool, id, &user_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(db_error_status(&err)),
    }
}
