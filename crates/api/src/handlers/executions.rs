//! Execution trigger.
//!
//! Publishing is optimistic: once ownership is verified and the trigger
//! event is queued, the handler returns the workflow record for UI
//! confirmation.  It never awaits the execution itself; per-node status
//! reaches the editor through the real-time channel.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use db::models::WorkflowRow;
use db::repository::{executions as exec_repo, jobs as job_repo, workflows as wf_repo};
use engine::{EventEnvelope, TriggerEvent};

use super::{caller_id, db_error_status};
use crate::AppState;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWorkflowDto {
    #[serde(default)]
    pub initial_data: Option<serde_json::Map<String, Value>>,
}

pub async fn execute(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ExecuteWorkflowDto>,
) -> Result<(StatusCode, Json<WorkflowRow>), StatusCode> {
    let user_id = caller_id(&headers)?;

    // Ownership gate: only the workflow's owner may trigger it.
    let workflow = wf_repo::get_workflow(&state.pool, id, &user_id)
        .await
        .map_err(|err| db_error_status(&err))?;

    let execution = exec_repo::create_execution(&state.pool, id)
        .await
        .map_err(|err| db_error_status(&err))?;

    let event = TriggerEvent {
        workflow_id: Some(id),
        user_id,
        initial_data: payload.initial_data,
    };
    let envelope = EventEnvelope::execute_workflow(&event)
        .and_then(|envelope| serde_json::to_value(&envelope))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    job_repo::enqueue_job(&state.pool, execution.id, id, envelope)
        .await
        .map_err(|err| db_error_status(&err))?;

    Ok((StatusCode::ACCEPTED, Json(workflow)))
}
