//! Workflow execution bookkeeping.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{ExecutionStatus, WorkflowExecutionRow},
    DbError,
};

/// Create a new workflow execution record in `pending` status.
pub async fn create_execution(
    pool: &PgPool,
    workflow_id: Uuid,
) -> Result<WorkflowExecutionRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowExecutionRow>(
        r#"
        INSERT INTO workflow_executions (id, workflow_id, status, started_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, workflow_id, status, started_at, finished_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(workflow_id)
    .bind(ExecutionStatus::Pending.to_string())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Update the status of a workflow execution, stamping `finished_at` when
/// the execution has reached a terminal state.
pub async fn update_execution_status(
    pool: &PgPool,
    execution_id: Uuid,
    status: ExecutionStatus,
) -> Result<(), DbError> {
    let finished = matches!(status, ExecutionStatus::Succeeded | ExecutionStatus::Failed);

    if finished {
        sqlx::query(
            "UPDATE workflow_executions SET status = $1, finished_at = $2 WHERE id = $3",
        )
        .bind(status.to_string())
        .bind(Utc::now())
        .bind(execution_id)
        .execute(pool)
        .await?;
    } else {
        sqlx::query("UPDATE workflow_executions SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(execution_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}
