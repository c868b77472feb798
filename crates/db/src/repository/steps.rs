//! Durable step checkpoints.
//!
//! One row per `(execution_id, step_name)`.  A replayed execution reads the
//! stored result instead of re-running the step, which is what makes
//! at-least-once job delivery safe for executors.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Read a checkpointed step result, if one exists.
pub async fn get_checkpoint(
    pool: &PgPool,
    execution_id: Uuid,
    step_name: &str,
) -> Result<Option<serde_json::Value>, DbError> {
    let result = sqlx::query_scalar::<_, serde_json::Value>(
        r#"
        SELECT result FROM step_checkpoints
        WHERE execution_id = $1 AND step_name = $2
        "#,
    )
    .bind(execution_id)
    .bind(step_name)
    .fetch_optional(pool)
    .await?;

    Ok(result)
}

/// Store a step result.  Idempotent: if a concurrent delivery already wrote
/// the checkpoint, the first value wins.
pub async fn save_checkpoint(
    pool: &PgPool,
    execution_id: Uuid,
    step_name: &str,
    result: &serde_json::Value,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO step_checkpoints (execution_id, step_name, result, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (execution_id, step_name) DO NOTHING
        "#,
    )
    .bind(execution_id)
    .bind(step_name)
    .bind(result)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
