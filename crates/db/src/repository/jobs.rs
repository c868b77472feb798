//! Job queue repository functions.
//!
//! The trigger-event transport is backed by the `job_queue` Postgres table.
//! Workers poll the table and use `SELECT … FOR UPDATE SKIP LOCKED` for safe
//! concurrent processing.  Delivery is at-least-once: a failed retriable job
//! goes back to `pending` until its attempts are exhausted.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::JobRow, DbError};

/// Enqueue a new job for the given execution.
///
/// `payload` is the serialized trigger event the worker hands back to the
/// engine.
pub async fn enqueue_job(
    pool: &PgPool,
    execution_id: Uuid,
    workflow_id: Uuid,
    payload: serde_json::Value,
) -> Result<JobRow, DbError> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO job_queue
            (id, execution_id, workflow_id, status, attempts, max_attempts,
             payload, created_at, updated_at)
        VALUES ($1, $2, $3, 'pending', 0, 3, $4, $5, $5)
        RETURNING id, execution_id, workflow_id, status, attempts, max_attempts,
                  payload, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(execution_id)
    .bind(workflow_id)
    .bind(payload)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Atomically fetch the oldest pending job and mark it as `processing`.
///
/// Returns `None` if no pending jobs exist.
pub async fn fetch_next_job(pool: &PgPool) -> Result<Option<JobRow>, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, execution_id, workflow_id, status, attempts, max_attempts,
               payload, created_at, updated_at
        FROM job_queue
        WHERE status = 'pending'
        ORDER BY created_at ASC
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(ref job) = row {
        sqlx::query(
            r#"
            UPDATE job_queue
            SET status = 'processing', attempts = attempts + 1, updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(job.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
    } else {
        tx.rollback().await?;
    }

    Ok(row)
}

/// Mark a job as completed.
pub async fn complete_job(pool: &PgPool, job_id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE job_queue SET status = 'completed', updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record a retriable failure: the job goes back to `pending` for another
/// delivery, or to `dead_lettered` once its attempts are exhausted.
pub async fn fail_job(pool: &PgPool, job_id: Uuid) -> Result<JobRow, DbError> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE job_queue
        SET status = CASE WHEN attempts >= max_attempts
                          THEN 'dead_lettered' ELSE 'pending' END,
            updated_at = $1
        WHERE id = $2
        RETURNING id, execution_id, workflow_id, status, attempts, max_attempts,
                  payload, created_at, updated_at
        "#,
    )
    .bind(Utc::now())
    .bind(job_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Dead-letter a job immediately.  Used for non-retriable failures, which
/// must not be redelivered.
pub async fn dead_letter_job(pool: &PgPool, job_id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE job_queue SET status = 'dead_lettered', updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}
