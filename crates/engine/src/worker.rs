//! Queue worker — drains trigger events and runs them through the runner.
//!
//! Delivery is at-least-once: a retriable failure sends the job back to
//! `pending` until its attempts are exhausted, and step checkpoints make the
//! redelivered run cheap.  Non-retriable failures are dead-lettered
//! immediately; they would fail identically on every attempt.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use db::models::{ExecutionStatus, JobRow, JobStatus};
use db::repository::{executions, jobs};
use db::DbPool;

use crate::event::{EventEnvelope, TriggerEvent, EXECUTE_WORKFLOW};
use crate::runner::WorkflowRunner;
use crate::step_store::DurableStep;

/// Tuning knobs for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to sleep when the queue is empty.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Poll the job queue forever, processing one job at a time.
///
/// Run several workers for parallelism across executions; the queue's
/// `FOR UPDATE SKIP LOCKED` fetch keeps them from stepping on each other.
pub async fn run_worker(pool: DbPool, runner: Arc<WorkflowRunner>, config: WorkerConfig) {
    info!(poll_interval_ms = config.poll_interval.as_millis() as u64, "worker started");

    loop {
        match jobs::fetch_next_job(&pool).await {
            Ok(Some(job)) => process_job(&pool, &runner, job).await,
            Ok(None) => tokio::time::sleep(config.poll_interval).await,
            Err(err) => {
                error!(error = %err, "failed to poll job queue");
                tokio::time::sleep(config.poll_interval).await;
            }
        }
    }
}

async fn process_job(pool: &DbPool, runner: &WorkflowRunner, job: JobRow) {
    let event = match decode_trigger(&job.payload) {
        Ok(event) => event,
        Err(reason) => {
            error!(job_id = %job.id, %reason, "undeliverable job, dead-lettering");
            let _ = jobs::dead_letter_job(pool, job.id).await;
            let _ =
                executions::update_execution_status(pool, job.execution_id, ExecutionStatus::Failed)
                    .await;
            return;
        }
    };

    if let Err(err) =
        executions::update_execution_status(pool, job.execution_id, ExecutionStatus::Running).await
    {
        warn!(execution_id = %job.execution_id, error = %err, "failed to mark execution running");
    }

    let step = DurableStep::new(pool.clone(), job.execution_id);

    match runner.run(&event, &step).await {
        Ok(outcome) => {
            info!(workflow_id = %outcome.workflow_id, execution_id = %job.execution_id, "execution succeeded");
            let _ = executions::update_execution_status(
                pool,
                job.execution_id,
                ExecutionStatus::Succeeded,
            )
            .await;
            let _ = jobs::complete_job(pool, job.id).await;
        }

        Err(err) if err.is_retriable() => {
            warn!(
                job_id = %job.id,
                attempt = job.attempts,
                error = %err,
                "retriable failure, returning job to the queue"
            );
            match jobs::fail_job(pool, job.id).await {
                Ok(updated) if updated.status == JobStatus::DeadLettered.to_string() => {
                    error!(job_id = %job.id, "attempts exhausted, dead-lettered");
                    let _ = executions::update_execution_status(
                        pool,
                        job.execution_id,
                        ExecutionStatus::Failed,
                    )
                    .await;
                }
                Ok(_) => {}
                Err(db_err) => error!(job_id = %job.id, error = %db_err, "failed to requeue job"),
            }
        }

        Err(err) => {
            error!(job_id = %job.id, error = %err, "non-retriable failure, dead-lettering");
            let _ = jobs::dead_letter_job(pool, job.id).await;
            let _ =
                executions::update_execution_status(pool, job.execution_id, ExecutionStatus::Failed)
                    .await;
        }
    }
}

fn decode_trigger(payload: &serde_json::Value) -> Result<TriggerEvent, String> {
    let envelope: EventEnvelope = serde_json::from_value(payload.clone())
        .map_err(|err| format!("undecodable event envelope: {err}"))?;

    if envelope.name != EXECUTE_WORKFLOW {
        return Err(format!("unknown event name '{}'", envelope.name));
    }

    serde_json::from_value(envelope.data)
        .map_err(|err| format!("undecodable trigger payload: {err}"))
}
