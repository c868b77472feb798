//! Database-backed durable step.
//!
//! One `DurableStep` exists per execution; it keys checkpoints by
//! `(execution_id, step name)`.  A redelivered job builds a new `DurableStep`
//! for the same execution id and transparently replays everything that
//! already completed.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use db::{DbError, DbPool};
use nodes::{Step, StepError, StepFuture};
use serde_json::Value;

use crate::EngineError;

pub struct DurableStep {
    pool: DbPool,
    execution_id: Uuid,
}

impl DurableStep {
    pub fn new(pool: DbPool, execution_id: Uuid) -> Self {
        Self { pool, execution_id }
    }
}

fn infra_error(err: DbError) -> StepError {
    EngineError::Database(err).into()
}

#[async_trait]
impl Step for DurableStep {
    async fn run<'a>(&'a self, name: &'a str, thunk: StepFuture<'a>) -> Result<Value, StepError> {
        let cached = db::repository::steps::get_checkpoint(&self.pool, self.execution_id, name)
            .await
            .map_err(infra_error)?;

        if let Some(value) = cached {
            debug!(execution_id = %self.execution_id, step = name, "replaying checkpointed step");
            return Ok(value);
        }

        let value = thunk.await?;

        db::repository::steps::save_checkpoint(&self.pool, self.execution_id, name, &value)
            .await
            .map_err(infra_error)?;

        Ok(value)
    }
}
