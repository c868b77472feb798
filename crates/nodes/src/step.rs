//! The durable step primitive.
//!
//! `step.run(name, thunk)` executes `thunk` at most once per
//! `(execution, name)` pair: successful results are checkpointed by the
//! transport and replayed on resume without re-running the thunk.  Errors
//! pass through un-cached so a redelivered job re-attempts the step.
//!
//! The trait is deliberately minimal — one method — so the engine can be
//! unit-tested with [`InMemoryStep`] and run in production against the
//! database-backed implementation in the engine crate.  Code outside a step
//! may run more than once on resume; code inside runs at most once, provided
//! the thunk is idempotent for external effects.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

/// Errors crossing the step boundary keep their concrete type and are
/// recovered by downcast on the calling side.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A boxed thunk producing the step's checkpointable result.
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, StepError>> + Send + 'a>>;

/// The durability boundary supplied to every executor.
#[async_trait]
pub trait Step: Send + Sync {
    /// Run `thunk` under `name`, or return the checkpointed result of an
    /// earlier run.  `name` must be unique within the calling executor.
    async fn run<'a>(&'a self, name: &'a str, thunk: StepFuture<'a>) -> Result<Value, StepError>;
}

/// In-process [`Step`] implementation without any durability.
///
/// Executes each named thunk exactly once per instance and caches the value,
/// which is all the runner needs in unit tests and single-process runs.
#[derive(Debug, Default)]
pub struct InMemoryStep {
    cache: Mutex<HashMap<String, Value>>,
}

impl InMemoryStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// The checkpointed value for `name`, if that step has completed.
    pub fn checkpoint(&self, name: &str) -> Option<Value> {
        self.cache.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl Step for InMemoryStep {
    async fn run<'a>(&'a self, name: &'a str, thunk: StepFuture<'a>) -> Result<Value, StepError> {
        let cached = self.cache.lock().unwrap().get(name).cloned();
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = thunk.await?;
        self.cache
            .lock()
            .unwrap()
            .insert(name.to_string(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn thunk_runs_once_and_result_is_cached() {
        let step = InMemoryStep::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            let value = step
                .run(
                    "only-once",
                    Box::pin(async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok(json!({"n": 7}))
                    }),
                )
                .await
                .expect("step should succeed");
            assert_eq!(value, json!({"n": 7}));
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(step.checkpoint("only-once"), Some(json!({"n": 7})));
    }

    #[tokio::test]
    async fn distinct_names_run_independently() {
        let step = InMemoryStep::new();

        let a = step
            .run("a", Box::pin(async { Ok(json!(1)) }))
            .await
            .unwrap();
        let b = step
            .run("b", Box::pin(async { Ok(json!(2)) }))
            .await
            .unwrap();

        assert_eq!(a, json!(1));
        assert_eq!(b, json!(2));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let step = InMemoryStep::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let runs_first = runs.clone();
        let first = step
            .run(
                "flaky",
                Box::pin(async move {
                    runs_first.fetch_add(1, Ordering::SeqCst);
                    Err(NodeError::Transient("boom".into()).into())
                }),
            )
            .await;
        assert!(first.is_err());
        assert_eq!(step.checkpoint("flaky"), None);

        let runs_second = runs.clone();
        let second = step
            .run(
                "flaky",
                Box::pin(async move {
                    runs_second.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("recovered"))
                }),
            )
            .await
            .expect("second attempt should run the thunk again");

        assert_eq!(second, json!("recovered"));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn typed_errors_survive_the_boundary() {
        let step = InMemoryStep::new();
        let err = step
            .run(
                "typed",
                Box::pin(async { Err(NodeError::Config("bad config".into()).into()) }),
            )
            .await
            .unwrap_err();

        let recovered = NodeError::from_step(err);
        assert!(matches!(recovered, NodeError::Config(msg) if msg == "bad config"));
    }
}
