//! Manual-trigger executor.
//!
//! A no-op that checkpoints the incoming context unchanged.  It exists to
//! put a durability boundary at the workflow entry: a process restart after
//! the trigger resumes from the checkpoint instead of re-observing the
//! trigger event.  The `INITIAL` placeholder node type shares this executor.

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{Context, NodeExecutor, NodeInvocation};
use crate::NodeError;

#[derive(Debug, Default)]
pub struct ManualTriggerExecutor;

#[async_trait]
impl NodeExecutor for ManualTriggerExecutor {
    async fn execute(&self, invocation: NodeInvocation<'_>) -> Result<Context, NodeError> {
        let NodeInvocation { context, step, .. } = invocation;

        let snapshot = Value::Object(context);
        let value = step
            .run("manual-trigger", Box::pin(async move { Ok(snapshot) }))
            .await
            .map_err(NodeError::from_step)?;

        match value {
            Value::Object(context) => Ok(context),
            other => Err(NodeError::Config(format!(
                "manual trigger checkpoint is not an object: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::InMemoryStep;
    use serde_json::json;

    fn context_of(value: Value) -> Context {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn returns_the_context_unchanged() {
        let step = InMemoryStep::new();
        let executor = ManualTriggerExecutor;
        let context = context_of(json!({"seed": 1, "nested": {"a": true}}));

        let out = executor
            .execute(NodeInvocation {
                data: &json!({}),
                node_id: "n1",
                context: context.clone(),
                step: &step,
            })
            .await
            .expect("manual trigger should never fail");

        assert_eq!(out, context);
    }

    #[tokio::test]
    async fn checkpoints_the_context() {
        let step = InMemoryStep::new();
        let executor = ManualTriggerExecutor;

        executor
            .execute(NodeInvocation {
                data: &json!({}),
                node_id: "n1",
                context: context_of(json!({"seed": 1})),
                step: &step,
            })
            .await
            .unwrap();

        assert_eq!(step.checkpoint("manual-trigger"), Some(json!({"seed": 1})));
    }
}
