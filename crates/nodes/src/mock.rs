//! `MockExecutor` — a test double for `NodeExecutor`.
//!
//! Records every invocation it receives (node id and incoming context) and
//! returns a programmer-specified result.  Used by the engine's runner tests
//! to assert execution order and failure propagation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{Context, NodeExecutor, NodeInvocation};
use crate::NodeError;

/// Behaviour injected into `MockExecutor` at construction time.
pub enum MockBehaviour {
    /// Merge the given JSON object into the incoming context and return it.
    MergeValue(Value),
    /// Fail with a `Config` error.
    FailConfig(String),
    /// Fail with a `Transient` error.
    FailTransient(String),
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub node_id: String,
    pub context: Context,
}

pub struct MockExecutor {
    pub behaviour: MockBehaviour,
    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockExecutor {
    /// A mock that returns its input context unchanged.
    pub fn passthrough() -> Self {
        Self::merging(Value::Object(Context::new()))
    }

    /// A mock that merges `value`'s entries into the context.
    pub fn merging(value: Value) -> Self {
        Self {
            behaviour: MockBehaviour::MergeValue(value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock that always fails with a `Config` error.
    pub fn failing_config(msg: impl Into<String>) -> Self {
        Self {
            behaviour: MockBehaviour::FailConfig(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock that always fails with a `Transient` error.
    pub fn failing_transient(msg: impl Into<String>) -> Self {
        Self {
            behaviour: MockBehaviour::FailTransient(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times this executor ran.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Node ids this executor ran for, in call order.
    pub fn executed_nodes(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.node_id.clone())
            .collect()
    }
}

#[async_trait]
impl NodeExecutor for MockExecutor {
    async fn execute(&self, invocation: NodeInvocation<'_>) -> Result<Context, NodeError> {
        self.calls.lock().unwrap().push(MockCall {
            node_id: invocation.node_id.to_string(),
            context: invocation.context.clone(),
        });

        match &self.behaviour {
            MockBehaviour::MergeValue(value) => {
                let mut out = invocation.context;
                if let Value::Object(map) = value {
                    for (key, val) in map {
                        out.insert(key.clone(), val.clone());
                    }
                }
                Ok(out)
            }
            MockBehaviour::FailConfig(msg) => Err(NodeError::Config(msg.clone())),
            MockBehaviour::FailTransient(msg) => Err(NodeError::Transient(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::InMemoryStep;
    use serde_json::json;

    #[tokio::test]
    async fn merging_mock_preserves_input_keys() {
        let step = InMemoryStep::new();
        let mock = MockExecutor::merging(json!({"added": true}));

        let mut context = Context::new();
        context.insert("kept".into(), json!(1));

        let out = mock
            .execute(NodeInvocation {
                data: &json!({}),
                node_id: "m1",
                context,
                step: &step,
            })
            .await
            .unwrap();

        assert_eq!(out["kept"], json!(1));
        assert_eq!(out["added"], json!(true));
        assert_eq!(mock.executed_nodes(), vec!["m1"]);
    }
}
