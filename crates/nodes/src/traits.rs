//! The `NodeExecutor` trait — the contract every node type must fulfil.

use async_trait::async_trait;
use serde_json::Value;

use crate::step::Step;
use crate::NodeError;

/// The execution context threaded through a workflow run.
///
/// An unordered mapping from string keys to arbitrary JSON values; the sole
/// data channel between nodes.  Executors receive it by value and return a
/// fresh context — the input is never mutated in place.
pub type Context = serde_json::Map<String, Value>;

/// Everything an executor gets for one node invocation.
pub struct NodeInvocation<'a> {
    /// Node-type-specific configuration, exactly as stored.  Each executor
    /// owns validation and decoding of its own shape.
    pub data: &'a Value,
    /// Identifier of the node being executed.
    pub node_id: &'a str,
    /// Output context of the previous node (or the trigger's initial data).
    pub context: Context,
    /// Durability boundary for the executor's principal side effect.
    pub step: &'a dyn Step,
}

/// The core executor trait.
///
/// Implementations wrap their principal side effect in exactly one
/// `step.run` whose name is unique within the executor, and return a context
/// that is a superset of the input (overwriting a key set upstream is
/// permitted and intentional).
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(&self, invocation: NodeInvocation<'_>) -> Result<Context, NodeError>;
}
