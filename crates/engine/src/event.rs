//! The trigger event — the message that starts a workflow execution.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nodes::Context;

/// Event name under which executions are published to the transport.
pub const EXECUTE_WORKFLOW: &str = "workflow/execute.workflow";

/// Payload of an execution trigger.
///
/// Delivery is at-least-once; the runner's `step` checkpoints make replays
/// safe.  The user id is stamped by the API layer when the event is
/// published so the graph load stays owner-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    #[serde(default)]
    pub workflow_id: Option<Uuid>,
    pub user_id: String,
    #[serde(default)]
    pub initial_data: Option<Context>,
}

/// What a completed execution hands back to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub workflow_id: Uuid,
    pub context: Context,
}

/// The envelope published onto the queue: an event name plus its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub name: String,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    /// Wrap a trigger event under the [`EXECUTE_WORKFLOW`] name.
    pub fn execute_workflow(event: &TriggerEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: EXECUTE_WORKFLOW.to_string(),
            data: serde_json::to_value(event)?,
        })
    }
}
