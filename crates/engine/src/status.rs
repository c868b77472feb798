//! Per-node status emission.
//!
//! The runner publishes a transition at every executor boundary: `Running`
//! on entry, `Succeeded` or `Failed` on exit.  The real-time channel to the
//! editor is an external collaborator; the engine only defines the emission
//! points and ships a no-op sink and a structured-log sink.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, workflow_id: Uuid, node_id: &str, status: NodeStatus);
}

/// Swallows every transition.
pub struct NoopStatusPublisher;

#[async_trait]
impl StatusPublisher for NoopStatusPublisher {
    async fn publish(&self, _workflow_id: Uuid, _node_id: &str, _status: NodeStatus) {}
}

/// Routes transitions into the process log.
pub struct TracingStatusPublisher;

#[async_trait]
impl StatusPublisher for TracingStatusPublisher {
    async fn publish(&self, workflow_id: Uuid, node_id: &str, status: NodeStatus) {
        info!(%workflow_id, node_id, %status, "node status");
    }
}
