//! The workflow runner — the orchestrator behind every execution.
//!
//! Triggered by a [`TriggerEvent`], it loads the graph, computes a legal
//! execution order, and dispatches each node to its executor, threading the
//! context through the graph.  Load and sort happen inside one
//! `step.run("prepare-workflow", …)` so a resumed execution replays the plan
//! instead of re-reading the database.
//!
//! Execution is strictly sequential within a run; concurrent runs of the
//! same workflow share nothing but the database.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use nodes::{Context, NodeInvocation, Step};

use crate::event::{ExecutionOutcome, TriggerEvent};
use crate::graph::GraphSource;
use crate::models::{to_execution_edges, Node};
use crate::registry::ExecutorRegistry;
use crate::scheduler::topological_order;
use crate::status::{NodeStatus, StatusPublisher, TracingStatusPublisher};
use crate::EngineError;

/// The checkpointed result of the prepare step: the workflow's nodes in
/// execution order.
#[derive(Debug, Serialize, Deserialize)]
struct PreparedPlan {
    workflow_id: Uuid,
    nodes: Vec<Node>,
}

pub struct WorkflowRunner {
    graphs: Arc<dyn GraphSource>,
    registry: ExecutorRegistry,
    status: Arc<dyn StatusPublisher>,
}

impl WorkflowRunner {
    pub fn new(graphs: Arc<dyn GraphSource>, registry: ExecutorRegistry) -> Self {
        Self {
            graphs,
            registry,
            status: Arc::new(TracingStatusPublisher),
        }
    }

    /// Replace the status sink (default: structured log events).
    pub fn with_status_publisher(mut self, status: Arc<dyn StatusPublisher>) -> Self {
        self.status = status;
        self
    }

    /// Run one workflow execution to completion.
    ///
    /// # Errors
    /// Graph validation failures, cycles, unknown node types, and executor
    /// errors all abort the run; the transport decides whether to redeliver
    /// from [`EngineError::is_retriable`].
    #[instrument(skip_all, fields(workflow_id = ?event.workflow_id))]
    pub async fn run(
        &self,
        event: &TriggerEvent,
        step: &dyn Step,
    ) -> Result<ExecutionOutcome, EngineError> {
        let workflow_id = event.workflow_id.ok_or(EngineError::MissingWorkflowId)?;
        let user_id = event.user_id.clone();

        let graphs = self.graphs.clone();
        let plan_value = step
            .run(
                "prepare-workflow",
                Box::pin(async move {
                    let graph = graphs.load(workflow_id, &user_id).await?;
                    let edges = to_execution_edges(&graph.connections);
                    let ordered = topological_order(&graph.nodes, &edges)?;
                    let plan = PreparedPlan { workflow_id, nodes: ordered };
                    Ok(serde_json::to_value(&plan).map_err(|err| {
                        EngineError::Transient(format!("failed to serialize execution plan: {err}"))
                    })?)
                }),
            )
            .await
            .map_err(EngineError::from_step)?;

        let plan: PreparedPlan = serde_json::from_value(plan_value).map_err(|err| {
            EngineError::Config(format!("malformed execution plan checkpoint: {err}"))
        })?;

        info!(nodes = plan.nodes.len(), "executing workflow");

        let mut context: Context = event.initial_data.clone().unwrap_or_default();

        for node in &plan.nodes {
            let executor = self.registry.get(node.node_type)?;

            self.status
                .publish(workflow_id, &node.id, NodeStatus::Running)
                .await;

            let result = executor
                .execute(NodeInvocation {
                    data: &node.data,
                    node_id: &node.id,
                    context,
                    step,
                })
                .await;

            match result {
                Ok(next) => {
                    self.status
                        .publish(workflow_id, &node.id, NodeStatus::Succeeded)
                        .await;
                    context = next;
                }
                Err(source) => {
                    self.status
                        .publish(workflow_id, &node.id, NodeStatus::Failed)
                        .await;
                    error!(node_id = %node.id, error = %source, "node failed, aborting execution");
                    return Err(EngineError::Node {
                        node_id: node.id.clone(),
                        source,
                    });
                }
            }
        }

        info!("workflow execution succeeded");
        Ok(ExecutionOutcome { workflow_id, context })
    }
}
