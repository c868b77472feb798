//! `engine` crate — domain models, graph scheduling, and the workflow runner.

pub mod error;
pub mod event;
pub mod graph;
pub mod models;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod step_store;
pub mod worker;

pub use error::EngineError;
pub use event::{EventEnvelope, ExecutionOutcome, TriggerEvent, EXECUTE_WORKFLOW};
pub use graph::{GraphSource, InMemoryGraphSource, PgGraphSource};
pub use models::{to_execution_edges, Connection, Edge, Node, NodeType, Position, WorkflowGraph};
pub use registry::ExecutorRegistry;
pub use runner::WorkflowRunner;
pub use scheduler::topological_order;
pub use status::{NodeStatus, NoopStatusPublisher, StatusPublisher, TracingStatusPublisher};
pub use step_store::DurableStep;
