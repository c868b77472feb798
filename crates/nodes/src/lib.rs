//! `nodes` crate — the executor contract and the built-in executors.
//!
//! Every node type the platform can run — built-in and future additions
//! alike — implements [`NodeExecutor`].  The engine crate dispatches
//! execution through this trait object.  The [`Step`] durability primitive
//! lives here too, so executors and the engine can share it without a
//! circular dependency.

pub mod error;
pub mod http_request;
pub mod manual_trigger;
pub mod mock;
pub mod step;
pub mod traits;

pub use error::NodeError;
pub use http_request::HttpRequestExecutor;
pub use manual_trigger::ManualTriggerExecutor;
pub use step::{InMemoryStep, Step, StepError, StepFuture};
pub use traits::{Context, NodeExecutor, NodeInvocation};
