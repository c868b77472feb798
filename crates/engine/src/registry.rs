//! The executor registry — node type → executor instance.
//!
//! Registration is static, at process start.  Looking up a type with no
//! registered executor is a configuration failure surfaced before the node
//! runs.

use std::collections::HashMap;
use std::sync::Arc;

use nodes::{HttpRequestExecutor, ManualTriggerExecutor, NodeExecutor};

use crate::models::NodeType;
use crate::EngineError;

#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<NodeType, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    /// An empty registry.  Useful in tests; production code starts from
    /// [`ExecutorRegistry::builtin`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in executor set.  `INITIAL` is an alias for the
    /// manual-trigger executor: a freshly created workflow executes exactly
    /// like one with an explicit manual trigger.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let manual: Arc<dyn NodeExecutor> = Arc::new(ManualTriggerExecutor);
        registry.register(NodeType::ManualTrigger, manual.clone());
        registry.register(NodeType::Initial, manual);
        registry.register(NodeType::HttpRequest, Arc::new(HttpRequestExecutor::new()));
        registry
    }

    pub fn register(&mut self, node_type: NodeType, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(node_type, executor);
    }

    /// Look up the executor for `node_type`.
    pub fn get(&self, node_type: NodeType) -> Result<&Arc<dyn NodeExecutor>, EngineError> {
        self.executors
            .get(&node_type)
            .ok_or_else(|| EngineError::Config(format!("No executor for type {node_type}")))
    }
}
