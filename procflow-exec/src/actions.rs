use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use procflow_core::types::Record;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub succeeded: bool,
    /// Merged into process data when the action succeeds.
    pub output: Record,
}

impl ActionOutcome {
    pub fn success(output: Record) -> Self {
        Self {
            succeeded: true,
            output,
        }
    }

    pub fn failure() -> Self {
        Self::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("no handler registered under '{0}'")]
    UnknownHandler(String),
    #[error("handler '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// Work done by a system step. Implementations receive a snapshot of the
/// process data and must not assume they run exactly once.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(&self, data: &Record) -> Result<ActionOutcome, ActionError>;
}

#[derive(Default)]
pub struct ActionRegistry {
    handlers: DashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).map(|h| h.value().clone())
    }

    pub async fn run(&self, name: &str, data: &Record) -> Result<ActionOutcome, ActionError> {
        let handler = self
            .get(name)
            .ok_or_else(|| ActionError::UnknownHandler(name.to_string()))?;
        handler.run(data).await
    }
}

/// Adapts an async-free closure into a handler.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> ActionHandler for FnHandler<F>
where
    F: Fn(&Record) -> Result<ActionOutcome, ActionError> + Send + Sync,
{
    async fn run(&self, data: &Record) -> Result<ActionOutcome, ActionError> {
        (self.0)(data)
    }
}
