use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use procflow_core::SpecId;

/// Whoever is driving the current engine call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Authentication and authorization as seen by the engine.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_actor(&self) -> Option<Actor>;

    async fn has_access(&self, process: &SpecId, actor: &Actor) -> bool;
}

/// A fixed actor with access to every process, or to a named subset.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    actor: Option<Actor>,
    allowed: Option<BTreeSet<String>>,
}

impl StaticIdentity {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor: Some(actor),
            allowed: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Restrict access to processes with these names.
    pub fn allow_only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> Option<Actor> {
        self.actor.clone()
    }

    async fn has_access(&self, process: &SpecId, _actor: &Actor) -> bool {
        match &self.allowed {
            None => true,
            Some(names) => names.contains(&process.name),
        }
    }
}
