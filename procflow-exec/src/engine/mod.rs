//! The process state machine.
//!
//! Every public operation follows the same shape: resolve the instance key,
//! take the per-process lock, re-read the instances, run all checks, mutate
//! working copies inside a [`Transition`], then commit the transition as one
//! write batch. Caches are only refreshed after a successful commit, so a
//! failed check or a failed commit leaves no trace.

mod admin;
mod create;
mod input;
mod next_steps;
mod system;
mod transition;
mod validation;

use std::sync::Arc;

use tracing::debug;

use procflow_core::types::{ProcessInstance, StepInstance};
use procflow_core::{Failure, FailureKind, SpecId, SpecRegistry};
use procflow_store::{DocumentStore, StoreError, WriteBatch};

use crate::actions::ActionRegistry;
use crate::actor::{Actor, IdentityProvider};
use crate::cache::{CacheError, InstanceCache};
use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventSink, NoOpEventSink};
use crate::locks::KeyedLocks;

pub use admin::ProcessView;
use transition::Transition;

/// Failures that abort an engine call.
#[derive(Debug)]
pub(crate) struct Rejection(Vec<Failure>);

impl Rejection {
    pub(crate) fn into_failures(self) -> Vec<Failure> {
        self.0
    }
}

impl From<Failure> for Rejection {
    fn from(f: Failure) -> Self {
        Rejection(vec![f])
    }
}

impl From<Vec<Failure>> for Rejection {
    fn from(f: Vec<Failure>) -> Self {
        Rejection(f)
    }
}

impl From<CacheError> for Rejection {
    fn from(e: CacheError) -> Self {
        Rejection(vec![e.into()])
    }
}

impl From<StoreError> for Rejection {
    fn from(e: StoreError) -> Self {
        Rejection(vec![Failure::store(e.to_string())])
    }
}

/// Turn a non-empty list of failures into an error.
fn reject_any(failures: Vec<Failure>) -> Result<(), Rejection> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Rejection(failures))
    }
}

#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    specs: Arc<SpecRegistry>,
    processes: Arc<InstanceCache<ProcessInstance>>,
    steps: Arc<InstanceCache<StepInstance>>,
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    actions: Arc<ActionRegistry>,
    events: Arc<dyn EventSink>,
    locks: KeyedLocks,
}

impl Engine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        specs: Arc<SpecRegistry>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config: EngineConfig::default(),
            specs,
            processes: Arc::new(InstanceCache::new(store.clone())),
            steps: Arc::new(InstanceCache::new(store.clone())),
            store,
            identity,
            actions: Arc::new(ActionRegistry::new()),
            events: Arc::new(NoOpEventSink),
            locks: KeyedLocks::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_actions(mut self, actions: Arc<ActionRegistry>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// A handle acting as another identity. Specs, caches, and locks are
    /// shared with `self`.
    pub fn with_identity(&self, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn specs(&self) -> &SpecRegistry {
        &self.specs
    }

    /// Processes that currently have a call holding or waiting on their lock.
    pub fn locked_processes(&self) -> usize {
        self.locks.len()
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub async fn process_instance(&self, key: &str) -> Result<ProcessInstance, Vec<Failure>> {
        self.processes
            .get(key)
            .await
            .map_err(|e| vec![Failure::from(e)])
    }

    pub async fn step_instance(&self, key: &str) -> Result<StepInstance, Vec<Failure>> {
        self.steps.get(key).await.map_err(|e| vec![Failure::from(e)])
    }

    async fn current_actor(&self) -> Result<Actor, Failure> {
        self.identity
            .current_actor()
            .await
            .ok_or_else(|| Failure::new(FailureKind::AccessDenied, "no current actor"))
    }

    async fn check_access(&self, process: &SpecId, actor: &Actor) -> Result<(), Failure> {
        if self.identity.has_access(process, actor).await {
            Ok(())
        } else {
            Err(Failure::access_denied(process, Some(&actor.id)))
        }
    }

    /// Persist a transition as one batch, then refresh the caches and emit
    /// its events.
    async fn commit(&self, tx: Transition) -> Result<(), Rejection> {
        let persist_process = tx.persists_process();
        let actor = tx.actor().map(str::to_string);
        let (process, steps, events) = tx.into_parts();

        let mut batch = WriteBatch::new();
        if persist_process {
            self.processes.stage_write(&mut batch, &process)?;
        }
        for step in &steps {
            self.steps.stage_write(&mut batch, step)?;
        }
        let writes = batch.len();
        self.store.commit(batch).await?;
        debug!(
            process_key = %process.instance_key,
            writes,
            actor = ?actor,
            "committed transition"
        );

        let process_key = process.instance_key.clone();
        if persist_process {
            self.processes.add(process);
        }
        for event in events {
            self.events.emit(event).await;
        }
        for step in steps {
            self.events
                .emit(EngineEvent::StepChanged {
                    process_key: process_key.clone(),
                    step_key: step.instance_key.clone(),
                    step: step.name().to_string(),
                    status: step.status,
                    active_actor: step.active_actor().map(str::to_string),
                })
                .await;
            self.steps.add(step);
        }
        Ok(())
    }
}
