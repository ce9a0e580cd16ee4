use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use procflow_core::types::{ProcessInstance, Record};
use procflow_core::{Failure, SpecId};

use super::transition::Transition;
use super::validation::{dry_run_guards, resolve_steps, validate_fields};
use super::{reject_any, Engine, Rejection};
use crate::events::EngineEvent;

impl Engine {
    /// Start a process instance of `spec_id` (version 0 = latest) with `data`.
    ///
    /// Returns the new process instance key. Checks run in a fixed order:
    /// access, spec existence, spec activity, field validation, initial step
    /// resolution, guard dry-run. Nothing is persisted unless all of them
    /// pass and at least one step instance results.
    pub async fn create_process(&self, spec_id: &SpecId, data: Record) -> Result<String, Vec<Failure>> {
        self.create(spec_id, data).await.map_err(Rejection::into_failures)
    }

    async fn create(&self, spec_id: &SpecId, data: Record) -> Result<String, Rejection> {
        let actor = self.current_actor().await?;
        self.check_access(spec_id, &actor).await?;

        let spec = self
            .specs
            .process(spec_id)
            .ok_or_else(|| Failure::spec_not_found(spec_id))?;
        if !spec.is_active() {
            return Err(Failure::spec_not_active(&spec.spec_id).into());
        }

        reject_any(validate_fields(&spec, &data))?;
        let initial = resolve_steps(&self.specs, &spec.initial_steps)?;
        reject_any(dry_run_guards(&initial, &data))?;

        let key = Uuid::new_v4().to_string();
        let process = ProcessInstance::new(key.clone(), spec.spec_id.clone(), data, Utc::now());
        let mut tx = Transition::new(process, Some(&actor.id));
        tx.log(None, format!("process {} created", spec.spec_id));
        tx.push_event(EngineEvent::ProcessCreated {
            process_key: key.clone(),
            spec: spec.spec_id.clone(),
            actor: Some(actor.id.clone()),
        });

        self.spawn_steps(&mut tx, &initial, None).await?;
        if tx.steps().is_empty() {
            return Err(Failure::process_has_no_steps(&spec.spec_id).into());
        }

        let _guard = self.locks.lock(&key).await;
        let queue = tx.ready_system_steps();
        self.commit(tx).await?;
        info!(process_key = %key, spec = %spec.spec_id, actor = %actor.id, "process created");

        self.follow_up(&key, queue).await;
        Ok(key)
    }
}
