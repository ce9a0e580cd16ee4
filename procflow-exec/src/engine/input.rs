use tracing::{debug, info};

use procflow_core::types::{
    merge_fields, ProcessInstance, Record, StepInstance, StepInstanceKind, StepStatus,
};
use procflow_core::Failure;

use super::transition::Transition;
use super::validation::{dry_run_guards, resolve_steps, validate_fields};
use super::{reject_any, Engine, Rejection};
use crate::actor::Actor;
use crate::locks::KeyGuard;

/// An input step that passed the common checks, with its process lock held.
struct Claim {
    actor: Actor,
    step: StepInstance,
    process: ProcessInstance,
    _guard: KeyGuard,
}

impl Claim {
    /// The current actor must be the one holding the step.
    fn require_holder(&self) -> Result<(), Failure> {
        match self.step.active_actor() {
            None => Err(Failure::step_not_active(&self.step.spec_id, &self.step.instance_key)),
            Some(holder) if holder != self.actor.id => {
                Err(Failure::access_denied(&self.process.spec_id, Some(&self.actor.id))
                    .with_instance(self.step.instance_key.clone()))
            }
            Some(_) => Ok(()),
        }
    }
}

fn input_state(step: &mut StepInstance) -> Option<(&mut Record, &mut Option<String>)> {
    match &mut step.kind {
        StepInstanceKind::Input {
            temporary_data,
            active_actor,
        } => Some((temporary_data, active_actor)),
        StepInstanceKind::System { .. } => None,
    }
}

impl Engine {
    /// Checks shared by select, return, save and submit, in order: actor,
    /// step existence, access, step kind, process status, step status.
    async fn claim(&self, step_key: &str) -> Result<Claim, Rejection> {
        let actor = self.current_actor().await?;
        let process_key = self.steps.get(step_key).await?.process_instance_key;

        let guard = self.locks.lock(&process_key).await;
        let step = self.steps.get(step_key).await?;
        let process = self.processes.get(&process_key).await?;

        self.check_access(&process.spec_id, &actor).await?;
        if !step.is_input() {
            return Err(Failure::spec_kind_mismatch(&step.spec_id, "input", "system")
                .with_instance(step_key)
                .into());
        }
        if !process.is_runnable() {
            return Err(
                Failure::process_not_runnable(&process.spec_id, &process.instance_key, process.status.as_str())
                    .into(),
            );
        }
        if step.status != StepStatus::Ready {
            return Err(Failure::step_not_ready(&step.spec_id, step_key, step.status.as_str()).into());
        }

        Ok(Claim {
            actor,
            step,
            process,
            _guard: guard,
        })
    }

    /// Take ownership of a READY input step.
    pub async fn select_step(&self, step_key: &str) -> Result<(), Vec<Failure>> {
        self.select(step_key).await.map_err(Rejection::into_failures)
    }

    async fn select(&self, step_key: &str) -> Result<(), Rejection> {
        let Claim {
            actor,
            mut step,
            process,
            _guard,
        } = self.claim(step_key).await?;

        if let Some(holder) = step.active_actor() {
            return Err(Failure::step_already_active(&step.spec_id, step_key, holder).into());
        }
        if let Some((_, active_actor)) = input_state(&mut step) {
            *active_actor = Some(actor.id.clone());
        }

        let mut tx = Transition::new(process, Some(&actor.id));
        tx.log(Some(step.name()), "step selected");
        tx.put(step);
        self.commit(tx).await?;
        info!(step_key, actor = %actor.id, "step selected");
        Ok(())
    }

    /// Give a held step back so another actor can select it.
    pub async fn return_step(&self, step_key: &str) -> Result<(), Vec<Failure>> {
        self.give_back(step_key).await.map_err(Rejection::into_failures)
    }

    async fn give_back(&self, step_key: &str) -> Result<(), Rejection> {
        let claim = self.claim(step_key).await?;
        claim.require_holder()?;
        let Claim {
            actor,
            mut step,
            process,
            _guard,
        } = claim;

        if let Some((_, active_actor)) = input_state(&mut step) {
            *active_actor = None;
        }

        let mut tx = Transition::new(process, Some(&actor.id));
        tx.log(Some(step.name()), "step returned");
        tx.put(step);
        self.commit(tx).await?;
        info!(step_key, actor = %actor.id, "step returned");
        Ok(())
    }

    /// Replace the draft data of a held step. Drafts are not validated.
    pub async fn save_step(&self, step_key: &str, data: Record) -> Result<(), Vec<Failure>> {
        self.save(step_key, data).await.map_err(Rejection::into_failures)
    }

    async fn save(&self, step_key: &str, data: Record) -> Result<(), Rejection> {
        let claim = self.claim(step_key).await?;
        claim.require_holder()?;
        let Claim {
            actor,
            mut step,
            process,
            _guard,
        } = claim;

        if let Some((temporary_data, _)) = input_state(&mut step) {
            *temporary_data = data;
        }

        let mut tx = Transition::new(process, Some(&actor.id)).steps_only();
        tx.put(step);
        self.commit(tx).await?;
        debug!(step_key, actor = %actor.id, "step draft saved");
        Ok(())
    }

    /// Complete a held input step with `data`.
    ///
    /// Only the step's declared input fields are merged. The process fields
    /// and the successors' guards are checked against the merged data before
    /// anything changes; successors are then created and everything is
    /// committed as one batch.
    pub async fn submit_step(&self, step_key: &str, data: Record) -> Result<(), Vec<Failure>> {
        self.submit(step_key, data).await.map_err(Rejection::into_failures)
    }

    async fn submit(&self, step_key: &str, data: Record) -> Result<(), Rejection> {
        let claim = self.claim(step_key).await?;
        claim.require_holder()?;
        let Claim {
            actor,
            mut step,
            process,
            _guard,
        } = claim;

        let step_spec = self
            .specs
            .step(&step.spec_id)
            .ok_or_else(|| Failure::spec_not_found(&step.spec_id))?;
        let input_spec = step_spec
            .as_input()
            .ok_or_else(|| Failure::spec_kind_mismatch(&step.spec_id, "input", step_spec.kind_str()))?;
        let process_spec = self
            .specs
            .process(&process.spec_id)
            .ok_or_else(|| Failure::spec_not_found(&process.spec_id))?;

        let mut prospective = process.data.clone();
        let written = merge_fields(&mut prospective, &data, &input_spec.input_field_names);
        if written.len() < data.len() {
            debug!(
                step_key,
                ignored = data.len() - written.len(),
                "submitted fields outside the step's input fields were ignored"
            );
        }

        reject_any(validate_fields(&process_spec, &prospective))?;
        let successors = resolve_steps(&self.specs, &input_spec.successor_steps)?;
        reject_any(dry_run_guards(&successors, &prospective))?;

        let name = step.name().to_string();
        let mut tx = Transition::new(process, Some(&actor.id));
        tx.process.data = prospective;
        if let Some((temporary_data, _)) = input_state(&mut step) {
            temporary_data.clear();
        }
        step.advance(StepStatus::Success);
        tx.process.open_steps.remove(&step.instance_key);
        tx.log(Some(&name), format!("step submitted with fields {written:?}"));
        tx.put(step);

        self.spawn_steps(&mut tx, &successors, Some(&name)).await?;
        tx.settle(true);

        let process_key = tx.process.instance_key.clone();
        let queue = tx.ready_system_steps();
        self.commit(tx).await?;
        info!(step_key, process_key = %process_key, actor = %actor.id, "step submitted");

        self.follow_up(&process_key, queue).await;
        Ok(())
    }
}
