use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use procflow_core::types::{Record, StepInstance, StepInstanceKind, StepSpec, StepStatus, SystemAction};
use procflow_core::Evaluate;

use super::transition::Transition;
use super::validation::resolve_steps;
use super::{Engine, Rejection};

impl Engine {
    /// Execute ready system steps of one process until none are left or the
    /// configured budget is spent. Each executed step is committed as its own
    /// batch. The caller holds the process lock.
    pub(crate) async fn run_system_steps(
        &self,
        process_key: &str,
        mut queue: VecDeque<String>,
    ) -> Result<(), Rejection> {
        let limit = self.config.max_system_steps_per_run;
        let mut executed = 0usize;

        while let Some(step_key) = queue.pop_front() {
            if executed >= limit {
                warn!(
                    process_key,
                    pending = queue.len() + 1,
                    limit,
                    "system step budget exhausted, remaining steps stay EXECUTE_READY"
                );
                break;
            }

            let process = self.processes.get(process_key).await?;
            if !process.is_runnable() {
                debug!(process_key, status = process.status.as_str(), "process no longer runnable");
                break;
            }
            let mut step = self.steps.get(&step_key).await?;
            if step.status != StepStatus::ExecuteReady {
                continue;
            }

            let mut tx = Transition::new(process, None);
            step.advance(StepStatus::Executing);
            if let StepInstanceKind::System { attempt_timestamps } = &mut step.kind {
                attempt_timestamps.push(Utc::now());
            }
            let name = step.name().to_string();

            let result = self.execute(&step, &tx.process.data).await;
            let succeeded = match result {
                Ok((output, successors)) => {
                    tx.process.data.extend(output);
                    step.advance(StepStatus::Success);
                    tx.process.open_steps.remove(&step.instance_key);
                    tx.log(Some(&name), "system step succeeded");
                    tx.put(step);
                    self.spawn_steps(&mut tx, &successors, Some(&name)).await?;
                    true
                }
                Err(reason) => {
                    warn!(process_key, step = %name, step_key = %step_key, reason = %reason, "system step failed");
                    step.advance(StepStatus::Fail);
                    tx.process.open_steps.remove(&step.instance_key);
                    tx.log(Some(&name), format!("system step failed: {reason}"));
                    tx.put(step);
                    false
                }
            };

            tx.settle(succeeded);
            queue.extend(tx.ready_system_steps());
            self.commit(tx).await?;
            executed += 1;
            info!(process_key, step = %name, succeeded, "system step executed");
        }
        Ok(())
    }

    /// Run the system steps made ready by a transition that is already
    /// committed. That transition stands whatever happens here: failures are
    /// logged on the process and the steps stay EXECUTE_READY until
    /// [`Engine::run_ready_system_steps`] picks them up.
    pub(crate) async fn follow_up(&self, process_key: &str, queue: Vec<String>) {
        if queue.is_empty() {
            return;
        }
        let Err(rejection) = self.run_system_steps(process_key, queue.into()).await else {
            return;
        };
        let summary = rejection
            .into_failures()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        warn!(process_key, failures = %summary, "system steps deferred");

        if let Err(rejection) = self.record_deferred(process_key, &summary).await {
            warn!(process_key, failures = ?rejection.into_failures(), "could not record deferred system steps");
        }
    }

    async fn record_deferred(&self, process_key: &str, summary: &str) -> Result<(), Rejection> {
        let process = self.processes.get(process_key).await?;
        let mut tx = Transition::new(process, None);
        tx.log(None, format!("system steps deferred: {summary}"));
        self.commit(tx).await
    }

    /// Run the action of a system step. On success yields the output to merge
    /// and the resolved successor specs.
    async fn execute(
        &self,
        step: &StepInstance,
        data: &Record,
    ) -> Result<(Record, Vec<Arc<StepSpec>>), String> {
        let spec = self
            .specs
            .step(&step.spec_id)
            .ok_or_else(|| format!("spec {} is not registered", step.spec_id))?;
        let system = spec
            .as_system()
            .ok_or_else(|| format!("spec {} is not a system step", step.spec_id))?;

        let outcome = match &system.action {
            SystemAction::Expression { expression } => {
                let held = expression
                    .evaluate(data)
                    .map_err(|e| format!("action expression could not be evaluated: {e}"))?;
                crate::actions::ActionOutcome {
                    succeeded: held,
                    output: Record::new(),
                }
            }
            SystemAction::Handler { name } => self
                .actions
                .run(name, data)
                .await
                .map_err(|e| e.to_string())?,
        };
        if !outcome.succeeded {
            return Err("action reported failure".to_string());
        }

        let successors = resolve_steps(&self.specs, &system.successor_steps).map_err(|failures| {
            failures
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        })?;
        Ok((outcome.output, successors))
    }
}
