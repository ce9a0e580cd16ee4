use tracing::{debug, info};

use procflow_core::types::{ProcessInstance, ProcessStatus, StepInstance, StepStatus};
use procflow_core::{Failure, FailureKind};

use super::transition::Transition;
use super::{Engine, Rejection};

/// A process instance together with all of its step instances.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessView {
    pub process: ProcessInstance,
    pub steps: Vec<StepInstance>,
}

impl Engine {
    /// RUNNABLE -> SUSPENDED. Input steps of a suspended process cannot be
    /// acted on and its system steps are not executed.
    pub async fn suspend_process(&self, process_key: &str) -> Result<(), Vec<Failure>> {
        self.change_status(process_key, ProcessStatus::Suspended)
            .await
            .map_err(Rejection::into_failures)
    }

    /// SUSPENDED -> RUNNABLE, then run any system steps that became ready
    /// while the process was suspended.
    pub async fn resume_process(&self, process_key: &str) -> Result<(), Vec<Failure>> {
        self.change_status(process_key, ProcessStatus::Runnable)
            .await
            .map_err(Rejection::into_failures)
    }

    /// Any non-final status -> TERMINATED. Every open step instance is
    /// terminated in the same batch.
    pub async fn terminate_process(&self, process_key: &str) -> Result<(), Vec<Failure>> {
        self.change_status(process_key, ProcessStatus::Terminated)
            .await
            .map_err(Rejection::into_failures)
    }

    async fn change_status(&self, process_key: &str, target: ProcessStatus) -> Result<(), Rejection> {
        let actor = self.current_actor().await?;
        self.processes.get(process_key).await?;

        let _guard = self.locks.lock(process_key).await;
        let process = self.processes.get(process_key).await?;
        self.check_access(&process.spec_id, &actor).await?;

        let allowed = match target {
            ProcessStatus::Suspended => process.status == ProcessStatus::Runnable,
            ProcessStatus::Runnable => process.status == ProcessStatus::Suspended,
            ProcessStatus::Terminated => !process.status.is_final(),
            ProcessStatus::Completed => false,
        };
        if !allowed {
            return Err(Failure::new(
                FailureKind::ProcessNotRunnable,
                format!(
                    "process {} cannot go from {} to {}",
                    process.spec_id,
                    process.status.as_str(),
                    target.as_str()
                ),
            )
            .with_spec(&process.spec_id)
            .with_instance(process_key)
            .into());
        }

        let mut tx = Transition::new(process, Some(&actor.id));
        if target == ProcessStatus::Terminated {
            let open: Vec<String> = tx.process.open_steps.iter().cloned().collect();
            for key in open {
                let mut step = self.steps.get(&key).await?;
                step.advance(StepStatus::Terminated);
                tx.put(step);
            }
            tx.process.open_steps.clear();
            tx.process.waiting_steps.clear();
            tx.process.step_join_counters.clear();
        }
        tx.set_status(target);

        let ready = if target == ProcessStatus::Runnable {
            self.ready_system_steps_of(&tx.process).await?
        } else {
            Vec::new()
        };
        self.commit(tx).await?;
        info!(process_key, status = target.as_str(), actor = %actor.id, "process status changed");

        self.follow_up(process_key, ready).await;
        Ok(())
    }

    /// Execute the EXECUTE_READY system steps of a runnable process, such as
    /// steps left over by an exhausted budget or a failed store write.
    pub async fn run_ready_system_steps(&self, process_key: &str) -> Result<(), Vec<Failure>> {
        self.run_ready(process_key).await.map_err(Rejection::into_failures)
    }

    async fn run_ready(&self, process_key: &str) -> Result<(), Rejection> {
        let actor = self.current_actor().await?;
        self.processes.get(process_key).await?;

        let _guard = self.locks.lock(process_key).await;
        let process = self.processes.get(process_key).await?;
        self.check_access(&process.spec_id, &actor).await?;
        if !process.is_runnable() {
            return Err(Failure::process_not_runnable(
                &process.spec_id,
                process_key,
                process.status.as_str(),
            )
            .into());
        }

        let ready = self.ready_system_steps_of(&process).await?;
        debug!(process_key, ready = ready.len(), actor = %actor.id, "running ready system steps");
        self.run_system_steps(process_key, ready.into()).await
    }

    async fn ready_system_steps_of(&self, process: &ProcessInstance) -> Result<Vec<String>, Rejection> {
        let mut ready = Vec::new();
        for key in &process.open_steps {
            let step = self.steps.get(key).await?;
            if step.status == StepStatus::ExecuteReady {
                ready.push(key.clone());
            }
        }
        Ok(ready)
    }

    /// Load a process instance and every step instance that belongs to it,
    /// straight from the store.
    pub async fn process_view(&self, process_key: &str) -> Result<ProcessView, Vec<Failure>> {
        let process = self.process_instance(process_key).await?;
        let docs = self
            .store
            .list_process_steps(process_key)
            .await
            .map_err(|e| vec![Failure::store(e.to_string())])?;

        let mut steps = Vec::new();
        for (key, body) in docs {
            let step: StepInstance = serde_json::from_value(body)
                .map_err(|e| vec![Failure::store(e.to_string()).with_instance(key)])?;
            steps.push(step);
        }
        Ok(ProcessView { process, steps })
    }
}
