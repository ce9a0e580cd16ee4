use chrono::Utc;

use procflow_core::types::{ProcessInstance, ProcessStatus, StepInstance, StepStatus};

use crate::events::EngineEvent;

/// Working copies of everything one engine call changes. Nothing here is
/// visible to other callers until [`super::Engine::commit`] has persisted it.
pub(crate) struct Transition {
    pub(crate) process: ProcessInstance,
    steps: Vec<StepInstance>,
    events: Vec<EngineEvent>,
    actor: Option<String>,
    persist_process: bool,
}

impl Transition {
    pub(crate) fn new(process: ProcessInstance, actor: Option<&str>) -> Self {
        Self {
            process,
            steps: Vec::new(),
            events: Vec::new(),
            actor: actor.map(str::to_string),
            persist_process: true,
        }
    }

    /// A transition that writes its step instances only.
    pub(crate) fn steps_only(mut self) -> Self {
        self.persist_process = false;
        self
    }

    pub(crate) fn persists_process(&self) -> bool {
        self.persist_process
    }

    pub(crate) fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub(crate) fn step(&self, key: &str) -> Option<&StepInstance> {
        self.steps.iter().find(|s| s.instance_key == key)
    }

    pub(crate) fn steps(&self) -> &[StepInstance] {
        &self.steps
    }

    pub(crate) fn put(&mut self, step: StepInstance) {
        match self.steps.iter_mut().find(|s| s.instance_key == step.instance_key) {
            Some(slot) => *slot = step,
            None => self.steps.push(step),
        }
    }

    pub(crate) fn log(&mut self, step: Option<&str>, message: impl Into<String>) {
        let actor = self.actor.clone();
        self.process.log(actor.as_deref(), step, message);
    }

    pub(crate) fn push_event(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub(crate) fn set_status(&mut self, status: ProcessStatus) {
        if self.process.status == status {
            return;
        }
        if status.is_final() {
            self.process.finish(status, Utc::now());
        } else {
            self.process.status = status;
        }
        self.log(None, format!("process {}", status.as_str()));
        self.events.push(EngineEvent::ProcessStatusChanged {
            process_key: self.process.instance_key.clone(),
            status,
            actor: self.actor.clone(),
        });
    }

    /// Finish the process once no step instance is left open.
    pub(crate) fn settle(&mut self, last_succeeded: bool) {
        if self.process.open_steps.is_empty() && self.process.is_runnable() {
            let status = if last_succeeded {
                ProcessStatus::Completed
            } else {
                ProcessStatus::Terminated
            };
            self.set_status(status);
        }
    }

    /// Keys of system step instances this transition made runnable.
    pub(crate) fn ready_system_steps(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::ExecuteReady)
            .map(|s| s.instance_key.clone())
            .collect()
    }

    pub(crate) fn into_parts(self) -> (ProcessInstance, Vec<StepInstance>, Vec<EngineEvent>) {
        (self.process, self.steps, self.events)
    }
}
