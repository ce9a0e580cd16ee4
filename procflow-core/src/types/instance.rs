use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::types::{Record, SpecId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Runnable,
    Suspended,
    Terminated,
    Completed,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Runnable => "RUNNABLE",
            ProcessStatus::Suspended => "SUSPENDED",
            ProcessStatus::Terminated => "TERMINATED",
            ProcessStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ProcessStatus::Terminated | ProcessStatus::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminData {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<Utc>>,
}

/// One audit line appended to a process instance by a state transition.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogItem {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstance {
    pub instance_key: String,
    pub spec_id: SpecId,
    pub data: Record,
    pub status: ProcessStatus,
    pub admin_data: AdminData,

    /// Outstanding predecessor completions per step name.
    #[serde(default)]
    pub step_join_counters: BTreeMap<String, i64>,

    /// Step name -> key of the WAITING instance shared by its predecessors.
    #[serde(default)]
    pub waiting_steps: BTreeMap<String, String>,

    /// Keys of step instances that have not reached a terminal status.
    #[serde(default)]
    pub open_steps: BTreeSet<String>,

    #[serde(default)]
    pub log_items: Vec<LogItem>,
}

impl ProcessInstance {
    pub fn new(instance_key: impl Into<String>, spec_id: SpecId, data: Record, now: DateTime<Utc>) -> Self {
        Self {
            instance_key: instance_key.into(),
            spec_id,
            data,
            status: ProcessStatus::Runnable,
            admin_data: AdminData {
                start_time: now,
                stop_time: None,
            },
            step_join_counters: BTreeMap::new(),
            waiting_steps: BTreeMap::new(),
            open_steps: BTreeSet::new(),
            log_items: Vec::new(),
        }
    }

    pub fn is_runnable(&self) -> bool {
        self.status == ProcessStatus::Runnable
    }

    pub fn log(&mut self, actor: Option<&str>, step: Option<&str>, message: impl Into<String>) {
        self.log_items.push(LogItem {
            timestamp: Utc::now(),
            actor: actor.map(str::to_string),
            step: step.map(str::to_string),
            message: message.into(),
        });
    }

    /// Move to a final status and stamp the stop time. No-op when already final.
    pub fn finish(&mut self, status: ProcessStatus, now: DateTime<Utc>) {
        if self.status.is_final() {
            return;
        }
        self.status = status;
        self.admin_data.stop_time = Some(now);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Waiting,
    Ready,
    ExecuteReady,
    Executing,
    Success,
    Fail,
    Terminated,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Waiting => "WAITING",
            StepStatus::Ready => "READY",
            StepStatus::ExecuteReady => "EXECUTE_READY",
            StepStatus::Executing => "EXECUTING",
            StepStatus::Success => "SUCCESS",
            StepStatus::Fail => "FAIL",
            StepStatus::Terminated => "TERMINATED",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            StepStatus::Waiting => 0,
            StepStatus::Ready | StepStatus::ExecuteReady => 1,
            StepStatus::Executing => 2,
            StepStatus::Success | StepStatus::Fail | StepStatus::Terminated => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 3
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepInstanceKind {
    #[serde(rename_all = "camelCase")]
    Input {
        #[serde(default)]
        temporary_data: Record,
        #[serde(default)]
        active_actor: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    System {
        #[serde(default)]
        attempt_timestamps: Vec<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInstance {
    pub instance_key: String,
    pub spec_id: SpecId,
    pub process_instance_key: String,
    pub predecessors_completed: BTreeMap<String, bool>,
    pub status: StepStatus,
    #[serde(flatten)]
    pub kind: StepInstanceKind,
}

impl StepInstance {
    pub fn name(&self) -> &str {
        &self.spec_id.name
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, StepInstanceKind::Input { .. })
    }

    pub fn active_actor(&self) -> Option<&str> {
        match &self.kind {
            StepInstanceKind::Input { active_actor, .. } => active_actor.as_deref(),
            StepInstanceKind::System { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, StepStatus::Ready | StepStatus::ExecuteReady)
    }

    /// Apply a forward status transition. Backward transitions are refused and
    /// leave the status untouched; returns whether the status changed.
    pub fn advance(&mut self, next: StepStatus) -> bool {
        if self.status.is_terminal() || next.rank() < self.status.rank() || next == self.status {
            return false;
        }
        self.status = next;
        true
    }
}
