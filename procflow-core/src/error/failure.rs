use std::fmt;

use chrono::{DateTime, Utc};

use crate::expressions::ExpressionError;
use crate::types::SpecId;

/// What went wrong, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    SpecNotFound,
    SpecNotActive,
    SpecKindMismatch,
    DataValidationFailed,
    DataCalculation,
    GuardEvaluationFailed,
    AccessDenied,
    StepAlreadyActive,
    StepNotActive,
    StepNotReady,
    ProcessHasNoSteps,
    ProcessNotRunnable,
    InstanceNotFound,
    Store,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::SpecNotFound => "SPEC_NOT_FOUND",
            FailureKind::SpecNotActive => "SPEC_NOT_ACTIVE",
            FailureKind::SpecKindMismatch => "SPEC_KIND_MISMATCH",
            FailureKind::DataValidationFailed => "DATA_VALIDATION_FAILED",
            FailureKind::DataCalculation => "DATA_CALCULATION",
            FailureKind::GuardEvaluationFailed => "GUARD_EVALUATION_FAILED",
            FailureKind::AccessDenied => "ACCESS_DENIED",
            FailureKind::StepAlreadyActive => "STEP_ALREADY_ACTIVE",
            FailureKind::StepNotActive => "STEP_NOT_ACTIVE",
            FailureKind::StepNotReady => "STEP_NOT_READY",
            FailureKind::ProcessHasNoSteps => "PROCESS_HAS_NO_STEPS",
            FailureKind::ProcessNotRunnable => "PROCESS_NOT_RUNNABLE",
            FailureKind::InstanceNotFound => "INSTANCE_NOT_FOUND",
            FailureKind::Store => "STORE",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured business or validation failure.
///
/// Callers and tests should match on `kind` and the identifier fields rather
/// than on `message`.
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<SpecId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            spec_id: None,
            instance_key: None,
            field: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_spec(mut self, spec_id: &SpecId) -> Self {
        self.spec_id = Some(spec_id.clone());
        self
    }

    pub fn with_instance(mut self, key: impl Into<String>) -> Self {
        self.instance_key = Some(key.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn spec_not_found(spec_id: &SpecId) -> Self {
        Self::new(FailureKind::SpecNotFound, format!("spec {spec_id} is not registered")).with_spec(spec_id)
    }

    pub fn spec_not_active(spec_id: &SpecId) -> Self {
        Self::new(FailureKind::SpecNotActive, format!("spec {spec_id} is not active")).with_spec(spec_id)
    }

    pub fn spec_kind_mismatch(spec_id: &SpecId, expected: &str, found: &str) -> Self {
        Self::new(
            FailureKind::SpecKindMismatch,
            format!("spec {spec_id}: expected a {expected} step, found a {found} step"),
        )
        .with_spec(spec_id)
    }

    pub fn access_denied(spec_id: &SpecId, actor: Option<&str>) -> Self {
        let who = actor.unwrap_or("anonymous actor");
        Self::new(FailureKind::AccessDenied, format!("{who} may not act on {spec_id}")).with_spec(spec_id)
    }

    pub fn data_validation(spec_id: &SpecId, field: &str, message: impl Into<String>) -> Self {
        Self::new(FailureKind::DataValidationFailed, message)
            .with_spec(spec_id)
            .with_field(field)
    }

    pub fn data_calculation(spec_id: &SpecId, field: &str, err: &ExpressionError) -> Self {
        Self::new(
            FailureKind::DataCalculation,
            format!("validation of '{field}' could not be calculated: {err}"),
        )
        .with_spec(spec_id)
        .with_field(field)
    }

    pub fn guard_evaluation(spec_id: &SpecId, err: &ExpressionError) -> Self {
        Self::new(
            FailureKind::GuardEvaluationFailed,
            format!("guard of {spec_id} could not be evaluated: {err}"),
        )
        .with_spec(spec_id)
    }

    pub fn instance_not_found(key: &str) -> Self {
        Self::new(FailureKind::InstanceNotFound, format!("instance {key} does not exist")).with_instance(key)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Store, message)
    }

    pub fn step_already_active(step: &SpecId, key: &str, actor: &str) -> Self {
        Self::new(FailureKind::StepAlreadyActive, format!("step {step} is already held by {actor}"))
            .with_spec(step)
            .with_instance(key)
    }

    pub fn step_not_active(step: &SpecId, key: &str) -> Self {
        Self::new(FailureKind::StepNotActive, format!("step {step} is not held by any actor"))
            .with_spec(step)
            .with_instance(key)
    }

    pub fn step_not_ready(step: &SpecId, key: &str, status: &str) -> Self {
        Self::new(FailureKind::StepNotReady, format!("step {step} is {status}, not READY"))
            .with_spec(step)
            .with_instance(key)
    }

    pub fn process_not_runnable(process: &SpecId, key: &str, status: &str) -> Self {
        Self::new(FailureKind::ProcessNotRunnable, format!("process {process} is {status}"))
            .with_spec(process)
            .with_instance(key)
    }

    pub fn process_has_no_steps(process: &SpecId) -> Self {
        Self::new(
            FailureKind::ProcessHasNoSteps,
            format!("process {process} would be created without any step"),
        )
        .with_spec(process)
    }
}
