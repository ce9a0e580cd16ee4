use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use procflow_core::types::{ProcessStatus, StepStatus};
use procflow_core::SpecId;

/// A committed state transition.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    ProcessCreated {
        process_key: String,
        spec: SpecId,
        actor: Option<String>,
    },
    ProcessStatusChanged {
        process_key: String,
        status: ProcessStatus,
        actor: Option<String>,
    },
    StepChanged {
        process_key: String,
        step_key: String,
        step: String,
        status: StepStatus,
        active_actor: Option<String>,
    },
}

impl EngineEvent {
    pub fn process_key(&self) -> &str {
        match self {
            EngineEvent::ProcessCreated { process_key, .. }
            | EngineEvent::ProcessStatusChanged { process_key, .. }
            | EngineEvent::StepChanged { process_key, .. } => process_key,
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: EngineEvent);
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: EngineEvent) {}
}

/// Logs every event at `info`.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::ProcessCreated {
                process_key,
                spec,
                actor,
            } => info!(process_key = %process_key, spec = %spec, actor = ?actor, "process created"),
            EngineEvent::ProcessStatusChanged {
                process_key,
                status,
                actor,
            } => info!(
                process_key = %process_key,
                status = status.as_str(),
                actor = ?actor,
                "process status changed"
            ),
            EngineEvent::StepChanged {
                process_key,
                step_key,
                step,
                status,
                active_actor,
            } => info!(
                process_key = %process_key,
                step_key = %step_key,
                step = %step,
                status = status.as_str(),
                active_actor = ?active_actor,
                "step changed"
            ),
        }
    }
}

/// Keeps every event in memory; mostly useful in tests.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: EngineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Fans every event out to each added sink, in insertion order.
#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: EngineEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(key: &str) -> EngineEvent {
        EngineEvent::ProcessCreated {
            process_key: key.to_string(),
            spec: SpecId::new("order", 1),
            actor: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn composite_reaches_every_sink() {
        let first = Arc::new(RecordingEventSink::new());
        let second = Arc::new(RecordingEventSink::new());
        let sink = CompositeEventSink::new()
            .with(Arc::new(NoOpEventSink))
            .with(first.clone())
            .with(second.clone());

        sink.emit(created("p1")).await;
        sink.emit(created("p2")).await;

        assert_eq!(first.events(), vec![created("p1"), created("p2")]);
        assert_eq!(second.events(), first.events());
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let value = serde_json::to_value(EngineEvent::StepChanged {
            process_key: "p1".into(),
            step_key: "s1".into(),
            step: "enter".into(),
            status: StepStatus::Ready,
            active_actor: None,
        })
        .unwrap();
        assert_eq!(value["type"], "stepChanged");
        assert_eq!(value["stepKey"], "s1");
        assert_eq!(value["status"], "READY");
    }
}
