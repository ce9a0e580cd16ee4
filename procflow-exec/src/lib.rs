#![forbid(unsafe_code)]

//! Runtime engine driving process and step instances through their lifecycle.
//!
//! Spec parsing, validation and expression evaluation live in `procflow-core`;
//! persistence adapters live in `procflow-store`.

pub mod actions;
pub mod actor;
pub mod cache;
pub mod config;
pub mod engine;
pub mod events;
pub mod locks;

pub use crate::actions::{ActionError, ActionHandler, ActionOutcome, ActionRegistry, FnHandler};
pub use crate::actor::{Actor, IdentityProvider, StaticIdentity};
pub use crate::cache::{CacheError, Document, InstanceCache};
pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, ProcessView};
pub use crate::events::{
    CompositeEventSink, EngineEvent, EventSink, NoOpEventSink, RecordingEventSink, TracingEventSink,
};
pub use crate::locks::{KeyGuard, KeyedLocks};
