//! In-memory registry of immutable, versioned process and step specs.
//!
//! Versions of a name are kept in descending order so that a version-0 query
//! ("latest") is index 0. The registry does not look at the `active` flag;
//! callers decide what an inactive spec means for them.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::types::{ProcessSpec, SpecDocument, SpecId, StepSpec};

pub trait Versioned {
    fn spec_id(&self) -> &SpecId;
}

impl Versioned for ProcessSpec {
    fn spec_id(&self) -> &SpecId {
        &self.spec_id
    }
}

impl Versioned for StepSpec {
    fn spec_id(&self) -> &SpecId {
        StepSpec::spec_id(self)
    }
}

/// What registering an already-present `(name, version)` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the registered spec and report [`RegistryError::Duplicate`].
    #[default]
    Reject,
    /// Replace the registered spec (last write wins).
    Replace,
}

pub struct VersionedCache<T> {
    entries: DashMap<String, Vec<Arc<T>>>,
    policy: DuplicatePolicy,
}

impl<T: Versioned> VersionedCache<T> {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    pub fn get(&self, id: &SpecId) -> Option<Arc<T>> {
        let versions = self.entries.get(&id.name)?;
        if id.is_latest_query() {
            return versions.first().cloned();
        }
        versions
            .iter()
            .find(|s| s.spec_id().version == id.version)
            .cloned()
    }

    pub fn contains(&self, id: &SpecId) -> bool {
        !id.is_latest_query() && self.get(id).is_some()
    }

    pub fn add(&self, spec: T) -> Result<Arc<T>, RegistryError> {
        let id = spec.spec_id().clone();
        if id.version == 0 {
            return Err(RegistryError::InvalidVersion(id));
        }
        let spec = Arc::new(spec);
        let mut versions = self.entries.entry(id.name.clone()).or_default();
        match versions.binary_search_by(|entry| id.version.cmp(&entry.spec_id().version)) {
            Ok(pos) => {
                warn!(spec = %id, policy = ?self.policy, "conflicting spec registration");
                match self.policy {
                    DuplicatePolicy::Reject => return Err(RegistryError::Duplicate(id)),
                    DuplicatePolicy::Replace => versions[pos] = spec.clone(),
                }
            }
            Err(pos) => versions.insert(pos, spec.clone()),
        }
        debug!(spec = %id, "registered spec");
        Ok(spec)
    }

    /// Registered versions of `name`, highest first.
    pub fn versions(&self, name: &str) -> Vec<u32> {
        self.entries
            .get(name)
            .map(|v| v.iter().map(|s| s.spec_id().version).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide registry of process and step specs. Construct one per engine
/// (or per test) and share it behind an `Arc`.
pub struct SpecRegistry {
    processes: VersionedCache<ProcessSpec>,
    steps: VersionedCache<StepSpec>,
    policy: DuplicatePolicy,
}

impl Default for SpecRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

impl SpecRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            processes: VersionedCache::new(policy),
            steps: VersionedCache::new(policy),
            policy,
        }
    }

    pub fn process(&self, id: &SpecId) -> Option<Arc<ProcessSpec>> {
        self.processes.get(id)
    }

    pub fn step(&self, id: &SpecId) -> Option<Arc<StepSpec>> {
        self.steps.get(id)
    }

    pub fn add_process(&self, spec: ProcessSpec) -> Result<Arc<ProcessSpec>, RegistryError> {
        self.processes.add(spec)
    }

    pub fn add_step(&self, spec: StepSpec) -> Result<Arc<StepSpec>, RegistryError> {
        self.steps.add(spec)
    }

    pub fn processes(&self) -> &VersionedCache<ProcessSpec> {
        &self.processes
    }

    pub fn steps(&self) -> &VersionedCache<StepSpec> {
        &self.steps
    }

    /// Register every spec of a document. Under [`DuplicatePolicy::Reject`]
    /// the whole document is refused, before anything is registered, if any of
    /// its specs is already present.
    pub fn register_document(&self, doc: SpecDocument) -> Result<(), RegistryError> {
        if self.policy == DuplicatePolicy::Reject {
            let clash = doc
                .processes
                .iter()
                .map(|p| &p.spec_id)
                .find(|id| self.processes.contains(id))
                .or_else(|| doc.steps.iter().map(|s| s.spec_id()).find(|id| self.steps.contains(id)));
            if let Some(id) = clash {
                warn!(spec = %id, "spec document conflicts with a registered spec");
                return Err(RegistryError::Duplicate(id.clone()));
            }
        }
        for step in doc.steps {
            self.add_step(step)?;
        }
        for process in doc.processes {
            self.add_process(process)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputStepSpec, StepSpec};

    fn process(name: &str, version: u32, description: &str) -> ProcessSpec {
        ProcessSpec {
            spec_id: SpecId::new(name, version),
            description: description.to_string(),
            data_field_specs: vec![],
            initial_steps: vec![SpecId::latest("start")],
        }
    }

    fn input_step(name: &str, version: u32) -> StepSpec {
        StepSpec::Input(InputStepSpec {
            spec_id: SpecId::new(name, version),
            guard_expression: None,
            predecessor_steps: vec![],
            successor_steps: vec![],
            input_field_names: vec![],
        })
    }

    #[test]
    fn versions_are_kept_descending() {
        let cache = VersionedCache::new(DuplicatePolicy::Reject);
        for v in [2, 5, 1, 3] {
            cache.add(process("X", v, "")).unwrap();
        }
        assert_eq!(cache.versions("X"), vec![5, 3, 2, 1]);
    }

    #[test]
    fn version_zero_returns_highest() {
        let cache = VersionedCache::new(DuplicatePolicy::Reject);
        cache.add(process("X", 1, "one")).unwrap();
        cache.add(process("X", 7, "seven")).unwrap();
        cache.add(process("X", 4, "four")).unwrap();
        let latest = cache.get(&SpecId::latest("X")).unwrap();
        let max = cache.get(&SpecId::new("X", 7)).unwrap();
        assert_eq!(latest.description, "seven");
        assert!(Arc::ptr_eq(&latest, &max));
    }

    #[test]
    fn latest_ignores_active_flag() {
        let cache = VersionedCache::new(DuplicatePolicy::Reject);
        cache.add(process("X", 1, "")).unwrap();
        let mut newest = process("X", 2, "");
        newest.spec_id = newest.spec_id.inactive();
        cache.add(newest).unwrap();
        let latest = cache.get(&SpecId::latest("X")).unwrap();
        assert_eq!(latest.spec_id.version, 2);
        assert!(!latest.is_active());
    }

    #[test]
    fn duplicate_is_rejected_by_default() {
        let cache = VersionedCache::new(DuplicatePolicy::Reject);
        cache.add(process("X", 1, "first")).unwrap();
        let err = cache.add(process("X", 1, "second")).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(SpecId::new("X", 1)));
        assert_eq!(cache.get(&SpecId::new("X", 1)).unwrap().description, "first");
    }

    #[test]
    fn duplicate_replaces_under_replace_policy() {
        let cache = VersionedCache::new(DuplicatePolicy::Replace);
        cache.add(process("X", 1, "first")).unwrap();
        cache.add(process("X", 1, "second")).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&SpecId::new("X", 1)).unwrap().description, "second");
    }

    #[test]
    fn version_zero_cannot_be_registered() {
        let cache = VersionedCache::new(DuplicatePolicy::Reject);
        assert!(matches!(
            cache.add(process("X", 0, "")),
            Err(RegistryError::InvalidVersion(_))
        ));
    }

    #[test]
    fn unknown_name_and_version_are_absent() {
        let registry = SpecRegistry::default();
        registry.add_step(input_step("a", 1)).unwrap();
        assert!(registry.step(&SpecId::new("a", 2)).is_none());
        assert!(registry.step(&SpecId::latest("b")).is_none());
        assert!(registry.step(&SpecId::latest("a")).is_some());
    }

    #[test]
    fn conflicting_document_registers_nothing() {
        let registry = SpecRegistry::default();
        registry.add_step(input_step("a", 1)).unwrap();
        let doc = SpecDocument {
            processes: vec![process("P", 1, "")],
            steps: vec![input_step("b", 1), input_step("a", 1)],
        };
        assert!(registry.register_document(doc).is_err());
        assert!(registry.step(&SpecId::latest("b")).is_none());
        assert!(registry.process(&SpecId::latest("P")).is_none());
    }
}
