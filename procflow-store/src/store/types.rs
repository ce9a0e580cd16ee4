use serde::Serialize;
use serde_json::Value as JsonValue;

use super::StoreError;

/// The document collections the engine persists into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    ProcessInstances,
    StepInstances,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::ProcessInstances, Collection::StepInstances];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::ProcessInstances => "process_instances",
            Collection::StepInstances => "step_instances",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub collection: Collection,
    pub key: String,
    pub value: JsonValue,
}

/// Writes that become visible together or not at all. Writes are applied in
/// staging order, so a later write to the same key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_write(&mut self, collection: Collection, key: impl Into<String>, value: JsonValue) {
        self.writes.push(Write {
            collection,
            key: key.into(),
            value,
        });
    }

    /// Serialize `document` and stage it.
    pub fn stage<T: Serialize>(
        &mut self,
        collection: Collection,
        key: impl Into<String>,
        document: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        self.stage_write(collection, key, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn keys(&self, collection: Collection) -> impl Iterator<Item = &str> {
        self.writes
            .iter()
            .filter(move |w| w.collection == collection)
            .map(|w| w.key.as_str())
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}
