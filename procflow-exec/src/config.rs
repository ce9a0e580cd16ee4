use procflow_core::DuplicatePolicy;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Upper bound on system steps executed by one create or submit call.
    pub max_system_steps_per_run: usize,
    /// Used when building the spec registry for this engine.
    pub duplicate_specs: DuplicatePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_system_steps_per_run: 256,
            duplicate_specs: DuplicatePolicy::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{ "maxSystemStepsPerRun": 8 }"#).unwrap();
        assert_eq!(cfg.max_system_steps_per_run, 8);
        assert_eq!(cfg.duplicate_specs, DuplicatePolicy::Reject);
    }
}
