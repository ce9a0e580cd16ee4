use std::sync::Arc;

use serde_json::Value as JsonValue;

use procflow_core::types::{FieldType, ProcessSpec, Record, StepSpec};
use procflow_core::{Evaluate, Failure, SpecId, SpecRegistry};

fn type_matches(field_type: FieldType, value: &JsonValue) -> bool {
    match field_type {
        FieldType::Any => true,
        FieldType::Text => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
    }
}

fn type_name(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Any => "any",
        FieldType::Text => "text",
        FieldType::Number => "number",
        FieldType::Boolean => "boolean",
    }
}

/// Check every declared field of `spec` against `data`, collecting all
/// violations. A `null` value counts as absent.
pub(crate) fn validate_fields(spec: &ProcessSpec, data: &Record) -> Vec<Failure> {
    let mut failures = Vec::new();
    for field in &spec.data_field_specs {
        let value = match data.get(&field.name) {
            None | Some(JsonValue::Null) => {
                if field.required {
                    failures.push(Failure::data_validation(
                        &spec.spec_id,
                        &field.name,
                        format!("required field '{}' is missing", field.name),
                    ));
                }
                continue;
            }
            Some(v) => v,
        };

        if !type_matches(field.field_type, value) {
            failures.push(Failure::data_validation(
                &spec.spec_id,
                &field.name,
                format!("field '{}' must be of type {}", field.name, type_name(field.field_type)),
            ));
            continue;
        }

        if let Some(expr) = &field.validation {
            match expr.evaluate(data) {
                Ok(true) => {}
                Ok(false) => failures.push(Failure::data_validation(
                    &spec.spec_id,
                    &field.name,
                    format!("field '{}' failed its validation", field.name),
                )),
                Err(e) => failures.push(Failure::data_calculation(&spec.spec_id, &field.name, &e)),
            }
        }
    }
    failures
}

/// Resolve step references to registered, active specs.
pub(crate) fn resolve_steps(
    registry: &SpecRegistry,
    refs: &[SpecId],
) -> Result<Vec<Arc<StepSpec>>, Vec<Failure>> {
    let mut specs = Vec::with_capacity(refs.len());
    let mut failures = Vec::new();
    for id in refs {
        match registry.step(id) {
            None => failures.push(Failure::spec_not_found(id)),
            Some(spec) if !spec.is_active() => failures.push(Failure::spec_not_active(spec.spec_id())),
            Some(spec) => specs.push(spec),
        }
    }
    if failures.is_empty() {
        Ok(specs)
    } else {
        Err(failures)
    }
}

/// Evaluate every guard against prospective data without acting on the
/// result; only evaluation errors are reported.
pub(crate) fn dry_run_guards(specs: &[Arc<StepSpec>], data: &Record) -> Vec<Failure> {
    specs
        .iter()
        .filter_map(|spec| {
            let guard = spec.guard_expression()?;
            guard
                .evaluate(data)
                .err()
                .map(|e| Failure::guard_evaluation(spec.spec_id(), &e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_core::types::DataFieldSpec;
    use procflow_core::{Expression, FailureKind};
    use serde_json::json;

    fn spec() -> ProcessSpec {
        ProcessSpec {
            spec_id: SpecId::new("p", 1),
            description: String::new(),
            data_field_specs: vec![
                DataFieldSpec {
                    name: "name".into(),
                    field_type: FieldType::Text,
                    required: true,
                    validation: Some(Expression::text("GT(LENGTH(FIELD(name)), 0)")),
                },
                DataFieldSpec {
                    name: "age".into(),
                    field_type: FieldType::Number,
                    required: false,
                    validation: Some(Expression::text("GTE(FIELD(age), 18)")),
                },
                DataFieldSpec {
                    name: "ratio".into(),
                    field_type: FieldType::Any,
                    required: false,
                    validation: Some(Expression::text("NOPE(FIELD(ratio))")),
                },
            ],
            initial_steps: vec![],
        }
    }

    fn data(v: JsonValue) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn valid_record_passes() {
        assert!(validate_fields(&spec(), &data(json!({ "name": "ann", "age": 30 }))).is_empty());
    }

    #[test]
    fn all_violations_are_collected() {
        let failures = validate_fields(&spec(), &data(json!({ "age": "old", "ratio": 1 })));
        let kinds: Vec<_> = failures.iter().map(|f| (f.kind, f.field.clone().unwrap())).collect();
        assert_eq!(
            kinds,
            vec![
                (FailureKind::DataValidationFailed, "name".to_string()),
                (FailureKind::DataValidationFailed, "age".to_string()),
                (FailureKind::DataCalculation, "ratio".to_string()),
            ]
        );
    }

    #[test]
    fn empty_name_fails_its_validator() {
        let failures = validate_fields(&spec(), &data(json!({ "name": "" })));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::DataValidationFailed);
        assert_eq!(failures[0].field.as_deref(), Some("name"));
    }

    #[test]
    fn absent_optional_field_skips_validator() {
        assert!(validate_fields(&spec(), &data(json!({ "name": "x", "age": null }))).is_empty());
    }
}
