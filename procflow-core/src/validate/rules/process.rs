use std::collections::HashSet;

use crate::types::ProcessSpec;
use crate::validate::validator::Validator;

pub(crate) fn validate_process(v: &mut Validator, p: &ProcessSpec, path: &str) {
    v.validate_definition_id(&format!("{path}.specId"), &p.spec_id);

    if p.initial_steps.is_empty() {
        v.push(format!("{path}.initialSteps"), "must list at least one step");
    }
    for (idx, id) in p.initial_steps.iter().enumerate() {
        v.validate_reference_id(&format!("{path}.initialSteps[{idx}]"), id);
    }

    let mut names = HashSet::new();
    for (idx, field) in p.data_field_specs.iter().enumerate() {
        let fpath = format!("{path}.dataFieldSpecs[{idx}]");
        if field.name.trim().is_empty() {
            v.push(format!("{fpath}.name"), "must not be empty");
        } else if !names.insert(field.name.as_str()) {
            v.push(format!("{fpath}.name"), format!("duplicate field '{}'", field.name));
        }
        if let Some(expr) = &field.validation {
            v.validate_expression(&format!("{fpath}.validation"), expr);
        }
    }
}
