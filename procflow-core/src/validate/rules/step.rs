use std::collections::HashSet;

use crate::types::{StepSpec, SystemAction};
use crate::validate::validator::Validator;

pub(crate) fn validate_step(v: &mut Validator, step: &StepSpec, path: &str) {
    v.validate_definition_id(&format!("{path}.specId"), step.spec_id());

    if let Some(guard) = step.guard_expression() {
        v.validate_expression(&format!("{path}.guardExpression"), guard);
    }
    for (idx, id) in step.predecessor_steps().iter().enumerate() {
        v.validate_reference_id(&format!("{path}.predecessorSteps[{idx}]"), id);
    }
    for (idx, id) in step.successor_steps().iter().enumerate() {
        v.validate_reference_id(&format!("{path}.successorSteps[{idx}]"), id);
    }

    match step {
        StepSpec::Input(input) => {
            let mut names = HashSet::new();
            for (idx, name) in input.input_field_names.iter().enumerate() {
                let fpath = format!("{path}.inputFieldNames[{idx}]");
                if name.trim().is_empty() {
                    v.push(fpath, "must not be empty");
                } else if !names.insert(name.as_str()) {
                    v.push(fpath, format!("duplicate input field '{name}'"));
                }
            }
        }
        StepSpec::System(system) => match &system.action {
            SystemAction::Expression { expression } => {
                v.validate_expression(&format!("{path}.action.expression"), expression);
            }
            SystemAction::Handler { name } => {
                if name.trim().is_empty() {
                    v.push(format!("{path}.action.name"), "must not be empty");
                }
            }
        },
    }
}
