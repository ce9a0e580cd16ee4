use crate::types::{SpecDocument, SpecId, StepSpec};
use crate::validate::validator::Validator;

/// Resolve a reference within the document; version 0 picks the highest
/// version declared under that name.
fn resolve<'a>(steps: &'a [StepSpec], id: &SpecId) -> Option<&'a StepSpec> {
    steps
        .iter()
        .filter(|s| s.name() == id.name)
        .filter(|s| id.is_latest_query() || s.spec_id().version == id.version)
        .max_by_key(|s| s.spec_id().version)
}

pub(crate) fn validate_references(v: &mut Validator, doc: &SpecDocument) {
    for (pidx, p) in doc.processes.iter().enumerate() {
        for (idx, id) in p.initial_steps.iter().enumerate() {
            if resolve(&doc.steps, id).is_none() {
                v.push(
                    format!("$.processes[{pidx}].initialSteps[{idx}]"),
                    format!("unknown step {id}"),
                );
            }
        }
    }

    for (sidx, step) in doc.steps.iter().enumerate() {
        let path = format!("$.steps[{sidx}]");

        for (idx, id) in step.successor_steps().iter().enumerate() {
            let spath = format!("{path}.successorSteps[{idx}]");
            match resolve(&doc.steps, id) {
                None => v.push(spath, format!("unknown step {id}")),
                Some(succ) => {
                    if !succ.predecessor_steps().iter().any(|p| p.name == step.name()) {
                        v.push(
                            spath,
                            format!("{} does not list {} as a predecessor", succ.spec_id(), step.spec_id()),
                        );
                    }
                }
            }
        }

        for (idx, id) in step.predecessor_steps().iter().enumerate() {
            let ppath = format!("{path}.predecessorSteps[{idx}]");
            match resolve(&doc.steps, id) {
                None => v.push(ppath, format!("unknown step {id}")),
                Some(pred) => {
                    if !pred.successor_steps().iter().any(|s| s.name == step.name()) {
                        v.push(
                            ppath,
                            format!("{} does not list {} as a successor", pred.spec_id(), step.spec_id()),
                        );
                    }
                }
            }
        }
    }
}
