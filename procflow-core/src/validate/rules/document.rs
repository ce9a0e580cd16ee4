use std::collections::HashSet;

use crate::types::SpecDocument;
use crate::validate::rules::{graph, process, step};
use crate::validate::validator::Validator;

pub(crate) fn validate_document(v: &mut Validator, doc: &SpecDocument) {
    if doc.processes.is_empty() && doc.steps.is_empty() {
        v.push("$", "document defines no processes and no steps");
    }

    let mut seen = HashSet::new();
    for (idx, p) in doc.processes.iter().enumerate() {
        let path = format!("$.processes[{idx}]");
        if !seen.insert((p.spec_id.name.as_str(), p.spec_id.version)) {
            v.push(format!("{path}.specId"), format!("duplicate process spec {}", p.spec_id));
        }
        process::validate_process(v, p, &path);
    }

    let mut seen = HashSet::new();
    for (idx, s) in doc.steps.iter().enumerate() {
        let path = format!("$.steps[{idx}]");
        if !seen.insert((s.name(), s.spec_id().version)) {
            v.push(format!("{path}.specId"), format!("duplicate step spec {}", s.spec_id()));
        }
        step::validate_step(v, s, &path);
    }

    graph::validate_references(v, doc);
}
