use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, Violation};
use crate::expressions::Expression;
use crate::types::{SpecDocument, SpecId};

use super::rules;

pub(crate) static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid"));

pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_document(&mut self, doc: &SpecDocument) {
        rules::document::validate_document(self, doc);
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    /// A spec being defined: valid name and a concrete version.
    pub(crate) fn validate_definition_id(&mut self, path: &str, id: &SpecId) {
        self.validate_name(&format!("{path}.name"), &id.name);
        if id.version == 0 {
            self.push(format!("{path}.version"), "must be at least 1");
        }
    }

    /// A reference to another spec: valid name, any version (0 = latest).
    pub(crate) fn validate_reference_id(&mut self, path: &str, id: &SpecId) {
        self.validate_name(&format!("{path}.name"), &id.name);
    }

    fn validate_name(&mut self, path: &str, name: &str) {
        if name.is_empty() {
            self.push(path, "must not be empty");
        } else if !NAME_RE.is_match(name) {
            self.push(path, "must match ^[A-Za-z0-9_\\-]+$");
        }
    }

    pub(crate) fn validate_expression(&mut self, path: &str, expr: &Expression) {
        if let Err(e) = expr.compile() {
            self.push(path, format!("invalid expression: {e}"));
        }
    }
}
