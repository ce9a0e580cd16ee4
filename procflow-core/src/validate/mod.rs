mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::SpecDocument;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for SpecDocument {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_document(self)
    }
}

/// Structurally validate a spec document, collecting every violation.
pub fn validate_document(doc: &SpecDocument) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_document(doc);
    v.finish()
}
