#![forbid(unsafe_code)]

pub mod error;
pub mod expressions;
pub mod parser;
pub mod registry;
pub mod types;
pub mod validate;

pub use crate::error::{
    Failure, FailureKind, ParseError, ProcflowError, RegistryError, ValidationError, Violation,
};
pub use crate::expressions::{evaluate, Evaluate, Expression, ExpressionError};
pub use crate::parser::{parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::registry::{DuplicatePolicy, SpecRegistry};
pub use crate::types::{ProcessSpec, SpecDocument, SpecId, StepSpec};
pub use crate::validate::{validate_document, Validate};
