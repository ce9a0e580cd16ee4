//! Boolean/arithmetic/string expressions evaluated against a data record.
//!
//! Two syntaxes are accepted and share one function core:
//!
//! - textual prefix calls, e.g. `GT(LENGTH(FIELD(name)), 0)`;
//! - structured condition lists, where each [`Condition`] applies an
//!   [`Operator`] to literals, record paths, or earlier condition results.
//!
//! Intermediate values are text; an expression holds when its result is the
//! literal `true`.

mod conditions;
mod functions;
mod lexer;
mod parser;

pub use conditions::{Condition, ConditionValue, Operator};
pub use functions::Function;

use crate::types::Record;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("unimplemented function: {0}")]
    Unimplemented(String),
    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: &'static str,
        expected: String,
        got: usize,
    },
    #[error("{function}: '{value}' is not a number")]
    NotANumber { function: &'static str, value: String },
    #[error("{function}: {message}")]
    Calculation { function: &'static str, message: String },
    #[error("condition {index} references result {reference}, which is not an earlier condition")]
    ForwardReference { index: usize, reference: usize },
}

impl ExpressionError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        ExpressionError::Syntax {
            offset,
            message: message.into(),
        }
    }
}

/// Anything that can decide a yes/no question about a data record.
pub trait Evaluate {
    fn evaluate(&self, data: &Record) -> Result<bool, ExpressionError>;
}

/// A guard or validation expression as written in a spec document: a string
/// is the textual syntax, a list is a structured condition list.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Text(String),
    Conditions(Vec<Condition>),
}

impl Expression {
    pub fn text(s: impl Into<String>) -> Self {
        Expression::Text(s.into())
    }

    pub fn compile(&self) -> Result<CompiledExpression, ExpressionError> {
        match self {
            Expression::Text(s) => Ok(CompiledExpression {
                inner: Compiled::Call(parser::parse(s)?),
            }),
            Expression::Conditions(c) => {
                conditions::check(c)?;
                Ok(CompiledExpression {
                    inner: Compiled::Conditions(c.clone()),
                })
            }
        }
    }
}

impl Evaluate for Expression {
    fn evaluate(&self, data: &Record) -> Result<bool, ExpressionError> {
        self.compile()?.evaluate(data)
    }
}

impl Evaluate for [Condition] {
    fn evaluate(&self, data: &Record) -> Result<bool, ExpressionError> {
        conditions::evaluate(self, data)
    }
}

/// A parsed expression, ready to be evaluated repeatedly.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    inner: Compiled,
}

#[derive(Debug, Clone)]
enum Compiled {
    Call(parser::Node),
    Conditions(Vec<Condition>),
}

impl CompiledExpression {
    /// Evaluate to the raw text result. Condition lists yield `true`/`false`.
    pub fn calculate(&self, data: &Record) -> Result<String, ExpressionError> {
        match &self.inner {
            Compiled::Call(node) => node.eval(data),
            Compiled::Conditions(c) => conditions::evaluate(c, data).map(|b| b.to_string()),
        }
    }
}

impl Evaluate for CompiledExpression {
    fn evaluate(&self, data: &Record) -> Result<bool, ExpressionError> {
        Ok(functions::is_true(&self.calculate(data)?))
    }
}

/// Parse and evaluate a textual expression in one go.
pub fn evaluate(expression: &str, data: &Record) -> Result<bool, ExpressionError> {
    Expression::text(expression).evaluate(data)
}

/// Parse and evaluate a textual expression, returning its text result.
pub fn calculate(expression: &str, data: &Record) -> Result<String, ExpressionError> {
    Expression::text(expression).compile()?.calculate(data)
}
