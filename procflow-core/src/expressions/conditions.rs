use serde_json::Value as JsonValue;

use super::functions::{apply, is_true, Function};
use super::ExpressionError;
use crate::types::{lookup_path, value_to_text, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Required,
    StartsWith,
    EndsWith,
    Includes,
    And,
    Or,
}

impl Operator {
    fn function(&self) -> Function {
        match self {
            Operator::Eq => Function::Eq,
            Operator::Neq => Function::Neq,
            Operator::Gt => Function::Gt,
            Operator::Gte => Function::Gte,
            Operator::Lt => Function::Lt,
            Operator::Lte => Function::Lte,
            Operator::Required => Function::Required,
            Operator::StartsWith => Function::StartsWith,
            Operator::EndsWith => Function::EndsWith,
            Operator::Includes => Function::Includes,
            Operator::And => Function::And,
            Operator::Or => Function::Or,
        }
    }
}

/// Where a condition operand comes from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionValue {
    Literal(JsonValue),
    /// Dotted path into the data record.
    Path(String),
    /// Boolean result of an earlier condition, by index.
    Result(usize),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<ConditionValue>,
}

impl Condition {
    pub fn new(operator: Operator, values: Vec<ConditionValue>) -> Self {
        Self { operator, values }
    }
}

/// Reject back-references that do not point at an earlier condition.
pub(crate) fn check(conditions: &[Condition]) -> Result<(), ExpressionError> {
    for (index, condition) in conditions.iter().enumerate() {
        for value in &condition.values {
            if let ConditionValue::Result(reference) = value {
                if *reference >= index {
                    return Err(ExpressionError::ForwardReference {
                        index,
                        reference: *reference,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Evaluate left to right; the last condition decides. An empty list is true.
pub(crate) fn evaluate(conditions: &[Condition], data: &Record) -> Result<bool, ExpressionError> {
    let mut results: Vec<bool> = Vec::with_capacity(conditions.len());
    for (index, condition) in conditions.iter().enumerate() {
        let args = condition
            .values
            .iter()
            .map(|v| resolve(v, index, &results, data))
            .collect::<Result<Vec<_>, _>>()?;
        let out = apply(condition.operator.function(), &args, data)?;
        results.push(is_true(&out));
    }
    Ok(results.last().copied().unwrap_or(true))
}

fn resolve(
    value: &ConditionValue,
    index: usize,
    results: &[bool],
    data: &Record,
) -> Result<String, ExpressionError> {
    match value {
        ConditionValue::Literal(v) => Ok(value_to_text(v)),
        ConditionValue::Path(path) => Ok(lookup_path(data, path).map(value_to_text).unwrap_or_default()),
        ConditionValue::Result(reference) => results
            .get(*reference)
            .map(|b| b.to_string())
            .ok_or(ExpressionError::ForwardReference {
                index,
                reference: *reference,
            }),
    }
}
