use std::collections::HashSet;

use chrono::Utc;

use super::ExpressionError;
use crate::types::{lookup_path, value_to_text, Record};

pub(crate) const TRUE: &str = "true";
pub(crate) const FALSE: &str = "false";

/// The function core shared by every expression front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Field,
    Now,
    Length,
    Add,
    Negate,
    Multiply,
    Invert,
    Power,
    Abs,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    Required,
    StartsWith,
    EndsWith,
    Includes,
    And,
    Or,
    Not,
    Concat,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Function {
    /// Case-insensitive lookup of a function by its call name.
    pub fn from_name(name: &str) -> Option<Self> {
        let f = match name.trim().to_ascii_uppercase().as_str() {
            "FIELD" => Function::Field,
            "NOW" => Function::Now,
            "LENGTH" | "LEN" => Function::Length,
            "ADD" => Function::Add,
            "NEG" | "NEGATE" => Function::Negate,
            "MUL" | "MULTIPLY" => Function::Multiply,
            "INV" | "INVERT" => Function::Invert,
            "POW" | "POWER" => Function::Power,
            "ABS" => Function::Abs,
            "LT" => Function::Lt,
            "LTE" => Function::Lte,
            "GT" => Function::Gt,
            "GTE" => Function::Gte,
            "EQ" => Function::Eq,
            "NEQ" => Function::Neq,
            "REQUIRED" => Function::Required,
            "STARTSWITH" => Function::StartsWith,
            "ENDSWITH" => Function::EndsWith,
            "INCLUDES" => Function::Includes,
            "AND" => Function::And,
            "OR" => Function::Or,
            "NOT" => Function::Not,
            "CONCAT" => Function::Concat,
            "LEFT" => Function::Left,
            "RIGHT" => Function::Right,
            _ => return None,
        };
        Some(f)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Field => "FIELD",
            Function::Now => "NOW",
            Function::Length => "LENGTH",
            Function::Add => "ADD",
            Function::Negate => "NEG",
            Function::Multiply => "MUL",
            Function::Invert => "INV",
            Function::Power => "POW",
            Function::Abs => "ABS",
            Function::Lt => "LT",
            Function::Lte => "LTE",
            Function::Gt => "GT",
            Function::Gte => "GTE",
            Function::Eq => "EQ",
            Function::Neq => "NEQ",
            Function::Required => "REQUIRED",
            Function::StartsWith => "STARTSWITH",
            Function::EndsWith => "ENDSWITH",
            Function::Includes => "INCLUDES",
            Function::And => "AND",
            Function::Or => "OR",
            Function::Not => "NOT",
            Function::Concat => "CONCAT",
            Function::Left => "LEFT",
            Function::Right => "RIGHT",
        }
    }

    fn arity(&self) -> Arity {
        match self {
            Function::Now => Arity::Exact(0),
            Function::Field
            | Function::Length
            | Function::Negate
            | Function::Invert
            | Function::Abs
            | Function::Not => Arity::Exact(1),
            Function::Power | Function::Left | Function::Right => Arity::Exact(2),
            Function::StartsWith | Function::EndsWith | Function::Includes => Arity::AtLeast(2),
            _ => Arity::AtLeast(1),
        }
    }

    fn check_arity(&self, got: usize) -> Result<(), ExpressionError> {
        let (ok, expected) = match self.arity() {
            Arity::Exact(n) => (got == n, n.to_string()),
            Arity::AtLeast(n) => (got >= n, format!("at least {n}")),
        };
        if ok {
            Ok(())
        } else {
            Err(ExpressionError::Arity {
                function: self.name(),
                expected,
                got,
            })
        }
    }
}

/// Apply `function` to already-evaluated arguments. Every value, including the
/// result, travels as text; booleans are the literals `"true"` and `"false"`.
pub(crate) fn apply(function: Function, args: &[String], data: &Record) -> Result<String, ExpressionError> {
    function.check_arity(args.len())?;

    let out = match function {
        Function::Field => lookup_path(data, args[0].trim())
            .map(value_to_text)
            .unwrap_or_default(),
        Function::Now => Utc::now().to_rfc3339(),
        Function::Length => args[0].chars().count().to_string(),

        Function::Add => {
            let nums = numbers(function, args)?;
            format_number(nums.iter().sum())
        }
        Function::Multiply => {
            let nums = numbers(function, args)?;
            format_number(nums.iter().product())
        }
        Function::Negate => format_number(-number(function, &args[0])?),
        Function::Abs => format_number(number(function, &args[0])?.abs()),
        Function::Invert => {
            let n = number(function, &args[0])?;
            if n == 0.0 {
                return Err(ExpressionError::Calculation {
                    function: function.name(),
                    message: "cannot invert zero".to_string(),
                });
            }
            format_number(1.0 / n)
        }
        Function::Power => {
            let base = number(function, &args[0])?;
            let exp = number(function, &args[1])?;
            let result = base.powf(exp);
            if !result.is_finite() {
                return Err(ExpressionError::Calculation {
                    function: function.name(),
                    message: format!("{base} ^ {exp} is not a finite number"),
                });
            }
            format_number(result)
        }

        Function::Lt => bool_text(is_ordered(args, |o| o.is_lt())),
        Function::Lte => bool_text(is_ordered(args, |o| o.is_le())),
        Function::Gt => bool_text(is_ordered(args, |o| o.is_gt())),
        Function::Gte => bool_text(is_ordered(args, |o| o.is_ge())),

        // all-equal iff the de-duplicated set has one member,
        // all-distinct iff nothing was de-duplicated.
        Function::Eq => bool_text(distinct(args) == 1),
        Function::Neq => bool_text(distinct(args) == args.len()),

        Function::Required => bool_text(args.iter().all(|a| !a.trim().is_empty())),
        Function::StartsWith => {
            let (prefix, rest) = split_first(args);
            bool_text(rest.iter().all(|s| s.starts_with(prefix.as_str())))
        }
        Function::EndsWith => {
            let (suffix, rest) = split_first(args);
            bool_text(rest.iter().all(|s| s.ends_with(suffix.as_str())))
        }
        Function::Includes => {
            let (needle, rest) = split_first(args);
            bool_text(rest.iter().all(|s| s.contains(needle.as_str())))
        }

        Function::And => bool_text(args.iter().all(|a| is_true(a))),
        Function::Or => bool_text(args.iter().any(|a| is_true(a))),
        Function::Not => bool_text(!is_true(&args[0])),

        Function::Concat => args.concat(),
        Function::Left => {
            let n = count(function, &args[1])?;
            args[0].chars().take(n).collect()
        }
        Function::Right => {
            let n = count(function, &args[1])?;
            let len = args[0].chars().count();
            args[0].chars().skip(len.saturating_sub(n)).collect()
        }
    };
    Ok(out)
}

pub(crate) fn is_true(s: &str) -> bool {
    s.trim() == TRUE
}

fn bool_text(b: bool) -> String {
    let text = if b { TRUE } else { FALSE };
    text.to_string()
}

fn split_first(args: &[String]) -> (&String, &[String]) {
    // arity checks guarantee at least two arguments
    (&args[0], &args[1..])
}

fn distinct(args: &[String]) -> usize {
    args.iter().collect::<HashSet<_>>().len()
}

/// True when every adjacent pair satisfies `accept`. Numeric comparison is
/// used when every argument parses as a number, text comparison otherwise.
fn is_ordered(args: &[String], accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    let parsed: Option<Vec<f64>> = args.iter().map(|a| parse_number(a)).collect();
    match parsed {
        Some(nums) => nums
            .windows(2)
            .all(|w| w[0].partial_cmp(&w[1]).map(&accept).unwrap_or(false)),
        None => args.windows(2).all(|w| accept(w[0].cmp(&w[1]))),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number(function: Function, s: &str) -> Result<f64, ExpressionError> {
    parse_number(s).ok_or_else(|| ExpressionError::NotANumber {
        function: function.name(),
        value: s.to_string(),
    })
}

fn numbers(function: Function, args: &[String]) -> Result<Vec<f64>, ExpressionError> {
    args.iter().map(|a| number(function, a)).collect()
}

fn count(function: Function, s: &str) -> Result<usize, ExpressionError> {
    s.trim().parse::<usize>().map_err(|_| ExpressionError::NotANumber {
        function: function.name(),
        value: s.to_string(),
    })
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
