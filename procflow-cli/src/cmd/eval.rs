use procflow_core::{Evaluate, Expression};
use serde::Serialize;

use crate::cmd::config::load_inputs;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{InputArgs, OutputArgs};

#[derive(Serialize)]
struct EvalResult {
    result: String,
    holds: bool,
}

/// A leading `[` means a JSON condition list, anything else is expression text.
fn parse_expression(source: &str) -> Result<Expression, String> {
    if source.trim_start().starts_with('[') {
        serde_json::from_str(source).map_err(|e| format!("invalid condition list: {e}"))
    } else {
        Ok(Expression::text(source))
    }
}

pub async fn eval_cmd(source: &str, inputs: InputArgs, output: OutputArgs) -> i32 {
    let data = match load_inputs(&inputs, &output) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let calculated = parse_expression(source).and_then(|expr| {
        let compiled = expr.compile().map_err(|e| e.to_string())?;
        let result = compiled.calculate(&data).map_err(|e| e.to_string())?;
        let holds = compiled.evaluate(&data).map_err(|e| e.to_string())?;
        Ok((result, holds))
    });

    match calculated {
        Ok((result, holds)) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!("{result}");
            } else {
                print_result(output.format, output.quiet, &EvalResult { result, holds });
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            exit_codes::VALIDATION_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_expression;
    use procflow_core::Expression;

    #[test]
    fn bracketed_input_is_a_condition_list() {
        let expr = parse_expression(r#"[{"operator": "EQ", "values": [{"literal": 1}, {"literal": 1}]}]"#).unwrap();
        assert!(matches!(expr, Expression::Conditions(_)));
    }

    #[test]
    fn plain_input_is_expression_text() {
        let expr = parse_expression("EQ(1, 1)").unwrap();
        assert!(matches!(expr, Expression::Text(_)));
    }
}
