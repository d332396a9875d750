//! Formula evaluation logic.

use super::{BinaryOp, Formula, FormulaError, Function};
use crate::number::BigNumber;

/// Named variable values for one evaluation.
pub type Bindings<'a> = &'a [(&'a str, BigNumber)];

/// Evaluate a formula to a numeric value.
///
/// ## Error Handling
/// - `UnboundVariable` if a referenced name is missing from `bindings`
/// - `DivisionByZero` for `x / 0`
/// - `InvalidPower` for powers without a real result
pub fn evaluate(formula: &Formula, bindings: Bindings<'_>) -> Result<BigNumber, FormulaError> {
    match formula {
        Formula::Constant(value) => Ok(*value),

        Formula::Variable(name) => bindings
            .iter()
            .find(|(key, _)| *key == name.as_str())
            .map(|(_, value)| *value)
            .ok_or_else(|| FormulaError::UnboundVariable(name.clone())),

        Formula::Negate(inner) => Ok(-evaluate(inner, bindings)?),

        Formula::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, bindings)?;
            let rhs = evaluate(rhs, bindings)?;
            match op {
                BinaryOp::Add => Ok(lhs + rhs),
                BinaryOp::Sub => Ok(lhs - rhs),
                BinaryOp::Mul => Ok(lhs * rhs),
                BinaryOp::Div => lhs.checked_div(rhs).ok_or(FormulaError::DivisionByZero),
                BinaryOp::Pow => lhs
                    .checked_pow(rhs.to_f64())
                    .ok_or(FormulaError::InvalidPower {
                        base: lhs,
                        power: rhs,
                    }),
            }
        }

        Formula::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            // Arity is enforced by the parser; guard anyway for hand-built trees.
            if values.len() != function.arity() {
                return Err(FormulaError::Arity {
                    function: *function,
                    expected: function.arity(),
                    found: values.len(),
                });
            }
            Ok(match function {
                Function::Min => values[0].min(values[1]),
                Function::Max => values[0].max(values[1]),
                Function::Floor => values[0].floor(),
            })
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate_expression(
    expression: &str,
    bindings: Bindings<'_>,
) -> Result<BigNumber, FormulaError> {
    Formula::parse(expression)?.evaluate(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> BigNumber {
        BigNumber::from(v)
    }

    #[test]
    fn substitutes_bindings() {
        let bindings = [("value", n(10.0)), ("stage", n(3.0)), ("chapter", n(2.0))];
        let result = evaluate_expression("value * stage + chapter", &bindings);
        assert_eq!(result, Ok(n(32.0)));
    }

    #[test]
    fn handles_huge_exponential_growth() {
        let bindings = [("value", n(5.0)), ("chapter", n(400.0))];
        let result = evaluate_expression("value * 10 ^ chapter", &bindings).unwrap();
        assert_eq!(result, "5e400".parse::<BigNumber>().unwrap());
    }

    #[test]
    fn unbound_variable_is_an_error() {
        let result = evaluate_expression("value * bonus", &[("value", n(1.0))]);
        assert_eq!(result, Err(FormulaError::UnboundVariable("bonus".into())));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let bindings = [("value", n(1.0)), ("stage", n(1.0))];
        let result = evaluate_expression("value / (stage - 1)", &bindings);
        assert_eq!(result, Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn functions_and_negation() {
        let bindings = [("chapter", n(5.0)), ("conditionChapter", n(4.0))];
        assert_eq!(
            evaluate_expression("max(chapter - conditionChapter, 0)", &bindings),
            Ok(n(1.0))
        );
        assert_eq!(evaluate_expression("min(-chapter, 0)", &bindings), Ok(n(-5.0)));
        assert_eq!(evaluate_expression("floor(chapter / 2)", &bindings), Ok(n(2.0)));
    }
}
