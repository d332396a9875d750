//! Formula system for economy value calculation.
//!
//! Reward formulas are authored as strings in the session configuration and
//! parsed once into a [`Formula`] tree. Evaluation substitutes named
//! variables such as `chapter`, `stage` or `value`.
//!
//! ## Grammar
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?
//! primary := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! ## Examples
//!
//! ```
//! use runner_core::{BigNumber, Formula};
//!
//! let gold = Formula::parse("value * (1 + stage * 0.1) * 2 ^ (chapter - 1)").unwrap();
//! let amount = gold
//!     .evaluate(&[
//!         ("value", BigNumber::from(10u32)),
//!         ("stage", BigNumber::from(0u32)),
//!         ("chapter", BigNumber::from(3u32)),
//!     ])
//!     .unwrap();
//! assert_eq!(amount, BigNumber::from(40u32));
//! ```

pub mod evaluate;
mod parse;

pub use evaluate::{Bindings, evaluate, evaluate_expression};

use std::collections::BTreeSet;

use thiserror::Error;

use crate::number::{BigNumber, NumberParseError};

// ============================================================================
// Formula Definition
// ============================================================================

/// Parsed algebraic expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    /// Literal value.
    Constant(BigNumber),

    /// Named variable resolved from bindings at evaluation time.
    Variable(String),

    /// Unary minus.
    Negate(Box<Formula>),

    /// Binary arithmetic.
    Binary {
        op: BinaryOp,
        lhs: Box<Formula>,
        rhs: Box<Formula>,
    },

    /// Built-in function call.
    Call {
        function: Function,
        args: Vec<Formula>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Function {
    Min,
    Max,
    Floor,
}

impl Function {
    /// Number of arguments the function accepts.
    pub const fn arity(self) -> usize {
        match self {
            Function::Min | Function::Max => 2,
            Function::Floor => 1,
        }
    }
}

impl Formula {
    /// Parses an expression string.
    pub fn parse(expression: &str) -> Result<Self, FormulaError> {
        parse::Parser::new(expression).parse()
    }

    /// Evaluates against named bindings.
    pub fn evaluate(&self, bindings: Bindings<'_>) -> Result<BigNumber, FormulaError> {
        evaluate(self, bindings)
    }

    /// Every variable name referenced by the expression.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Formula::Constant(_) => {}
            Formula::Variable(name) => {
                names.insert(name.as_str());
            }
            Formula::Negate(inner) => inner.collect_variables(names),
            Formula::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Formula::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unexpected `{found}` at offset {offset} in {expression:?}")]
    UnexpectedToken {
        expression: String,
        offset: usize,
        found: String,
    },

    #[error("unexpected end of expression {expression:?}")]
    UnexpectedEnd { expression: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("`{function}` expects {expected} argument(s), got {found}")]
    Arity {
        function: Function,
        expected: usize,
        found: usize,
    },

    #[error("unbound variable `{0}`")]
    UnboundVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{base}^{power} is not a real number")]
    InvalidPower { base: BigNumber, power: BigNumber },

    #[error(transparent)]
    Number(#[from] NumberParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_referenced_variables() {
        let formula = Formula::parse("value * max(stage, chapter) + value").unwrap();
        let vars: Vec<_> = formula.variables().into_iter().collect();
        assert_eq!(vars, vec!["chapter", "stage", "value"]);
    }
}
