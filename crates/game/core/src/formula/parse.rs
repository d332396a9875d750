//! Tokenizer and recursive-descent parser for formula strings.

use std::str::FromStr;

use super::{BinaryOp, Formula, FormulaError, Function};
use crate::number::BigNumber;

#[derive(Clone, Debug, PartialEq)]
enum Token<'a> {
    Number(&'a str),
    Ident(&'a str),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl Token<'_> {
    fn text(&self) -> String {
        match self {
            Token::Number(s) | Token::Ident(s) => (*s).to_owned(),
            Token::Op(c) => c.to_string(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

pub(super) struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<(usize, Token<'a>)>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(expression: &'a str) -> Self {
        Self {
            expression,
            tokens: Vec::new(),
            cursor: 0,
        }
    }

    pub(super) fn parse(mut self) -> Result<Formula, FormulaError> {
        self.tokens = self.tokenize()?;
        let formula = self.expr()?;
        match self.tokens.get(self.cursor) {
            None => Ok(formula),
            Some((offset, token)) => Err(self.unexpected(*offset, token)),
        }
    }

    fn tokenize(&self) -> Result<Vec<(usize, Token<'a>)>, FormulaError> {
        let src = self.expression;
        let bytes = src.as_bytes();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let c = bytes[i];
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => i += 1,
                b'0'..=b'9' | b'.' => {
                    let start = i;
                    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                        i += 1;
                    }
                    // Scientific suffix only when digits follow, so `2e` stays an error.
                    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                        let mut j = i + 1;
                        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                            j += 1;
                        }
                        if j < bytes.len() && bytes[j].is_ascii_digit() {
                            while j < bytes.len() && bytes[j].is_ascii_digit() {
                                j += 1;
                            }
                            i = j;
                        }
                    }
                    tokens.push((start, Token::Number(&src[start..i])));
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                    let start = i;
                    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                    {
                        i += 1;
                    }
                    tokens.push((start, Token::Ident(&src[start..i])));
                }
                b'+' | b'-' | b'*' | b'/' | b'^' => {
                    tokens.push((i, Token::Op(c as char)));
                    i += 1;
                }
                b'(' => {
                    tokens.push((i, Token::LParen));
                    i += 1;
                }
                b')' => {
                    tokens.push((i, Token::RParen));
                    i += 1;
                }
                b',' => {
                    tokens.push((i, Token::Comma));
                    i += 1;
                }
                _ => {
                    let found = src[i..].chars().next().map(String::from).unwrap_or_default();
                    return Err(FormulaError::UnexpectedToken {
                        expression: src.to_owned(),
                        offset: i,
                        found,
                    });
                }
            }
        }

        Ok(tokens)
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.cursor).map(|(_, t)| t)
    }

    fn next(&mut self) -> Result<(usize, Token<'a>), FormulaError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| FormulaError::UnexpectedEnd {
                expression: self.expression.to_owned(),
            })?;
        self.cursor += 1;
        Ok(token)
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(c) => {
                let c = *c;
                self.cursor += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: &Token<'a>) -> Result<(), FormulaError> {
        let (offset, token) = self.next()?;
        if &token == expected {
            Ok(())
        } else {
            Err(self.unexpected(offset, &token))
        }
    }

    fn unexpected(&self, offset: usize, token: &Token<'_>) -> FormulaError {
        FormulaError::UnexpectedToken {
            expression: self.expression.to_owned(),
            offset,
            found: token.text(),
        }
    }

    fn expr(&mut self) -> Result<Formula, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Formula, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/']) {
            let rhs = self.unary()?;
            let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Formula, FormulaError> {
        if self.eat_op(&['-']).is_some() {
            return Ok(Formula::Negate(Box::new(self.unary()?)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Formula, FormulaError> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            // Right associative: 2^3^2 == 2^(3^2).
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Formula, FormulaError> {
        let (offset, token) = self.next()?;
        match token {
            Token::Number(literal) => Ok(Formula::Constant(BigNumber::from_str(literal)?)),
            Token::Ident(name) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Formula::Variable(name.to_owned()));
                }
                let function =
                    Function::from_str(name).map_err(|_| FormulaError::UnknownFunction {
                        name: name.to_owned(),
                    })?;
                self.cursor += 1;
                let args = self.arguments()?;
                if args.len() != function.arity() {
                    return Err(FormulaError::Arity {
                        function,
                        expected: function.arity(),
                        found: args.len(),
                    });
                }
                Ok(Formula::Call { function, args })
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(self.unexpected(offset, &other)),
        }
    }

    /// Parses `expr (',' expr)* ')'` after the opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Formula>, FormulaError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.cursor += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            let (offset, token) = self.next()?;
            match token {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => return Err(self.unexpected(offset, &other)),
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Formula, rhs: Formula) -> Formula {
    Formula::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Formula {
        Formula::Variable(name.to_owned())
    }

    fn num(n: u32) -> Formula {
        Formula::Constant(BigNumber::from(n))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let parsed = Formula::parse("value + stage * 2").unwrap();
        assert_eq!(
            parsed,
            binary(
                BinaryOp::Add,
                var("value"),
                binary(BinaryOp::Mul, var("stage"), num(2))
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        let parsed = Formula::parse("2 ^ 3 ^ 2").unwrap();
        assert_eq!(
            parsed,
            binary(BinaryOp::Pow, num(2), binary(BinaryOp::Pow, num(3), num(2)))
        );
    }

    #[test]
    fn scientific_literals_are_single_tokens() {
        let parsed = Formula::parse("1.5e3 * x").unwrap();
        assert_eq!(parsed, binary(BinaryOp::Mul, num(1500), var("x")));
    }

    #[test]
    fn reports_trailing_tokens() {
        let err = Formula::parse("value value").unwrap_err();
        assert!(matches!(err, FormulaError::UnexpectedToken { offset: 6, .. }));
    }

    #[test]
    fn reports_unclosed_parenthesis() {
        let err = Formula::parse("(value + 1").unwrap_err();
        assert!(matches!(err, FormulaError::UnexpectedEnd { .. }));
    }

    #[test]
    fn reports_unknown_characters() {
        let err = Formula::parse("value % 2").unwrap_err();
        assert!(matches!(err, FormulaError::UnexpectedToken { ref found, .. } if found == "%"));
    }

    #[test]
    fn validates_function_names_and_arity() {
        assert!(matches!(
            Formula::parse("sqrt(4)").unwrap_err(),
            FormulaError::UnknownFunction { .. }
        ));
        assert!(matches!(
            Formula::parse("max(1)").unwrap_err(),
            FormulaError::Arity {
                function: Function::Max,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(matches!(
            Formula::parse("1.2.3").unwrap_err(),
            FormulaError::Number(_)
        ));
    }
}
