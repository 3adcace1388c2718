//! Output-variable formulas
//!
//! A formula such as `trans_sat + trans_unsat` combines RHESSys output columns
//! with a fixed set of arithmetic operators (`+ - * / **`, unary sign and
//! parentheses). Identifiers resolve to whole columns, so evaluation is
//! element-wise over all rows of a table. Nothing outside this grammar is
//! accepted.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::ColumnSource;
pub use parser::Expr;

use crate::table::OutputTable;
use lexer::Token;
use thiserror::Error;

/// Errors raised while parsing or evaluating a formula
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Formula is empty")]
    Empty,

    #[error("Unexpected character '{found}' at position {offset}")]
    UnexpectedCharacter { offset: usize, found: char },

    #[error("Invalid number '{text}' at position {offset}")]
    InvalidNumber { offset: usize, text: String },

    #[error("Unexpected '{found}' at position {offset}")]
    UnexpectedToken { offset: usize, found: String },

    #[error("Formula ends unexpectedly at position {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("Parenthesis opened at position {offset} is never closed")]
    UnclosedParenthesis { offset: usize },

    #[error("Variable '{0}' not found in output")]
    UnknownVariable(String),

    #[error("Columns have different lengths ({left} and {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// A parsed output-variable formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
    variables: Vec<String>,
}

impl Formula {
    /// Parses `source`.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = lexer::tokenize(source)?;

        let mut variables: Vec<String> = Vec::new();
        for spanned in &tokens {
            if let Token::Identifier(name) = &spanned.token {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
            }
        }

        let expr = parser::Parser::new(&tokens, source.len()).parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
            variables,
        })
    }

    /// The formula as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variables referenced by the formula, in order of first appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates the formula once per row of `source`.
    pub fn evaluate<S: ColumnSource + ?Sized>(&self, source: &S) -> Result<Vec<f64>, ExpressionError> {
        eval::evaluate(&self.expr, source)
    }
}

impl ColumnSource for OutputTable {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        OutputTable::column(self, name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_two_columns() {
        let table = OutputTable::parse("patchID a b\n1 1 3\n2 2 4\n").unwrap();
        let formula = Formula::parse("a + b").unwrap();

        assert_eq!(formula.evaluate(&table).unwrap(), vec![4.0, 6.0]);
    }

    #[test]
    fn collects_variables_once_in_order() {
        let formula = Formula::parse("trans_sat + trans_unsat * trans_sat / 2").unwrap();
        assert_eq!(formula.variables(), ["trans_sat", "trans_unsat"]);
        assert_eq!(formula.source(), "trans_sat + trans_unsat * trans_sat / 2");
    }

    #[test]
    fn numeric_literal_has_no_variables() {
        let formula = Formula::parse("42").unwrap();
        assert!(formula.variables().is_empty());
    }

    #[test]
    fn evaluates_mixed_formula() {
        let table = OutputTable::parse("patchID x y\n1 2 1\n2 3 4\n").unwrap();
        let formula = Formula::parse("-(x ** 2) + y / 2").unwrap();

        assert_eq!(formula.evaluate(&table).unwrap(), vec![-3.5, -7.0]);
    }

    #[test]
    fn missing_column_names_the_variable() {
        let table = OutputTable::parse("patchID a\n1 1\n").unwrap();
        let formula = Formula::parse("a + evap").unwrap();

        assert_eq!(
            formula.evaluate(&table).unwrap_err(),
            ExpressionError::UnknownVariable("evap".into())
        );
    }

    #[test]
    fn rejects_code_like_input() {
        assert!(Formula::parse("__import__('os')").is_err());
        assert!(Formula::parse("a; b").is_err());
    }
}
