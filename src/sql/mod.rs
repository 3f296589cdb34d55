//! SQL parsing for the benchmark's supported subset: single-table and
//! joined SELECTs, WHERE/GROUP BY/HAVING/ORDER BY/LIMIT, the standard
//! aggregations, set operators and arbitrarily nested subqueries.

pub mod ast;
mod lexer;
mod parser;

pub use lexer::{Keyword, Lexer, Token};
pub use parser::Parser;

use ast::{Query, RawColumn};

/// Syntax error with the byte position it occurred at. Expected for
/// model-generated SQL; the caller recovers per example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub position: usize,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    pub fn new(position: usize, expected: &str, found: &str) -> Self {
        Self {
            position,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "syntax error at byte {}: expected {}, found {}",
            self.position, self.expected, self.found
        )
    }
}

impl std::error::Error for ParseError {}

/// Parses one SQL query into its unresolved AST.
pub fn parse(sql: &str) -> Result<Query<RawColumn>, ParseError> {
    Parser::new(sql).parse()
}
