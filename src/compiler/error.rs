use std::fmt;

use thiserror::Error;

use crate::token::{LexError, Token, TokenType};

/// What the grammar would have accepted at the point of a syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub typ: TokenType,
    pub values: Vec<&'static str>,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            write!(f, "<{}>", self.typ)
        } else {
            write!(f, "<{}> {} </{}>", self.typ, self.values.join(" | "), self.typ)
        }
    }
}

/// Token classes and values a term may start with.
pub const TERM_STARTS: &str =
    "integerConstant | stringConstant | true | false | null | this | identifier | ( | - | ~";

fn describe(tok: &Option<Token>) -> String {
    tok.as_ref()
        .map_or_else(|| "end of input".to_string(), |t| t.to_string())
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected {expected}, found {}", describe(.found))]
    Syntax {
        expected: Expected,
        found: Option<Token>,
    },
    #[error("expected a term ({}), found {}", TERM_STARTS, describe(.found))]
    ExpectedTerm { found: Option<Token> },
    #[error("expressions nested deeper than {0} terms")]
    NestingTooDeep(usize),
    #[error("undeclared identifier `{0}`")]
    UnresolvedName(String),
    #[error("invalid character {ch:?} in string constant \"{literal}\"")]
    InvalidStringChar { ch: char, literal: String },
    #[error("integer constant {0} is out of range 0..=32767")]
    IntegerOutOfRange(String),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display_should_work() {
        let tests = [
            (
                CompileError::Syntax {
                    expected: Expected {
                        typ: TokenType::Symbol,
                        values: vec![",", ";"],
                    },
                    found: Some(Token::new(TokenType::Identifier, "y")),
                },
                "expected <symbol> , | ; </symbol>, found <identifier> y </identifier>",
            ),
            (
                CompileError::Syntax {
                    expected: Expected {
                        typ: TokenType::Identifier,
                        values: vec![],
                    },
                    found: None,
                },
                "expected <identifier>, found end of input",
            ),
            (
                CompileError::ExpectedTerm {
                    found: Some(Token::new(TokenType::Symbol, ";")),
                },
                "expected a term (integerConstant | stringConstant | true | false | null | this | identifier | ( | - | ~), found <symbol> ; </symbol>",
            ),
            (
                CompileError::NestingTooDeep(256),
                "expressions nested deeper than 256 terms",
            ),
            (
                CompileError::UnresolvedName("foo".into()),
                "undeclared identifier `foo`",
            ),
            (
                CompileError::Lex(LexError::UnterminatedString),
                "unterminated string constant",
            ),
        ];

        tests.into_iter().for_each(|(err, expect)| {
            assert_eq!(expect, err.to_string());
        })
    }
}
