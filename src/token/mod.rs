use std::fmt;

use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Every character that forms a single-character symbol token.
pub const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum TokenType {
    Keyword,
    Identifier,
    Symbol,
    IntegerConstant,
    StringConstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unknown character {0:?}")]
    UnknownCharacter(char),
    #[error("unterminated string constant")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("integer constant {0} is out of range 0..=32767")]
    IntegerOutOfRange(String),
}

/// A classified token. Equality is structural over class and literal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub typ: TokenType,
    pub literal: String,
}

impl Token {
    pub fn new(typ: TokenType, literal: impl Into<String>) -> Self {
        Self {
            typ,
            literal: literal.into(),
        }
    }

    /// True when the token has class `typ` and, if `values` is non-empty,
    /// its literal is one of `values`.
    pub fn matches(&self, typ: TokenType, values: &[&str]) -> bool {
        self.typ == typ && (values.is_empty() || values.contains(&self.literal.as_str()))
    }

    pub fn is(&self, typ: TokenType, value: &str) -> bool {
        self.typ == typ && self.literal == value
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.typ {
            TokenType::Keyword => self.literal.parse().ok(),
            _ => None,
        }
    }
}

// <label> value </label>, the token listing format of the analyzer
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self.literal.as_str() {
            "<" => "&lt;",
            ">" => "&gt;",
            "\"" => "&quot;",
            "&" => "&amp;",
            other => other,
        };
        write!(f, "<{}> {} </{}>", self.typ, value, self.typ)
    }
}

pub fn lookup_ident(key: impl AsRef<str>) -> Token {
    let key = key.as_ref();
    match key.parse::<Keyword>() {
        Ok(_) => Token::new(TokenType::Keyword, key),
        Err(_) => Token::new(TokenType::Identifier, key),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_should_work() {
        assert_eq!("integerConstant", TokenType::IntegerConstant.to_string());
        assert_eq!("stringConstant", TokenType::StringConstant.as_ref());
        assert_eq!("keyword", TokenType::Keyword.to_string());
        assert_eq!(Token::new(TokenType::Keyword, "class"), lookup_ident("class"));
        assert_eq!(Token::new(TokenType::Keyword, "while"), lookup_ident("while"));
        assert_eq!(
            Token::new(TokenType::Identifier, "Class"),
            lookup_ident("Class")
        );
        assert_eq!(
            Token::new(TokenType::Identifier, "whiles"),
            lookup_ident("whiles")
        );
    }

    #[test]
    fn keyword_should_work() {
        assert_eq!(
            Some(Keyword::Constructor),
            Token::new(TokenType::Keyword, "constructor").keyword()
        );
        assert_eq!(None, Token::new(TokenType::Identifier, "this").keyword());
        assert_eq!("boolean", Keyword::Boolean.as_ref());
    }

    #[test]
    fn matches_should_work() {
        let tok = Token::new(TokenType::Symbol, ";");
        assert!(tok.matches(TokenType::Symbol, &[]));
        assert!(tok.matches(TokenType::Symbol, &[",", ";"]));
        assert!(!tok.matches(TokenType::Symbol, &[","]));
        assert!(!tok.matches(TokenType::Keyword, &[]));
        assert!(tok.is(TokenType::Symbol, ";"));
    }

    #[test]
    fn display_should_escape() {
        let tests = [
            (Token::new(TokenType::Keyword, "class"), "<keyword> class </keyword>"),
            (Token::new(TokenType::Symbol, "<"), "<symbol> &lt; </symbol>"),
            (Token::new(TokenType::Symbol, ">"), "<symbol> &gt; </symbol>"),
            (Token::new(TokenType::Symbol, "&"), "<symbol> &amp; </symbol>"),
            (
                Token::new(TokenType::StringConstant, "hi there"),
                "<stringConstant> hi there </stringConstant>",
            ),
            (
                Token::new(TokenType::IntegerConstant, "42"),
                "<integerConstant> 42 </integerConstant>",
            ),
        ];

        tests.into_iter().for_each(|(tok, expect)| {
            assert_eq!(expect, tok.to_string(), "display of {:?}", tok);
        })
    }
}
