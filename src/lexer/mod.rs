use crate::token::{lookup_ident, LexError, Token, TokenType, SYMBOLS};

const MAX_INT: u16 = 32767;

/// Splits source text into classified tokens, dropping whitespace and comments.
///
/// The lexer is pull-based: each call to `next` scans exactly one token. After
/// the first error it yields `None`.
#[derive(Default)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            ..Default::default()
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek_char().is_some_and(&pred) {
            self.read_char();
        }
        &self.input[start..self.pos]
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                // a comment goes until the end of the line
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(LexError::UnterminatedComment),
                }
            } else if self.peek_char().is_some_and(char::is_whitespace) {
                self.read_while(char::is_whitespace);
            } else {
                return Ok(());
            }
        }
    }

    fn is_identifier(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_'
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        // opening quote
        self.read_char();
        let rest = self.rest();
        match rest.find(|c: char| c == '"' || c == '\n') {
            Some(end) if rest[end..].starts_with('"') => {
                self.pos += end + 1;
                Ok(rest[..end].to_string())
            }
            _ => Err(LexError::UnterminatedString),
        }
    }

    fn read_number(&mut self) -> Result<String, LexError> {
        let literal = self.read_while(|c| c.is_ascii_digit());
        match literal.parse::<u16>() {
            Ok(value) if value <= MAX_INT => Ok(literal.to_string()),
            _ => Err(LexError::IntegerOutOfRange(literal.to_string())),
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia()?;

        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        let tok = match ch {
            '"' => Token::new(TokenType::StringConstant, self.read_string()?),
            c if SYMBOLS.contains(c) => {
                self.read_char();
                Token::new(TokenType::Symbol, c.to_string())
            }
            c if c.is_ascii_digit() => Token::new(TokenType::IntegerConstant, self.read_number()?),
            c if c.is_ascii_alphabetic() || c == '_' => {
                lookup_ident(self.read_while(Self::is_identifier))
            }
            other => return Err(LexError::UnknownCharacter(other)),
        };
        Ok(Some(tok))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(Some(tok)) => Some(Ok(tok)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
