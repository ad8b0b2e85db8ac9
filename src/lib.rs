//! Compiler for a small class-based language targeting a stack VM.
//!
//! ```
//! let listing = jackc::compile("class Main { function void main() { return; } }").unwrap();
//! assert_eq!("function Main.main 0\npush constant 0\nreturn\n\n", listing.to_string());
//! ```

pub mod code;
pub mod compiler;
pub mod lexer;
pub mod repl;
pub mod token;

pub use code::{ClassCode, Instruction, Listing};
pub use compiler::{CompileError, Compiler};
pub use lexer::Lexer;
pub use token::{LexError, Token, TokenType};

/// Lexes and compiles one compilation unit.
pub fn compile(source: &str) -> Result<Listing, CompileError> {
    Compiler::new(Lexer::new(source)).compile()
}

/// Compiles an already classified token stream as one compilation unit.
pub fn compile_tokens<T>(tokens: T) -> Result<Listing, CompileError>
where
    T: IntoIterator<Item = Token>,
{
    Compiler::new(tokens.into_iter().map(Ok::<Token, LexError>)).compile()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compile_tokens_should_match_compile() {
        let input = "class Main { function int one() { return 1; } }";
        let tokens: Vec<Token> = Lexer::new(input).collect::<Result<_, _>>().unwrap();

        assert_eq!(compile(input), compile_tokens(tokens));
    }

    #[test]
    fn compile_tokens_should_check_integer_range() {
        let tokens = [
            (TokenType::Keyword, "class"),
            (TokenType::Identifier, "A"),
            (TokenType::Symbol, "{"),
            (TokenType::Keyword, "function"),
            (TokenType::Keyword, "int"),
            (TokenType::Identifier, "f"),
            (TokenType::Symbol, "("),
            (TokenType::Symbol, ")"),
            (TokenType::Symbol, "{"),
            (TokenType::Keyword, "return"),
            (TokenType::IntegerConstant, "32768"),
            (TokenType::Symbol, ";"),
            (TokenType::Symbol, "}"),
            (TokenType::Symbol, "}"),
        ]
        .map(|(typ, literal)| Token::new(typ, literal));

        assert_eq!(
            Err(CompileError::IntegerOutOfRange("32768".into())),
            compile_tokens(tokens.clone())
        );

        let mut tokens = tokens.to_vec();
        tokens[10] = Token::new(TokenType::IntegerConstant, "32767");
        let listing = compile_tokens(tokens).unwrap();
        assert_eq!(
            Some("push constant 32767".to_string()),
            listing.instructions().nth(1).map(ToString::to_string)
        );
    }
}
