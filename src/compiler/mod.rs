//! Single-pass compiler from class definitions to stack VM instructions.
//!
//! The [`Compiler`] is a recursive-descent parser with two tokens of
//! lookahead. Each grammar rule validates its tokens and emits code right
//! away; no syntax tree is built.

use std::{fmt::Display, str::FromStr};

use crate::{
    code::{self, ClassCode, Instruction, Listing, Segment},
    token::{Keyword, LexError, Token, TokenType},
};

mod error;
pub mod scope;
pub mod symbol_table;
#[cfg_attr(not(feature = "trace"), allow(dead_code))]
pub(crate) mod trace;

pub use error::{CompileError, Expected};
use scope::{ClassScope, Labels, RoutineKind, RoutineScope};
use symbol_table::{Kind, Symbol, SymbolTable};
use trace::trace_rule;

type Result<T> = std::result::Result<T, CompileError>;

const CLASS_VAR_KINDS: &[&str] = &["static", "field"];
const ROUTINE_KINDS: &[&str] = &["constructor", "function", "method"];
const PRIMITIVE_TYPES: &[&str] = &["int", "char", "boolean"];
const KEYWORD_CONSTANTS: &[&str] = &["true", "false", "null", "this"];
const BINARY_OPS: &[&str] = &["+", "-", "*", "/", "&", "|", "<", ">", "="];
const UNARY_OPS: &[&str] = &["-", "~"];

/// Deepest allowed nesting of terms within one expression.
pub const MAX_NESTING: usize = 256;

const STRING_NEW: &str = "String.new";
const STRING_APPEND_CHAR: &str = "String.appendChar";
const MEMORY_ALLOC: &str = "Memory.alloc";

/// Compiles one compilation unit pulled from a token source.
///
/// The engine owns both symbol scopes and the output; it is consumed by
/// [`Compiler::compile`], so one instance compiles exactly one unit.
pub struct Compiler<I> {
    tokens: I,
    current: Option<Token>,
    next: Option<Token>,
    class_table: SymbolTable,
    routine_table: SymbolTable,
    class: ClassScope,
    routine: Option<RoutineScope>,
    labels: Labels,
    listing: Listing,
    depth: usize,
}

impl<I> Compiler<I>
where
    I: Iterator<Item = std::result::Result<Token, LexError>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            current: None,
            next: None,
            class_table: SymbolTable::default(),
            routine_table: SymbolTable::default(),
            class: ClassScope::default(),
            routine: None,
            labels: Labels::default(),
            listing: Listing::default(),
            depth: 0,
        }
    }

    /// Compiles every class in the token stream.
    ///
    /// compilationUnit: classDef*
    pub fn compile(mut self) -> Result<Listing> {
        // load current and next
        self.advance()?;
        self.advance()?;

        while self.current.is_some() {
            self.compile_class()?;
        }
        Ok(self.listing)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.next.take();
        self.next = self.tokens.next().transpose()?;
        Ok(())
    }

    fn current_is(&self, typ: TokenType, value: &str) -> bool {
        self.current.as_ref().is_some_and(|t| t.is(typ, value))
    }

    fn current_in(&self, typ: TokenType, values: &[&str]) -> bool {
        self.current.as_ref().is_some_and(|t| t.matches(typ, values))
    }

    fn next_is(&self, typ: TokenType, value: &str) -> bool {
        self.next.as_ref().is_some_and(|t| t.is(typ, value))
    }

    /// Takes the current token if it has class `typ` and one of `values`
    /// (any value when empty), otherwise fails with a syntax error.
    fn consume(&mut self, typ: TokenType, values: &[&'static str]) -> Result<Token> {
        match self.current.take() {
            Some(tok) if tok.matches(typ, values) => {
                self.advance()?;
                Ok(tok)
            }
            found => Err(CompileError::Syntax {
                expected: Expected {
                    typ,
                    values: values.to_vec(),
                },
                found,
            }),
        }
    }

    fn consume_symbol(&mut self, symbol: &'static str) -> Result<()> {
        self.consume(TokenType::Symbol, &[symbol]).map(|_| ())
    }

    fn consume_keyword<K>(&mut self, values: &[&'static str]) -> Result<K>
    where
        K: FromStr,
        K::Err: Display,
    {
        let tok = self.consume(TokenType::Keyword, values)?;
        tok.literal
            .parse()
            .map_err(|e: K::Err| CompileError::Internal(format!("{}: {}", tok.literal, e)))
    }

    fn consume_identifier(&mut self) -> Result<String> {
        self.consume(TokenType::Identifier, &[]).map(|t| t.literal)
    }

    fn emit(&mut self, ins: Instruction) {
        self.class.instructions.push(ins)
    }

    fn routine(&self) -> Result<&RoutineScope> {
        self.routine
            .as_ref()
            .ok_or_else(|| CompileError::Internal("statement outside of a routine".into()))
    }

    /// Looks `name` up in the routine scope, then the class scope.
    fn resolve(&self, name: &str) -> Option<Symbol> {
        self.routine_table
            .resolve(name)
            .or_else(|| self.class_table.resolve(name))
            .cloned()
    }

    fn lookup(&self, name: &str) -> Result<Symbol> {
        self.resolve(name)
            .ok_or_else(|| CompileError::UnresolvedName(name.to_string()))
    }

    fn starts_term(&self) -> bool {
        self.current.as_ref().is_some_and(|t| match t.typ {
            TokenType::IntegerConstant | TokenType::StringConstant | TokenType::Identifier => true,
            TokenType::Keyword => t.matches(TokenType::Keyword, KEYWORD_CONSTANTS),
            TokenType::Symbol => t.is(TokenType::Symbol, "(") || t.matches(TokenType::Symbol, UNARY_OPS),
        })
    }

    fn push_symbol(&mut self, symbol: &Symbol) {
        self.emit(code::push(symbol.segment(), symbol.index))
    }

    /// class: 'class' className '{' classVarDec* subroutineDec* '}'
    fn compile_class(&mut self) -> Result<()> {
        trace_rule!("class");
        self.consume(TokenType::Keyword, &["class"])?;
        let name = self.consume_identifier()?;
        log::debug!("compiling class {}", name);

        self.class_table.reset();
        self.class = ClassScope::new(name);

        self.consume_symbol("{")?;
        while self.current_in(TokenType::Keyword, CLASS_VAR_KINDS) {
            self.compile_class_var_dec()?;
        }
        while self.current_in(TokenType::Keyword, ROUTINE_KINDS) {
            self.compile_subroutine()?;
        }
        self.consume_symbol("}")?;

        let class = std::mem::take(&mut self.class);
        self.listing.push(ClassCode {
            name: class.name,
            instructions: class.instructions,
        });
        Ok(())
    }

    /// type: 'int' | 'char' | 'boolean' | className
    fn compile_type(&mut self) -> Result<String> {
        let is_keyword = self
            .current
            .as_ref()
            .is_some_and(|t| t.typ == TokenType::Keyword);
        let tok = if is_keyword {
            self.consume(TokenType::Keyword, PRIMITIVE_TYPES)?
        } else {
            self.consume(TokenType::Identifier, &[])?
        };
        Ok(tok.literal)
    }

    /// classVarDec: ('static' | 'field') type varName (',' varName)* ';'
    fn compile_class_var_dec(&mut self) -> Result<()> {
        trace_rule!("classVarDec");
        let kind: Kind = self.consume_keyword(CLASS_VAR_KINDS)?;
        let typ = self.compile_type()?;

        loop {
            let name = self.consume_identifier()?;
            self.class_table.define(name, typ.as_str(), kind);
            if self.consume(TokenType::Symbol, &[",", ";"])?.literal == ";" {
                return Ok(());
            }
        }
    }

    /// subroutineDec: ('constructor' | 'function' | 'method') ('void' | type)
    ///                subroutineName '(' parameterList ')' subroutineBody
    fn compile_subroutine(&mut self) -> Result<()> {
        trace_rule!("subroutineDec");
        self.routine_table.reset();

        let kind: RoutineKind = self.consume_keyword(ROUTINE_KINDS)?;
        let return_type = if self.current_is(TokenType::Keyword, "void") {
            self.consume(TokenType::Keyword, &["void"])?.literal
        } else {
            self.compile_type()?
        };
        let name = self.consume_identifier()?;
        log::debug!("compiling {} {}.{}", kind, self.class.name, name);

        if kind == RoutineKind::Method {
            self.routine_table
                .define("this", self.class.name.as_str(), Kind::Argument);
        }
        self.routine = Some(RoutineScope {
            name,
            kind,
            return_type,
        });

        self.consume_symbol("(")?;
        self.compile_parameter_list()?;
        self.consume_symbol(")")?;
        self.compile_subroutine_body()?;

        self.routine = None;
        Ok(())
    }

    /// parameterList: ((type varName) (',' type varName)*)?
    fn compile_parameter_list(&mut self) -> Result<()> {
        trace_rule!("parameterList");
        if self.current_is(TokenType::Symbol, ")") {
            return Ok(());
        }
        loop {
            let typ = self.compile_type()?;
            let name = self.consume_identifier()?;
            self.routine_table.define(name, typ, Kind::Argument);

            if !self.current_is(TokenType::Symbol, ",") {
                return Ok(());
            }
            self.consume(TokenType::Symbol, &[","])?;
        }
    }

    /// subroutineBody: '{' varDec* statements '}'
    fn compile_subroutine_body(&mut self) -> Result<()> {
        trace_rule!("subroutineBody");
        self.consume_symbol("{")?;

        let mut locals = 0;
        while self.current_is(TokenType::Keyword, "var") {
            locals += self.compile_var_dec()?;
        }

        let routine = self.routine()?;
        let kind = routine.kind;
        let name = format!("{}.{}", self.class.name, routine.name);
        self.emit(code::function(name, locals));

        match kind {
            RoutineKind::Method => {
                // bind the receiver passed as argument 0
                self.emit(code::push(Segment::Argument, 0));
                self.emit(code::pop(Segment::Pointer, 0));
            }
            RoutineKind::Constructor => {
                let size = self.class_table.var_count(Kind::Field);
                self.emit(code::push(Segment::Constant, size));
                self.emit(code::call(MEMORY_ALLOC, 1));
                self.emit(code::pop(Segment::Pointer, 0));
            }
            RoutineKind::Function => {}
        }

        self.compile_statements()?;
        self.consume_symbol("}")
    }

    /// varDec: 'var' type varName (',' varName)* ';'
    ///
    /// Returns the number of names declared.
    fn compile_var_dec(&mut self) -> Result<usize> {
        trace_rule!("varDec");
        self.consume(TokenType::Keyword, &["var"])?;
        let typ = self.compile_type()?;

        let mut count = 0;
        loop {
            let name = self.consume_identifier()?;
            self.routine_table.define(name, typ.as_str(), Kind::Local);
            count += 1;
            if self.consume(TokenType::Symbol, &[",", ";"])?.literal == ";" {
                return Ok(count);
            }
        }
    }

    /// statements: statement*
    fn compile_statements(&mut self) -> Result<()> {
        trace_rule!("statements");
        loop {
            match self.current.as_ref().and_then(Token::keyword) {
                Some(Keyword::Let) => self.compile_let()?,
                Some(Keyword::If) => self.compile_if()?,
                Some(Keyword::While) => self.compile_while()?,
                Some(Keyword::Do) => self.compile_do()?,
                Some(Keyword::Return) => self.compile_return()?,
                _ => return Ok(()),
            }
        }
    }

    /// letStatement: 'let' varName ('[' expression ']')? '=' expression ';'
    fn compile_let(&mut self) -> Result<()> {
        trace_rule!("letStatement");
        self.consume(TokenType::Keyword, &["let"])?;
        let name = self.consume_identifier()?;
        let target = self.lookup(&name)?;

        if self.current_is(TokenType::Symbol, "[") {
            // address of target[index] stays on the stack under the value
            self.push_symbol(&target);
            self.consume_symbol("[")?;
            self.compile_expression()?;
            self.consume_symbol("]")?;
            self.emit(Instruction::Arithmetic(code::Command::Add));

            self.consume_symbol("=")?;
            self.compile_expression()?;
            self.consume_symbol(";")?;

            self.emit(code::pop(Segment::Temp, 0));
            self.emit(code::pop(Segment::Pointer, 1));
            self.emit(code::push(Segment::Temp, 0));
            self.emit(code::pop(Segment::That, 0));
        } else {
            self.consume_symbol("=")?;
            self.compile_expression()?;
            self.consume_symbol(";")?;
            self.emit(code::pop(target.segment(), target.index));
        }
        Ok(())
    }

    /// ifStatement: 'if' '(' expression ')' '{' statements '}'
    ///              ('else' '{' statements '}')?
    fn compile_if(&mut self) -> Result<()> {
        trace_rule!("ifStatement");
        self.consume(TokenType::Keyword, &["if"])?;
        self.consume_symbol("(")?;
        self.compile_expression()?;
        self.consume_symbol(")")?;

        let (if_false, if_true) = self.labels.next_if();
        self.emit(Instruction::Arithmetic(code::Command::Not));
        self.emit(code::if_goto(if_false.as_str()));

        self.consume_symbol("{")?;
        self.compile_statements()?;
        self.consume_symbol("}")?;

        self.emit(code::goto(if_true.as_str()));
        self.emit(code::label(if_false));

        if self.current_is(TokenType::Keyword, "else") {
            self.consume(TokenType::Keyword, &["else"])?;
            self.consume_symbol("{")?;
            self.compile_statements()?;
            self.consume_symbol("}")?;
        }

        self.emit(code::label(if_true));
        Ok(())
    }

    /// whileStatement: 'while' '(' expression ')' '{' statements '}'
    fn compile_while(&mut self) -> Result<()> {
        trace_rule!("whileStatement");
        let (top, exit) = self.labels.next_while();
        self.emit(code::label(top.as_str()));

        self.consume(TokenType::Keyword, &["while"])?;
        self.consume_symbol("(")?;
        self.compile_expression()?;
        self.consume_symbol(")")?;

        self.emit(Instruction::Arithmetic(code::Command::Not));
        self.emit(code::if_goto(exit.as_str()));

        self.consume_symbol("{")?;
        self.compile_statements()?;
        self.consume_symbol("}")?;

        self.emit(code::goto(top));
        self.emit(code::label(exit));
        Ok(())
    }

    /// doStatement: 'do' subroutineCall ';'
    fn compile_do(&mut self) -> Result<()> {
        trace_rule!("doStatement");
        self.consume(TokenType::Keyword, &["do"])?;
        self.compile_subroutine_call()?;
        self.consume_symbol(";")?;

        // every call leaves a value behind
        self.emit(code::pop(Segment::Temp, 0));
        Ok(())
    }

    /// returnStatement: 'return' expression? ';'
    fn compile_return(&mut self) -> Result<()> {
        trace_rule!("returnStatement");
        self.consume(TokenType::Keyword, &["return"])?;
        if self.starts_term() {
            self.compile_expression()?;
        }
        self.consume_symbol(";")?;

        if self.routine()?.returns_void() {
            self.emit(code::push(Segment::Constant, 0));
        }
        self.emit(Instruction::Return);
        Ok(())
    }

    /// expression: term (op term)*
    ///
    /// Operators have no precedence; each is emitted right after its right
    /// operand, strictly left to right.
    fn compile_expression(&mut self) -> Result<()> {
        trace_rule!("expression");
        self.compile_term()?;
        while self.current_in(TokenType::Symbol, BINARY_OPS) {
            let op = self.consume(TokenType::Symbol, BINARY_OPS)?.literal;
            self.compile_term()?;

            let ins = code::binary(&op)
                .ok_or_else(|| CompileError::Internal(format!("unknown binary operator {}", op)))?;
            self.emit(ins);
        }
        Ok(())
    }

    /// term: integerConstant | stringConstant | keywordConstant | varName
    ///       | varName '[' expression ']' | subroutineCall | '(' expression ')'
    ///       | unaryOp term
    ///
    /// Nesting depth is bounded by [`MAX_NESTING`].
    fn compile_term(&mut self) -> Result<()> {
        if self.depth == MAX_NESTING {
            return Err(CompileError::NestingTooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = self.compile_term_body();
        self.depth -= 1;
        result
    }

    fn compile_term_body(&mut self) -> Result<()> {
        trace_rule!("term");
        let Some(typ) = self.current.as_ref().map(|t| t.typ) else {
            return Err(CompileError::ExpectedTerm { found: None });
        };

        match typ {
            TokenType::IntegerConstant => {
                let literal = self.consume(TokenType::IntegerConstant, &[])?.literal;
                let value = literal
                    .parse::<u16>()
                    .ok()
                    .filter(|v| *v <= 32767)
                    .ok_or(CompileError::IntegerOutOfRange(literal))?;
                self.emit(code::push(Segment::Constant, value as usize));
            }
            TokenType::StringConstant => {
                let literal = self.consume(TokenType::StringConstant, &[])?.literal;
                self.compile_string(&literal)?;
            }
            TokenType::Keyword if self.current_in(TokenType::Keyword, KEYWORD_CONSTANTS) => {
                let keyword = self.consume(TokenType::Keyword, KEYWORD_CONSTANTS)?.literal;
                match keyword.as_str() {
                    "true" => {
                        self.emit(code::push(Segment::Constant, 1));
                        self.emit(Instruction::Arithmetic(code::Command::Neg));
                    }
                    "this" => self.emit(code::push(Segment::Pointer, 0)),
                    // false | null
                    _ => self.emit(code::push(Segment::Constant, 0)),
                }
            }
            TokenType::Symbol if self.current_in(TokenType::Symbol, UNARY_OPS) => {
                let op = self.consume(TokenType::Symbol, UNARY_OPS)?.literal;
                self.compile_term()?;
                let ins = code::unary(&op)
                    .ok_or_else(|| CompileError::Internal(format!("unknown unary operator {}", op)))?;
                self.emit(ins);
            }
            TokenType::Symbol if self.current_is(TokenType::Symbol, "(") => {
                self.consume_symbol("(")?;
                self.compile_expression()?;
                self.consume_symbol(")")?;
            }
            TokenType::Identifier => {
                if self.next_is(TokenType::Symbol, "[") {
                    let name = self.consume_identifier()?;
                    let array = self.lookup(&name)?;
                    self.push_symbol(&array);

                    self.consume_symbol("[")?;
                    self.compile_expression()?;
                    self.consume_symbol("]")?;

                    self.emit(Instruction::Arithmetic(code::Command::Add));
                    self.emit(code::pop(Segment::Pointer, 1));
                    self.emit(code::push(Segment::That, 0));
                } else if self.next_is(TokenType::Symbol, "(") || self.next_is(TokenType::Symbol, ".") {
                    self.compile_subroutine_call()?;
                } else {
                    let name = self.consume_identifier()?;
                    let var = self.lookup(&name)?;
                    self.push_symbol(&var);
                }
            }
            _ => {
                return Err(CompileError::ExpectedTerm {
                    found: self.current.take(),
                })
            }
        }
        Ok(())
    }

    /// Builds a string object at run time, one character at a time.
    fn compile_string(&mut self, literal: &str) -> Result<()> {
        if let Some(ch) = literal.chars().find(|c| !(' '..='~').contains(c)) {
            return Err(CompileError::InvalidStringChar {
                ch,
                literal: literal.to_string(),
            });
        }

        self.emit(code::push(Segment::Constant, literal.chars().count()));
        self.emit(code::call(STRING_NEW, 1));
        for ch in literal.chars() {
            self.emit(code::push(Segment::Constant, ch as usize));
            self.emit(code::call(STRING_APPEND_CHAR, 2));
        }
        Ok(())
    }

    /// subroutineCall: subroutineName '(' expressionList ')'
    ///                 | (className | varName) '.' subroutineName '(' expressionList ')'
    fn compile_subroutine_call(&mut self) -> Result<()> {
        trace_rule!("subroutineCall");
        let name = self.consume_identifier()?;

        if self.consume(TokenType::Symbol, &["(", "."])?.literal == "(" {
            // method on the current object
            self.emit(code::push(Segment::Pointer, 0));
            let args = self.compile_expression_list()?;
            self.consume_symbol(")")?;

            let target = format!("{}.{}", self.class.name, name);
            self.emit(code::call(target, args + 1));
            return Ok(());
        }

        // a known variable is a receiver, anything else names a class
        let receiver = self.resolve(&name);
        if let Some(ref object) = receiver {
            self.push_symbol(object);
        }

        let routine = self.consume_identifier()?;
        self.consume_symbol("(")?;
        let args = self.compile_expression_list()?;
        self.consume_symbol(")")?;

        let ins = match receiver {
            Some(object) => code::call(format!("{}.{}", object.typ, routine), args + 1),
            None => code::call(format!("{}.{}", name, routine), args),
        };
        self.emit(ins);
        Ok(())
    }

    /// expressionList: (expression (',' expression)*)?
    ///
    /// Returns the number of expressions.
    fn compile_expression_list(&mut self) -> Result<usize> {
        trace_rule!("expressionList");
        if self.current_is(TokenType::Symbol, ")") {
            return Ok(0);
        }

        let mut count = 0;
        loop {
            self.compile_expression()?;
            count += 1;
            if !self.current_is(TokenType::Symbol, ",") {
                return Ok(count);
            }
            self.consume(TokenType::Symbol, &[","])?;
        }
    }
}
