use std::{fmt, ops::Deref};

use strum::Display;

/// VM memory segments addressable by `push`/`pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

/// Zero-operand arithmetic and logical commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Push(Segment, usize),
    Pop(Segment, usize),
    Arithmetic(Command),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: usize },
    Call { name: String, args: usize },
    Return,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment, index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
            Instruction::Arithmetic(cmd) => write!(f, "{}", cmd),
            Instruction::Label(label) => write!(f, "label {}", label),
            Instruction::Goto(label) => write!(f, "goto {}", label),
            Instruction::IfGoto(label) => write!(f, "if-goto {}", label),
            Instruction::Function { name, locals } => write!(f, "function {} {}", name, locals),
            Instruction::Call { name, args } => write!(f, "call {} {}", name, args),
            Instruction::Return => f.write_str("return"),
        }
    }
}

pub fn push(segment: Segment, index: usize) -> Instruction {
    Instruction::Push(segment, index)
}

pub fn pop(segment: Segment, index: usize) -> Instruction {
    Instruction::Pop(segment, index)
}

pub fn label(label: impl Into<String>) -> Instruction {
    Instruction::Label(label.into())
}

pub fn goto(label: impl Into<String>) -> Instruction {
    Instruction::Goto(label.into())
}

pub fn if_goto(label: impl Into<String>) -> Instruction {
    Instruction::IfGoto(label.into())
}

pub fn call(name: impl Into<String>, args: usize) -> Instruction {
    Instruction::Call {
        name: name.into(),
        args,
    }
}

pub fn function(name: impl Into<String>, locals: usize) -> Instruction {
    Instruction::Function {
        name: name.into(),
        locals,
    }
}

/// Looks up the instruction for a binary operator symbol.
///
/// Multiplication and division have no VM opcode and go through the
/// runtime's `Math` routines instead.
pub fn binary(op: &str) -> Option<Instruction> {
    let ins = match op {
        "+" => Instruction::Arithmetic(Command::Add),
        "-" => Instruction::Arithmetic(Command::Sub),
        "&" => Instruction::Arithmetic(Command::And),
        "|" => Instruction::Arithmetic(Command::Or),
        "=" => Instruction::Arithmetic(Command::Eq),
        "<" => Instruction::Arithmetic(Command::Lt),
        ">" => Instruction::Arithmetic(Command::Gt),
        "*" => call("Math.multiply", 2),
        "/" => call("Math.divide", 2),
        _ => return None,
    };
    Some(ins)
}

pub fn unary(op: &str) -> Option<Instruction> {
    match op {
        "-" => Some(Instruction::Arithmetic(Command::Neg)),
        "~" => Some(Instruction::Arithmetic(Command::Not)),
        _ => None,
    }
}

/// The instructions emitted for one class, in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Instructions(Vec<Instruction>);

impl Instructions {
    pub fn push(&mut self, ins: Instruction) {
        self.0.push(ins)
    }
}

impl Deref for Instructions {
    type Target = Vec<Instruction>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Instruction>> for Instructions {
    fn from(value: Vec<Instruction>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|ins| writeln!(f, "{}", ins))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCode {
    pub name: String,
    pub instructions: Instructions,
}

/// The finished output of one compilation unit: every class in source order.
///
/// Renders as one instruction per line with a blank line after each class.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Listing(Vec<ClassCode>);

impl Listing {
    pub fn push(&mut self, class: ClassCode) {
        self.0.push(class)
    }

    pub fn classes(&self) -> &[ClassCode] {
        &self.0
    }

    /// All instructions of the unit, ignoring class boundaries.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.0.iter().flat_map(|class| class.instructions.iter())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|class| writeln!(f, "{}", class.instructions))
    }
}
