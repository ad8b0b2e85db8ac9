use std::io::{self, BufRead, Write};

use crate::{code::Listing, compiler::CompileError};

pub const PROMPT: &str = "> ";
pub const CONTINUATION: &str = "| ";

/// Collects source lines until a blank line, then compiles the chunk as one
/// compilation unit.
#[derive(Debug, Default)]
pub struct Session {
    buffer: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one line of input. Returns the compile result once a blank line
    /// submits a non-empty chunk.
    pub fn feed(&mut self, line: &str) -> Option<Result<Listing, CompileError>> {
        if line.trim().is_empty() {
            return self.finish();
        }
        self.buffer.push_str(line);
        if !line.ends_with('\n') {
            self.buffer.push('\n');
        }
        None
    }

    /// Submits whatever is buffered, if anything.
    pub fn finish(&mut self) -> Option<Result<Listing, CompileError>> {
        let source = std::mem::take(&mut self.buffer);
        if source.trim().is_empty() {
            return None;
        }
        log::debug!("compiling {} bytes of input", source.len());
        Some(crate::compile(&source))
    }

    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn prompt(&self) -> &'static str {
        if self.is_pending() {
            CONTINUATION
        } else {
            PROMPT
        }
    }
}

/// Writes a listing, or the error that stopped the chunk.
pub fn report<W: Write>(output: &mut W, result: Result<Listing, CompileError>) -> io::Result<()> {
    match result {
        Ok(listing) => write!(output, "{}", listing),
        Err(e) => writeln!(output, "error: {}", e),
    }
}

pub fn repl<R: BufRead, W: Write>(input: R, mut output: W) -> io::Result<()> {
    let mut session = Session::new();

    write!(output, "{}", session.prompt())?;
    output.flush()?;
    for line in input.lines() {
        if let Some(result) = session.feed(&line?) {
            report(&mut output, result)?;
        }
        write!(output, "{}", session.prompt())?;
        output.flush()?;
    }

    if let Some(result) = session.finish() {
        report(&mut output, result)?;
    }
    writeln!(output, "exit")
}
