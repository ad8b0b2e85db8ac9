use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use rustyline::{error::ReadlineError, DefaultEditor};

use jackc::{
    code::Listing,
    lexer::Lexer,
    repl::{self, Session},
    token::Token,
};

#[derive(ClapParser, Debug)]
#[command(author, version, long_version = env!("JACKC_LONG_VERSION"), about, long_about = None)]
struct Cli {
    /// Source files, each compiled as its own unit (REPL if none)
    #[arg(required = false)]
    files: Vec<PathBuf>,

    /// Write one `<Class>.vm` file per class into this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Print the token stream as XML instead of compiling
    #[arg(long)]
    tokens: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.files.is_empty() {
        println!("Welcome to jackc! Enter a blank line to compile.");
        return run_repl();
    }

    for path in &cli.files {
        let source =
            fs::read_to_string(path).with_context(|| format!("can not read {}", path.display()))?;

        if cli.tokens {
            print_tokens(&source).with_context(|| format!("failed to tokenize {}", path.display()))?;
            continue;
        }

        log::info!("compiling {}", path.display());
        let listing =
            jackc::compile(&source).with_context(|| format!("failed to compile {}", path.display()))?;

        match &cli.out_dir {
            Some(dir) => write_classes(dir, &listing)?,
            None => print!("{}", listing),
        }
    }
    Ok(())
}

fn print_tokens(source: &str) -> Result<()> {
    let tokens = Lexer::new(source).collect::<Result<Vec<Token>, _>>()?;

    let mut out = io::stdout().lock();
    writeln!(out, "<tokens>")?;
    for token in tokens {
        writeln!(out, "{}", token)?;
    }
    writeln!(out, "</tokens>")?;
    Ok(())
}

fn write_classes(dir: &Path, listing: &Listing) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("can not create {}", dir.display()))?;

    for class in listing.classes() {
        let path = dir.join(format!("{}.vm", class.name));
        fs::write(&path, class.instructions.to_string())
            .with_context(|| format!("can not write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn run_repl() -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut session = Session::new();

    loop {
        match rl.readline(session.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    rl.add_history_entry(line.as_str())?;
                }
                if let Some(result) = session.feed(&line) {
                    repl::report(&mut io::stdout(), result)?;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                if let Some(result) = session.finish() {
                    repl::report(&mut io::stdout(), result)?;
                }
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!("exit");
    Ok(())
}
