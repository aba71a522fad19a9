use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::line_reader::{LineReadStatus, LineReader};
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::session::{on_session_stack, Session, Status};

const HISTORY_FILE: &str = ".rox_history";

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// Script to run; starts a REPL when omitted
    #[arg(value_name = "script")]
    scripts: Vec<PathBuf>,

    /// Write a debug log to rox.log
    #[arg(long)]
    log: bool,

    /// Print the token stream of the script instead of running it
    #[arg(long, conflicts_with = "parse")]
    tokenize: bool,

    /// With --tokenize, print one JSON object per token
    #[arg(long, requires = "tokenize")]
    json: bool,

    /// Print the S-expression form of the parsed program instead of running it
    #[arg(long)]
    parse: bool,
}

/// Reads a script into a String.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).with_context(|| format!("{:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

/// `--tokenize`: one token per line, diagnostics interleaved on stderr.
fn tokenize(source: &str, json: bool) -> Result<i32> {
    info!("Tokenizing");
    let mut ok = true;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for item in Scanner::new(source) {
        match item {
            Ok(token) if json => writeln!(out, "{}", serde_json::to_string(&token)?)?,
            Ok(token) => writeln!(out, "{}", token)?,
            Err(e) => {
                ok = false;
                debug!("Tokenization debug: {}", e);
                out.flush()?;
                eprintln!("{}", e);
            }
        }
    }

    Ok(if ok { 0 } else { 65 })
}

/// `--parse`: one S-expression per top-level statement.
fn parse(source: &str) -> Result<i32> {
    info!("Parsing");
    let (tokens, lex_errors) = scan_tokens(source);
    for e in &lex_errors {
        eprintln!("{}", e);
    }

    match Parser::new(&tokens).parse() {
        Ok(statements) if lex_errors.is_empty() => {
            println!("{}", AstPrinter::print_program(&statements));
            Ok(0)
        }
        Ok(_) => Ok(65),
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            Ok(65)
        }
    }
}

fn run_file(path: &Path) -> Result<i32> {
    let source = read_file(path)?;

    let mut session = Session::new(Box::new(io::stdout()), Box::new(io::stderr()));
    let status: Status = session.run(&source);

    info!("Script finished with {:?}", status);
    Ok(status.exit_code())
}

fn run_prompt() -> Result<i32> {
    info!("Starting REPL");

    let mut reader = LineReader::new(HISTORY_FILE, "> ").context("Failed to start line editor")?;
    let mut session = Session::new(Box::new(io::stdout()), Box::new(io::stderr()));
    session.set_repl(true);

    while let LineReadStatus::Line(line) = reader.readline() {
        let status: Status = session.run(&line);
        debug!("REPL line finished with {:?}", status);
        session.reset_error();
    }

    info!("REPL closed");
    Ok(0)
}

/// Picks the mode from the arguments and returns the process exit code.
fn dispatch(args: Cli) -> Result<i32> {
    let code: i32 = match args.scripts.as_slice() {
        [] if args.tokenize || args.parse => {
            eprintln!("Usage: lox [script]");
            64
        }
        [] => run_prompt()?,
        [script] if args.tokenize => tokenize(&read_file(script)?, args.json)?,
        [script] if args.parse => parse(&read_file(script)?)?,
        [script] => run_file(script)?,
        _ => {
            println!("Usage: lox [script]");
            64
        }
    };

    Ok(code)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 =
        on_session_stack(move || dispatch(args)).context("Failed to run the interpreter thread")??;

    debug!("Exiting with code {}", code);
    process::exit(code);
}
