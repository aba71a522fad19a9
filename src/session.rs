//! A running interpreter together with its output sinks and error flags.
//!
//! One `Session` lives for a whole script or REPL.  Globals, the resolution
//! table and the expression‑id counter all survive between [`Session::run`]
//! calls, so later REPL lines can use what earlier ones defined.

use std::io::{self, Write};
use std::thread;

use log::{debug, info, warn};

use crate::error::LoxError;
use crate::interpreter::{Clock, Interpreter};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Stack reserved for the thread that runs a session.  Only the pages the
/// interpreter actually recurses into get committed.
pub const SESSION_STACK_SIZE: usize = 512 * 1024 * 1024;

/// Run `task` on its own thread with [`SESSION_STACK_SIZE`] bytes of stack
/// and wait for its result.  The interpreter's depth limits assume this
/// stack; the 8 MiB of a process main thread is not enough for them.
pub fn on_session_stack<T, F>(task: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    debug!("Spawning session thread with {} byte stack", SESSION_STACK_SIZE);

    thread::Builder::new()
        .name("rox-session".to_string())
        .stack_size(SESSION_STACK_SIZE)
        .spawn(task)?
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "session thread panicked"))
}

/// Outcome of running one piece of source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Completed,
    /// Lexical, syntax or resolution errors; nothing was executed.
    StaticError,
    RuntimeError,
}

impl Status {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Completed => 0,
            Status::StaticError => 64,
            Status::RuntimeError => 70,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
    diagnostics: Box<dyn Write>,
    next_id: usize,
    had_error: bool,
    had_runtime_error: bool,
}

impl Session {
    /// Program output goes to `out`, error reports to `diagnostics`.
    pub fn new(out: Box<dyn Write>, diagnostics: Box<dyn Write>) -> Self {
        Self::from_interpreter(Interpreter::new(out), diagnostics)
    }

    /// Like [`Session::new`] with `clock()` answered by `clock`.
    pub fn with_clock(out: Box<dyn Write>, diagnostics: Box<dyn Write>, clock: Clock) -> Self {
        Self::from_interpreter(Interpreter::with_clock(out, clock), diagnostics)
    }

    fn from_interpreter(interpreter: Interpreter, diagnostics: Box<dyn Write>) -> Self {
        info!("Session created");

        Session {
            interpreter,
            diagnostics,
            next_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn set_repl(&mut self, repl: bool) {
        self.interpreter.set_repl(repl);
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Forget earlier errors; the REPL calls this before each line.
    pub fn reset_error(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Scan, parse, resolve and execute `source`.  Static diagnostics are
    /// written in phase order (lexical, syntax, resolution) and any of them
    /// prevents execution.
    pub fn run(&mut self, source: &str) -> Status {
        info!("Session run over {} byte(s) of source", source.len());

        let (tokens, lex_errors) = scan_tokens(source);
        self.report_all(&lex_errors);

        let mut parser = Parser::with_first_id(&tokens, self.next_id);
        let parsed = parser.parse();
        self.next_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(&errors);
                return Status::StaticError;
            }
        };

        if !lex_errors.is_empty() {
            return Status::StaticError;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.report_all(&errors);
            return Status::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Status::Completed,
            Err(error) => {
                self.report(&error);
                Status::RuntimeError
            }
        }
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.report(error);
        }
    }

    fn report(&mut self, error: &LoxError) {
        debug!("Reporting diagnostic: {}", error);

        if error.is_static() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        let written = writeln!(self.diagnostics, "{}", error).and_then(|()| self.diagnostics.flush());
        if let Err(e) = written {
            warn!("Could not write diagnostic: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent() -> Session {
        Session::new(Box::new(std::io::sink()), Box::new(std::io::sink()))
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Status::Completed.exit_code(), 0);
        assert_eq!(Status::StaticError.exit_code(), 64);
        assert_eq!(Status::RuntimeError.exit_code(), 70);
    }

    #[test]
    fn flags_follow_outcomes() {
        let mut session = silent();

        assert_eq!(session.run("var a = 1;"), Status::Completed);
        assert!(!session.had_error() && !session.had_runtime_error());

        assert_eq!(session.run("var = ;"), Status::StaticError);
        assert!(session.had_error());

        session.reset_error();
        assert_eq!(session.run("a();"), Status::RuntimeError);
        assert!(session.had_runtime_error() && !session.had_error());

        session.reset_error();
        assert!(!session.had_runtime_error());
    }

    #[test]
    fn lexical_errors_prevent_execution() {
        let mut session = silent();
        assert_eq!(session.run("print 1; @"), Status::StaticError);
    }

    #[test]
    fn locals_resolved_in_earlier_runs_stay_valid() {
        let mut session = silent();

        assert_eq!(
            session.run("fun make() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }"),
            Status::Completed
        );
        assert_eq!(session.run("var c = make(); c();"), Status::Completed);
        // Different nesting at the same position must not reuse old depths.
        assert_eq!(session.run("{ var x = 1; { print x; } }"), Status::Completed);
        assert_eq!(session.run("c();"), Status::Completed);
    }
}
