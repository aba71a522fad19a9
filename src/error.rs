//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The `Display` form of each variant *is* the user‑facing diagnostic:
//!
//! | Variant            | Rendering                                   |
//! |--------------------|---------------------------------------------|
//! | `Lex`              | `[ 3 ] Error : Unexpected character: #`     |
//! | `Parse`, `Resolve` | `[ 3 ] Error  at 'x': message`              |
//! | `Runtime`          | `message` + newline + `[line 3]`            |
//!
//! The module **does not** print diagnostics itself; the
//! [`Session`](crate::session::Session) owns the diagnostic sink.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[ {line} ] Error : {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is either ` at '<lexeme>'` or
    /// ` at end`.
    #[error("[ {line} ] Error {location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[ {line} ] Error {location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, reported at the line of the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// ` at end` for the EOF token, ` at '<lexeme>'` otherwise.
fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Static errors (lexical, syntactic, resolution) prevent evaluation.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_at_token_and_at_end() {
        let semi = Token::new(TokenType::SEMICOLON, ";", 4);
        let eof = Token::new(TokenType::EOF, "", 9);

        assert_eq!(
            LoxError::parse(&semi, "Expected expression").to_string(),
            "[ 4 ] Error  at ';': Expected expression"
        );
        assert_eq!(
            LoxError::parse(&eof, "Expect '}' after block.").to_string(),
            "[ 9 ] Error  at end: Expect '}' after block."
        );
    }

    #[test]
    fn lex_and_runtime_rendering() {
        assert_eq!(
            LoxError::lex(2, "Unterminated string.").to_string(),
            "[ 2 ] Error : Unterminated string."
        );

        let minus = Token::new(TokenType::MINUS, "-", 1);
        let err = LoxError::runtime(&minus, "Operands must be numbers.");
        assert_eq!(err.to_string(), "Operands must be numbers.\n[line 1]");
        assert!(!err.is_static());
        assert!(LoxError::lex(1, "x").is_static());
    }
}
