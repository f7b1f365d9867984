//! Error types for the QASM frontend.

use thiserror::Error;

/// Errors that can occur during parsing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Invalid token '{text}' on line {line}")]
    Lexer { line: u32, text: String },

    /// Unexpected token.
    #[error("Unexpected token on line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: u32,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// Unsupported OPENQASM version.
    #[error("Unsupported OPENQASM version: {0}")]
    InvalidVersion(String),

    /// Unknown include file.
    #[error("Unknown include '{file}' on line {line}")]
    UnknownInclude { line: u32, file: String },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
