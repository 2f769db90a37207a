//! Crate-wide error type for the Mina compiler.
//!
//! The taxonomy follows the error handling design in the specification:
//! lex/parse errors, semantic errors (redeclaration, use-before-declaration,
//! type mismatch, arity mismatch, wrong kind), lowering errors (arity > 4,
//! `return` outside a function, duplicate `Alloca`, unknown variable), and an
//! internal-invariant category for bugs in the compiler itself (a violated
//! SSA or renaming invariant is never a user-facing error).

use crate::Span;
use thiserror::Error;

/// The umbrella error type returned across crate boundaries.
#[derive(Error, Debug, Clone)]
pub enum MinaError {
    #[error("lex error at {span}: {message}")]
    Lex { message: String, span: Span },

    #[error("parse error at {span}: {message}")]
    Parse { message: String, span: Span },

    #[error("semantic error at {span}: {message}")]
    Semantic { message: String, span: Span },

    #[error("lowering error: {message}")]
    Lowering { message: String },

    #[error("internal compiler error: {message}")]
    Internal { message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

pub type MinaResult<T> = Result<T, MinaError>;

impl MinaError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex { message: message.into(), span }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse { message: message.into(), span }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic { message: message.into(), span }
    }

    pub fn lowering(message: impl Into<String>) -> Self {
        Self::Lowering { message: message.into() }
    }

    /// An invariant the compiler itself is responsible for upholding was
    /// violated. Never triggered by ill-formed Mina source; a report of this
    /// kind is a bug in the translator, SSA builder, or renamer.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

impl From<std::io::Error> for MinaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
