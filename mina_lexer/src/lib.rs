//! Lexical analyzer for Mina.
//!
//! Scans Mina source text into a flat token stream. The keyword and
//! punctuation set mirrors the original implementation's `TokenType`
//! enumeration one-for-one (`if/then/else/end`, `repeat/until`, `loop/exit`,
//! `var/func/proc`, `integer/boolean`, `get/put/skip/return`, `:=`, and the
//! full relational/arithmetic/logical operator set).

pub mod token;
pub mod char_stream;
pub mod lexer;

pub use token::*;
pub use char_stream::*;
pub use lexer::*;
