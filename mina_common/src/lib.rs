//! Shared types used across every stage of the Mina compiler:
//! source positions and spans, diagnostics, and the crate-wide error enum.

pub mod error;
pub mod span;
pub mod diagnostics;

pub use error::*;
pub use span::*;
pub use diagnostics::*;