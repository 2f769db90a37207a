//! MIR generator and textual x86-64 assembly emitter (C6): lowers the
//! out-of-SSA IR `mina_ir` produces to a machine-IR suitable for a simple
//! register-allocator front-end, then prints it as an Intel-syntax listing.
//!
//! `mina_codegen` is the pipeline's final stage — per `spec.md` §1 the real
//! register allocator and assembler proper are external collaborators; here
//! every named value gets its own fixed stack slot (`frame.rs`) rather than
//! being assigned to a scarce set of physical registers, which is the
//! "simple register-allocator" the spec calls for.

pub mod emit;
pub mod frame;
pub mod generator;
pub mod legalize;
pub mod mir;

pub use emit::{compile, emit_program};
pub use frame::StackFrame;
pub use generator::{lower_function, StringPool};
pub use mir::CallingConvention;
