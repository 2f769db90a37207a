//! Compile-time options for the Mina driver — no project manifest, no
//! persisted state (`spec.md` §6.4: "No environment variables or persisted
//! state"), just the handful of flags a single-file AOT compiler needs.

use mina_codegen::CallingConvention;

/// `--target {sysv,win64}` — the integer argument-passing convention
/// `spec.md` §1 says is "selectable for arguments". Parsed from `clap`'s
/// `ValueEnum` derive in `main.rs` and converted here to the codegen crate's
/// own `CallingConvention`, keeping `mina_codegen` free of any CLI/clap
/// dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Target {
    #[default]
    Win64,
    SysV,
}

impl From<Target> for CallingConvention {
    fn from(t: Target) -> Self {
        match t {
            Target::Win64 => CallingConvention::Win64,
            Target::SysV => CallingConvention::SysV,
        }
    }
}
