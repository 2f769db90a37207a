//! Mina compiler command-line driver.
//!
//! Two modes per `spec.md` §6.4: file mode (`mina <FILE>`) compiles one
//! source file; bare `mina` reads the whole of stdin until EOF and compiles
//! that. Either way the emitted x86-64 assembly listing goes to stdout,
//! diagnostics go to stderr, and the process exits 0 on success or 1 on any
//! parse/semantic/lowering failure — there is no partial output on failure.

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use std::io::Read;
use std::path::PathBuf;

use mina_cli::config::Target;

/// The Mina ahead-of-time compiler.
#[derive(ClapParser)]
#[command(name = "mina")]
#[command(about = "Ahead-of-time compiler for the Mina language")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Source file to compile. Omit to read from stdin until EOF (REPL mode).
    file: Option<PathBuf>,

    /// Calling convention to lower parameter passing against.
    #[arg(long, value_enum, default_value = "win64")]
    target: Target,

    /// Print the translated SSA IR (post out-of-SSA renaming) to stderr
    /// before emitting assembly, for debugging.
    #[arg(long)]
    emit_ir: bool,

    /// Like `--emit-ir`, but prints the full arena-indexed IR as JSON
    /// instead of the human-readable per-instruction dump — for tooling
    /// that wants to consume the SSA form programmatically.
    #[arg(long)]
    emit_ir_json: bool,

    /// Increase logging verbosity; repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all logging below error level.
    #[arg(short, long, global = true)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let source = read_source(cli.file.as_deref()).context("failed to read source")?;

    if cli.emit_ir || cli.emit_ir_json {
        let registry = mina_cli::translate_and_rename(&source).map_err(|e| anyhow::anyhow!("{e}"))?;
        if cli.emit_ir_json {
            eprintln!("{}", mina_cli::dump_ir_json(&registry).context("failed to serialize IR")?);
        } else {
            eprint!("{}", mina_cli::dump_ir(&registry));
        }
    }

    let asm = mina_cli::compile(&source, cli.target).map_err(|e| anyhow::anyhow!("{e}"))?;
    print!("{asm}");
    Ok(())
}

/// File mode reads the named path; REPL mode (`file: None`) reads stdin to
/// EOF — Mina has no incremental/line-by-line compilation, so the whole
/// accumulated input is compiled once EOF is reached, matching the
/// original driver's stdin behavior.
fn read_source(file: Option<&std::path::Path>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
