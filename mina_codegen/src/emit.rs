//! Textual x86-64 assembly emitter (§6.2). Walks the MIR blocks
//! [`crate::generator`] produces, resolves every named vreg to its stack
//! slot via [`StackFrame`], and prints Intel-syntax assembly into a
//! `String` — no register allocator or separate assembler stage sits
//! between MIR and this text, per the Open Question `DESIGN.md` records.
//!
//! Grounded on `seen_ir/src/simple_codegen.rs`'s `writeln!`-into-`String`
//! shape; the prologue/epilogue and section layout are grounded on
//! `examples/original_source/src/CodeGen.cpp`'s `generateProgram`.

use crate::frame::StackFrame;
use crate::generator::{lower_function, StringPool};
use crate::mir::{CallingConvention, MirBlock, MirInst, MirOperand, PhysReg};
use mina_ir::{rename_out_of_ssa, CallableKind, FunctionRegistry};
use std::fmt::Write as _;

/// Runs the out-of-SSA renamer (C5) over every function, then emits the
/// full program listing. The one entry point `mina_cli` calls after
/// `mina_ir::translate_program` — callers that already renamed (e.g. to
/// inspect the renamed IR separately, as `--emit-ir` does) should call
/// [`emit_program`] directly instead.
pub fn compile(mut registry: FunctionRegistry, conv: CallingConvention) -> String {
    for func in registry.functions.iter_mut() {
        rename_out_of_ssa(func);
    }
    emit_program(&registry, conv)
}

/// Resolves a named vreg to its `[rbp+disp]` stack slot; every other
/// operand form (a physical register, an immediate, an already-concrete
/// memory reference, or a `rip`-relative label) passes through unchanged.
fn resolve(op: &MirOperand, frame: &StackFrame) -> MirOperand {
    match op {
        MirOperand::VReg(name) => {
            let disp = frame
                .scalar_disp(name)
                .unwrap_or_else(|| panic!("no stack slot reserved for `{name}`"));
            MirOperand::Mem { base: PhysReg::Rbp, disp }
        }
        other => other.clone(),
    }
}

/// Renders an operand in its 8-bit form, for `setcc`'s destination and
/// `movzx`'s source — the only two positions that read/write a single byte.
fn render8(op: &MirOperand, frame: &StackFrame) -> String {
    match resolve(op, frame) {
        MirOperand::Phys(r) => r.name8().to_string(),
        MirOperand::Mem { base, disp } => {
            if disp >= 0 {
                format!("BYTE PTR [{}+{}]", base.name64(), disp)
            } else {
                format!("BYTE PTR [{}{}]", base.name64(), disp)
            }
        }
        other => other.to_string(),
    }
}

fn render(op: &MirOperand, frame: &StackFrame) -> String {
    resolve(op, frame).to_string()
}

fn emit_inst(out: &mut String, inst: &MirInst, frame: &StackFrame) {
    match inst {
        MirInst::Mov { dst, src } => {
            let _ = writeln!(out, "    mov {}, {}", render(dst, frame), render(src, frame));
        }
        MirInst::Lea { dst, label } => {
            let _ = writeln!(out, "    lea {}, [rip+{label}]", render(dst, frame));
        }
        MirInst::Call { callee } => {
            let _ = writeln!(out, "    call {callee}");
        }
        MirInst::Add { dst, src } => {
            let _ = writeln!(out, "    add {}, {}", render(dst, frame), render(src, frame));
        }
        MirInst::Sub { dst, src } => {
            let _ = writeln!(out, "    sub {}, {}", render(dst, frame), render(src, frame));
        }
        MirInst::Mul { dst, src } => {
            let _ = writeln!(out, "    imul {}, {}", render(dst, frame), render(src, frame));
        }
        MirInst::Div { divisor } => {
            let _ = writeln!(out, "    idiv {}", render(divisor, frame));
        }
        MirInst::Cqo => {
            let _ = writeln!(out, "    cqo");
        }
        MirInst::Not { dst } => {
            // logical not on a 0/1 value: xor with 1, not the bitwise `not`
            // (§4.1's Not contract: "xor with 1 in MIR").
            let _ = writeln!(out, "    xor {}, 1", render(dst, frame));
        }
        MirInst::And { dst, src } => {
            let _ = writeln!(out, "    and {}, {}", render(dst, frame), render(src, frame));
        }
        MirInst::Or { dst, src } => {
            let _ = writeln!(out, "    or {}, {}", render(dst, frame), render(src, frame));
        }
        MirInst::Cmp { a, b } => {
            let _ = writeln!(out, "    cmp {}, {}", render(a, frame), render(b, frame));
        }
        MirInst::Set { cc, dst } => {
            let _ = writeln!(out, "    set{} {}", crate::mir::set_cc_suffix(*cc), render8(dst, frame));
        }
        MirInst::Movzx { dst, src } => {
            let _ = writeln!(out, "    movzx {}, {}", render(dst, frame), render8(src, frame));
        }
        MirInst::Test { a, b } => {
            let _ = writeln!(out, "    test {}, {}", render(a, frame), render(b, frame));
        }
        MirInst::Jmp { target } => {
            let _ = writeln!(out, "    jmp {target}");
        }
        MirInst::Jz { target } => {
            let _ = writeln!(out, "    jz {target}");
        }
        MirInst::Jnz { target } => {
            let _ = writeln!(out, "    jnz {target}");
        }
        MirInst::Ret => {
            let _ = writeln!(out, "    ret");
        }
        MirInst::Raw(line) => {
            let _ = writeln!(out, "    {line}");
        }
    }
}

fn emit_block(out: &mut String, block: &MirBlock, frame: &StackFrame) {
    let _ = writeln!(out, "{}:", block.name);
    for inst in &block.insts {
        emit_inst(out, inst, frame);
    }
}

/// Emits one callable's full label, prologue, body, epilogue. `Return`
/// already lowers to its own inline `mov rsp, rbp; pop rbp; ret` (the
/// translator never falls off the end of a function without one — see
/// `translate_callable_body`'s synthetic epilogue), so only the entry-side
/// prologue is emitted here.
fn emit_function(out: &mut String, func: &mina_ir::Function, pool: &mut StringPool, conv: CallingConvention) {
    let frame = StackFrame::build(func);
    let blocks = lower_function(func, &frame, pool, conv);

    let _ = writeln!(out, "{}:", func.name);
    let _ = writeln!(out, "    push rbp");
    let _ = writeln!(out, "    mov rbp, rsp");
    let _ = writeln!(out, "    sub rsp, {}", frame.size);

    for block in &blocks {
        emit_block(out, block, &frame);
    }
}

/// Assembles the whole program (§6.2): header directives, `main` (the
/// translated top-level program body) followed by every other declared
/// callable, then the interned string-literal pool and the three fixed
/// format/boolean/newline labels. Expects every function in `registry` to
/// already be out of SSA (see [`compile`], which does both steps).
pub fn emit_program(registry: &FunctionRegistry, conv: CallingConvention) -> String {
    let mut out = String::new();
    let _ = writeln!(out, ".intel_syntax noprefix");
    let _ = writeln!(out, ".globl main");
    let _ = writeln!(out, ".section .text");

    let mut pool = StringPool::default();

    if let Some(main) = registry.get("main") {
        emit_function(&mut out, main, &mut pool, conv);
    }
    for func in &registry.functions {
        if func.name == "main" {
            continue;
        }
        debug_assert!(matches!(func.kind, CallableKind::Procedure | CallableKind::Function));
        emit_function(&mut out, func, &mut pool, conv);
    }

    let _ = writeln!(out, ".section .rodata");
    let _ = writeln!(out, "fmt_str: .string \"%lld\"");
    let _ = writeln!(out, "true_str: .string \"true\"");
    let _ = writeln!(out, "false_str: .string \"false\"");
    let _ = writeln!(out, "newline_str: .string \"\\n\"");
    for (label, text) in &pool.entries {
        let _ = writeln!(out, "{label}: .string \"{}\"", escape_for_asm(text));
    }

    out
}

/// Escapes a Mina string literal's content for a `.string` directive. The
/// lexer has already turned the source's `\n` escape into a real newline
/// character (§4.4 "newline escapes mapped to `'\n'` token"); this reverses
/// that for the assembler, plus the usual `"`/`\` doubling.
fn escape_for_asm(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mina_ir::{rename_out_of_ssa, translate_program};
    use mina_lexer::Lexer;
    use mina_parser::Parser;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src, 0).tokenize().expect("lex");
        let program = Parser::new(tokens).parse_program().expect("parse");
        let mut registry = translate_program(&program).expect("translate");
        for func in registry.functions.iter_mut() {
            rename_out_of_ssa(func);
        }
        emit_program(&registry, CallingConvention::default())
    }

    #[test]
    fn emits_required_header_directives_and_sections() {
        let asm = compile("{ var x : integer; get(x); put(x, skip) }");
        assert!(asm.starts_with(".intel_syntax noprefix\n"));
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("fmt_str: .string \"%lld\""));
        assert!(asm.contains("newline_str: .string \"\\n\""));
    }

    #[test]
    fn no_mov_or_cmp_has_two_memory_operands() {
        let asm = compile("{ var a : integer; var b : integer; a := 2 * (3 + 4); b := a + a; put(b, skip) }");
        for line in asm.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("mov ").or_else(|| line.strip_prefix("cmp ")) {
                let mem_operands = rest.matches('[').count();
                assert!(mem_operands <= 1, "two-memory-operand instruction emitted: {line}");
            }
        }
    }

    #[test]
    fn stack_decrement_is_a_multiple_of_16() {
        let asm = compile("{ var a[3] : integer; a[0] := 10; put(a[0], skip) }");
        let sub_line = asm.lines().find(|l| l.trim().starts_with("sub rsp,")).expect("has sub rsp");
        let n: u32 = sub_line.trim().trim_start_matches("sub rsp,").trim().parse().unwrap();
        assert_eq!(n % 16, 0);
    }

    #[test]
    fn function_call_scenario_emits_both_labels_and_win64_arg_register() {
        let asm = compile("{ integer func sq(x:integer) = x * x; put(sq(6), skip) }");
        assert!(asm.contains("sq:"));
        assert!(asm.contains("call sq"));
        assert!(asm.contains("mov rcx,"));
    }

    #[test]
    fn string_literal_and_skip_scenario_emits_pos_literal_pool_entry() {
        let asm = compile(
            "{ var n : integer; get(n); if n > 0 then put(\"pos\", skip) else put(\"neg\", skip) end if }",
        );
        assert!(asm.contains("literal0: .string \"pos\""));
        assert!(asm.contains("literal1: .string \"neg\""));
    }
}
