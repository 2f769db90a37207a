//! MIR generator (C6): reverse-postorder CFG linearization plus the
//! per-`InstKind` lowering table of §4.6, producing one [`MirBlock`] per SSA
//! block.
//!
//! Grounded on `examples/original_source/src/CodeGen.cpp`'s per-`InstType`
//! `switch` (the `mov rax, ...`/`mov ..., rax` bridging sequences it repeats
//! at every arithmetic and comparison site are exactly what
//! [`crate::legalize`] centralizes); the RPO walk itself is grounded on
//! `seen_ir/src/simple_codegen.rs`'s block-ordering pass, generalized from a
//! flat function to the CFG's explicit successor lists.

use crate::frame::StackFrame;
use crate::legalize::{legalize_cmp, legalize_mov};
use crate::mir::{CallingConvention, ConditionCode, MirBlock, MirInst, MirOperand, PhysReg};
use mina_ir::{BlockId, Function, InstId, InstKind, PutArgKind};
use std::collections::HashSet;

/// String literals interned during lowering, in first-use order: `literal0`,
/// `literal1`, … per §4.6's "Put (string literal)" row. Newline and format
/// strings are not included here — those three are fixed labels emitted
/// once per program by [`crate::emit`].
#[derive(Debug, Default)]
pub struct StringPool {
    pub entries: Vec<(String, String)>,
}

impl StringPool {
    fn intern(&mut self, text: &str) -> String {
        if let Some((label, _)) = self.entries.iter().find(|(_, t)| t == text) {
            return label.clone();
        }
        let label = format!("literal{}", self.entries.len());
        self.entries.push((label.clone(), text.to_string()));
        label
    }
}

/// Post-order DFS from `entry`, visiting each block's successors in reverse
/// so the first-appended successor is visited first, then reversed to
/// obtain RPO (§4.6 "Linearization"). A terminal block (its last instruction
/// is `Return`) contributes no successors of its own to the walk, matching
/// the spec's "terminal blocks ... detached from their outgoing edges".
fn reverse_postorder(func: &Function) -> Vec<BlockId> {
    let mut visited = HashSet::new();
    let mut postorder = Vec::new();

    fn visit(func: &Function, block: BlockId, visited: &mut HashSet<BlockId>, postorder: &mut Vec<BlockId>) {
        if !visited.insert(block) {
            return;
        }
        let terminal = func
            .block(block)
            .insts
            .last()
            .map(|&id| matches!(func.inst(id).kind, InstKind::Return))
            .unwrap_or(false);
        if !terminal {
            for &succ in func.block(block).succs.iter().rev() {
                visit(func, succ, visited, postorder);
            }
        }
        postorder.push(block);
    }

    visit(func, func.entry, &mut visited, &mut postorder);
    postorder.reverse();
    postorder
}

/// Lowers every block of `func` (already out-of-SSA) to MIR, in RPO.
/// `func.name` becomes the label emitted by [`crate::emit`]; parameter and
/// return-value handling follow the Win64 integer convention of §4.6.
pub fn lower_function(func: &Function, frame: &StackFrame, pool: &mut StringPool, conv: CallingConvention) -> Vec<MirBlock> {
    let order = reverse_postorder(func);
    let mut out = Vec::with_capacity(order.len());

    for block_id in order {
        let block = func.block(block_id);
        let mut mir = MirBlock::new(block.name.clone());
        for &id in &block.insts {
            lower_inst(func, func.inst(id), frame, pool, &mut mir, conv);
        }
        out.push(mir);
    }
    out
}

/// Resolves an operand instruction to its MIR source location: an immediate
/// for constants, a named vreg (i.e. its stack slot, via `frame.rs`)
/// otherwise.
fn operand_source(func: &Function, id: InstId) -> MirOperand {
    let inst = func.inst(id);
    match &inst.kind {
        InstKind::IntConst(n) => MirOperand::Imm(*n),
        InstKind::BoolConst(b) => MirOperand::Imm(if *b { 1 } else { 0 }),
        _ => {
            let name = inst.target.clone().unwrap_or_else(|| format!("_unnamed{}", id.0));
            MirOperand::VReg(name)
        }
    }
}

/// Array-address rematerialization (§4.6): recomputes `arr[idx]`'s address
/// into `rax` fresh at every use rather than holding it across a call. A
/// constant index folds into a single `lea`; a dynamic one is scaled and
/// negated first since x86 addressing has no subtracted-register form.
fn resolve_array_address(func: &Function, frame: &StackFrame, arr_id: InstId, idx_id: InstId, mir: &mut MirBlock) -> MirOperand {
    let arr_name = func.inst(arr_id).target.clone().expect("array value must be named");
    let slot = frame.array_slot(&arr_name).expect("array must have a reserved slot");

    match &func.inst(idx_id).kind {
        InstKind::IntConst(n) => {
            let disp = slot.base_disp - (*n as i32) * 8;
            mir.push(MirInst::Raw(format!("lea rax, [rbp{:+}]", disp)));
        }
        _ => {
            let idx_src = operand_source(func, idx_id);
            legalize_mov(mir, MirOperand::Phys(PhysReg::Rax), idx_src);
            mir.push(MirInst::Raw("lea rax, [rax*8]".to_string()));
            mir.push(MirInst::Raw("neg rax".to_string()));
            mir.push(MirInst::Raw(format!("lea rax, [rbp+rax{:+}]", slot.base_disp)));
        }
    }
    MirOperand::Mem { base: PhysReg::Rax, disp: 0 }
}

fn lower_inst(
    func: &Function,
    inst: &mina_ir::Instruction,
    frame: &StackFrame,
    pool: &mut StringPool,
    mir: &mut MirBlock,
    conv: CallingConvention,
) {
    let target_vreg = |name: &str| MirOperand::VReg(name.to_string());

    match &inst.kind {
        // Constants and string/bool literals carry no MIR of their own —
        // they're materialized at the point a `Put`, arithmetic op, etc.
        // consumes them via `operand_source`.
        InstKind::IntConst(_) | InstKind::BoolConst(_) | InstKind::StrConst(_) | InstKind::Undef | InstKind::Noop => {}

        InstKind::Ident => {} // function parameters: already placed by FuncSignature

        InstKind::FuncSignature { .. } => {
            let regs = conv.param_regs();
            for (i, (name, _)) in func.params.iter().enumerate().take(4) {
                mir.push(MirInst::Mov { dst: target_vreg(name), src: MirOperand::Phys(regs[i]) });
            }
        }

        InstKind::Assign => {
            let src = operand_source(func, inst.operands[0]);
            let dst = target_vreg(inst.target.as_deref().expect("Assign always has a target"));
            legalize_mov(mir, dst, src);
        }

        InstKind::Add | InstKind::Sub | InstKind::Mul => {
            let op1 = operand_source(func, inst.operands[0]);
            let op2 = operand_source(func, inst.operands[1]);
            let dst = target_vreg(inst.target.as_deref().unwrap());
            legalize_mov(mir, dst.clone(), op1);
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rdx), src: op2 });
            let rhs = MirOperand::Phys(PhysReg::Rdx);
            match inst.kind {
                InstKind::Add => mir.push(MirInst::Add { dst, src: rhs }),
                InstKind::Sub => mir.push(MirInst::Sub { dst, src: rhs }),
                InstKind::Mul => mir.push(MirInst::Mul { dst, src: rhs }),
                _ => unreachable!(),
            }
        }

        InstKind::Div => {
            let op1 = operand_source(func, inst.operands[0]);
            let op2 = operand_source(func, inst.operands[1]);
            let dst = target_vreg(inst.target.as_deref().unwrap());
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rax), src: op1 });
            mir.push(MirInst::Cqo);
            let scratch = MirOperand::Mem { base: PhysReg::Rbp, disp: frame.div_scratch_disp() };
            legalize_mov(mir, scratch.clone(), op2);
            mir.push(MirInst::Div { divisor: scratch });
            mir.push(MirInst::Mov { dst, src: MirOperand::Phys(PhysReg::Rax) });
        }

        InstKind::Not => {
            let src = operand_source(func, inst.operands[0]);
            let dst = target_vreg(inst.target.as_deref().unwrap());
            legalize_mov(mir, dst.clone(), src);
            mir.push(MirInst::Not { dst });
        }

        InstKind::And | InstKind::Or => {
            let op1 = operand_source(func, inst.operands[0]);
            let op2 = operand_source(func, inst.operands[1]);
            let dst = target_vreg(inst.target.as_deref().unwrap());
            legalize_mov(mir, dst.clone(), op1);
            match inst.kind {
                InstKind::And => mir.push(MirInst::And { dst, src: op2 }),
                InstKind::Or => mir.push(MirInst::Or { dst, src: op2 }),
                _ => unreachable!(),
            }
        }

        InstKind::CmpEq | InstKind::CmpNe | InstKind::CmpLt | InstKind::CmpLte | InstKind::CmpGt | InstKind::CmpGte => {
            let op1 = operand_source(func, inst.operands[0]);
            let op2 = operand_source(func, inst.operands[1]);
            let dst = target_vreg(inst.target.as_deref().unwrap());
            legalize_cmp(mir, op1, op2);
            let cc = match inst.kind {
                InstKind::CmpEq => ConditionCode::Eq,
                InstKind::CmpNe => ConditionCode::Ne,
                InstKind::CmpLt => ConditionCode::Lt,
                InstKind::CmpLte => ConditionCode::Le,
                InstKind::CmpGt => ConditionCode::Gt,
                InstKind::CmpGte => ConditionCode::Ge,
                _ => unreachable!(),
            };
            mir.push(MirInst::Set { cc, dst: MirOperand::Phys(PhysReg::Rax) });
            mir.push(MirInst::Movzx { dst: MirOperand::Phys(PhysReg::Rax), src: MirOperand::Phys(PhysReg::Rax) });
            legalize_mov(mir, dst, MirOperand::Phys(PhysReg::Rax));
        }

        InstKind::Alloca { .. } => {} // slot reserved statically by `frame.rs`

        InstKind::ArrAccess => {
            let addr = resolve_array_address(func, frame, inst.operands[0], inst.operands[1], mir);
            let dst = target_vreg(inst.target.as_deref().unwrap());
            legalize_mov(mir, dst, addr);
        }

        InstKind::ArrUpdate => {
            // `addr` pins the element address in `rax`; staging `value`
            // through `rdx` rather than `legalize_mov` keeps the store from
            // clobbering that address when `value` is itself memory (see
            // `legalize_mov`'s both-memory path, which bridges through `rax`).
            let addr = resolve_array_address(func, frame, inst.operands[0], inst.operands[1], mir);
            let value = operand_source(func, inst.operands[2]);
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rdx), src: value });
            mir.push(MirInst::Mov { dst: addr, src: MirOperand::Phys(PhysReg::Rdx) });
        }

        InstKind::Jump { target } => {
            mir.push(MirInst::Jmp { target: func.block(*target).name.clone() });
        }

        InstKind::Brt { succ, fail } => {
            let cond = operand_source(func, inst.operands[0]);
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rax), src: cond });
            mir.push(MirInst::Test { a: MirOperand::Phys(PhysReg::Rax), b: MirOperand::Phys(PhysReg::Rax) });
            mir.push(MirInst::Jnz { target: func.block(*succ).name.clone() });
            mir.push(MirInst::Jmp { target: func.block(*fail).name.clone() });
        }

        InstKind::Brf { succ, fail } => {
            let cond = operand_source(func, inst.operands[0]);
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rax), src: cond });
            mir.push(MirInst::Test { a: MirOperand::Phys(PhysReg::Rax), b: MirOperand::Phys(PhysReg::Rax) });
            mir.push(MirInst::Jz { target: func.block(*succ).name.clone() });
            mir.push(MirInst::Jmp { target: func.block(*fail).name.clone() });
        }

        InstKind::Put(PutArgKind::Newline) => {
            mir.push(MirInst::Lea { dst: MirOperand::Phys(PhysReg::Rcx), label: "newline_str".to_string() });
            mir.push(MirInst::Call { callee: "printf".to_string() });
        }

        InstKind::Put(PutArgKind::Value) => {
            let arg = inst.operands[0];
            match &func.inst(arg).kind {
                InstKind::StrConst(text) => {
                    let label = pool.intern(text);
                    mir.push(MirInst::Lea { dst: MirOperand::Phys(PhysReg::Rcx), label });
                    mir.push(MirInst::Call { callee: "printf".to_string() });
                }
                InstKind::BoolConst(b) => {
                    let label = if *b { "true_str" } else { "false_str" };
                    mir.push(MirInst::Lea { dst: MirOperand::Phys(PhysReg::Rcx), label: label.to_string() });
                    mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rdx), src: MirOperand::Imm(if *b { 1 } else { 0 }) });
                    mir.push(MirInst::Call { callee: "printf".to_string() });
                }
                _ => {
                    let src = operand_source(func, arg);
                    mir.push(MirInst::Lea { dst: MirOperand::Phys(PhysReg::Rcx), label: "fmt_str".to_string() });
                    mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rdx), src });
                    mir.push(MirInst::Call { callee: "printf".to_string() });
                }
            }
        }

        InstKind::Get => {
            let name = inst.target.as_deref().unwrap();
            let disp = frame.scalar_disp(name).expect("Get target must have a reserved scalar slot");
            mir.push(MirInst::Lea { dst: MirOperand::Phys(PhysReg::Rcx), label: "fmt_str".to_string() });
            mir.push(MirInst::Raw(format!("lea rdx, [rbp{:+}]", disp)));
            mir.push(MirInst::Call { callee: "scanf".to_string() });
        }

        InstKind::Call { callee } => {
            let regs = conv.param_regs();
            for (i, &arg) in inst.operands.iter().enumerate().take(4) {
                let src = operand_source(func, arg);
                mir.push(MirInst::Mov { dst: MirOperand::Phys(regs[i]), src });
            }
            mir.push(MirInst::Call { callee: callee.clone() });
        }

        // The return value is always in `rax` by the time a `Pop` is
        // reached: `Push` (below) moves it there, and a procedure's
        // synthetic `0` epilogue does the same.
        InstKind::Pop => {
            let dst = target_vreg(inst.target.as_deref().unwrap());
            legalize_mov(mir, dst, MirOperand::Phys(PhysReg::Rax));
        }

        InstKind::Push => {
            let src = operand_source(func, inst.operands[0]);
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rax), src });
        }

        InstKind::Return => {
            mir.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rsp), src: MirOperand::Phys(PhysReg::Rbp) });
            mir.push(MirInst::Raw("pop rbp".to_string()));
            mir.push(MirInst::Ret);
        }

        InstKind::Phi => unreachable!("phis must be removed by rename_out_of_ssa before lowering"),
    }
}
