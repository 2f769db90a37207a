//! Operand-form legalization (§4.6 "Legalization contract"): no emitted
//! `mov`/`cmp` may have memory on both sides. Grounded on the bridging
//! sequences `examples/original_source/src/CodeGen.cpp` uses throughout its
//! per-`InstType` lowering (`mov rax, ...; mov ..., rax`).

use crate::mir::{MirBlock, MirInst, MirOperand, PhysReg};

/// Emits a legal move from `src` to `dst`. If both sides are memory
/// (a named vreg or an explicit `[base+disp]`), bridges through `rax`.
pub fn legalize_mov(block: &mut MirBlock, dst: MirOperand, src: MirOperand) {
    if !dst.is_memory() || !src.is_memory() {
        block.push(MirInst::Mov { dst, src });
    } else {
        block.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rax), src });
        block.push(MirInst::Mov { dst, src: MirOperand::Phys(PhysReg::Rax) });
    }
}

/// Funnels both comparison operands through `rax`/`rdx` before `cmp`, the
/// same principle `legalize_mov` applies — a `cmp` with two memory operands
/// is as illegal as a `mov` with two.
pub fn legalize_cmp(block: &mut MirBlock, a: MirOperand, b: MirOperand) {
    block.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rax), src: a });
    block.push(MirInst::Mov { dst: MirOperand::Phys(PhysReg::Rdx), src: b });
    block.push(MirInst::Cmp { a: MirOperand::Phys(PhysReg::Rax), b: MirOperand::Phys(PhysReg::Rdx) });
}
