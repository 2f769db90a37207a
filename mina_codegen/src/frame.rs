//! Per-function stack frame layout (§4.6 "Stack layout", §3.6's prologue/
//! epilogue note).
//!
//! Mina's minimal allocation scheme gives every scalar variable and every
//! array element its own fixed `rbp`-relative slot rather than running a
//! real register allocator (out of scope per `spec.md` §1) — a named "vreg"
//! (`MirOperand::VReg`) is really just a symbolic name for one of these
//! slots, resolved here once per function.

use mina_ir::{Function, InstKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct ArraySlot {
    /// Displacement (negative, relative to `rbp`) of element 0.
    pub base_disp: i32,
    pub len: u32,
}

#[derive(Debug, Clone)]
pub struct StackFrame {
    scalars: HashMap<String, i32>,
    arrays: HashMap<String, ArraySlot>,
    /// A single pinned scratch slot `idiv`'s divisor is spilled to (§4.6:
    /// "spill op2 to a pinned stack slot"). `idiv` cannot take an immediate
    /// or non-memory-legal operand consistently with the legalization
    /// contract, so every `Div` lowering reuses this one slot.
    div_scratch_disp: i32,
    /// Total frame size, shadow space included, rounded up to 16 bytes.
    pub size: u32,
}

const SHADOW_SPACE: i32 = 32;
const SLOT_SIZE: i32 = 8;

impl StackFrame {
    /// Walks every instruction still reachable from a block (post-rename,
    /// post-linearization) and assigns one slot per distinct scalar name and
    /// one contiguous region per declared array.
    pub fn build(func: &Function) -> Self {
        let mut arrays: HashMap<String, ArraySlot> = HashMap::new();
        let mut scalar_names: Vec<String> = Vec::new();

        for block in func.blocks() {
            for &id in &block.insts {
                let inst = func.inst(id);
                if let InstKind::Alloca { size, .. } = inst.kind {
                    if let Some(name) = &inst.target {
                        arrays.entry(name.clone()).or_insert(ArraySlot { base_disp: 0, len: size.max(1) });
                    }
                }
            }
        }

        for block in func.blocks() {
            for &id in &block.insts {
                let inst = func.inst(id);
                let Some(name) = &inst.target else { continue };
                if arrays.contains_key(name) {
                    continue;
                }
                if matches!(inst.kind, InstKind::Alloca { .. }) {
                    continue;
                }
                if !scalar_names.contains(name) {
                    scalar_names.push(name.clone());
                }
            }
        }

        let mut disp = -SLOT_SIZE;
        let div_scratch_disp = disp;
        disp -= SLOT_SIZE;

        let mut scalars = HashMap::new();
        for name in scalar_names {
            scalars.insert(name, disp);
            disp -= SLOT_SIZE;
        }

        let mut array_names: Vec<String> = arrays.keys().cloned().collect();
        array_names.sort();
        for name in array_names {
            let slot = arrays.get_mut(&name).unwrap();
            slot.base_disp = disp;
            disp -= SLOT_SIZE * slot.len as i32;
        }

        let used = -disp; // bytes below rbp consumed by locals + scratch
        let raw_size = SHADOW_SPACE + used;
        let size = ((raw_size + 15) / 16 * 16) as u32;

        StackFrame { scalars, arrays, div_scratch_disp, size }
    }

    pub fn scalar_disp(&self, name: &str) -> Option<i32> {
        self.scalars.get(name).copied()
    }

    pub fn array_slot(&self, name: &str) -> Option<ArraySlot> {
        self.arrays.get(name).copied()
    }

    pub fn div_scratch_disp(&self) -> i32 {
        self.div_scratch_disp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_is_a_multiple_of_16() {
        let f = mina_ir::Function::new("f", mina_ir::CallableKind::Procedure);
        let frame = StackFrame::build(&f);
        assert_eq!(frame.size % 16, 0);
        assert!(frame.size >= 32);
    }
}
