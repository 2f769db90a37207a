//! The MIR (machine IR) value model (§3.6): physical registers, named
//! virtual registers, immediates, and memory/label operands, plus one
//! instruction kind per machine operation.
//!
//! Grounded on `examples/original_source/include/MachineIR.hpp`'s
//! `MIRType`/`Register`/`MemoryMIR` family and one-class-per-op instructions
//! (`MovMIR`, `AddMIR`, `CmpMIR`, ...); collapsed here to a single tagged
//! `MirInst` enum the way `value.rs`'s `InstKind` collapses the SSA side's
//! polymorphic `Inst` hierarchy.

use std::fmt;

/// A physical x86-64 register. Reserved for calling-convention plumbing,
/// legalization scratch space, and array-address computation — Mina never
/// allocates a real register to hold a *named* value across instructions;
/// every variable lives in its own stack slot (`MirOperand::VReg`) per the
/// minimal allocation scheme in `spec.md` §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysReg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    Rbp,
    Rsp,
}

impl PhysReg {
    pub fn name64(self) -> &'static str {
        match self {
            PhysReg::Rax => "rax",
            PhysReg::Rbx => "rbx",
            PhysReg::Rcx => "rcx",
            PhysReg::Rdx => "rdx",
            PhysReg::Rsi => "rsi",
            PhysReg::Rdi => "rdi",
            PhysReg::R8 => "r8",
            PhysReg::R9 => "r9",
            PhysReg::R10 => "r10",
            PhysReg::R11 => "r11",
            PhysReg::R12 => "r12",
            PhysReg::Rbp => "rbp",
            PhysReg::Rsp => "rsp",
        }
    }

    /// The low 8 bits of this register, used as `setcc`'s destination.
    pub fn name8(self) -> &'static str {
        match self {
            PhysReg::Rax => "al",
            PhysReg::Rbx => "bl",
            PhysReg::Rcx => "cl",
            PhysReg::Rdx => "dl",
            PhysReg::Rsi => "sil",
            PhysReg::Rdi => "dil",
            PhysReg::R8 => "r8b",
            PhysReg::R9 => "r9b",
            PhysReg::R10 => "r10b",
            PhysReg::R11 => "r11b",
            PhysReg::R12 => "r12b",
            PhysReg::Rbp => "bpl",
            PhysReg::Rsp => "spl",
        }
    }
}

/// The Win64 integer parameter registers, in argument-position order.
pub const WIN64_PARAM_REGS: [PhysReg; 4] = [PhysReg::Rcx, PhysReg::Rdx, PhysReg::R8, PhysReg::R9];

/// The System V AMD64 integer parameter registers, in argument-position
/// order — `spec.md` §1's "System V or Win64 calling convention selectable
/// for arguments". The instruction selector itself is convention-agnostic;
/// only this register list changes between the two.
pub const SYSV_PARAM_REGS: [PhysReg; 4] = [PhysReg::Rdi, PhysReg::Rsi, PhysReg::Rdx, PhysReg::Rcx];

/// Which integer argument-passing convention to lower `Call`/`FuncSignature`
/// against. `spec.md` §1: "Win64 register order is assumed for parameter
/// passing" — `Win64` is this crate's default; `SysV` is offered behind
/// `mina_cli --target` for the System V calling convention the spec also
/// names as a valid target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallingConvention {
    #[default]
    Win64,
    SysV,
}

impl CallingConvention {
    pub fn param_regs(self) -> [PhysReg; 4] {
        match self {
            CallingConvention::Win64 => WIN64_PARAM_REGS,
            CallingConvention::SysV => SYSV_PARAM_REGS,
        }
    }
}

/// A location an instruction reads or writes.
#[derive(Debug, Clone, PartialEq)]
pub enum MirOperand {
    Phys(PhysReg),
    /// A named virtual register — resolved at emission time to its stack
    /// slot (`[rbp - offset]`); see `frame.rs`. Named by the SSA base name
    /// so the lowering rules in `spec.md` §4.6 (`v_<name>`) read literally.
    VReg(String),
    Imm(i64),
    /// `[base + disp]`, `disp` signed (negative for locals below `rbp`).
    Mem { base: PhysReg, disp: i32 },
    /// `[rip + label]`, used for format/literal string addressing.
    RipLabel(String),
}

impl MirOperand {
    pub fn is_memory(&self) -> bool {
        matches!(self, MirOperand::VReg(_) | MirOperand::Mem { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionCode {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ConditionCode {
    fn suffix(self) -> &'static str {
        match self {
            ConditionCode::Eq => "e",
            ConditionCode::Ne => "ne",
            ConditionCode::Lt => "l",
            ConditionCode::Le => "le",
            ConditionCode::Gt => "g",
            ConditionCode::Ge => "ge",
        }
    }
}

/// One machine instruction. A `MirBlock` holds an ordered `Vec<MirInst>`;
/// there is no separate terminator type — `Jmp`/`Jz`/`Jnz`/`Ret` simply
/// appear last, matching the SSA side's "exactly one terminator, always
/// last" invariant (§4.2).
#[derive(Debug, Clone)]
pub enum MirInst {
    Mov { dst: MirOperand, src: MirOperand },
    Lea { dst: MirOperand, label: String },
    Call { callee: String },
    Add { dst: MirOperand, src: MirOperand },
    Sub { dst: MirOperand, src: MirOperand },
    Mul { dst: MirOperand, src: MirOperand },
    /// `idivq divisor` — numerator is always `rax:rdx` (set up by a
    /// preceding `Cqo`), matching the x86-64 `idiv` contract.
    Div { divisor: MirOperand },
    Cqo,
    /// Logical not, emitted as `xor dst, 1` — see §4.6's "Not" row: the
    /// SSA-level `Not` models boolean negation (operands are always 0/1),
    /// and a bitwise one's-complement `not` would not flip between 0 and 1.
    Not { dst: MirOperand },
    And { dst: MirOperand, src: MirOperand },
    Or { dst: MirOperand, src: MirOperand },
    Cmp { a: MirOperand, b: MirOperand },
    Set { cc: ConditionCode, dst: MirOperand },
    /// Zero-extend `src`'s low byte into `dst`.
    Movzx { dst: MirOperand, src: MirOperand },
    Test { a: MirOperand, b: MirOperand },
    Jmp { target: String },
    Jz { target: String },
    Jnz { target: String },
    Ret,
    /// A raw assembly line escape hatch for things with no dedicated
    /// variant (the call-printf/scanf sequences' literal `call printf`
    /// already fits `Call`; this exists for label pseudo-ops such as a
    /// string-literal-pool entry).
    Raw(String),
}

/// One lowered basic block: a label plus its straight-line MIR body.
/// Mirrors the CFG's `BasicBlock` (§4.2) one level down.
#[derive(Debug, Clone)]
pub struct MirBlock {
    pub name: String,
    pub insts: Vec<MirInst>,
}

impl MirBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), insts: Vec::new() }
    }

    pub fn push(&mut self, inst: MirInst) {
        self.insts.push(inst);
    }
}

pub(crate) fn set_cc_suffix(cc: ConditionCode) -> &'static str {
    cc.suffix()
}

impl fmt::Display for MirOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirOperand::Phys(r) => write!(f, "{}", r.name64()),
            MirOperand::VReg(name) => write!(f, "v_{name}"),
            MirOperand::Imm(n) => write!(f, "{n}"),
            MirOperand::Mem { base, disp } => {
                if *disp >= 0 {
                    write!(f, "QWORD PTR [{}+{}]", base.name64(), disp)
                } else {
                    write!(f, "QWORD PTR [{}{}]", base.name64(), disp)
                }
            }
            MirOperand::RipLabel(label) => write!(f, "[rip+{label}]"),
        }
    }
}
