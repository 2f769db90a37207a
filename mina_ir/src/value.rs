//! The IR value model (C1): a closed-set tagged instruction kind, held in a
//! per-function arena and addressed by stable integer ids.
//!
//! The original implementation represents instructions as a polymorphic
//! `shared_ptr<Inst>` hierarchy with one near-identical subclass per kind,
//! and wraps every defined value in a second, separate `IdentInst` object
//! purely to hold its textual SSA name. Both are collapsed here: `InstKind`
//! is a single tagged enum dispatched by one `match`, and an instruction's
//! SSA name lives directly on `Instruction::target` — an arena index is
//! already a stable, cheap identity, so a name-holding proxy instruction
//! buys nothing an index doesn't already give for free.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

/// `ScalarType` per the data model — booleans are represented as 0/1
/// integers once lowered to MIR, but are tracked distinctly in the IR so
/// `Not` and the comparison operators can be told apart from arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Integer,
    Boolean,
    Undefined,
}

/// An argument to `put`: distinguished at construction time rather than
/// re-sniffed from the operand's kind during MIR lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutArgKind {
    Value,
    Newline,
}

/// The closed instruction-kind set from the data model, one variant per
/// entry: `IntConst, BoolConst, StrConst, Ident, Add, Sub, Mul, Div, Not,
/// And, Or, Alloca, ArrAccess, ArrUpdate, Assign, CmpEq, CmpNE, CmpLT,
/// CmpLTE, CmpGT, CmpGTE, Jump, BRT, BRF, Put, Get, Push, Pop, Return,
/// FuncSignature, Call, Phi, Undef, Noop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    IntConst(i64),
    BoolConst(bool),
    StrConst(String),
    /// A named value with no computation of its own — used for function
    /// parameters, which are definitions without an evaluated right-hand
    /// side.
    Ident,

    Add,
    Sub,
    Mul,
    Div,
    Not,
    And,
    Or,

    Alloca { elem_ty: ScalarType, size: u32 },
    ArrAccess,
    ArrUpdate,
    Assign,

    CmpEq,
    CmpNe,
    CmpLt,
    CmpLte,
    CmpGt,
    CmpGte,

    Jump { target: BlockId },
    /// Branch-if-true: `succ` is taken when the operand is true, `fail`
    /// otherwise.
    Brt { succ: BlockId, fail: BlockId },
    /// Branch-if-false: `succ` is taken when the operand is false.
    Brf { succ: BlockId, fail: BlockId },

    Put(PutArgKind),
    Get,
    Push,
    Pop,
    Return,

    FuncSignature { name: String },
    Call { callee: String },

    Phi,
    Undef,
    /// Present for closed-set completeness; the translator never emits it.
    Noop,
}

impl InstKind {
    /// Per the data model: false for constants, strings, jumps, and
    /// branches; true otherwise. Out-of-SSA only ever rewrites renameable
    /// operands.
    pub fn is_renameable(&self) -> bool {
        !matches!(
            self,
            InstKind::IntConst(_)
                | InstKind::BoolConst(_)
                | InstKind::StrConst(_)
                | InstKind::Jump { .. }
                | InstKind::Brt { .. }
                | InstKind::Brf { .. }
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, InstKind::Phi)
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Jump { .. } | InstKind::Brt { .. } | InstKind::Brf { .. } | InstKind::Return
        )
    }
}

/// One arena-owned instruction. `operands` is ordered; for a `Phi` position
/// *i* corresponds to predecessor *i* of `block`. `users` is the back-edge
/// list invariant: for every `o` in `operands`, this instruction's id
/// appears in `arena[o].users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub kind: InstKind,
    pub block: BlockId,
    pub target: Option<String>,
    pub operands: Vec<InstId>,
    pub users: Vec<InstId>,
}

impl Instruction {
    pub fn is_renameable(&self) -> bool {
        self.kind.is_renameable()
    }
}
