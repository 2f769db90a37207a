//! Basic block and CFG (C2).
//!
//! A block owns an ordered instruction list; predecessor/successor edges are
//! non-owning `BlockId` back-references. Grounded on the original
//! `BasicBlock::pushInst`/`pushInstBegin`/predecessor-successor pairs, with
//! the shared-pointer graph replaced by arena indices per the data model's
//! redesign note (`spec.md` §9).

use crate::value::{BlockId, InstId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub name: String,
    pub insts: Vec<InstId>,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
    pub sealed: bool,
}

impl BasicBlock {
    pub fn new(id: BlockId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            insts: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
            sealed: false,
        }
    }

    /// Appends at the tail — the common case for non-phi instructions.
    pub fn push_inst(&mut self, inst: InstId) {
        self.insts.push(inst);
    }

    /// Inserts at the head. Used exclusively for phi placement, preserving
    /// the data model's invariant that every phi precedes every non-phi.
    pub fn push_inst_begin(&mut self, inst: InstId) {
        self.insts.insert(0, inst);
    }

    pub fn remove_inst(&mut self, inst: InstId) {
        self.insts.retain(|&i| i != inst);
    }

    /// Count of instructions at the block head that are phis, used by the
    /// instruction-selector's phi-precedes-non-phi invariant check.
    pub fn phi_count(&self, is_phi: impl Fn(InstId) -> bool) -> usize {
        self.insts.iter().take_while(|&&i| is_phi(i)).count()
    }

    pub fn push_pred(&mut self, pred: BlockId) {
        if !self.preds.contains(&pred) {
            self.preds.push(pred);
        }
    }

    pub fn push_succ(&mut self, succ: BlockId) {
        if !self.succs.contains(&succ) {
            self.succs.push(succ);
        }
    }
}
