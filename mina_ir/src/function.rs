//! A function (or procedure) as an arena of instructions and blocks, plus
//! the program-level registry mapping callable names to entry blocks (§3.4).

use crate::block::BasicBlock;
use crate::value::{BlockId, InstId, Instruction, ScalarType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallableKind {
    Procedure,
    Function,
}

/// One compiled callable (including the top-level program body, which is
/// translated as a parameterless procedure named `main`).
///
/// Instructions and blocks are owned here, addressed by the stable `InstId`/
/// `BlockId` indices handed out as they're pushed — the arena replaces the
/// original's cyclic `shared_ptr<Inst>`/`shared_ptr<BasicBlock>` graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub kind: CallableKind,
    pub params: Vec<(String, ScalarType)>,
    pub return_type: Option<ScalarType>,
    pub entry: BlockId,
    insts: Vec<Instruction>,
    blocks: Vec<BasicBlock>,
    label_ctr: u32,
    temp_ctr: u32,
}

impl Function {
    pub fn new(name: impl Into<String>, kind: CallableKind) -> Self {
        let mut f = Function {
            name: name.into(),
            kind,
            params: Vec::new(),
            return_type: None,
            entry: BlockId(0),
            insts: Vec::new(),
            blocks: Vec::new(),
            label_ctr: 0,
            temp_ctr: 0,
        };
        let n = f.next_label();
        f.entry = f.new_block_named(format!("Entry_{n}"));
        f
    }

    /// The shared label counter a structured construct bumps once, before
    /// creating any of its blocks, so every block it mints shares the same
    /// suffix (`ifExprBlock_3`, `thenBlock_3`, `elseBlock_3`, …) — §4.4.
    pub fn next_label(&mut self) -> u32 {
        let n = self.label_ctr;
        self.label_ctr += 1;
        n
    }

    /// The next compiler-generated temporary name, `t0`, `t1`, ….
    pub fn next_temp(&mut self) -> String {
        let n = self.temp_ctr;
        self.temp_ctr += 1;
        format!("t{n}")
    }

    pub fn new_block_named(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id, name));
        id
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn push_inst(&mut self, block: BlockId, kind: crate::value::InstKind, target: Option<String>, operands: Vec<InstId>) -> InstId {
        let id = InstId(self.insts.len() as u32);
        let users = Vec::new();
        self.insts.push(Instruction { id, kind, block, target, operands, users });
        self.setup_def_use(id);
        self.blocks[block.0 as usize].push_inst(id);
        id
    }

    /// Inserts at the block head — phis only.
    pub fn push_phi_inst(&mut self, block: BlockId, target: String) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(Instruction {
            id,
            kind: crate::value::InstKind::Phi,
            block,
            target: Some(target),
            operands: Vec::new(),
            users: Vec::new(),
        });
        self.blocks[block.0 as usize].push_inst_begin(id);
        id
    }

    /// Publishes `inst` to each of its operands' user lists. Idempotent:
    /// repeated operands (or repeated calls) only ever add one entry.
    pub fn setup_def_use(&mut self, inst: InstId) {
        let operands = self.inst(inst).operands.clone();
        for op in operands {
            let users = &mut self.insts[op.0 as usize].users;
            if !users.contains(&inst) {
                users.push(inst);
            }
        }
    }

    pub fn append_operand(&mut self, inst: InstId, operand: InstId) {
        self.insts[inst.0 as usize].operands.push(operand);
        let users = &mut self.insts[operand.0 as usize].users;
        if !users.contains(&inst) {
            users.push(inst);
        }
    }

    /// Replaces every occurrence of `old` with `new` across `user`'s operand
    /// list, keeping both sides of the def/use edge consistent.
    pub fn replace_operand(&mut self, user: InstId, old: InstId, new: InstId) {
        let mut changed = false;
        for op in self.insts[user.0 as usize].operands.iter_mut() {
            if *op == old {
                *op = new;
                changed = true;
            }
        }
        if changed {
            let new_users = &mut self.insts[new.0 as usize].users;
            if !new_users.contains(&user) {
                new_users.push(user);
            }
            self.insts[old.0 as usize].users.retain(|&u| u != user);
        }
    }

    pub fn inst(&self, id: InstId) -> &Instruction {
        &self.insts[id.0 as usize]
    }

    pub fn inst_mut(&mut self, id: InstId) -> &mut Instruction {
        &mut self.insts[id.0 as usize]
    }

    pub fn insts(&self) -> impl Iterator<Item = &Instruction> {
        self.insts.iter()
    }

    pub fn remove_inst(&mut self, id: InstId) {
        let block = self.inst(id).block;
        self.blocks[block.0 as usize].remove_inst(id);
    }

    /// Allocates an instruction without inserting it into any block's
    /// instruction list — used solely for the `Undef` sentinel a trivial phi
    /// with no real incoming value collapses to. It needs a stable `InstId`
    /// so it can be used as an operand, but it is not itself executed.
    pub fn push_floating_inst(&mut self, block: BlockId, kind: crate::value::InstKind) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(Instruction { id, kind, block, target: None, operands: Vec::new(), users: Vec::new() });
        id
    }
}

/// Maps callable name to its compiled `Function`, populated as declarations
/// are visited (§3.4). Consulted by call sites to resolve the callee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionRegistry {
    pub functions: Vec<Function>,
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, f: Function) -> usize {
        let idx = self.functions.len();
        self.index.insert(f.name.clone(), idx);
        self.functions.push(f);
        idx
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.index.get(name).map(|&i| &self.functions[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Function> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.functions[i]),
            None => None,
        }
    }
}
