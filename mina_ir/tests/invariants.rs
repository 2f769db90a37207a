//! Property-based checks of the structural invariants `spec.md` §8 states as
//! quantified over every translated program, not just the six worked
//! examples: def/use symmetry, predecessor/successor symmetry, and
//! phi-operand-count-equals-predecessor-count once every block is sealed.
//! Each run generates a small family of nested if/else and repeat-until
//! programs and checks the invariants hold on the resulting SSA IR.

use mina_ir::{translate_program, BasicBlock, Function, FunctionRegistry};
use mina_lexer::Lexer;
use mina_parser::{Parser, SemanticChecker};
use proptest::prelude::*;

fn translate(source: &str) -> FunctionRegistry {
    let tokens = Lexer::new(source, 0).tokenize().expect("lex");
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program().expect("parse");
    SemanticChecker::check_program(&program).expect("semantic check");
    translate_program(&program).expect("translate")
}

/// Every instruction `u` that lists `d` as an operand must appear in `d`'s
/// user list, and every entry in `d`'s user list must actually use `d` — the
/// def/use graph is kept symmetric by `Function::setup_def_use`/
/// `append_operand`/`replace_operand`.
fn check_def_use_symmetry(func: &Function) {
    for inst in func.insts() {
        for &operand in &inst.operands {
            let def = func.inst(operand);
            assert!(
                def.users.contains(&inst.id),
                "{:?} uses {:?} but is missing from its user list",
                inst.id,
                operand
            );
        }
    }
    for inst in func.insts() {
        for &user in &inst.users {
            let user_inst = func.inst(user);
            assert!(
                user_inst.operands.contains(&inst.id),
                "{:?} lists {:?} as a user but does not operand it",
                inst.id,
                user
            );
        }
    }
}

/// `a`'s successor list contains `b` iff `b`'s predecessor list contains `a`.
fn check_pred_succ_symmetry(func: &Function) {
    let block_by_succ = |b: &BasicBlock, target: mina_ir::BlockId| b.succs.contains(&target);
    for block in func.blocks() {
        for &succ in &block.succs {
            let succ_block = func.block(succ);
            assert!(
                succ_block.preds.contains(&block.id),
                "{:?} -> {:?} missing reverse pred edge",
                block.id,
                succ
            );
        }
        for &pred in &block.preds {
            let pred_block = func.block(pred);
            assert!(
                block_by_succ(pred_block, block.id),
                "{:?} <- {:?} missing forward succ edge",
                block.id,
                pred
            );
        }
    }
}

/// Every phi in a sealed block carries exactly as many operands as the block
/// has predecessors — `spec.md` §3.3's incomplete-phi bookkeeping must have
/// fully resolved by the time translation finishes (every block gets sealed
/// before `translate_program` returns).
fn check_phi_arity(func: &Function) {
    for block in func.blocks() {
        assert!(block.sealed, "block {:?} left unsealed after translation", block.id);
        for &id in &block.insts {
            let inst = func.inst(id);
            if inst.kind == mina_ir::InstKind::Phi {
                assert_eq!(
                    inst.operands.len(),
                    block.preds.len(),
                    "phi {:?} in {:?} has {} operands but block has {} preds",
                    id,
                    block.id,
                    inst.operands.len(),
                    block.preds.len()
                );
            }
        }
    }
}

fn check_all(registry: &FunctionRegistry) {
    for func in &registry.functions {
        check_def_use_symmetry(func);
        check_pred_succ_symmetry(func);
        check_phi_arity(func);
    }
}

proptest! {
    #[test]
    fn if_else_diamond_keeps_structural_invariants(
        threshold in -20i64..20,
        probe in -20i64..20,
        relop in prop_oneof![Just("<"), Just("<="), Just(">"), Just(">="), Just("="), Just("!=")],
    ) {
        let source = format!(
            "{{ var n : integer; var a : integer; get(n); \
             if n {relop} {threshold} then a := {probe} + 1 else a := {probe} - 1 end if; \
             put(a, skip) }}"
        );
        let registry = translate(&source);
        check_all(&registry);
    }

    #[test]
    fn repeat_until_loop_keeps_structural_invariants(
        start in 0i64..5,
        bound in 1i64..10,
        step in 1i64..4,
    ) {
        let source = format!(
            "{{ var i : integer; i := {start}; \
             repeat i := i + {step}; put(i, skip) until i >= {bound} }}"
        );
        let registry = translate(&source);
        check_all(&registry);
    }

    #[test]
    fn nested_if_inside_loop_keeps_structural_invariants(
        bound in 1i64..8,
        threshold in -5i64..5,
    ) {
        let source = format!(
            "{{ var i : integer; var a : integer; i := 0; \
             loop if i >= {bound} then exit end if; \
             if i > {threshold} then a := i else a := 0 - i end if; \
             i := i + 1 end loop; put(a, skip) }}"
        );
        let registry = translate(&source);
        check_all(&registry);
    }

    #[test]
    fn straight_line_arithmetic_keeps_structural_invariants(
        x in -50i64..50,
        y in -50i64..50,
    ) {
        let source = format!(
            "{{ var a : integer; var b : integer; \
             a := {x} * ({y} + 1); b := a - {x}; put(b, skip) }}"
        );
        let registry = translate(&source);
        check_all(&registry);
    }
}
