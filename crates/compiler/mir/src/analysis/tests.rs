//! # Tests for Analysis Module

use super::*;
use crate::builder::ForLoopBlocks;
use crate::{
    BasicBlockId, BinaryOp, CfgBuilder, InstrBuilder, MirFunction, MirType, Terminator, Value,
    ValueId,
};

/// Helper to create an if-else diamond CFG:
///     Entry
///     /  \
///   Then  Else
///     \  /
///     Merge
fn create_if_else_cfg() -> MirFunction {
    let mut function = MirFunction::new("test_if_else");
    let entry = function.entry_block;
    let then_block = function.add_basic_block();
    let else_block = function.add_basic_block();
    let merge = function.add_basic_block();

    let cond = function.new_value_id();
    function.basic_blocks[entry].terminator =
        Terminator::branch(Value::operand(cond), then_block, else_block);
    function.basic_blocks[then_block].terminator = Terminator::jump(merge);
    function.basic_blocks[else_block].terminator = Terminator::jump(merge);
    function.basic_blocks[merge].terminator = Terminator::return_void();

    function
}

struct NestedLoops {
    function: MirFunction,
    outer: ForLoopBlocks,
    inner: ForLoopBlocks,
    i: ValueId,
    j: ValueId,
    j_next: ValueId,
}

/// Emits `for (iv = 0; iv < bound; iv += step)` control flow around `blocks`,
/// entered from `pred`. The body block is left unterminated.
fn emit_counted_loop(
    function: &mut MirFunction,
    pred: BasicBlockId,
    blocks: ForLoopBlocks,
    bound: i64,
    step: i64,
) -> (ValueId, ValueId) {
    let mut instrs = InstrBuilder::new(function, blocks.header);
    let iv = instrs.phi(MirType::i32(), vec![(pred, Value::integer(0))]);
    let cond = instrs.compare(BinaryOp::SLt, Value::operand(iv), Value::integer(bound));
    instrs.switch_to_block(blocks.latch);
    let next = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(iv),
        Value::integer(step),
        MirType::i32(),
    );
    instrs.add_phi_source(iv, blocks.latch, Value::operand(next));

    let mut cfg = CfgBuilder::new(function, blocks.header);
    cfg.terminate_with_branch(Value::operand(cond), blocks.body, blocks.exit);
    cfg.switch_to_block(blocks.latch);
    cfg.terminate_with_jump(blocks.header);

    (iv, next)
}

/// for i in 0..4 { for j in 0..8 {} }
fn create_nested_loops(inner_step: i64) -> NestedLoops {
    let mut function = MirFunction::new("nested");
    let entry = function.entry_block;

    let (outer, inner) = {
        let mut cfg = CfgBuilder::new(&mut function, entry);
        let outer = cfg.create_for_loop_blocks("outer");
        let inner = cfg.create_for_loop_blocks("inner");
        cfg.terminate_with_jump(outer.header);
        cfg.switch_to_block(outer.body);
        cfg.terminate_with_jump(inner.header);
        cfg.switch_to_block(inner.body);
        cfg.terminate_with_jump(inner.latch);
        cfg.switch_to_block(inner.exit);
        cfg.terminate_with_jump(outer.latch);
        cfg.switch_to_block(outer.exit);
        cfg.terminate_with_return(None);
        (outer, inner)
    };

    let (i, _) = emit_counted_loop(&mut function, entry, outer, 4, 1);
    let (j, j_next) = emit_counted_loop(&mut function, outer.body, inner, 8, inner_step);

    NestedLoops {
        function,
        outer,
        inner,
        i,
        j,
        j_next,
    }
}

#[test]
fn test_dominator_tree_if_else() {
    let function = create_if_else_cfg();
    let dom_tree = compute_dominator_tree(&function);

    let entry = BasicBlockId::from_raw(0);
    let then_block = BasicBlockId::from_raw(1);
    let merge = BasicBlockId::from_raw(3);

    assert_eq!(dom_tree.immediate_dominator(entry), None);
    assert_eq!(dom_tree.immediate_dominator(then_block), Some(entry));
    assert_eq!(dom_tree.immediate_dominator(merge), Some(entry));
    assert!(dom_tree.dominates(entry, merge));
    assert!(dom_tree.dominates(merge, merge));
    assert!(!dom_tree.dominates(then_block, merge));
    assert!(!dom_tree.strictly_dominates(merge, merge));
}

#[test]
fn test_unreachable_block_is_not_dominated() {
    let mut function = create_if_else_cfg();
    let orphan = function.add_basic_block();
    function.basic_blocks[orphan].terminator = Terminator::return_void();

    let dom_tree = compute_dominator_tree(&function);
    assert!(!dom_tree.is_reachable(orphan));
    assert!(!dom_tree.dominates(function.entry_block, orphan));
}

#[test]
fn test_edge_dominance_in_loop() {
    let nested = create_nested_loops(1);
    let dom_tree = compute_dominator_tree(&nested.function);
    let outer = nested.outer;

    // Entering the body dominates everything reached only through it
    assert!(dom_tree.edge_dominates(outer.header, outer.body, outer.body));
    assert!(dom_tree.edge_dominates(outer.header, outer.body, outer.latch));
    assert!(dom_tree.edge_dominates(outer.header, outer.body, nested.inner.exit));
    assert!(!dom_tree.edge_dominates(outer.header, outer.body, outer.exit));
    assert!(!dom_tree.edge_dominates(outer.header, outer.body, outer.header));

    // The exit edge dominates the exit block, which has no other predecessor
    assert!(dom_tree.edge_dominates(outer.header, outer.exit, outer.exit));

    // The header has a non-back-edge predecessor besides the latch
    assert!(!dom_tree.edge_dominates(outer.latch, outer.header, outer.body));
}

#[test]
fn test_edge_dominance_with_shared_target() {
    let mut function = MirFunction::new("shared");
    let entry = function.entry_block;
    let exit = function.add_basic_block();
    function.basic_blocks[entry].terminator = Terminator::branch(Value::boolean(true), exit, exit);
    function.basic_blocks[exit].terminator = Terminator::return_void();

    let dom_tree = compute_dominator_tree(&function);
    assert!(dom_tree.edge_dominates(entry, exit, exit));
}

#[test]
fn test_loop_forest_nesting() {
    let nested = create_nested_loops(1);
    let function = &nested.function;
    let dom_tree = compute_dominator_tree(function);
    let forest = compute_loop_forest(function, &dom_tree);

    assert_eq!(forest.len(), 2);
    let [outer_id] = forest.top_level() else {
        panic!("expected a single outermost loop");
    };
    let outer = forest.get(*outer_id);
    assert_eq!(outer.header, nested.outer.header);
    assert_eq!(outer.depth, 1);
    assert_eq!(outer.latches, vec![nested.outer.latch]);
    assert_eq!(outer.blocks[0], nested.outer.header);
    assert_eq!(outer.blocks.len(), 7);
    assert!(outer.contains(nested.inner.body));
    assert!(!outer.contains(nested.outer.exit));
    assert_eq!(outer.exit_block(function), Some(nested.outer.exit));
    assert_eq!(outer.preheader(function), Some(function.entry_block));

    let [inner_id] = outer.children.as_slice() else {
        panic!("expected a single child loop");
    };
    let inner = forest.get(*inner_id);
    assert_eq!(inner.parent, Some(*outer_id));
    assert_eq!(inner.depth, 2);
    assert_eq!(
        inner.blocks,
        vec![nested.inner.header, nested.inner.body, nested.inner.latch]
    );
    assert_eq!(inner.exit_blocks(function), vec![nested.inner.exit]);
    assert_eq!(inner.preheader(function), Some(nested.outer.body));
    assert_eq!(forest.loop_with_header(nested.inner.header), Some(*inner_id));
    assert_eq!(forest.innermost_loop_of(nested.inner.latch), Some(*inner_id));
    assert_eq!(forest.innermost_loop_of(nested.outer.latch), Some(*outer_id));
}

#[test]
fn test_canonical_induction_variables() {
    let nested = create_nested_loops(1);
    let function = &nested.function;
    let dom_tree = compute_dominator_tree(function);
    let forest = compute_loop_forest(function, &dom_tree);

    let outer = forest.get(forest.top_level()[0]);
    let inner = forest.get(outer.children[0]);

    let outer_iv = outer.canonical_induction_variable(function).unwrap();
    assert_eq!(outer_iv.phi, nested.i);
    assert_eq!(outer_iv.start, 0);

    let inner_iv = inner.canonical_induction_variable(function).unwrap();
    assert_eq!(inner_iv.phi, nested.j);
    assert_eq!(inner_iv.next, nested.j_next);
}

#[test]
fn test_non_unit_step_is_not_canonical() {
    let nested = create_nested_loops(2);
    let function = &nested.function;
    let dom_tree = compute_dominator_tree(function);
    let forest = compute_loop_forest(function, &dom_tree);

    let inner = forest.get(forest.loop_with_header(nested.inner.header).unwrap());
    assert_eq!(inner.canonical_induction_variable(function), None);
}

#[test]
fn test_def_use_locates_phi_uses_at_incoming_block() {
    let nested = create_nested_loops(1);
    let function = &nested.function;
    let index = DefUseIndex::build(function);

    assert_eq!(
        index.definition(nested.j),
        Some(Definition::Instruction {
            block: nested.inner.header,
            index: 0
        })
    );
    assert_eq!(index.defining_block(nested.j_next), Some(nested.inner.latch));

    let phi_use = index
        .uses(nested.j_next)
        .iter()
        .find(|site| matches!(site.kind, UseKind::Phi { .. }))
        .copied()
        .unwrap();
    assert_eq!(phi_use.block, nested.inner.header);
    assert_eq!(phi_use.location_block(), nested.inner.latch);

    // j feeds the exit comparison and the increment
    assert_eq!(index.uses(nested.j).len(), 2);
    assert!(index.defining_instruction(function, nested.j).unwrap().is_phi());
}
