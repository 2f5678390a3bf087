use super::*;
use crate::{
    BasicBlockId, BinaryOp, CfgBuilder, InstrBuilder, InstructionKind, MirType, PrettyPrint,
    Value,
};

/// `for (i = 0; i < 8; i++) out[i] = 0;` with the header's branch patched to skip the body
fn erased_counted_loop() -> MirFunction {
    let mut function = MirFunction::new("erased");
    let out = function.add_parameter(MirType::pointer(MirType::i32()));
    let entry = function.entry_block;

    let blocks = CfgBuilder::new(&mut function, entry).create_for_loop_blocks("loop");

    let mut instrs = InstrBuilder::new(&mut function, blocks.header);
    let iv = instrs.phi(MirType::i32(), vec![(entry, Value::integer(0))]);
    let cond = instrs.compare(BinaryOp::SLt, Value::operand(iv), Value::integer(8));

    instrs.switch_to_block(blocks.body);
    let addr = instrs.gep(
        Value::operand(out),
        vec![Value::operand(iv)],
        MirType::i32(),
    );
    instrs.store(Value::operand(addr), Value::integer(0), MirType::i32());

    instrs.switch_to_block(blocks.latch);
    let next = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(iv),
        Value::integer(1),
        MirType::i32(),
    );
    instrs.add_phi_source(iv, blocks.latch, Value::operand(next));

    let mut cfg = CfgBuilder::new(&mut function, entry);
    cfg.terminate_with_jump(blocks.header);
    cfg.switch_to_block(blocks.header);
    cfg.terminate_with_branch(Value::operand(cond), blocks.exit, blocks.exit);
    cfg.switch_to_block(blocks.body);
    cfg.terminate_with_jump(blocks.latch);
    cfg.switch_to_block(blocks.latch);
    cfg.terminate_with_jump(blocks.header);
    cfg.switch_to_block(blocks.exit);
    cfg.terminate_with_return(None);

    function
}

#[test]
fn test_dce_removes_erased_loop_body() {
    let mut function = erased_counted_loop();
    assert_eq!(function.block_count(), 5);

    let modified = DeadCodeElimination::new().run(&mut function);

    assert!(modified);
    assert_eq!(function.block_count(), 3);
    assert!(function.validate().is_ok(), "{:?}", function.validate());

    // The induction phi lost its latch input but still feeds the exit test
    let header = &function.basic_blocks[BasicBlockId::from_raw(1)];
    match &header.instructions[0].kind {
        InstructionKind::Phi { sources, .. } => {
            assert_eq!(sources, &vec![(BasicBlockId::from_raw(0), Value::integer(0))]);
        }
        other => panic!("Expected phi, got {other:?}"),
    }
    assert_eq!(
        header.terminator.target_blocks(),
        vec![BasicBlockId::from_raw(2)]
    );
}

#[test]
fn test_dce_keeps_side_effects() {
    let mut function = MirFunction::new("effects");
    let callee = crate::FunctionId::from_raw(0);
    let entry = function.entry_block;
    let mut instrs = InstrBuilder::new(&mut function, entry);
    let unused = instrs.binary_op(
        BinaryOp::Mul,
        Value::integer(6),
        Value::integer(7),
        MirType::i32(),
    );
    instrs.void_call(callee, vec![Value::integer(1)]);
    CfgBuilder::new(&mut function, entry).terminate_with_return(None);

    assert!(DeadCodeElimination::new().run(&mut function));
    let block = &function.basic_blocks[entry];
    assert_eq!(block.instructions.len(), 1);
    assert!(matches!(
        block.instructions[0].kind,
        InstructionKind::VoidCall { .. }
    ));
    assert!(!block.defined_values().contains(&unused));
}

#[test]
fn test_pass_manager_runs_on_module_bodies_only() {
    let mut module = crate::MirModule::new();
    module.declare_external("ext", vec![MirType::i32()], MirType::unit());
    module.add_function(erased_counted_loop());

    let mut manager = PassManager::cleanup_pipeline();
    assert_eq!(manager.len(), 1);
    assert!(manager.run_on_module(&mut module));

    let printed = module.pretty_print(0);
    assert!(printed.contains("declare fn ext(%0: i32) -> ()"), "{printed}");
    assert!(!printed.contains("store"), "{printed}");
}
