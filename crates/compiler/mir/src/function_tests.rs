use super::*;
use crate::{BinaryOp, Terminator, Value};

#[test]
fn test_external_declaration_signature() {
    let func = MirFunction::external(
        "pim_run_subregion",
        vec![MirType::i32(), MirType::i32()],
        MirType::unit(),
    );

    assert!(func.is_external);
    assert_eq!(func.parameters.len(), 2);
    assert_eq!(
        func.signature(),
        MirType::function(vec![MirType::i32(), MirType::i32()], MirType::unit())
    );
    assert!(func.validate().is_ok());
}

#[test]
fn test_insert_instruction_bounds() {
    let mut func = MirFunction::new("test");
    let entry = func.entry_block;
    func.basic_blocks[entry].set_terminator(Terminator::return_void());

    let dest = func.new_typed_value_id(MirType::i32());
    let instr = Instruction::binary_op(BinaryOp::Add, dest, Value::integer(1), Value::integer(2));

    assert!(func.insert_instruction(entry, 0, instr.clone()).is_ok());
    assert_eq!(func.basic_blocks[entry].instructions.len(), 1);
    assert!(func.insert_instruction(entry, 5, instr.clone()).is_err());
    assert!(func
        .insert_instruction(BasicBlockId::from_raw(9), 0, instr)
        .is_err());
}

#[test]
fn test_validate_rejects_double_definition() {
    let mut func = MirFunction::new("test");
    let entry = func.entry_block;
    let dest = func.new_typed_value_id(MirType::i32());
    let block = &mut func.basic_blocks[entry];
    block.push_instruction(Instruction::assign(dest, Value::integer(1), MirType::i32()));
    block.push_instruction(Instruction::assign(dest, Value::integer(2), MirType::i32()));
    block.set_terminator(Terminator::return_void());

    let err = func.validate().unwrap_err();
    assert!(err.contains("SSA violation"), "{err}");
}

#[test]
fn test_validate_rejects_phi_from_non_predecessor() {
    let mut func = MirFunction::new("test");
    let entry = func.entry_block;
    let body = func.add_basic_block();
    let stray = func.add_basic_block();
    func.basic_blocks[entry].set_terminator(Terminator::jump(body));
    func.basic_blocks[stray].set_terminator(Terminator::return_void());

    let phi = func.new_typed_value_id(MirType::i32());
    func.basic_blocks[body].push_instruction(Instruction::phi(
        phi,
        MirType::i32(),
        vec![(entry, Value::integer(0)), (stray, Value::integer(1))],
    ));
    func.basic_blocks[body].set_terminator(Terminator::return_void());

    assert!(func.validate().is_err());
}

#[test]
fn test_unreachable_blocks_and_use_counts() {
    let mut func = MirFunction::new("test");
    let entry = func.entry_block;
    let dead = func.add_basic_block();
    let x = func.add_parameter(MirType::i32());
    let y = func.new_typed_value_id(MirType::i32());

    func.basic_blocks[entry].push_instruction(Instruction::binary_op(
        BinaryOp::Mul,
        y,
        Value::operand(x),
        Value::operand(x),
    ));
    func.basic_blocks[entry].set_terminator(Terminator::return_value(Value::operand(y)));
    func.basic_blocks[dead].set_terminator(Terminator::return_void());

    assert_eq!(func.unreachable_blocks(), vec![dead]);
    assert!(func.reachable_blocks().contains(&entry));

    // `x` appears twice but is counted once per instruction
    let counts = func.get_value_use_counts();
    assert_eq!(counts.get(&x), Some(&1));
    assert_eq!(counts.get(&y), Some(&1));
}
