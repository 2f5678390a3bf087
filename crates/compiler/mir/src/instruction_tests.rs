use crate::{
    BasicBlockId, BinaryOp, CastKind, Instruction, InstructionKind, MirType, PrettyPrint, Value,
    ValueId,
};

#[test]
fn test_gep_trailing_index_is_last_index() {
    let dest = ValueId::new(0);
    let base = Value::operand(ValueId::new(1));
    let row = Value::operand(ValueId::new(2));
    let col = Value::operand(ValueId::new(3));

    let instr = Instruction::get_element_ptr(dest, base, vec![row, col]);

    assert!(instr.is_get_element_ptr());
    assert_eq!(instr.trailing_index(), Some(col));
    assert_eq!(instr.destination(), Some(dest));

    let used = instr.used_values();
    assert!(used.contains(&ValueId::new(1)));
    assert!(used.contains(&ValueId::new(2)));
    assert!(used.contains(&ValueId::new(3)));
}

#[test]
fn test_trailing_index_of_non_gep_is_none() {
    let instr = Instruction::binary_op(
        BinaryOp::Add,
        ValueId::new(0),
        Value::integer(1),
        Value::integer(2),
    );
    assert_eq!(instr.trailing_index(), None);
}

#[test]
fn test_store_operands_are_value_then_address() {
    let addr = Value::operand(ValueId::new(4));
    let value = Value::operand(ValueId::new(5));
    let instr = Instruction::store(addr, value, MirType::i32());

    assert_eq!(instr.operands(), vec![value, addr]);
    assert!(instr.destinations().is_empty());
    assert!(instr.has_side_effects());
}

#[test]
fn test_phi_uses_and_validation() {
    let dest = ValueId::new(0);
    let instr = Instruction::phi(
        dest,
        MirType::i32(),
        vec![
            (BasicBlockId::new(0), Value::integer(0)),
            (BasicBlockId::new(2), Value::operand(ValueId::new(7))),
        ],
    );

    assert!(instr.is_phi());
    assert_eq!(instr.used_values().len(), 1);
    assert!(instr.validate().is_ok());

    let empty = Instruction::phi(dest, MirType::i32(), vec![]);
    assert!(empty.validate().is_err());
}

#[test]
fn test_replace_value_uses() {
    let old = ValueId::new(1);
    let mut instr = Instruction::binary_op(
        BinaryOp::Mul,
        ValueId::new(0),
        Value::operand(old),
        Value::operand(old),
    );

    instr.replace_value_uses(old, Value::integer(3));

    match instr.kind {
        InstructionKind::BinaryOp { left, right, .. } => {
            assert_eq!(left, Value::integer(3));
            assert_eq!(right, Value::integer(3));
        }
        _ => panic!("Expected BinaryOp instruction"),
    }
}

#[test]
fn test_comparison_classification() {
    assert!(BinaryOp::SGt.is_comparison());
    assert!(BinaryOp::UGe.is_comparison());
    assert!(!BinaryOp::Add.is_comparison());
    assert!(!BinaryOp::SRem.is_comparison());
}

#[test]
fn test_pretty_print_instructions() {
    let gep = Instruction::get_element_ptr(
        ValueId::new(3),
        Value::operand(ValueId::new(0)),
        vec![Value::operand(ValueId::new(1)), Value::operand(ValueId::new(2))],
    );
    assert_eq!(gep.pretty_print(0), "%3 = getelementptr %0, %1, %2");

    let cast = Instruction::cast(
        CastKind::ZeroExtend,
        ValueId::new(5),
        Value::operand(ValueId::new(4)),
        MirType::i32(),
    );
    assert_eq!(cast.pretty_print(0), "%5 = zext %4 to i32");

    let cmp = Instruction::binary_op(
        BinaryOp::SGt,
        ValueId::new(6),
        Value::operand(ValueId::new(5)),
        Value::integer(100),
    );
    assert_eq!(cmp.pretty_print(0), "%6 = sgt %5, 100");
}
