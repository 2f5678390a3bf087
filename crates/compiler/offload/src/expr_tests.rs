use autopim_mir::{CastKind, InstrBuilder, MirType};

use super::*;

struct Fixture {
    function: MirFunction,
    out: ValueId,
    a: ValueId,
    i: ValueId,
    j: ValueId,
}

impl Fixture {
    fn new() -> Self {
        let mut function = MirFunction::new("expr");
        let out = function.add_parameter(MirType::pointer(MirType::i32()));
        let a = function.add_parameter(MirType::pointer(MirType::i32()));
        let i = function.add_parameter(MirType::i32());
        let j = function.add_parameter(MirType::i32());
        Self {
            function,
            out,
            a,
            i,
            j,
        }
    }

    fn builder(&mut self) -> InstrBuilder<'_> {
        let entry = self.function.entry_block;
        InstrBuilder::new(&mut self.function, entry)
    }

    /// `load base[indices...]`
    fn load(&mut self, base: ValueId, indices: Vec<Value>) -> Value {
        let mut instrs = self.builder();
        let addr = instrs.gep(Value::operand(base), indices, MirType::i32());
        Value::operand(instrs.load(Value::operand(addr), MirType::i32()))
    }

    fn binary(&mut self, op: BinaryOp, left: Value, right: Value) -> Value {
        Value::operand(self.builder().binary_op(op, left, right, MirType::i32()))
    }

    fn extract(&self, value: Value) -> Option<ExprTree> {
        let defs = DefUseIndex::build(&self.function);
        let pattern = AccessPattern {
            row_index: Some(self.i),
            col_index: Some(self.j),
        };
        extract(&self.function, &defs, value, &pattern)
    }
}

#[test]
fn test_accumulation_extracts_add_of_two_loads() {
    let mut fx = Fixture::new();
    let (out, a, i, j) = (fx.out, fx.a, fx.i, fx.j);
    let out_j = fx.load(out, vec![Value::operand(j)]);
    let a_ij = fx.load(a, vec![Value::operand(i), Value::operand(j)]);
    let sum = fx.binary(BinaryOp::Add, out_j, a_ij);

    let tree = fx.extract(sum).unwrap();
    assert_eq!(
        tree,
        ExprTree::Operator {
            op: PimOp::Add,
            source: sum.as_operand().unwrap(),
            left: Box::new(ExprTree::ArrayLoad {
                source: out_j.as_operand().unwrap()
            }),
            right: Box::new(ExprTree::ArrayLoad {
                source: a_ij.as_operand().unwrap()
            }),
        }
    );
    assert_eq!(tree.render_prefix(), "(ADD (LOAD) (LOAD))");
    assert_eq!(tree.leaf_count(), 2);
    assert_eq!(tree.operator_count(), 1);
}

#[test]
fn test_conversions_are_transparent() {
    let mut fx = Fixture::new();
    let (out, j) = (fx.out, fx.j);
    let out_j = fx.load(out, vec![Value::operand(j)]);
    let cmp = fx.binary(BinaryOp::SGt, out_j, Value::integer(100));
    let widened = fx
        .builder()
        .cast(CastKind::ZeroExtend, cmp, MirType::i32());

    let tree = fx.extract(Value::operand(widened)).unwrap();
    assert_eq!(tree.render_prefix(), "(CMP (LOAD) (CONSTANT))");
    assert!(matches!(
        tree,
        ExprTree::Operator {
            op: PimOp::Compare,
            ..
        }
    ));
}

#[test]
fn test_nested_expression_renders_left_to_right() {
    let mut fx = Fixture::new();
    let (out, a, i, j) = (fx.out, fx.a, fx.i, fx.j);
    let out_j = fx.load(out, vec![Value::operand(j)]);
    let a_ij = fx.load(a, vec![Value::operand(i), Value::operand(j)]);
    let scaled = fx.binary(BinaryOp::Mul, a_ij, Value::integer(3));
    let sum = fx.binary(BinaryOp::Add, out_j, scaled);

    let tree = fx.extract(sum).unwrap();
    assert_eq!(tree.to_string(), "(ADD (LOAD) (MUL (LOAD) (CONSTANT)))");
    assert_eq!(tree.leaf_count(), 3);
}

#[test]
fn test_remainder_deep_in_the_tree_fails() {
    let mut fx = Fixture::new();
    let (out, j) = (fx.out, fx.j);
    let out_j = fx.load(out, vec![Value::operand(j)]);
    let rem = fx.binary(BinaryOp::SRem, out_j, Value::integer(7));
    let shifted = fx.binary(BinaryOp::Shl, rem, Value::integer(1));
    let sum = fx.binary(BinaryOp::Add, out_j, shifted);

    assert_eq!(fx.extract(sum), None);
    assert!(fx.extract(out_j).is_some());
}

#[test]
fn test_load_through_unrelated_index_fails() {
    let mut fx = Fixture::new();
    let out = fx.out;
    let k = fx.function.add_parameter(MirType::i32());
    let out_k = fx.load(out, vec![Value::operand(k)]);
    let sum = fx.binary(BinaryOp::Add, out_k, Value::integer(1));

    assert_eq!(fx.extract(sum), None);
}

#[test]
fn test_load_through_raw_pointer_fails() {
    let mut fx = Fixture::new();
    let out = fx.out;
    let raw = fx
        .builder()
        .load(Value::operand(out), MirType::i32());

    assert_eq!(fx.extract(Value::operand(raw)), None);
}

#[test]
fn test_parameters_and_error_values_fail() {
    let fx = Fixture::new();
    assert_eq!(fx.extract(Value::operand(fx.i)), None);
    assert_eq!(fx.extract(Value::error()), None);
    assert_eq!(
        fx.extract(Value::integer(4)),
        Some(ExprTree::Constant(Literal::Integer(4)))
    );
}

#[test]
fn test_from_binary_op_covers_comparisons() {
    assert_eq!(PimOp::from_binary_op(BinaryOp::ULe), Some(PimOp::Compare));
    assert_eq!(PimOp::from_binary_op(BinaryOp::AShr), Some(PimOp::AShr));
    assert_eq!(PimOp::from_binary_op(BinaryOp::URem), None);
}
