//! Hand-built MIR kernels exercising the offload pipeline.
//!
//! Every kernel lives in a module that already declares the two runtime entry
//! points, so the declarations take function ids 0 and 1.

use autopim_mir::{
    BasicBlockId, BinaryOp, CastKind, CfgBuilder, ForLoopBlocks, FunctionId, InstrBuilder,
    Instruction, MirFunction, MirModule, MirType, Value, ValueId,
};

pub const INIT_SUBREGION: &str = "pim_init_subregion";
pub const RUN_SUBREGION: &str = "pim_run_subregion";

/// Declares `pim_init_subregion(i32, i32, i32)` and `pim_run_subregion(i32, i32)`
pub fn declare_runtime(module: &mut MirModule) -> (FunctionId, FunctionId) {
    let init = module.declare_external(INIT_SUBREGION, vec![MirType::i32(); 3], MirType::unit());
    let run = module.declare_external(RUN_SUBREGION, vec![MirType::i32(); 2], MirType::unit());
    (init, run)
}

/// A module holding one kernel function next to the runtime declarations
#[derive(Debug, Clone)]
pub struct Kernel {
    pub module: MirModule,
    pub function: FunctionId,
}

impl Kernel {
    fn new(function: MirFunction) -> Self {
        let mut module = MirModule::new();
        declare_runtime(&mut module);
        let function = module.add_function(function);
        Self { module, function }
    }

    pub fn function(&self) -> &MirFunction {
        &self.module.functions[self.function]
    }

    pub fn function_mut(&mut self) -> &mut MirFunction {
        &mut self.module.functions[self.function]
    }
}

/// Handles on a loop emitted by [`emit_counted_loop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountedLoop {
    pub blocks: ForLoopBlocks,
    pub iv: ValueId,
    pub next: ValueId,
    pub condition: ValueId,
}

impl CountedLoop {
    pub const fn header(&self) -> BasicBlockId {
        self.blocks.header
    }
}

/// Emits `for (iv = start; iv < bound; iv++)` into four new blocks labelled `label`
///
/// `preheader` is terminated with a jump to the header. The body and exit blocks
/// are left open for the caller.
pub fn emit_counted_loop(
    function: &mut MirFunction,
    preheader: BasicBlockId,
    label: &str,
    start: Value,
    bound: i64,
) -> CountedLoop {
    let blocks = CfgBuilder::new(function, preheader).create_for_loop_blocks(label);

    let mut instrs = InstrBuilder::new(function, blocks.header);
    let iv = instrs.phi(MirType::i32(), vec![(preheader, start)]);
    let condition = instrs.compare(BinaryOp::SLt, Value::operand(iv), Value::integer(bound));
    instrs.switch_to_block(blocks.latch);
    let next = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(iv),
        Value::integer(1),
        MirType::i32(),
    );
    instrs.add_phi_source(iv, blocks.latch, Value::operand(next));

    let mut cfg = CfgBuilder::new(function, preheader);
    cfg.terminate_with_jump(blocks.header);
    cfg.switch_to_block(blocks.header);
    cfg.terminate_with_branch(Value::operand(condition), blocks.body, blocks.exit);
    cfg.switch_to_block(blocks.latch);
    cfg.terminate_with_jump(blocks.header);

    CountedLoop {
        blocks,
        iv,
        next,
        condition,
    }
}

fn jump(function: &mut MirFunction, from: BasicBlockId, to: BasicBlockId) {
    CfgBuilder::new(function, from).terminate_with_jump(to);
}

fn ret(function: &mut MirFunction, block: BasicBlockId) {
    CfgBuilder::new(function, block).terminate_with_return(None);
}

fn int_ptr() -> MirType {
    MirType::pointer(MirType::i32())
}

/// A GRIM-filter style bitvector kernel
///
/// ```text
/// for i in 0..64 { for j in 0..32 { out[j] = out[j] + a[i][j]; } }
/// for j in 0..32 { out[j] = out[j] > 100; }
/// ```
#[derive(Debug, Clone)]
pub struct GrimFilter {
    pub kernel: Kernel,
    pub out: ValueId,
    pub a: ValueId,
    pub rows: CountedLoop,
    pub accumulate: CountedLoop,
    pub threshold: CountedLoop,
    /// `out[j] + a[i][j]`
    pub sum: ValueId,
    /// `zext(out[j] > 100)`
    pub flag: ValueId,
}

pub fn grim_filter() -> GrimFilter {
    let mut function = MirFunction::new("grim_filter");
    let out = function.add_parameter(int_ptr());
    let a = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let rows = emit_counted_loop(&mut function, entry, "rows", Value::integer(0), 64);
    let accumulate = emit_counted_loop(
        &mut function,
        rows.blocks.body,
        "accumulate",
        Value::integer(0),
        32,
    );

    let mut instrs = InstrBuilder::new(&mut function, accumulate.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(accumulate.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let a_ij = instrs.gep(
        Value::operand(a),
        vec![Value::operand(rows.iv), Value::operand(accumulate.iv)],
        MirType::i32(),
    );
    let element = instrs.load(Value::operand(a_ij), MirType::i32());
    let sum = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(current),
        Value::operand(element),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_j), Value::operand(sum), MirType::i32());

    jump(&mut function, accumulate.blocks.body, accumulate.blocks.latch);
    jump(&mut function, accumulate.blocks.exit, rows.blocks.latch);

    let threshold = emit_counted_loop(
        &mut function,
        rows.blocks.exit,
        "threshold",
        Value::integer(0),
        32,
    );

    let mut instrs = InstrBuilder::new(&mut function, threshold.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(threshold.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let above = instrs.compare(BinaryOp::SGt, Value::operand(current), Value::integer(100));
    let flag = instrs.cast(CastKind::ZeroExtend, Value::operand(above), MirType::i32());
    instrs.store(Value::operand(out_j), Value::operand(flag), MirType::i32());

    jump(&mut function, threshold.blocks.body, threshold.blocks.latch);
    ret(&mut function, threshold.blocks.exit);

    GrimFilter {
        kernel: Kernel::new(function),
        out,
        a,
        rows,
        accumulate,
        threshold,
        sum,
        flag,
    }
}

/// `for j in 0..16 { out[j] = out[j] + 1; *sink = out[j]; }`
#[derive(Debug, Clone)]
pub struct RawPointerStore {
    pub kernel: Kernel,
    pub lp: CountedLoop,
    pub sink: ValueId,
}

pub fn raw_pointer_store() -> RawPointerStore {
    let mut function = MirFunction::new("raw_pointer_store");
    let out = function.add_parameter(int_ptr());
    let sink = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let lp = emit_counted_loop(&mut function, entry, "loop", Value::integer(0), 16);

    let mut instrs = InstrBuilder::new(&mut function, lp.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(lp.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let bumped = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(current),
        Value::integer(1),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_j), Value::operand(bumped), MirType::i32());
    instrs.store(Value::operand(sink), Value::operand(current), MirType::i32());

    jump(&mut function, lp.blocks.body, lp.blocks.latch);
    ret(&mut function, lp.blocks.exit);

    RawPointerStore {
        kernel: Kernel::new(function),
        lp,
        sink,
    }
}

/// A vector loop that also reduces into `acc`, which is read after the loop
///
/// ```text
/// acc = 0
/// for j in 0..16 { out[j] = out[j] * 2; acc = acc + out[j]; }
/// total[0] = acc
/// ```
#[derive(Debug, Clone)]
pub struct EscapingReduction {
    pub kernel: Kernel,
    pub lp: CountedLoop,
    pub acc: ValueId,
}

pub fn escaping_reduction() -> EscapingReduction {
    let mut function = MirFunction::new("escaping_reduction");
    let out = function.add_parameter(int_ptr());
    let total = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let lp = emit_counted_loop(&mut function, entry, "loop", Value::integer(0), 16);

    let acc = function.new_typed_value_id(MirType::i32());
    let header = &mut function.basic_blocks[lp.header()];
    let after_phis = header.first_non_phi_index();
    header.insert_instruction(
        after_phis,
        Instruction::phi(acc, MirType::i32(), vec![(entry, Value::integer(0))]),
    );

    let mut instrs = InstrBuilder::new(&mut function, lp.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(lp.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let doubled = instrs.binary_op(
        BinaryOp::Mul,
        Value::operand(current),
        Value::integer(2),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_j), Value::operand(doubled), MirType::i32());
    let running = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(acc),
        Value::operand(current),
        MirType::i32(),
    );
    instrs.add_phi_source(acc, lp.blocks.latch, Value::operand(running));

    instrs.switch_to_block(lp.blocks.exit);
    let slot = instrs.gep(Value::operand(total), vec![Value::integer(0)], MirType::i32());
    instrs.store(Value::operand(slot), Value::operand(acc), MirType::i32());

    jump(&mut function, lp.blocks.body, lp.blocks.latch);
    ret(&mut function, lp.blocks.exit);

    EscapingReduction {
        kernel: Kernel::new(function),
        lp,
        acc,
    }
}

/// `for j in lo..16 { out[j] = out[j] + 1; }` with `lo` a parameter
#[derive(Debug, Clone)]
pub struct NonConstantStart {
    pub kernel: Kernel,
    pub lp: CountedLoop,
    pub lo: ValueId,
}

pub fn non_constant_start() -> NonConstantStart {
    let mut function = MirFunction::new("non_constant_start");
    let out = function.add_parameter(int_ptr());
    let lo = function.add_parameter(MirType::i32());
    let entry = function.entry_block;

    let lp = emit_counted_loop(&mut function, entry, "loop", Value::operand(lo), 16);

    let mut instrs = InstrBuilder::new(&mut function, lp.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(lp.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let bumped = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(current),
        Value::integer(1),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_j), Value::operand(bumped), MirType::i32());

    jump(&mut function, lp.blocks.body, lp.blocks.latch);
    ret(&mut function, lp.blocks.exit);

    NonConstantStart {
        kernel: Kernel::new(function),
        lp,
        lo,
    }
}

/// Inner loop stores keyed by the outer index only
///
/// `for i in 0..8 { for j in 0..16 { row[i] = row[i] + a[i][j]; } }`
#[derive(Debug, Clone)]
pub struct RowReduction {
    pub kernel: Kernel,
    pub outer: CountedLoop,
    pub inner: CountedLoop,
}

pub fn row_reduction() -> RowReduction {
    let mut function = MirFunction::new("row_reduction");
    let row = function.add_parameter(int_ptr());
    let a = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let outer = emit_counted_loop(&mut function, entry, "outer", Value::integer(0), 8);
    let inner = emit_counted_loop(
        &mut function,
        outer.blocks.body,
        "inner",
        Value::integer(0),
        16,
    );

    let mut instrs = InstrBuilder::new(&mut function, inner.blocks.body);
    let row_i = instrs.gep(
        Value::operand(row),
        vec![Value::operand(outer.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(row_i), MirType::i32());
    let a_ij = instrs.gep(
        Value::operand(a),
        vec![Value::operand(outer.iv), Value::operand(inner.iv)],
        MirType::i32(),
    );
    let element = instrs.load(Value::operand(a_ij), MirType::i32());
    let sum = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(current),
        Value::operand(element),
        MirType::i32(),
    );
    instrs.store(Value::operand(row_i), Value::operand(sum), MirType::i32());

    jump(&mut function, inner.blocks.body, inner.blocks.latch);
    jump(&mut function, inner.blocks.exit, outer.blocks.latch);
    ret(&mut function, outer.blocks.exit);

    RowReduction {
        kernel: Kernel::new(function),
        outer,
        inner,
    }
}

/// Two sibling inner loops, the first of which uses an operator the accelerator lacks
///
/// ```text
/// for i in 0..8 {
///     for j in 0..16 { out[j] = out[j] % 3; }
///     for k in 0..16 { diff[k] = diff[k] - a[i][k]; }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MixedSubloops {
    pub kernel: Kernel,
    pub outer: CountedLoop,
    pub remainder: CountedLoop,
    pub subtract: CountedLoop,
}

pub fn mixed_subloops() -> MixedSubloops {
    let mut function = MirFunction::new("mixed_subloops");
    let out = function.add_parameter(int_ptr());
    let diff = function.add_parameter(int_ptr());
    let a = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let outer = emit_counted_loop(&mut function, entry, "outer", Value::integer(0), 8);
    let remainder = emit_counted_loop(
        &mut function,
        outer.blocks.body,
        "remainder",
        Value::integer(0),
        16,
    );

    let mut instrs = InstrBuilder::new(&mut function, remainder.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(remainder.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let reduced = instrs.binary_op(
        BinaryOp::SRem,
        Value::operand(current),
        Value::integer(3),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_j), Value::operand(reduced), MirType::i32());
    jump(&mut function, remainder.blocks.body, remainder.blocks.latch);

    let subtract = emit_counted_loop(
        &mut function,
        remainder.blocks.exit,
        "subtract",
        Value::integer(0),
        16,
    );

    let mut instrs = InstrBuilder::new(&mut function, subtract.blocks.body);
    let diff_k = instrs.gep(
        Value::operand(diff),
        vec![Value::operand(subtract.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(diff_k), MirType::i32());
    let a_ik = instrs.gep(
        Value::operand(a),
        vec![Value::operand(outer.iv), Value::operand(subtract.iv)],
        MirType::i32(),
    );
    let element = instrs.load(Value::operand(a_ik), MirType::i32());
    let delta = instrs.binary_op(
        BinaryOp::Sub,
        Value::operand(current),
        Value::operand(element),
        MirType::i32(),
    );
    instrs.store(Value::operand(diff_k), Value::operand(delta), MirType::i32());
    jump(&mut function, subtract.blocks.body, subtract.blocks.latch);

    jump(&mut function, subtract.blocks.exit, outer.blocks.latch);
    ret(&mut function, outer.blocks.exit);

    MixedSubloops {
        kernel: Kernel::new(function),
        outer,
        remainder,
        subtract,
    }
}

/// A vector loop that may leave early, returning the last value it stored
///
/// ```text
/// for j in 0..16 { s = out[j] + 1; out[j] = s; if s > 100 { return s; } }
/// return 0
/// ```
///
/// Both returns share the exit block through `result = phi [header: 0], [body: s]`.
#[derive(Debug, Clone)]
pub struct EarlyExit {
    pub kernel: Kernel,
    pub lp: CountedLoop,
    pub stored: ValueId,
    pub result: ValueId,
}

pub fn early_exit() -> EarlyExit {
    let mut function = MirFunction::new("early_exit");
    function.return_type = MirType::i32();
    let out = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let lp = emit_counted_loop(&mut function, entry, "loop", Value::integer(0), 16);

    let mut instrs = InstrBuilder::new(&mut function, lp.blocks.body);
    let out_j = instrs.gep(
        Value::operand(out),
        vec![Value::operand(lp.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_j), MirType::i32());
    let stored = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(current),
        Value::integer(1),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_j), Value::operand(stored), MirType::i32());
    let done = instrs.compare(BinaryOp::SGt, Value::operand(stored), Value::integer(100));

    instrs.switch_to_block(lp.blocks.exit);
    let result = instrs.phi(
        MirType::i32(),
        vec![
            (lp.header(), Value::integer(0)),
            (lp.blocks.body, Value::operand(stored)),
        ],
    );

    let mut cfg = CfgBuilder::new(&mut function, lp.blocks.body);
    cfg.terminate_with_branch(Value::operand(done), lp.blocks.exit, lp.blocks.latch);
    cfg.switch_to_block(lp.blocks.exit);
    cfg.terminate_with_return(Some(Value::operand(result)));

    EarlyExit {
        kernel: Kernel::new(function),
        lp,
        stored,
        result,
    }
}

/// A three-deep nest whose innermost loop is the only vector loop
///
/// `for i in 0..4 { for j in 0..8 { for k in 0..16 { out[k] = out[k] + a[j][k]; } } }`
#[derive(Debug, Clone)]
pub struct TripleNest {
    pub kernel: Kernel,
    pub outer: CountedLoop,
    pub middle: CountedLoop,
    pub inner: CountedLoop,
}

pub fn triple_nest() -> TripleNest {
    let mut function = MirFunction::new("triple_nest");
    let out = function.add_parameter(int_ptr());
    let a = function.add_parameter(int_ptr());
    let entry = function.entry_block;

    let outer = emit_counted_loop(&mut function, entry, "outer", Value::integer(0), 4);
    let middle = emit_counted_loop(
        &mut function,
        outer.blocks.body,
        "middle",
        Value::integer(0),
        8,
    );
    let inner = emit_counted_loop(
        &mut function,
        middle.blocks.body,
        "inner",
        Value::integer(0),
        16,
    );

    let mut instrs = InstrBuilder::new(&mut function, inner.blocks.body);
    let out_k = instrs.gep(
        Value::operand(out),
        vec![Value::operand(inner.iv)],
        MirType::i32(),
    );
    let current = instrs.load(Value::operand(out_k), MirType::i32());
    let a_jk = instrs.gep(
        Value::operand(a),
        vec![Value::operand(middle.iv), Value::operand(inner.iv)],
        MirType::i32(),
    );
    let element = instrs.load(Value::operand(a_jk), MirType::i32());
    let sum = instrs.binary_op(
        BinaryOp::Add,
        Value::operand(current),
        Value::operand(element),
        MirType::i32(),
    );
    instrs.store(Value::operand(out_k), Value::operand(sum), MirType::i32());

    jump(&mut function, inner.blocks.body, inner.blocks.latch);
    jump(&mut function, inner.blocks.exit, middle.blocks.latch);
    jump(&mut function, middle.blocks.exit, outer.blocks.latch);
    ret(&mut function, outer.blocks.exit);

    TripleNest {
        kernel: Kernel::new(function),
        outer,
        middle,
        inner,
    }
}
