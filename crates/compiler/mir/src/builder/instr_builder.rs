use crate::{
    BasicBlockId, BinaryOp, CastKind, FunctionId, Instruction, InstructionKind, MirFunction,
    MirType, Value, ValueId,
};

/// Appends instructions to one block at a time
///
/// Value-producing methods allocate a typed destination and return it.
pub struct InstrBuilder<'f> {
    function: &'f mut MirFunction,
    block: BasicBlockId,
}

impl<'f> InstrBuilder<'f> {
    pub const fn new(function: &'f mut MirFunction, block: BasicBlockId) -> Self {
        Self { function, block }
    }

    pub const fn switch_to_block(&mut self, block: BasicBlockId) -> &mut Self {
        self.block = block;
        self
    }

    /// Phis join the end of the block's phi prefix; everything else goes last
    fn emit(&mut self, instruction: Instruction) {
        let block = &mut self.function.basic_blocks[self.block];
        if instruction.is_phi() {
            let index = block.first_non_phi_index();
            block.insert_instruction(index, instruction);
        } else {
            block.push_instruction(instruction);
        }
    }

    fn define(&mut self, ty: MirType, make: impl FnOnce(ValueId) -> Instruction) -> ValueId {
        let dest = self.function.new_typed_value_id(ty);
        self.emit(make(dest));
        dest
    }

    pub fn binary_op(&mut self, op: BinaryOp, lhs: Value, rhs: Value, ty: MirType) -> ValueId {
        self.define(ty, |dest| Instruction::binary_op(op, dest, lhs, rhs))
    }

    pub fn compare(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> ValueId {
        debug_assert!(op.is_comparison(), "{op:?} is not a comparison");
        self.binary_op(op, lhs, rhs, MirType::bool())
    }

    pub fn cast(&mut self, kind: CastKind, source: Value, ty: MirType) -> ValueId {
        self.define(ty.clone(), |dest| Instruction::cast(kind, dest, source, ty))
    }

    pub fn load(&mut self, address: Value, ty: MirType) -> ValueId {
        self.define(ty.clone(), |dest| Instruction::load(dest, ty, address))
    }

    pub fn store(&mut self, address: Value, value: Value, ty: MirType) -> &mut Self {
        self.emit(Instruction::store(address, value, ty));
        self
    }

    /// Address of an element of `base`; the result is typed as a pointer to `element`
    pub fn gep(&mut self, base: Value, indices: Vec<Value>, element: MirType) -> ValueId {
        self.define(MirType::pointer(element), |dest| {
            Instruction::get_element_ptr(dest, base, indices)
        })
    }

    /// Latch inputs usually do not exist yet; add them with [`Self::add_phi_source`]
    pub fn phi(&mut self, ty: MirType, sources: Vec<(BasicBlockId, Value)>) -> ValueId {
        self.define(ty.clone(), |dest| Instruction::phi(dest, ty, sources))
    }

    /// Returns false if no phi defines `phi`
    pub fn add_phi_source(&mut self, phi: ValueId, block: BasicBlockId, value: Value) -> bool {
        let sources = self
            .function
            .basic_blocks
            .iter_mut()
            .flat_map(|b| b.instructions.iter_mut())
            .find_map(|instruction| match &mut instruction.kind {
                InstructionKind::Phi { dest, sources, .. } if *dest == phi => Some(sources),
                _ => None,
            });
        let Some(sources) = sources else {
            return false;
        };
        sources.push((block, value));
        true
    }

    pub fn void_call(&mut self, callee: FunctionId, args: Vec<Value>) -> &mut Self {
        self.emit(Instruction::void_call(callee, args));
        self
    }
}
