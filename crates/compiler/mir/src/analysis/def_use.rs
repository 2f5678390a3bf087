//! # Def/Use Index
//!
//! Maps every SSA value to its defining site and to all of its use sites.

use rustc_hash::FxHashMap;

use crate::{BasicBlockId, Instruction, InstructionKind, MirFunction, ValueId};

/// Where a value is defined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    /// A function parameter
    Parameter,
    /// The result of the instruction at `index` in `block`
    Instruction { block: BasicBlockId, index: usize },
}

/// How a value is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseKind {
    /// Operand of the non-phi instruction at `index`
    Instruction { index: usize },
    /// Incoming value of the phi at `index`, flowing along the edge from `incoming`
    Phi { index: usize, incoming: BasicBlockId },
    /// Operand of the block terminator
    Terminator,
}

/// A single use of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseSite {
    /// Block holding the using instruction or terminator
    pub block: BasicBlockId,
    pub kind: UseKind,
}

impl UseSite {
    /// The block where the use takes effect
    ///
    /// A phi operand is read at the end of its incoming block, not in the phi's block.
    pub const fn location_block(&self) -> BasicBlockId {
        match self.kind {
            UseKind::Phi { incoming, .. } => incoming,
            UseKind::Instruction { .. } | UseKind::Terminator => self.block,
        }
    }
}

/// Definitions and uses of every value in one function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefUseIndex {
    defs: FxHashMap<ValueId, Definition>,
    uses: FxHashMap<ValueId, Vec<UseSite>>,
}

impl DefUseIndex {
    /// Indexes `function`; use sites are recorded in block then instruction order
    pub fn build(function: &MirFunction) -> Self {
        let mut index = Self::default();

        for &param in &function.parameters {
            index.defs.insert(param, Definition::Parameter);
        }

        for (block_id, block) in function.basic_blocks() {
            for (position, instruction) in block.instructions.iter().enumerate() {
                for dest in instruction.destinations() {
                    index.defs.insert(
                        dest,
                        Definition::Instruction {
                            block: block_id,
                            index: position,
                        },
                    );
                }

                if let InstructionKind::Phi { sources, .. } = &instruction.kind {
                    for (incoming, value) in sources {
                        if let Some(used) = value.as_operand() {
                            index.record_use(
                                used,
                                block_id,
                                UseKind::Phi {
                                    index: position,
                                    incoming: *incoming,
                                },
                            );
                        }
                    }
                } else {
                    for used in instruction
                        .operands()
                        .into_iter()
                        .filter_map(|value| value.as_operand())
                    {
                        index.record_use(used, block_id, UseKind::Instruction { index: position });
                    }
                }
            }

            for used in block.terminator.used_values() {
                index.record_use(used, block_id, UseKind::Terminator);
            }
        }

        index
    }

    fn record_use(&mut self, value: ValueId, block: BasicBlockId, kind: UseKind) {
        self.uses
            .entry(value)
            .or_default()
            .push(UseSite { block, kind });
    }

    /// Where `value` is defined, if it is defined in the function at all
    pub fn definition(&self, value: ValueId) -> Option<Definition> {
        self.defs.get(&value).copied()
    }

    /// The block defining `value`; `None` for parameters and unknown values
    pub fn defining_block(&self, value: ValueId) -> Option<BasicBlockId> {
        match self.defs.get(&value)? {
            Definition::Instruction { block, .. } => Some(*block),
            Definition::Parameter => None,
        }
    }

    /// The instruction defining `value`
    pub fn defining_instruction<'f>(
        &self,
        function: &'f MirFunction,
        value: ValueId,
    ) -> Option<&'f Instruction> {
        match self.defs.get(&value)? {
            Definition::Instruction { block, index } => function.instruction(*block, *index),
            Definition::Parameter => None,
        }
    }

    /// Every use of `value`
    pub fn uses(&self, value: ValueId) -> &[UseSite] {
        self.uses.get(&value).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `value` has no uses
    pub fn is_unused(&self, value: ValueId) -> bool {
        self.uses(value).is_empty()
    }
}
