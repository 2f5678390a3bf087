//! # Functions
//!
//! A function body is a CFG of [`BasicBlock`]s plus the types of every value it
//! defines. External declarations have a signature and no blocks; the runtime
//! entry points the offload pass calls are modelled this way.

use index_vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    cfg, indent_str, BasicBlock, BasicBlockId, Instruction, InstructionKind, MirType,
    PrettyPrint, ValueId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirFunction {
    pub name: String,
    pub basic_blocks: IndexVec<BasicBlockId, BasicBlock>,
    /// Unused for external declarations
    pub entry_block: BasicBlockId,
    /// In signature order
    pub parameters: Vec<ValueId>,
    pub return_type: MirType,
    pub is_external: bool,
    pub value_types: FxHashMap<ValueId, MirType>,
    pub(crate) next_value_id: usize,
}

impl MirFunction {
    /// An empty body whose only block is `entry`
    pub fn new(name: impl Into<String>) -> Self {
        let mut basic_blocks = IndexVec::new();
        let entry_block = basic_blocks.push(BasicBlock::with_name("entry"));
        Self {
            name: name.into(),
            basic_blocks,
            entry_block,
            parameters: Vec::new(),
            return_type: MirType::unit(),
            is_external: false,
            value_types: FxHashMap::default(),
            next_value_id: 0,
        }
    }

    pub fn external(name: impl Into<String>, params: Vec<MirType>, return_type: MirType) -> Self {
        let mut function = Self::new(name);
        function.basic_blocks.clear();
        function.is_external = true;
        function.return_type = return_type;
        for ty in params {
            function.add_parameter(ty);
        }
        function
    }

    pub fn add_parameter(&mut self, ty: MirType) -> ValueId {
        let param = self.new_typed_value_id(ty);
        self.parameters.push(param);
        param
    }

    pub fn parameter_types(&self) -> Vec<MirType> {
        self.parameters
            .iter()
            .map(|&param| self.get_value_type_or_unknown(param))
            .collect()
    }

    pub fn signature(&self) -> MirType {
        MirType::function(self.parameter_types(), self.return_type.clone())
    }

    pub fn add_basic_block(&mut self) -> BasicBlockId {
        self.basic_blocks.push(BasicBlock::new())
    }

    pub fn add_basic_block_with_name(&mut self, name: impl Into<String>) -> BasicBlockId {
        self.basic_blocks.push(BasicBlock::with_name(name))
    }

    pub fn get_basic_block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.basic_blocks.get(id)
    }

    pub fn get_basic_block_mut(&mut self, id: BasicBlockId) -> Option<&mut BasicBlock> {
        self.basic_blocks.get_mut(id)
    }

    /// A fresh value with no recorded type
    pub fn new_value_id(&mut self) -> ValueId {
        let id = ValueId::new(self.next_value_id);
        self.next_value_id += 1;
        id
    }

    pub fn new_typed_value_id(&mut self, ty: MirType) -> ValueId {
        let id = self.new_value_id();
        self.value_types.insert(id, ty);
        id
    }

    pub fn get_value_type_or_unknown(&self, id: ValueId) -> MirType {
        self.value_types.get(&id).cloned().unwrap_or(MirType::Unknown)
    }

    pub fn basic_blocks(&self) -> impl Iterator<Item = (BasicBlockId, &BasicBlock)> {
        self.basic_blocks.iter_enumerated()
    }

    pub fn block_count(&self) -> usize {
        self.basic_blocks.len()
    }

    pub fn instruction(&self, block: BasicBlockId, index: usize) -> Option<&Instruction> {
        self.basic_blocks.get(block)?.instructions.get(index)
    }

    /// Inserts before the instruction currently at `index`; `index == len` appends
    pub fn insert_instruction(
        &mut self,
        block: BasicBlockId,
        index: usize,
        instruction: Instruction,
    ) -> Result<(), String> {
        let target = self
            .basic_blocks
            .get_mut(block)
            .ok_or_else(|| format!("no block bb{} in '{}'", block.index(), self.name))?;
        let len = target.instructions.len();
        if index > len {
            return Err(format!(
                "index {index} is past the end of bb{} ({len} instructions)",
                block.index()
            ));
        }
        target.insert_instruction(index, instruction);
        Ok(())
    }

    /// Number of reads of each value across instructions and terminators
    pub fn get_value_use_counts(&self) -> FxHashMap<ValueId, usize> {
        let mut counts: FxHashMap<ValueId, usize> = FxHashMap::default();
        let uses = self.basic_blocks.iter().flat_map(|block| {
            block
                .instructions
                .iter()
                .flat_map(Instruction::used_values)
                .chain(block.terminator.used_values())
        });
        for used in uses {
            *counts.entry(used).or_default() += 1;
        }
        counts
    }

    /// Checks block structure, branch targets, single definition and phi inputs
    pub fn validate(&self) -> Result<(), String> {
        if self.is_external {
            if !self.basic_blocks.is_empty() {
                return Err(format!("external function '{}' has a body", self.name));
            }
            return Ok(());
        }
        if self.get_basic_block(self.entry_block).is_none() {
            return Err(format!("missing entry block bb{}", self.entry_block.index()));
        }

        let predecessors = cfg::predecessor_map(self);
        let mut defined: FxHashSet<ValueId> = self.parameters.iter().copied().collect();
        for (id, block) in self.basic_blocks() {
            block
                .validate()
                .map_err(|err| format!("bb{}: {err}", id.index()))?;

            if let Some(target) = block
                .terminator
                .target_blocks()
                .into_iter()
                .find(|&target| self.get_basic_block(target).is_none())
            {
                return Err(format!(
                    "bb{} branches to missing bb{}",
                    id.index(),
                    target.index()
                ));
            }

            for instruction in &block.instructions {
                if let Some(dest) = instruction
                    .destinations()
                    .into_iter()
                    .find(|&dest| !defined.insert(dest))
                {
                    return Err(format!("SSA violation: %{} defined twice", dest.index()));
                }
                let InstructionKind::Phi { sources, .. } = &instruction.kind else {
                    continue;
                };
                if let Some((incoming, _)) = sources
                    .iter()
                    .find(|(incoming, _)| !predecessors[id].contains(incoming))
                {
                    return Err(format!(
                        "bb{}: phi input from bb{}, which is not a predecessor",
                        id.index(),
                        incoming.index()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Blocks reachable from the entry block
    pub fn reachable_blocks(&self) -> FxHashSet<BasicBlockId> {
        let mut seen = FxHashSet::default();
        if self.get_basic_block(self.entry_block).is_none() {
            return seen;
        }
        let mut worklist = vec![self.entry_block];
        while let Some(block) = worklist.pop() {
            if seen.insert(block) {
                worklist.extend(cfg::get_successors(self, block));
            }
        }
        seen
    }

    /// In ascending id order
    pub fn unreachable_blocks(&self) -> Vec<BasicBlockId> {
        let reachable = self.reachable_blocks();
        self.basic_blocks
            .indices()
            .filter(|id| !reachable.contains(id))
            .collect()
    }
}

impl PrettyPrint for MirFunction {
    fn pretty_print(&self, indent: usize) -> String {
        let prefix = indent_str(indent);
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|&param| format!("%{}: {}", param.index(), self.get_value_type_or_unknown(param)))
            .collect();
        let header = format!(
            "fn {}({}) -> {}",
            self.name,
            params.join(", "),
            self.return_type
        );
        if self.is_external {
            return format!("{prefix}declare {header}\n");
        }

        let mut out = format!("{prefix}{header} {{\n");
        for (id, block) in self.basic_blocks() {
            let label = block.name.as_deref().map_or_else(
                || format!("bb{}", id.index()),
                |name| format!("bb{} ({name})", id.index()),
            );
            out.push_str(&format!("{prefix}  {label}:\n"));
            out.push_str(&block.pretty_print(indent + 2));
        }
        out.push_str(&format!("{prefix}}}\n"));
        out
    }
}

#[cfg(test)]
#[path = "function_tests.rs"]
mod tests;
