use index_vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{BasicBlock, BasicBlockId, InstructionKind, MirFunction};

use super::MirPass;

/// Removes what loop erasure leaves behind
///
/// Unreachable blocks are dropped and the survivors renumbered in their original
/// order. Phi inputs from dropped blocks go with them. Side-effect-free
/// instructions whose results are unused are then swept until nothing changes.
#[derive(Debug, Default)]
pub struct DeadCodeElimination;

impl DeadCodeElimination {
    pub const fn new() -> Self {
        Self
    }

    fn remove_unreachable_blocks(function: &mut MirFunction) -> bool {
        let dead: FxHashSet<BasicBlockId> = function.unreachable_blocks().into_iter().collect();
        if dead.is_empty() {
            return false;
        }

        let mut renumbered: FxHashMap<BasicBlockId, BasicBlockId> = FxHashMap::default();
        let mut kept: IndexVec<BasicBlockId, BasicBlock> = IndexVec::new();
        for (old, block) in std::mem::take(&mut function.basic_blocks).into_iter_enumerated() {
            if !dead.contains(&old) {
                renumbered.insert(old, kept.push(block));
            }
        }

        let remap = |id: &mut BasicBlockId| {
            if let Some(&new) = renumbered.get(id) {
                *id = new;
            }
        };
        for block in kept.iter_mut() {
            for instruction in &mut block.instructions {
                if let InstructionKind::Phi { sources, .. } = &mut instruction.kind {
                    sources.retain(|(incoming, _)| !dead.contains(incoming));
                    sources.iter_mut().for_each(|(incoming, _)| remap(incoming));
                }
            }
            match &mut block.terminator {
                crate::Terminator::Jump { target } => remap(target),
                crate::Terminator::If {
                    then_target,
                    else_target,
                    ..
                } => {
                    remap(then_target);
                    remap(else_target);
                }
                crate::Terminator::Return { .. } | crate::Terminator::Unreachable => {}
            }
        }

        remap(&mut function.entry_block);
        function.basic_blocks = kept;
        log::debug!(
            "removed {} unreachable block(s) from '{}'",
            dead.len(),
            function.name
        );
        true
    }

    fn remove_unused_instructions(function: &mut MirFunction) -> bool {
        let mut changed = false;
        loop {
            let use_counts = function.get_value_use_counts();
            let is_live = |instruction: &crate::Instruction| {
                if instruction.has_side_effects() {
                    return true;
                }
                if matches!(instruction.kind, InstructionKind::Nop) {
                    return false;
                }
                let dests = instruction.destinations();
                dests.is_empty() || dests.iter().any(|dest| use_counts.contains_key(dest))
            };

            let mut removed = false;
            for block in function.basic_blocks.iter_mut() {
                let before = block.instructions.len();
                block.instructions.retain(|instruction| is_live(instruction));
                removed |= block.instructions.len() != before;
            }

            if !removed {
                return changed;
            }
            changed = true;
        }
    }
}

impl MirPass for DeadCodeElimination {
    fn run(&mut self, function: &mut MirFunction) -> bool {
        if function.is_external {
            return false;
        }
        let removed_blocks = Self::remove_unreachable_blocks(function);
        let removed_instructions = Self::remove_unused_instructions(function);
        removed_blocks || removed_instructions
    }

    fn name(&self) -> &'static str {
        "DeadCodeElimination"
    }
}
