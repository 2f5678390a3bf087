//! # Control Flow Graph Utilities
//!
//! Predecessor and successor queries and traversal orders over a function's CFG.
//! Successors are read from terminators; predecessors are derived on demand.

use index_vec::IndexVec;
use rustc_hash::FxHashSet;

use crate::{BasicBlockId, MirFunction};

/// Get all successor blocks of a given block
pub fn get_successors(function: &MirFunction, block_id: BasicBlockId) -> Vec<BasicBlockId> {
    function
        .basic_blocks
        .get(block_id)
        .map(|block| block.terminator.target_blocks())
        .unwrap_or_default()
}

/// Get all predecessor blocks of a given block, in ascending block order
pub fn get_predecessors(function: &MirFunction, target_id: BasicBlockId) -> Vec<BasicBlockId> {
    function
        .basic_blocks()
        .filter(|(_, block)| block.terminator.target_blocks().contains(&target_id))
        .map(|(id, _)| id)
        .collect()
}

/// Builds the predecessor lists of every block in one pass
pub fn predecessor_map(function: &MirFunction) -> IndexVec<BasicBlockId, Vec<BasicBlockId>> {
    let mut preds: IndexVec<BasicBlockId, Vec<BasicBlockId>> =
        IndexVec::from_vec(vec![Vec::new(); function.basic_blocks.len()]);
    for (block_id, block) in function.basic_blocks() {
        for succ in block.terminator.target_blocks() {
            if let Some(list) = preds.get_mut(succ) {
                list.push(block_id);
            }
        }
    }
    preds
}

/// Reverse postorder of the blocks reachable from the entry block
pub fn reverse_postorder(function: &MirFunction) -> Vec<BasicBlockId> {
    if function.basic_blocks.get(function.entry_block).is_none() {
        return Vec::new();
    }

    let mut visited = FxHashSet::default();
    let mut postorder = Vec::with_capacity(function.basic_blocks.len());
    // (block, next successor to visit)
    let mut stack = vec![(function.entry_block, 0usize)];
    visited.insert(function.entry_block);

    while let Some((block, next)) = stack.pop() {
        let succs = get_successors(function, block);
        if let Some(&succ) = succs.get(next) {
            stack.push((block, next + 1));
            if visited.insert(succ) {
                stack.push((succ, 0));
            }
        } else {
            postorder.push(block);
        }
    }

    postorder.reverse();
    postorder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Terminator, Value};

    fn create_diamond_cfg() -> MirFunction {
        let mut function = MirFunction::new("test_diamond");

        let entry = function.entry_block;
        let left = function.add_basic_block();
        let right = function.add_basic_block();
        let merge = function.add_basic_block();

        let cond = function.new_value_id();
        function.basic_blocks[entry].terminator =
            Terminator::branch(Value::operand(cond), left, right);
        function.basic_blocks[left].terminator = Terminator::jump(merge);
        function.basic_blocks[right].terminator = Terminator::jump(merge);
        function.basic_blocks[merge].terminator = Terminator::return_void();

        function
    }

    #[test]
    fn test_get_successors() {
        let function = create_diamond_cfg();

        let entry_succs = get_successors(&function, BasicBlockId::from_raw(0));
        assert_eq!(
            entry_succs,
            vec![BasicBlockId::from_raw(1), BasicBlockId::from_raw(2)]
        );
        assert!(get_successors(&function, BasicBlockId::from_raw(3)).is_empty());
    }

    #[test]
    fn test_get_predecessors() {
        let function = create_diamond_cfg();

        assert!(get_predecessors(&function, BasicBlockId::from_raw(0)).is_empty());
        assert_eq!(
            get_predecessors(&function, BasicBlockId::from_raw(3)),
            vec![BasicBlockId::from_raw(1), BasicBlockId::from_raw(2)]
        );

        let map = predecessor_map(&function);
        assert_eq!(map[BasicBlockId::from_raw(3)].len(), 2);
        assert_eq!(map[BasicBlockId::from_raw(1)], vec![BasicBlockId::from_raw(0)]);
    }

    #[test]
    fn test_reverse_postorder_starts_at_entry_and_ends_at_merge() {
        let mut function = create_diamond_cfg();
        // Unreachable block is not visited
        function.add_basic_block();

        let rpo = reverse_postorder(&function);
        assert_eq!(rpo.len(), 4);
        assert_eq!(rpo[0], BasicBlockId::from_raw(0));
        assert_eq!(rpo[3], BasicBlockId::from_raw(3));
    }

    #[test]
    fn test_branch_with_identical_targets_has_one_successor() {
        let mut function = MirFunction::new("same_target");
        let exit = function.add_basic_block();
        function.basic_blocks[function.entry_block].terminator =
            Terminator::branch(Value::boolean(true), exit, exit);

        assert_eq!(get_successors(&function, function.entry_block), vec![exit]);
        assert_eq!(get_predecessors(&function, exit), vec![function.entry_block]);
    }
}
