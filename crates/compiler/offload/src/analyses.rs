use autopim_mir::analysis::{
    compute_dominator_tree, compute_loop_forest, DefUseIndex, DominatorTree, Loop, LoopForest,
};
use autopim_mir::{BasicBlockId, Instruction, MirFunction};

/// The read-only oracles the offload analyses consume, computed together
#[derive(Debug, Clone)]
pub struct FunctionAnalyses {
    pub dom_tree: DominatorTree,
    pub forest: LoopForest,
    pub defs: DefUseIndex,
}

impl FunctionAnalyses {
    pub fn compute(function: &MirFunction) -> Self {
        let dom_tree = compute_dominator_tree(function);
        let forest = compute_loop_forest(function, &dom_tree);
        let defs = DefUseIndex::build(function);
        Self {
            dom_tree,
            forest,
            defs,
        }
    }

    /// The loop headed by `header`
    pub fn loop_at(&self, header: BasicBlockId) -> Option<&Loop> {
        self.forest
            .loop_with_header(header)
            .map(|id| self.forest.get(id))
    }
}

/// Instructions of every block of `lp`, nested loops included, in scan order
pub(crate) fn loop_instructions<'f>(
    function: &'f MirFunction,
    lp: &'f Loop,
) -> impl Iterator<Item = &'f Instruction> + 'f {
    lp.blocks
        .iter()
        .filter_map(|&block| function.get_basic_block(block))
        .flat_map(|block| block.instructions.iter())
}
