//! # Natural Loop Analysis
//!
//! Recognises natural loops from back edges and arranges them into a forest.
//!
//! A back edge is a CFG edge `latch -> header` where `header` dominates `latch`.
//! Each header owns one loop: back edges sharing a header are merged. The loop body
//! is the header plus every block that reaches a latch without passing through the
//! header. Loops nest by containment, outermost loops have depth 1.

use index_vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use super::dominance::DominatorTree;
use crate::{cfg, BasicBlockId, BinaryOp, InstructionKind, Literal, MirFunction, Value, ValueId};

index_vec::define_index_type! {
    /// Identifier of a loop within a [`LoopForest`]
    pub struct LoopId = usize;
}

/// A single natural loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    pub header: BasicBlockId,
    /// Sources of the back edges into `header`, ascending
    pub latches: Vec<BasicBlockId>,
    /// Loop blocks in scan order: the header first, then ascending block id
    pub blocks: Vec<BasicBlockId>,
    pub parent: Option<LoopId>,
    /// Directly nested loops, in header order
    pub children: Vec<LoopId>,
    /// Nesting depth, 1 for outermost loops
    pub depth: usize,
    block_set: FxHashSet<BasicBlockId>,
}

/// A loop-carried integer that starts at a constant and steps by exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InductionVariable {
    /// The header phi carrying the variable
    pub phi: ValueId,
    /// Initial value, flowing in from outside the loop
    pub start: i64,
    /// The `phi + 1` value flowing back along the latch
    pub next: ValueId,
}

impl Loop {
    /// Returns true if `block` belongs to this loop (nested loops included)
    pub fn contains(&self, block: BasicBlockId) -> bool {
        self.block_set.contains(&block)
    }

    /// Blocks outside the loop that are targeted from inside it, ascending
    pub fn exit_blocks(&self, function: &MirFunction) -> Vec<BasicBlockId> {
        let mut exits: Vec<BasicBlockId> = self
            .blocks
            .iter()
            .flat_map(|&block| cfg::get_successors(function, block))
            .filter(|succ| !self.contains(*succ))
            .collect();
        exits.sort_unstable();
        exits.dedup();
        exits
    }

    /// The unique exit block, if the loop has exactly one
    pub fn exit_block(&self, function: &MirFunction) -> Option<BasicBlockId> {
        match self.exit_blocks(function).as_slice() {
            [exit] => Some(*exit),
            _ => None,
        }
    }

    /// The unique out-of-loop predecessor of the header, if it jumps only to the header
    pub fn preheader(&self, function: &MirFunction) -> Option<BasicBlockId> {
        let outside: Vec<BasicBlockId> = cfg::get_predecessors(function, self.header)
            .into_iter()
            .filter(|pred| !self.contains(*pred))
            .collect();
        match outside.as_slice() {
            [pred] if cfg::get_successors(function, *pred) == [self.header] => Some(*pred),
            _ => None,
        }
    }

    /// Finds the canonical induction variable of this loop
    ///
    /// The first header phi with exactly two incoming values, an integer literal from
    /// outside the loop and `Add(phi, 1)` or `Add(1, phi)` from inside it.
    pub fn canonical_induction_variable(&self, function: &MirFunction) -> Option<InductionVariable> {
        let header = function.get_basic_block(self.header)?;

        header.phis().find_map(|instr| {
            let InstructionKind::Phi { dest, sources, .. } = &instr.kind else {
                return None;
            };
            let [first, second] = sources.as_slice() else {
                return None;
            };

            let (outside, inside) = match (self.contains(first.0), self.contains(second.0)) {
                (false, true) => (first, second),
                (true, false) => (second, first),
                _ => return None,
            };

            let Value::Literal(Literal::Integer(start)) = outside.1 else {
                return None;
            };
            let next = inside.1.as_operand()?;
            self.is_unit_increment(function, next, *dest)
                .then_some(InductionVariable {
                    phi: *dest,
                    start,
                    next,
                })
        })
    }

    /// Returns true if `value` is defined in the loop as `phi + 1` or `1 + phi`
    fn is_unit_increment(&self, function: &MirFunction, value: ValueId, phi: ValueId) -> bool {
        self.blocks
            .iter()
            .filter_map(|&block| function.get_basic_block(block))
            .flat_map(|block| block.instructions.iter())
            .any(|instr| match &instr.kind {
                InstructionKind::BinaryOp {
                    op: BinaryOp::Add,
                    dest,
                    left,
                    right,
                } if *dest == value => {
                    let one = Value::integer(1);
                    (left.is_operand_of(phi) && *right == one)
                        || (*left == one && right.is_operand_of(phi))
                }
                _ => false,
            })
    }
}

/// All natural loops of a function, arranged by nesting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopForest {
    loops: IndexVec<LoopId, Loop>,
    top_level: Vec<LoopId>,
}

/// Computes the loop forest of `function`
///
/// Unreachable blocks never take part in a loop.
pub fn compute_loop_forest(function: &MirFunction, dom_tree: &DominatorTree) -> LoopForest {
    // header -> latches
    let mut back_edges: FxHashMap<BasicBlockId, Vec<BasicBlockId>> = FxHashMap::default();
    for (block_id, block) in function.basic_blocks() {
        if !dom_tree.is_reachable(block_id) {
            continue;
        }
        for succ in block.terminator.target_blocks() {
            if dom_tree.dominates(succ, block_id) {
                back_edges.entry(succ).or_default().push(block_id);
            }
        }
    }

    let mut headers: Vec<BasicBlockId> = back_edges.keys().copied().collect();
    headers.sort_unstable();

    let mut loops: IndexVec<LoopId, Loop> = IndexVec::with_capacity(headers.len());
    for header in headers {
        let mut latches = back_edges.remove(&header).unwrap_or_default();
        latches.sort_unstable();
        latches.dedup();

        let block_set = collect_loop_body(dom_tree, header, &latches);
        let mut blocks: Vec<BasicBlockId> =
            block_set.iter().copied().filter(|&b| b != header).collect();
        blocks.sort_unstable();
        blocks.insert(0, header);

        loops.push(Loop {
            header,
            latches,
            blocks,
            parent: None,
            children: Vec::new(),
            depth: 1,
            block_set,
        });
    }

    // The parent is the smallest other loop containing this loop's header.
    let parents: Vec<Option<LoopId>> = loops
        .iter_enumerated()
        .map(|(id, lp)| {
            loops
                .iter_enumerated()
                .filter(|(other_id, other)| {
                    *other_id != id
                        && other.contains(lp.header)
                        && other.blocks.len() > lp.blocks.len()
                })
                .min_by_key(|(_, other)| other.blocks.len())
                .map(|(other_id, _)| other_id)
        })
        .collect();

    let mut top_level = Vec::new();
    for (id, parent) in parents.iter().enumerate() {
        let id = LoopId::from_usize(id);
        loops[id].parent = *parent;
        match parent {
            Some(parent) => loops[*parent].children.push(id),
            None => top_level.push(id),
        }
    }

    for id in loops.indices() {
        let mut depth = 1;
        let mut current = loops[id].parent;
        while let Some(parent) = current {
            depth += 1;
            current = loops[parent].parent;
        }
        loops[id].depth = depth;
    }

    LoopForest { loops, top_level }
}

/// Blocks reaching a latch without passing through `header`, plus the header
fn collect_loop_body(
    dom_tree: &DominatorTree,
    header: BasicBlockId,
    latches: &[BasicBlockId],
) -> FxHashSet<BasicBlockId> {
    let mut body = FxHashSet::default();
    body.insert(header);

    let mut stack: Vec<BasicBlockId> = latches.to_vec();
    while let Some(block) = stack.pop() {
        if body.insert(block) {
            stack.extend(dom_tree.predecessors(block).iter().copied());
        }
    }
    body
}

impl LoopForest {
    /// Returns the loop with the given ID
    pub fn get(&self, id: LoopId) -> &Loop {
        &self.loops[id]
    }

    /// Outermost loops, in header order
    pub fn top_level(&self) -> &[LoopId] {
        &self.top_level
    }

    /// Iterates over every loop, in header order
    pub fn iter(&self) -> impl Iterator<Item = (LoopId, &Loop)> {
        self.loops.iter_enumerated()
    }

    /// Returns the loop headed by `header`
    pub fn loop_with_header(&self, header: BasicBlockId) -> Option<LoopId> {
        self.loops
            .iter_enumerated()
            .find(|(_, lp)| lp.header == header)
            .map(|(id, _)| id)
    }

    /// Innermost loop containing `block`
    pub fn innermost_loop_of(&self, block: BasicBlockId) -> Option<LoopId> {
        self.loops
            .iter_enumerated()
            .filter(|(_, lp)| lp.contains(block))
            .max_by_key(|(_, lp)| lp.depth)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}
