//! # Dominance Analysis
//!
//! Computes the dominator tree of a function's CFG and answers block and edge
//! dominance queries.
//!
//! ## Dominator Tree
//! A node X dominates a node Y if every path from the entry node to Y must pass through X.
//! The immediate dominator of a node is its closest dominator (excluding itself).
//!
//! ## Edge Dominance
//! An edge `(from, to)` dominates a block B if every path from the entry to B
//! traverses that edge. This holds iff `to` dominates B and every other predecessor
//! of `to` is itself dominated by `to` (only back edges re-enter `to`), and
//! `from -> to` is the only edge between the two blocks.

use rustc_hash::FxHashMap;

use crate::{cfg, BasicBlockId, MirFunction};

/// Immediate-dominator map of a function, plus the predecessor lists used to build it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominatorTree {
    entry: BasicBlockId,
    /// Immediate dominator of every reachable block except the entry
    idom: FxHashMap<BasicBlockId, BasicBlockId>,
    /// Reverse postorder number of every reachable block
    rpo_number: FxHashMap<BasicBlockId, usize>,
    /// Reachable predecessors of every reachable block
    preds: FxHashMap<BasicBlockId, Vec<BasicBlockId>>,
}

/// Computes the dominator tree for a function using the Cooper-Harvey-Kennedy algorithm
///
/// ## Algorithm
/// 1. Compute blocks in reverse postorder (RPO)
/// 2. Initialize entry block's idom to itself
/// 3. Iterate until convergence, updating idoms using the intersect function
pub fn compute_dominator_tree(function: &MirFunction) -> DominatorTree {
    let entry = function.entry_block;
    let rpo = cfg::reverse_postorder(function);
    let rpo_number: FxHashMap<BasicBlockId, usize> =
        rpo.iter().enumerate().map(|(i, &block)| (block, i)).collect();

    let pred_map = cfg::predecessor_map(function);
    let preds: FxHashMap<BasicBlockId, Vec<BasicBlockId>> = pred_map
        .into_iter_enumerated()
        .filter(|(block, _)| rpo_number.contains_key(block))
        .map(|(block, list)| {
            let reachable = list
                .into_iter()
                .filter(|pred| rpo_number.contains_key(pred))
                .collect();
            (block, reachable)
        })
        .collect();

    let mut idom = FxHashMap::default();
    idom.insert(entry, entry);

    let mut changed = true;
    while changed {
        changed = false;

        for &block in rpo.iter().skip(1) {
            let Some(block_preds) = preds.get(&block) else {
                continue;
            };

            let mut processed = block_preds.iter().copied().filter(|p| idom.contains_key(p));
            let Some(first) = processed.next() else {
                continue;
            };
            let new_idom =
                processed.fold(first, |acc, pred| intersect(pred, acc, &idom, &rpo_number));

            if idom.get(&block) != Some(&new_idom) {
                idom.insert(block, new_idom);
                changed = true;
            }
        }
    }

    idom.remove(&entry);

    DominatorTree {
        entry,
        idom,
        rpo_number,
        preds,
    }
}

/// Cooper's intersect function for finding common dominator
fn intersect(
    mut b1: BasicBlockId,
    mut b2: BasicBlockId,
    idom: &FxHashMap<BasicBlockId, BasicBlockId>,
    rpo_number: &FxHashMap<BasicBlockId, usize>,
) -> BasicBlockId {
    while b1 != b2 {
        while rpo_number[&b1] > rpo_number[&b2] {
            b1 = idom[&b1];
        }
        while rpo_number[&b2] > rpo_number[&b1] {
            b2 = idom[&b2];
        }
    }
    b1
}

impl DominatorTree {
    /// The entry block of the analysed function
    pub const fn entry(&self) -> BasicBlockId {
        self.entry
    }

    /// Immediate dominator of `block`; `None` for the entry and unreachable blocks
    pub fn immediate_dominator(&self, block: BasicBlockId) -> Option<BasicBlockId> {
        self.idom.get(&block).copied()
    }

    /// Returns true if `block` is reachable from the entry
    pub fn is_reachable(&self, block: BasicBlockId) -> bool {
        self.rpo_number.contains_key(&block)
    }

    /// Reachable predecessors of `block`
    pub fn predecessors(&self, block: BasicBlockId) -> &[BasicBlockId] {
        self.preds.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `a` dominates `b` (every block dominates itself)
    ///
    /// Unreachable blocks dominate nothing and are dominated by nothing.
    pub fn dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        if !self.is_reachable(a) || !self.is_reachable(b) {
            return false;
        }

        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.idom.get(&current) {
                Some(&parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns true if `a` dominates `b` and `a != b`
    pub fn strictly_dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns true if the CFG edge `from -> to` dominates `block`
    pub fn edge_dominates(&self, from: BasicBlockId, to: BasicBlockId, block: BasicBlockId) -> bool {
        if !self.dominates(to, block) {
            return false;
        }

        let preds = self.predecessors(to);
        if preds.iter().filter(|&&p| p == from).count() != 1 {
            return false;
        }

        preds
            .iter()
            .filter(|&&p| p != from)
            .all(|&p| self.dominates(to, p))
    }
}
