//! # Sub-Loop Registry
//!
//! Records the outcome of every loop examined during one outer-loop visit. A
//! fresh registry is created per visit, so ordinals never collide across outer
//! loops.

use autopim_mir::{BasicBlockId, ValueId};

use crate::expr::ExprTree;
use crate::range::LoopRange;

/// Everything needed to offload one compiled sub-loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubLoopKernel {
    pub range: LoopRange,
    pub expression: ExprTree,
    pub cost: u64,
    /// Induction variable of the compiled loop
    pub induction_variable: ValueId,
    /// Whether the loop body may be deleted once the accelerator takes over
    pub erase_valid: bool,
}

impl SubLoopKernel {
    /// The prefix rendering of the per-element computation
    pub fn expression_text(&self) -> String {
        self.expression.render_prefix()
    }
}

/// The immutable outcome of examining one loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSubLoop {
    /// Dense ordinal within the outer-loop visit
    pub index: usize,
    pub header: BasicBlockId,
    /// True when the row and column roles were logically swapped
    pub interchanged: bool,
    /// `None` when detection, extraction or range resolution failed
    pub kernel: Option<SubLoopKernel>,
}

impl CompiledSubLoop {
    pub const fn is_compiled(&self) -> bool {
        self.kernel.is_some()
    }

    /// Name of the accelerator kernel this loop compiles to
    pub fn kernel_name(&self) -> String {
        format!("sub_loop_fn{}", self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubLoopRegistry {
    entries: Vec<CompiledSubLoop>,
}

impl SubLoopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its ordinal
    pub fn record(
        &mut self,
        header: BasicBlockId,
        interchanged: bool,
        kernel: Option<SubLoopKernel>,
    ) -> usize {
        let index = self.entries.len();
        self.entries.push(CompiledSubLoop {
            index,
            header,
            interchanged,
            kernel,
        });
        index
    }

    pub fn get(&self, index: usize) -> Option<&CompiledSubLoop> {
        self.entries.get(index)
    }

    /// All records, in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = &CompiledSubLoop> {
        self.entries.iter()
    }

    /// Records that compiled successfully, in ordinal order
    pub fn compiled(&self) -> impl Iterator<Item = (&CompiledSubLoop, &SubLoopKernel)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.kernel.as_ref().map(|kernel| (entry, kernel)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<CompiledSubLoop> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use autopim_mir::Literal;

    use super::*;

    fn kernel(end: i64) -> SubLoopKernel {
        SubLoopKernel {
            range: LoopRange { start: 0, end },
            expression: ExprTree::Constant(Literal::Integer(1)),
            cost: 0,
            induction_variable: ValueId::new(0),
            erase_valid: true,
        }
    }

    #[test]
    fn test_ordinals_are_dense_and_failures_are_kept() {
        let mut registry = SubLoopRegistry::new();
        assert_eq!(registry.record(BasicBlockId::new(5), false, None), 0);
        assert_eq!(
            registry.record(BasicBlockId::new(9), true, Some(kernel(16))),
            1
        );
        assert_eq!(registry.record(BasicBlockId::new(13), false, Some(kernel(8))), 2);

        assert_eq!(registry.len(), 3);
        assert!(!registry.get(0).unwrap().is_compiled());
        assert!(registry.get(1).unwrap().interchanged);

        let compiled: Vec<usize> = registry.compiled().map(|(entry, _)| entry.index).collect();
        assert_eq!(compiled, vec![1, 2]);
        assert_eq!(registry.get(2).unwrap().kernel_name(), "sub_loop_fn2");
        assert_eq!(
            registry.get(1).unwrap().kernel.as_ref().unwrap().expression_text(),
            "(CONSTANT)"
        );
    }
}
