//! # Iteration Independence
//!
//! A syntactic over-approximation of cross-iteration dependence. A loop counts as
//! independent only when every array access is indexed by its own induction
//! variable or by the row index, and every store goes through such an access.
//! Any other address (a raw pointer, an unrelated index) is assumed to carry a
//! dependence.

use autopim_mir::analysis::{DefUseIndex, Loop};
use autopim_mir::{InstructionKind, MirFunction, Value};
use tracing::debug;

use crate::access::{array_trailing_index, AccessPattern};
use crate::analyses::loop_instructions;

pub fn is_iteration_independent(
    function: &MirFunction,
    defs: &DefUseIndex,
    lp: &Loop,
    pattern: &AccessPattern,
) -> bool {
    let Some(iv) = lp.canonical_induction_variable(function) else {
        debug!(
            header = lp.header.index(),
            "no canonical induction variable, assuming dependent iterations"
        );
        return false;
    };

    let qualifies = |index: Value| {
        index.is_operand_of(iv.phi) || pattern.row_index.is_some_and(|row| index.is_operand_of(row))
    };

    for instruction in loop_instructions(function, lp) {
        let index = match &instruction.kind {
            InstructionKind::GetElementPtr { .. } => instruction.trailing_index(),
            InstructionKind::Store { address, .. } => {
                array_trailing_index(function, defs, *address)
            }
            _ => continue,
        };

        if !index.is_some_and(qualifies) {
            debug!(
                header = lp.header.index(),
                instruction = ?instruction.kind,
                "access not keyed by a loop index, assuming dependent iterations"
            );
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use autopim_test_utils::{escaping_reduction, grim_filter, raw_pointer_store, row_reduction};

    use super::*;
    use crate::FunctionAnalyses;

    #[test]
    fn test_accumulation_loop_is_independent() {
        let grim = grim_filter();
        let function = grim.kernel.function();
        let analyses = FunctionAnalyses::compute(function);
        let pattern = AccessPattern::new(grim.rows.iv);

        let inner = analyses.loop_at(grim.accumulate.header()).unwrap();
        assert!(is_iteration_independent(
            function,
            &analyses.defs,
            inner,
            &pattern
        ));
    }

    #[test]
    fn test_unrelated_index_is_dependent() {
        let grim = grim_filter();
        let function = grim.kernel.function();
        let analyses = FunctionAnalyses::compute(function);

        // The outer loop contains out[j], keyed by the inner variable only
        let outer = analyses.loop_at(grim.rows.header()).unwrap();
        let pattern = AccessPattern::default();
        assert!(!is_iteration_independent(
            function,
            &analyses.defs,
            outer,
            &pattern
        ));
    }

    #[test]
    fn test_raw_pointer_store_is_dependent() {
        let kernel = raw_pointer_store();
        let function = kernel.kernel.function();
        let analyses = FunctionAnalyses::compute(function);
        let lp = analyses.loop_at(kernel.lp.header()).unwrap();
        let pattern = AccessPattern::new(kernel.lp.iv);

        assert!(!is_iteration_independent(
            function,
            &analyses.defs,
            lp,
            &pattern
        ));
    }

    #[test]
    fn test_outer_index_counts_as_qualifying() {
        let kernel = row_reduction();
        let function = kernel.kernel.function();
        let analyses = FunctionAnalyses::compute(function);
        let inner = analyses.loop_at(kernel.inner.header()).unwrap();

        assert!(is_iteration_independent(
            function,
            &analyses.defs,
            inner,
            &AccessPattern::new(kernel.outer.iv)
        ));
        assert!(!is_iteration_independent(
            function,
            &analyses.defs,
            inner,
            &AccessPattern::default()
        ));
    }

    #[test]
    fn test_reduction_loop_accesses_are_keyed() {
        // Independence only looks at addresses; the escaping accumulator is the
        // eraser's concern.
        let kernel = escaping_reduction();
        let function = kernel.kernel.function();
        let analyses = FunctionAnalyses::compute(function);
        let lp = analyses.loop_at(kernel.lp.header()).unwrap();

        assert!(is_iteration_independent(
            function,
            &analyses.defs,
            lp,
            &AccessPattern::new(kernel.lp.iv)
        ));
    }
}
