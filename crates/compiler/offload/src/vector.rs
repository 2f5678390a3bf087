//! # Vector Loop Detection
//!
//! A vector loop stores into an array slot keyed by its own induction variable and
//! has independent iterations. Only the first store of the loop is considered.

use autopim_mir::analysis::{DefUseIndex, InductionVariable, Loop};
use autopim_mir::{InstructionKind, MirFunction, Value};
use tracing::debug;

use crate::access::{array_trailing_index, AccessPattern};
use crate::analyses::loop_instructions;
use crate::independence::is_iteration_independent;

/// A recognised vector loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorLoop {
    pub induction_variable: InductionVariable,
    /// The value written by the keyed store, root of the per-element computation
    pub stored_value: Value,
}

/// Tests whether `lp` is a vector loop
///
/// On finding the first store, `pattern.col_index` is set to the loop's induction
/// variable, whatever the final verdict.
pub fn detect_vector_loop(
    function: &MirFunction,
    defs: &DefUseIndex,
    lp: &Loop,
    pattern: &mut AccessPattern,
) -> Option<VectorLoop> {
    let induction_variable = lp.canonical_induction_variable(function)?;

    let (address, stored_value) =
        loop_instructions(function, lp).find_map(|instruction| match &instruction.kind {
            InstructionKind::Store { address, value, .. } => Some((*address, *value)),
            _ => None,
        })?;
    pattern.col_index = Some(induction_variable.phi);

    let keyed = array_trailing_index(function, defs, address)
        .is_some_and(|index| index.is_operand_of(induction_variable.phi));
    if !keyed {
        debug!(
            header = lp.header.index(),
            "first store is not keyed by the induction variable"
        );
        return None;
    }

    if !is_iteration_independent(function, defs, lp, pattern) {
        return None;
    }

    Some(VectorLoop {
        induction_variable,
        stored_value,
    })
}
