//! # Logical Loop Interchange
//!
//! Decides whether the outer and inner index roles may be swapped when mapping a
//! loop onto the accelerator. Nothing is moved in the IR: the inner loop body is
//! replaced by an accelerator call either way, so only the [`AccessPattern`]
//! labels change.

use autopim_mir::analysis::{DefUseIndex, Loop};
use autopim_mir::{InstructionKind, MirFunction};

use crate::access::{array_trailing_index, AccessPattern};
use crate::analyses::loop_instructions;
use crate::independence::is_iteration_independent;

/// Interchange is valid when the iterations are independent and every array
/// store of the loop is keyed by the row index
pub fn is_interchange_valid(
    function: &MirFunction,
    defs: &DefUseIndex,
    lp: &Loop,
    pattern: &AccessPattern,
) -> bool {
    if !is_iteration_independent(function, defs, lp, pattern) {
        return false;
    }

    loop_instructions(function, lp).all(|instruction| match &instruction.kind {
        InstructionKind::Store { address, .. } => {
            match array_trailing_index(function, defs, *address) {
                Some(index) => pattern
                    .row_index
                    .is_some_and(|row| index.is_operand_of(row)),
                None => true,
            }
        }
        _ => true,
    })
}
