//! # Access Patterns
//!
//! The pair of index variables an offloadable loop body may address arrays with.

use autopim_mir::analysis::DefUseIndex;
use autopim_mir::{InstructionKind, MirFunction, Value, ValueId};

/// Row and column index variables currently in scope
///
/// `row_index` is the outer loop's induction variable. `col_index` is filled in
/// once a candidate loop has been recognised as a vector loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPattern {
    pub row_index: Option<ValueId>,
    pub col_index: Option<ValueId>,
}

impl AccessPattern {
    /// Creates a pattern with only the row index set
    pub const fn new(row_index: ValueId) -> Self {
        Self {
            row_index: Some(row_index),
            col_index: None,
        }
    }

    /// Swaps the row and column roles in place
    pub fn swap_roles(&mut self) {
        std::mem::swap(&mut self.row_index, &mut self.col_index);
    }

    /// Returns true if `value` is the row or the column index
    pub fn is_indexed_by(&self, value: Value) -> bool {
        match value.as_operand() {
            Some(id) => self.row_index == Some(id) || self.col_index == Some(id),
            None => false,
        }
    }
}

/// Returns the trailing index of the array-indexing computation behind `address`
///
/// `None` when the address is not the result of a `getelementptr`.
pub(crate) fn array_trailing_index(
    function: &MirFunction,
    defs: &DefUseIndex,
    address: Value,
) -> Option<Value> {
    let instruction = defs.defining_instruction(function, address.as_operand()?)?;
    match &instruction.kind {
        InstructionKind::GetElementPtr { .. } => instruction.trailing_index(),
        _ => None,
    }
}
