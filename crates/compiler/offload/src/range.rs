//! # Loop Range Resolution
//!
//! Recovers the static `[start, end)` bounds of a counted loop. The start is the
//! first incoming value of the first phi in scan order, the end is the second
//! operand of the first comparison. Both must be integer literals.

use std::fmt;

use autopim_mir::analysis::Loop;
use autopim_mir::{InstructionKind, Literal, MirFunction, PrettyPrint, Value};

use crate::analyses::loop_instructions;
use crate::error::RangeError;

/// Statically resolved bounds of a loop, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopRange {
    pub start: i64,
    pub end: i64,
}

impl LoopRange {
    pub const fn trip_count(&self) -> u64 {
        self.end.abs_diff(self.start)
    }
}

impl fmt::Display for LoopRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

pub fn resolve_range(function: &MirFunction, lp: &Loop) -> Result<LoopRange, RangeError> {
    let mut start = None;
    let mut end = None;

    for instruction in loop_instructions(function, lp) {
        match &instruction.kind {
            InstructionKind::Phi { sources, .. } if start.is_none() => {
                start = sources.first().map(|(_, value)| *value);
            }
            InstructionKind::BinaryOp { op, right, .. } if end.is_none() && op.is_comparison() => {
                end = Some(*right);
            }
            _ => {}
        }
        if start.is_some() && end.is_some() {
            break;
        }
    }

    let start = start.ok_or(RangeError::NoMergeValue)?;
    let end = end.ok_or(RangeError::NoExitComparison)?;
    let start =
        integer_literal(start).ok_or_else(|| RangeError::NonConstantStart(start.pretty_print(0)))?;
    let end =
        integer_literal(end).ok_or_else(|| RangeError::NonConstantBound(end.pretty_print(0)))?;

    if start > end {
        return Err(RangeError::Inverted { start, end });
    }
    Ok(LoopRange { start, end })
}

const fn integer_literal(value: Value) -> Option<i64> {
    match value {
        Value::Literal(Literal::Integer(value)) => Some(value),
        _ => None,
    }
}
