//! # Expression Extraction
//!
//! Turns the instruction DAG feeding a stored value into the expression tree the
//! accelerator has to evaluate per element.
//!
//! Only a closed set of binary operators is accepted. Leaves are literals and
//! loads from arrays indexed by one of the [`AccessPattern`] indices. Integer
//! conversions and plain copies are looked through. Anything else makes the
//! whole extraction fail.

use std::fmt;

use autopim_mir::analysis::DefUseIndex;
use autopim_mir::{BinaryOp, InstructionKind, Literal, MirFunction, Value, ValueId};

use crate::access::{array_trailing_index, AccessPattern};

/// Operators the accelerator implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PimOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    /// Any integer comparison predicate
    Compare,
}

impl PimOp {
    /// Maps a MIR binary operator onto the accelerator operator set
    ///
    /// Remainders have no accelerator counterpart.
    pub const fn from_binary_op(op: BinaryOp) -> Option<Self> {
        let pim_op = match op {
            BinaryOp::Add => Self::Add,
            BinaryOp::Sub => Self::Sub,
            BinaryOp::Mul => Self::Mul,
            BinaryOp::SDiv => Self::SDiv,
            BinaryOp::UDiv => Self::UDiv,
            BinaryOp::And => Self::And,
            BinaryOp::Or => Self::Or,
            BinaryOp::Xor => Self::Xor,
            BinaryOp::Shl => Self::Shl,
            BinaryOp::LShr => Self::LShr,
            BinaryOp::AShr => Self::AShr,
            BinaryOp::SRem | BinaryOp::URem => return None,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::SLt
            | BinaryOp::SLe
            | BinaryOp::SGt
            | BinaryOp::SGe
            | BinaryOp::ULt
            | BinaryOp::ULe
            | BinaryOp::UGt
            | BinaryOp::UGe => Self::Compare,
        };
        Some(pim_op)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::SDiv => "SDIV",
            Self::UDiv => "UDIV",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Shl => "SHL",
            Self::LShr => "LSHR",
            Self::AShr => "ASHR",
            Self::Compare => "CMP",
        }
    }
}

/// A per-element computation, rooted at the stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprTree {
    /// A literal, wired into the accelerator
    Constant(Literal),
    /// A load from an array indexed by the row or column index
    ArrayLoad { source: ValueId },
    /// A binary operator applied to two subtrees
    Operator {
        op: PimOp,
        source: ValueId,
        left: Box<ExprTree>,
        right: Box<ExprTree>,
    },
}

impl ExprTree {
    /// Folds the tree bottom-up, visiting the left subtree before the right one
    pub fn fold<T, L, N>(&self, leaf: &mut L, node: &mut N) -> T
    where
        L: FnMut(&Self) -> T,
        N: FnMut(PimOp, T, T) -> T,
    {
        match self {
            Self::Constant(_) | Self::ArrayLoad { .. } => leaf(self),
            Self::Operator {
                op, left, right, ..
            } => {
                let left = left.fold(leaf, node);
                let right = right.fold(leaf, node);
                node(*op, left, right)
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.fold(&mut |_| 1, &mut |_, left, right| left + right)
    }

    pub fn operator_count(&self) -> usize {
        self.fold(&mut |_| 0, &mut |_, left, right| left + right + 1)
    }

    /// Renders the tree as a parenthesised prefix expression
    ///
    /// `(ADD (LOAD) (MUL (LOAD) (CONSTANT)))`
    pub fn render_prefix(&self) -> String {
        self.fold(
            &mut |leaf| match leaf {
                Self::ArrayLoad { .. } => "(LOAD)".to_string(),
                _ => "(CONSTANT)".to_string(),
            },
            &mut |op, left, right| format!("({} {left} {right})", op.mnemonic()),
        )
    }
}

impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_prefix())
    }
}

/// Extracts the expression tree computing `value`
///
/// Returns `None` as soon as any subtree falls outside the accepted forms.
pub fn extract(
    function: &MirFunction,
    defs: &DefUseIndex,
    value: Value,
    pattern: &AccessPattern,
) -> Option<ExprTree> {
    let id = match value {
        Value::Literal(literal) => return Some(ExprTree::Constant(literal)),
        Value::Operand(id) => id,
        Value::Error => return None,
    };

    let instruction = defs.defining_instruction(function, id)?;
    match &instruction.kind {
        InstructionKind::Cast { source, .. } | InstructionKind::Assign { source, .. } => {
            extract(function, defs, *source, pattern)
        }
        InstructionKind::BinaryOp {
            op, left, right, ..
        } => {
            let op = PimOp::from_binary_op(*op)?;
            let left = extract(function, defs, *left, pattern)?;
            let right = extract(function, defs, *right, pattern)?;
            Some(ExprTree::Operator {
                op,
                source: id,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        InstructionKind::Load { address, .. } => {
            let index = array_trailing_index(function, defs, *address)?;
            pattern
                .is_indexed_by(index)
                .then_some(ExprTree::ArrayLoad { source: id })
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod tests;
