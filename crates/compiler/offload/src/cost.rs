//! # Cost Model
//!
//! Structural hardware-area estimate of an extracted expression. Leaves are free;
//! every operator node adds its weight from the [`CostTable`].

use serde::{Deserialize, Serialize};

use crate::expr::{ExprTree, PimOp};

/// Per-operator area weights
///
/// Every field defaults to the reference weights, so a configuration file only
/// needs to name the operators it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub add: u64,
    pub sub: u64,
    pub mul: u64,
    /// Signed and unsigned division
    pub div: u64,
    pub and: u64,
    pub or: u64,
    pub xor: u64,
    /// Logical and arithmetic shifts
    pub shift: u64,
    pub compare: u64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            add: 1187,
            sub: 1187,
            mul: 16066,
            div: 61252,
            and: 50,
            or: 50,
            xor: 99,
            shift: 0,
            compare: 173,
        }
    }
}

impl CostTable {
    pub const fn weight(&self, op: PimOp) -> u64 {
        match op {
            PimOp::Add => self.add,
            PimOp::Sub => self.sub,
            PimOp::Mul => self.mul,
            PimOp::SDiv | PimOp::UDiv => self.div,
            PimOp::And => self.and,
            PimOp::Or => self.or,
            PimOp::Xor => self.xor,
            PimOp::Shl | PimOp::LShr | PimOp::AShr => self.shift,
            PimOp::Compare => self.compare,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CostModel {
    table: CostTable,
}

impl CostModel {
    pub const fn new(table: CostTable) -> Self {
        Self { table }
    }

    pub const fn table(&self) -> &CostTable {
        &self.table
    }

    /// Sums the operator weights of `tree`; constants and array loads cost nothing
    pub fn cost(&self, tree: &ExprTree) -> u64 {
        tree.fold(&mut |_| 0, &mut |op, left: u64, right: u64| {
            left.saturating_add(right)
                .saturating_add(self.table.weight(op))
        })
    }
}
