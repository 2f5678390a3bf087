//! # Analysis Module
//!
//! Read-only analyses over MIR functions: dominance, natural loops with
//! canonical induction variables, and def/use information.

pub mod def_use;
pub mod dominance;
pub mod loops;

#[cfg(test)]
mod tests;

pub use def_use::{DefUseIndex, Definition, UseKind, UseSite};
pub use dominance::{compute_dominator_tree, DominatorTree};
pub use loops::{compute_loop_forest, InductionVariable, Loop, LoopForest, LoopId};
