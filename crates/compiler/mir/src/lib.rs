//! # AutoPIM MIR
//!
//! The host-side SSA IR the offload pass reads and rewrites.
//!
//! ```text
//! MirModule        functions by FunctionId, name index
//!   MirFunction    blocks by BasicBlockId, parameters, value types
//!     BasicBlock   phis, then plain instructions, then one Terminator
//! ```
//!
//! Every value is defined once. Control flow only changes at terminators, so a
//! loop can be cut out of a function by retargeting its header's branch and
//! letting [`DeadCodeElimination`] sweep the unreachable blocks.
//!
//! The [`analysis`] module holds the read-only oracles loop transformations
//! consume: dominators, the natural-loop forest with canonical induction
//! variables, and a def/use index.

#![allow(clippy::option_if_let_else)]

pub use basic_block::BasicBlock;
pub use builder::{CfgBuilder, ForLoopBlocks, InstrBuilder};
pub use function::MirFunction;
pub use instruction::{BinaryOp, CastKind, Instruction, InstructionKind, UnaryOp};
pub use mir_types::MirType;
pub use module::MirModule;
pub use passes::{DeadCodeElimination, MirPass, PassManager};
pub use terminator::Terminator;
pub use value::{Literal, Value};

pub mod analysis;
pub mod basic_block;
pub mod builder;
pub mod cfg;
pub mod function;
pub mod instruction;
pub mod mir_types;
pub mod module;
pub mod passes;
pub mod terminator;
pub mod value;


index_vec::define_index_type! {
    pub struct FunctionId = usize;
}

index_vec::define_index_type! {
    pub struct BasicBlockId = usize;
}

index_vec::define_index_type! {
    /// An SSA value: parameter, phi or instruction result
    pub struct ValueId = usize;
}

/// Textual IR rendering, `indent` counted in two-space steps
pub trait PrettyPrint {
    fn pretty_print(&self, indent: usize) -> String;
}

pub(crate) fn indent_str(level: usize) -> String {
    "  ".repeat(level)
}
