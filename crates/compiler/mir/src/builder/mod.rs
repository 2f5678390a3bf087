//! # Builders
//!
//! Hand construction of MIR: [`CfgBuilder`] shapes and terminates blocks,
//! [`InstrBuilder`] fills them.

mod cfg_builder;
mod instr_builder;

pub use cfg_builder::{CfgBuilder, ForLoopBlocks};
pub use instr_builder::InstrBuilder;
