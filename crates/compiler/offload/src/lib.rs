//! # AutoPIM Offload
//!
//! A MIR pass that finds loops whose per-element computation a
//! processing-in-memory accelerator can evaluate, compiles that computation into
//! an expression tree with an area cost, and rewrites the host function to call
//! the accelerator runtime instead of running the loop.
//!
//! ## Pipeline
//!
//! For every outermost loop with a canonical induction variable:
//!
//! 1. Each child loop (or the loop itself when it has no children) is checked for
//!    logical interchange and recognised as a vector loop
//!    ([`is_interchange_valid`], [`detect_vector_loop`])
//! 2. The stored value is turned into an [`ExprTree`] ([`extract`]) and costed
//!    ([`CostModel`])
//! 3. The loop bounds are recovered ([`resolve_range`]) and the outcome recorded
//!    in a [`SubLoopRegistry`]
//! 4. Erasable loops are cut out of the CFG and runtime calls are inserted
//!    ([`erase`], [`CallInserter`])
//!
//! The unreachable loop bodies left behind are for
//! [`autopim_mir::DeadCodeElimination`] to remove.

pub use access::AccessPattern;
pub use analyses::FunctionAnalyses;
pub use config::{OffloadConfig, RuntimeSymbols};
pub use cost::{CostModel, CostTable};
pub use error::{OffloadError, RangeError};
pub use expr::{extract, ExprTree, PimOp};
pub use independence::is_iteration_independent;
pub use interchange::is_interchange_valid;
pub use pass::PimOffloadPass;
pub use range::{resolve_range, LoopRange};
pub use registry::{CompiledSubLoop, SubLoopKernel, SubLoopRegistry};
pub use report::{OffloadReport, OuterLoopKind, OuterLoopReport, SubLoopReport};
pub use rewrite::{erase, is_erase_valid, CallInserter, RuntimeEntryPoints};
pub use vector::{detect_vector_loop, VectorLoop};

pub mod access;
pub mod analyses;
pub mod config;
pub mod cost;
pub mod error;
pub mod expr;
pub mod independence;
pub mod interchange;
pub mod pass;
pub mod range;
pub mod registry;
pub mod report;
pub mod rewrite;
pub mod vector;
