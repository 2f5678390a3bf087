//! # Loop Erasure and Call Insertion
//!
//! Once a loop has been compiled for the accelerator its body is cut out of the
//! control flow and replaced by calls to the runtime entry points:
//!
//! - `init(subloop_index, range_start, range_end)` at the outer loop header
//! - `run(subloop_index, index_value)` at the erased loop's header
//!
//! Erasure only rewires the header's branch to the loop exit. The body becomes
//! unreachable and is removed by dead-code elimination afterwards.

use autopim_mir::analysis::{DefUseIndex, DominatorTree, Loop};
use autopim_mir::{
    BasicBlockId, FunctionId, Instruction, InstructionKind, MirFunction, MirModule, MirType,
    Value, ValueId,
};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::RuntimeSymbols;
use crate::error::OffloadError;
use crate::range::LoopRange;

/// The runtime entry points as resolved in one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEntryPoints {
    init: Result<FunctionId, OffloadError>,
    run: Result<FunctionId, OffloadError>,
}

impl RuntimeEntryPoints {
    /// Looks up both entry points, checking that they are integer-only void declarations
    pub fn resolve(module: &MirModule, symbols: &RuntimeSymbols) -> Self {
        Self {
            init: resolve_entry_point(module, &symbols.init, 3),
            run: resolve_entry_point(module, &symbols.run, 2),
        }
    }

    /// Entry points for a function analysed outside of any module
    pub fn unresolved(symbols: &RuntimeSymbols) -> Self {
        Self {
            init: Err(OffloadError::MissingEntryPoint {
                name: symbols.init.clone(),
            }),
            run: Err(OffloadError::MissingEntryPoint {
                name: symbols.run.clone(),
            }),
        }
    }

    pub fn init(&self) -> Result<FunctionId, OffloadError> {
        self.init.clone()
    }

    pub fn run(&self) -> Result<FunctionId, OffloadError> {
        self.run.clone()
    }
}

fn resolve_entry_point(
    module: &MirModule,
    name: &str,
    arity: usize,
) -> Result<FunctionId, OffloadError> {
    let id = module
        .lookup_function(name)
        .ok_or_else(|| OffloadError::MissingEntryPoint {
            name: name.to_string(),
        })?;
    let function = module
        .get_function(id)
        .ok_or_else(|| OffloadError::MissingEntryPoint {
            name: name.to_string(),
        })?;

    let params = function.parameter_types();
    let well_formed = function.is_external
        && params.len() == arity
        && params.iter().all(MirType::is_integer)
        && function.return_type == MirType::Unit;
    if !well_formed {
        return Err(OffloadError::EntryPointSignature {
            name: name.to_string(),
            expected: MirType::function(vec![MirType::i32(); arity], MirType::unit()).to_string(),
            found: function.signature().to_string(),
        });
    }
    Ok(id)
}

/// Returns true if deleting the body of `lp` cannot lose a value
///
/// The header must branch to exactly one block inside the loop and the loop must
/// have a unique exit. Every value defined in the loop, address computations
/// aside, may only be used inside the loop or in blocks that entering the body
/// dominates, which disappear along with it.
pub fn is_erase_valid(
    function: &MirFunction,
    dom_tree: &DominatorTree,
    defs: &DefUseIndex,
    lp: &Loop,
) -> bool {
    let Some((then_target, else_target)) = function
        .get_basic_block(lp.header)
        .and_then(|header| header.terminator.branch_targets())
    else {
        return false;
    };
    let body = match (lp.contains(then_target), lp.contains(else_target)) {
        (true, false) => then_target,
        (false, true) => else_target,
        _ => return false,
    };
    if lp.exit_block(function).is_none() {
        return false;
    }

    for &block_id in &lp.blocks {
        let Some(block) = function.get_basic_block(block_id) else {
            continue;
        };
        for instruction in &block.instructions {
            if matches!(
                instruction.kind,
                InstructionKind::GetElementPtr { .. } | InstructionKind::Store { .. }
            ) {
                continue;
            }

            // a phi outside the loop survives erasure even when its input comes from the body
            for value in instruction.destinations() {
                let escapes = defs.uses(value).iter().any(|site| {
                    !lp.contains(site.block)
                        && !dom_tree.edge_dominates(lp.header, body, site.block)
                });
                if escapes {
                    debug!(
                        header = lp.header.index(),
                        value = value.index(),
                        "value escapes the loop, keeping the body"
                    );
                    return false;
                }
            }
        }
    }

    true
}

/// Points both successors of the header's branch at the loop exit
///
/// All or nothing: on error the function is left untouched.
pub fn erase(function: &mut MirFunction, lp: &Loop) -> Result<(), OffloadError> {
    let header = lp.header.index();
    let exit = lp
        .exit_block(function)
        .ok_or(OffloadError::NoExitBlock { header })?;
    let block = function
        .get_basic_block_mut(lp.header)
        .ok_or_else(|| OffloadError::Edit(format!("block bb{header} does not exist")))?;

    if !block.terminator.redirect_all_targets(exit) {
        return Err(OffloadError::NotConditional { header });
    }
    info!(header, exit = exit.index(), "erased loop body");
    Ok(())
}

/// Inserts runtime calls after the phis of a block
///
/// Calls inserted into the same block keep their insertion order.
#[derive(Debug)]
pub struct CallInserter<'a> {
    entry_points: &'a RuntimeEntryPoints,
    inserted: FxHashMap<BasicBlockId, usize>,
}

impl<'a> CallInserter<'a> {
    pub fn new(entry_points: &'a RuntimeEntryPoints) -> Self {
        Self {
            entry_points,
            inserted: FxHashMap::default(),
        }
    }

    /// Inserts `run(subloop_index, index_value)` into `header`
    pub fn insert_run_call(
        &mut self,
        function: &mut MirFunction,
        header: BasicBlockId,
        subloop_index: usize,
        index_value: ValueId,
    ) -> Result<(), OffloadError> {
        let callee = self.entry_points.run()?;
        self.insert_call(
            function,
            header,
            callee,
            vec![
                Value::integer(subloop_index as i64),
                Value::operand(index_value),
            ],
        )
    }

    /// Inserts `init(subloop_index, range.start, range.end)` into `header`
    pub fn insert_init_call(
        &mut self,
        function: &mut MirFunction,
        header: BasicBlockId,
        subloop_index: usize,
        range: LoopRange,
    ) -> Result<(), OffloadError> {
        let callee = self.entry_points.init()?;
        self.insert_call(
            function,
            header,
            callee,
            vec![
                Value::integer(subloop_index as i64),
                Value::integer(range.start),
                Value::integer(range.end),
            ],
        )
    }

    fn insert_call(
        &mut self,
        function: &mut MirFunction,
        block: BasicBlockId,
        callee: FunctionId,
        args: Vec<Value>,
    ) -> Result<(), OffloadError> {
        let first_non_phi = function
            .get_basic_block(block)
            .ok_or_else(|| OffloadError::Edit(format!("block bb{} does not exist", block.index())))?
            .first_non_phi_index();
        let already = self.inserted.get(&block).copied().unwrap_or(0);

        function
            .insert_instruction(
                block,
                first_non_phi + already,
                Instruction::void_call(callee, args),
            )
            .map_err(OffloadError::Edit)?;
        *self.inserted.entry(block).or_default() += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
