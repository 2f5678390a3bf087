//! # PIM Offload Pass
//!
//! Drives the analyses over every outer loop of a function and commits the
//! resulting rewrites.
//!
//! Each outer loop is handled in two phases. Planning examines the candidate
//! loops (the children of the outer loop, or the outer loop itself when it has
//! none) against an unmodified function and fills a fresh [`SubLoopRegistry`].
//! Committing then walks the registry in ordinal order and edits the IR. The
//! analyses are recomputed before every outer loop, so loops removed by an
//! earlier rewrite are simply not found again.

use autopim_mir::analysis::Loop;
use autopim_mir::{BasicBlockId, MirFunction, MirModule, MirPass, ValueId};
use tracing::{debug, info, warn};

use crate::access::AccessPattern;
use crate::analyses::FunctionAnalyses;
use crate::config::{OffloadConfig, RuntimeSymbols};
use crate::cost::CostModel;
use crate::expr::extract;
use crate::interchange::is_interchange_valid;
use crate::range::resolve_range;
use crate::registry::{SubLoopKernel, SubLoopRegistry};
use crate::report::{OffloadReport, OuterLoopKind, OuterLoopReport, SubLoopReport};
use crate::rewrite::{erase, is_erase_valid, CallInserter, RuntimeEntryPoints};
use crate::vector::detect_vector_loop;

/// Offloads vectorisable loops to a processing-in-memory accelerator
///
/// When run through [`MirPass::run`] on a lone function the runtime entry points
/// cannot be resolved: loops are analysed and reported but left in place. Use
/// [`PimOffloadPass::run_on_module`] to rewrite.
#[derive(Debug)]
pub struct PimOffloadPass {
    cost_model: CostModel,
    symbols: RuntimeSymbols,
    entry_points: RuntimeEntryPoints,
    report: OffloadReport,
}

/// Everything decided about one outer loop before the IR is touched
struct OuterLoopPlan {
    header: BasicBlockId,
    induction_variable: ValueId,
    kind: OuterLoopKind,
    registry: SubLoopRegistry,
    diagnostics: Vec<Vec<String>>,
}

impl PimOffloadPass {
    pub fn new(config: OffloadConfig) -> Self {
        let entry_points = RuntimeEntryPoints::unresolved(&config.runtime);
        Self {
            cost_model: CostModel::new(config.costs),
            symbols: config.runtime,
            entry_points,
            report: OffloadReport::default(),
        }
    }

    pub const fn report(&self) -> &OffloadReport {
        &self.report
    }

    pub fn take_report(&mut self) -> OffloadReport {
        std::mem::take(&mut self.report)
    }

    /// Resolves the runtime entry points in `module`, then offloads every function with a body
    ///
    /// Returns true if any function was modified.
    pub fn run_on_module(&mut self, module: &mut MirModule) -> bool {
        self.entry_points = RuntimeEntryPoints::resolve(module, &self.symbols);
        for error in [self.entry_points.init().err(), self.entry_points.run().err()]
            .into_iter()
            .flatten()
        {
            warn!(%error, "runtime entry point unavailable, loops will not be rewritten");
        }

        let mut modified = false;
        for function in module.functions.iter_mut().filter(|f| !f.is_external) {
            modified |= self.offload_function(function);
        }
        modified
    }

    fn offload_function(&mut self, function: &mut MirFunction) -> bool {
        if function.is_external {
            return false;
        }

        let analyses = FunctionAnalyses::compute(function);
        let headers: Vec<BasicBlockId> = analyses
            .forest
            .top_level()
            .iter()
            .map(|&id| analyses.forest.get(id).header)
            .collect();
        debug!(
            function = %function.name,
            outer_loops = headers.len(),
            "offloading function"
        );

        let mut modified = false;
        for header in headers {
            let analyses = FunctionAnalyses::compute(function);
            let Some(outer) = analyses.loop_at(header) else {
                debug!(header = header.index(), "outer loop vanished, skipping");
                continue;
            };

            let Some(plan) = self.plan(function, &analyses, outer) else {
                debug!(
                    header = header.index(),
                    "outer loop has no canonical induction variable"
                );
                self.report.outer_loops.push(OuterLoopReport {
                    function: function.name.clone(),
                    header,
                    kind: OuterLoopKind::NotApplicable,
                    sub_loops: Vec::new(),
                });
                continue;
            };

            let (report, changed) = self.commit(function, &analyses, plan);
            modified |= changed;
            self.report.outer_loops.push(report);
        }
        modified
    }

    fn plan(
        &self,
        function: &MirFunction,
        analyses: &FunctionAnalyses,
        outer: &Loop,
    ) -> Option<OuterLoopPlan> {
        let induction_variable = outer.canonical_induction_variable(function)?;
        let pattern = AccessPattern::new(induction_variable.phi);

        let (kind, candidates): (_, Vec<&Loop>) = if outer.children.is_empty() {
            (OuterLoopKind::Standalone, vec![outer])
        } else {
            (
                OuterLoopKind::Nested,
                outer
                    .children
                    .iter()
                    .map(|&id| analyses.forest.get(id))
                    .collect(),
            )
        };

        let mut registry = SubLoopRegistry::new();
        let mut diagnostics = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let mut notes = Vec::new();
            let evaluate_interchange = kind == OuterLoopKind::Nested;
            let (interchanged, kernel) = self.compile_candidate(
                function,
                analyses,
                candidate,
                pattern,
                evaluate_interchange,
                &mut notes,
            );
            registry.record(candidate.header, interchanged, kernel);
            diagnostics.push(notes);
        }

        Some(OuterLoopPlan {
            header: outer.header,
            induction_variable: induction_variable.phi,
            kind,
            registry,
            diagnostics,
        })
    }

    /// Runs the analyses on one candidate loop
    ///
    /// Works on a copy of the outer pattern so that sibling candidates never see
    /// each other's column index or role swap.
    fn compile_candidate(
        &self,
        function: &MirFunction,
        analyses: &FunctionAnalyses,
        candidate: &Loop,
        mut pattern: AccessPattern,
        evaluate_interchange: bool,
        notes: &mut Vec<String>,
    ) -> (bool, Option<SubLoopKernel>) {
        let header = candidate.header.index();
        let interchanged = evaluate_interchange
            && is_interchange_valid(function, &analyses.defs, candidate, &pattern);

        let Some(vector) = detect_vector_loop(function, &analyses.defs, candidate, &mut pattern)
        else {
            notes.push("not a vector loop".to_string());
            return (interchanged, None);
        };
        // Unreachable with the current checks: interchange wants every store keyed
        // by the row index, detection wants the first one keyed by the loop's own.
        if interchanged {
            pattern.swap_roles();
            debug!(header, "row and column roles swapped");
        }

        let Some(expression) = extract(function, &analyses.defs, vector.stored_value, &pattern)
        else {
            notes.push("stored value cannot be evaluated on the accelerator".to_string());
            return (interchanged, None);
        };

        let range = match resolve_range(function, candidate) {
            Ok(range) => range,
            Err(error) => {
                notes.push(error.to_string());
                return (interchanged, None);
            }
        };

        let cost = self.cost_model.cost(&expression);
        let erase_valid = is_erase_valid(function, &analyses.dom_tree, &analyses.defs, candidate);
        if !erase_valid {
            notes.push("loop body kept: a value computed in the loop is used after it".to_string());
        }
        debug!(header, %range, %expression, cost, erase_valid, "compiled loop");

        (
            interchanged,
            Some(SubLoopKernel {
                range,
                expression,
                cost,
                induction_variable: vector.induction_variable.phi,
                erase_valid,
            }),
        )
    }

    fn commit(
        &self,
        function: &mut MirFunction,
        analyses: &FunctionAnalyses,
        plan: OuterLoopPlan,
    ) -> (OuterLoopReport, bool) {
        let mut inserter = CallInserter::new(&self.entry_points);
        let mut modified = false;
        let mut sub_loops: Vec<SubLoopReport> = plan
            .registry
            .into_entries()
            .into_iter()
            .zip(plan.diagnostics)
            .map(|(record, notes)| SubLoopReport::new(record, notes))
            .collect();

        for sub_loop in &mut sub_loops {
            let Some(kernel) = sub_loop.record.kernel.clone() else {
                continue;
            };
            let header = sub_loop.record.header;
            let index = sub_loop.record.index;

            // a standalone loop gets its calls even when its body has to stay
            let standalone = plan.kind == OuterLoopKind::Standalone;
            if !standalone && !kernel.erase_valid {
                continue;
            }
            let Some(lp) = analyses.loop_at(header) else {
                continue;
            };
            let available = if standalone {
                self.entry_points.init().and(self.entry_points.run())
            } else {
                self.entry_points.run()
            };
            if let Err(error) = available {
                warn!(header = header.index(), %error, "loop left in place");
                sub_loop.diagnostics.push(error.to_string());
                continue;
            }

            if kernel.erase_valid {
                match erase(function, lp) {
                    Ok(()) => {
                        sub_loop.erased = true;
                        modified = true;
                    }
                    Err(error) => {
                        warn!(header = header.index(), %error, "loop left in place");
                        sub_loop.diagnostics.push(error.to_string());
                        if !standalone {
                            continue;
                        }
                    }
                }
            }

            // a standalone loop is its own outer loop: init precedes run in the header
            if standalone {
                modified |= self.insert_init(&mut inserter, function, plan.header, sub_loop, &kernel);
            }
            match inserter.insert_run_call(function, header, index, plan.induction_variable) {
                Ok(()) => {
                    info!(header = header.index(), subloop = index, "inserted run call");
                    sub_loop.run_call_inserted = true;
                    modified = true;
                }
                Err(error) => {
                    warn!(header = header.index(), %error, "run call not inserted");
                    sub_loop.diagnostics.push(error.to_string());
                }
            }
        }

        if plan.kind == OuterLoopKind::Nested {
            for sub_loop in &mut sub_loops {
                if let Some(kernel) = sub_loop.record.kernel.clone() {
                    modified |=
                        self.insert_init(&mut inserter, function, plan.header, sub_loop, &kernel);
                }
            }
        }

        let report = OuterLoopReport {
            function: function.name.clone(),
            header: plan.header,
            kind: plan.kind,
            sub_loops,
        };
        (report, modified)
    }

    fn insert_init(
        &self,
        inserter: &mut CallInserter<'_>,
        function: &mut MirFunction,
        outer_header: BasicBlockId,
        sub_loop: &mut SubLoopReport,
        kernel: &SubLoopKernel,
    ) -> bool {
        let index = sub_loop.record.index;
        match inserter.insert_init_call(function, outer_header, index, kernel.range) {
            Ok(()) => {
                info!(
                    header = outer_header.index(),
                    subloop = index,
                    range = %kernel.range,
                    "inserted init call"
                );
                sub_loop.init_call_inserted = true;
                true
            }
            Err(error) => {
                warn!(header = outer_header.index(), %error, "init call not inserted");
                sub_loop.diagnostics.push(error.to_string());
                false
            }
        }
    }
}

impl Default for PimOffloadPass {
    fn default() -> Self {
        Self::new(OffloadConfig::default())
    }
}

impl MirPass for PimOffloadPass {
    fn run(&mut self, function: &mut MirFunction) -> bool {
        self.offload_function(function)
    }

    fn name(&self) -> &'static str {
        "PimOffloadPass"
    }
}
