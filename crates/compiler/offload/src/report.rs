//! # Offload Reports
//!
//! A human-readable account of what the offload pass decided for every outer
//! loop it visited.

use std::fmt;

use autopim_mir::BasicBlockId;

use crate::registry::CompiledSubLoop;

/// What happened to one examined loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubLoopReport {
    pub record: CompiledSubLoop,
    pub erased: bool,
    pub run_call_inserted: bool,
    pub init_call_inserted: bool,
    pub diagnostics: Vec<String>,
}

impl SubLoopReport {
    pub const fn new(record: CompiledSubLoop, diagnostics: Vec<String>) -> Self {
        Self {
            record,
            erased: false,
            run_call_inserted: false,
            init_call_inserted: false,
            diagnostics,
        }
    }
}

/// How an outer loop was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterLoopKind {
    /// No canonical induction variable; nothing was examined
    NotApplicable,
    /// No child loops; the loop itself was the candidate
    Standalone,
    /// Each child loop was a candidate
    Nested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterLoopReport {
    pub function: String,
    pub header: BasicBlockId,
    pub kind: OuterLoopKind,
    pub sub_loops: Vec<SubLoopReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffloadReport {
    pub outer_loops: Vec<OuterLoopReport>,
}

impl OffloadReport {
    pub fn sub_loops(&self) -> impl Iterator<Item = &SubLoopReport> {
        self.outer_loops
            .iter()
            .flat_map(|outer| outer.sub_loops.iter())
    }

    pub fn compiled_count(&self) -> usize {
        self.sub_loops()
            .filter(|sub| sub.record.is_compiled())
            .count()
    }

    pub fn erased_count(&self) -> usize {
        self.sub_loops().filter(|sub| sub.erased).count()
    }

    pub fn is_empty(&self) -> bool {
        self.outer_loops.is_empty()
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for SubLoopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = &self.record;
        writeln!(
            f,
            "[Sub-Loop Processing Report] {} at bb{}",
            record.kernel_name(),
            record.header.index()
        )?;
        let required = if record.interchanged { "is" } else { "is not" };
        writeln!(f, "Loop interchange {required} required.")?;

        match &record.kernel {
            Some(kernel) => {
                writeln!(f, "PIM compile can be done.")?;
                writeln!(
                    f,
                    "Compiled: pim_runindex({}, {}, {});",
                    record.kernel_name(),
                    kernel.range.start,
                    kernel.range.end
                )?;
                writeln!(f, "define {} = {}", record.kernel_name(), kernel.expression)?;
                writeln!(f, "Area cost: {}", kernel.cost)?;
                writeln!(
                    f,
                    "Erased: {}, run call: {}, init call: {}",
                    yes_no(self.erased),
                    yes_no(self.run_call_inserted),
                    yes_no(self.init_call_inserted)
                )?;
            }
            None => writeln!(f, "PIM compile cannot be done.")?,
        }

        for diagnostic in &self.diagnostics {
            writeln!(f, "note: {diagnostic}")?;
        }
        Ok(())
    }
}

impl fmt::Display for OuterLoopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header.index();
        match self.kind {
            OuterLoopKind::NotApplicable => {
                return writeln!(
                    f,
                    "[Loop Processing Report] skipped outer loop bb{header} in {}: no canonical induction variable",
                    self.function
                );
            }
            OuterLoopKind::Standalone => writeln!(
                f,
                "[Loop Processing Report] found compatible outer loop bb{header} in {}. No subloops, compiling the loop itself...",
                self.function
            )?,
            OuterLoopKind::Nested => writeln!(
                f,
                "[Loop Processing Report] found compatible outer loop bb{header} in {}. Checking subloops...",
                self.function
            )?,
        }

        for sub_loop in &self.sub_loops {
            write!(f, "{sub_loop}")?;
        }
        Ok(())
    }
}

impl fmt::Display for OffloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outer in &self.outer_loops {
            write!(f, "{outer}")?;
        }
        Ok(())
    }
}
