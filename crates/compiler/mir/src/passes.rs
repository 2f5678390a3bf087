//! # Passes
//!
//! Function-level transformations and a sequential runner. Loop rewrites leave
//! unreachable bodies behind; [`PassManager::cleanup_pipeline`] sweeps them.

pub mod dead_code_elimination;

pub use dead_code_elimination::DeadCodeElimination;

use crate::{MirFunction, MirModule};

pub trait MirPass {
    /// Transforms `function` in place, returning true if anything changed
    fn run(&mut self, function: &mut MirFunction) -> bool;

    fn name(&self) -> &'static str;
}

/// Runs boxed passes one after the other, in the order they were added
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn MirPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass<P: MirPass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn run(&mut self, function: &mut MirFunction) -> bool {
        let mut modified = false;
        for pass in &mut self.passes {
            if pass.run(function) {
                log::debug!("{} changed '{}'", pass.name(), function.name);
                modified = true;
            }
        }
        modified
    }

    /// Runs every pass over each function with a body; declarations are skipped
    pub fn run_on_module(&mut self, module: &mut MirModule) -> bool {
        let mut modified = false;
        for function in module.functions.iter_mut().filter(|f| !f.is_external) {
            modified |= self.run(function);
        }
        modified
    }

    pub fn cleanup_pipeline() -> Self {
        Self::new().add_pass(DeadCodeElimination::new())
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

#[cfg(test)]
#[path = "passes_tests.rs"]
mod tests;
