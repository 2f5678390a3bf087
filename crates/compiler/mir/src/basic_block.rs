//! # Basic Blocks
//!
//! Straight-line instruction lists closed by a single [`Terminator`]. Phis sit
//! at the front of the list; runtime calls inserted by later passes go right
//! after them.

use rustc_hash::FxHashSet;

use crate::{indent_str, Instruction, PrettyPrint, Terminator, ValueId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicBlock {
    /// Label shown by the pretty printer
    pub name: Option<String>,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn push_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Inserts at `index`; panics past the end like [`Vec::insert`]
    pub fn insert_instruction(&mut self, index: usize, instruction: Instruction) {
        self.instructions.insert(index, instruction);
    }

    pub fn set_terminator(&mut self, terminator: Terminator) {
        self.terminator = terminator;
    }

    /// Position right after the leading phis
    pub fn first_non_phi_index(&self) -> usize {
        self.phis().count()
    }

    /// The leading phis of the block
    pub fn phis(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().take_while(|instr| instr.is_phi())
    }

    pub fn validate(&self) -> Result<(), String> {
        let phi_count = self.first_non_phi_index();
        if let Some(offset) = self.instructions[phi_count..]
            .iter()
            .position(Instruction::is_phi)
        {
            return Err(format!(
                "phi at position {} follows a non-phi instruction",
                phi_count + offset
            ));
        }

        for (position, instruction) in self.instructions.iter().enumerate() {
            instruction
                .validate()
                .map_err(|err| format!("instruction {position}: {err}"))?;
        }
        self.terminator.validate()
    }

    /// Values defined by the instructions of this block
    pub fn defined_values(&self) -> FxHashSet<ValueId> {
        self.instructions
            .iter()
            .flat_map(Instruction::destinations)
            .collect()
    }
}

impl PrettyPrint for BasicBlock {
    fn pretty_print(&self, indent: usize) -> String {
        let prefix = indent_str(indent);
        self.instructions
            .iter()
            .map(|instruction| instruction.pretty_print(0))
            .chain(std::iter::once(self.terminator.pretty_print(0)))
            .map(|line| format!("{prefix}{line}\n"))
            .collect()
    }
}
