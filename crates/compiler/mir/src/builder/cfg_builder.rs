use crate::{BasicBlockId, MirFunction, Terminator, Value};

/// The four blocks of a counted loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForLoopBlocks {
    /// Induction phi and exit comparison
    pub header: BasicBlockId,
    pub body: BasicBlockId,
    /// Steps the induction variable and jumps back to the header
    pub latch: BasicBlockId,
    pub exit: BasicBlockId,
}

/// Creates blocks and terminates the one it is positioned on
pub struct CfgBuilder<'f> {
    function: &'f mut MirFunction,
    block: BasicBlockId,
}

impl<'f> CfgBuilder<'f> {
    pub const fn new(function: &'f mut MirFunction, block: BasicBlockId) -> Self {
        Self { function, block }
    }

    pub const fn switch_to_block(&mut self, block: BasicBlockId) -> &mut Self {
        self.block = block;
        self
    }

    pub fn new_block(&mut self, name: impl Into<String>) -> BasicBlockId {
        self.function.add_basic_block_with_name(name)
    }

    /// Appends `{label}_header`, `{label}_body`, `{label}_latch` and `{label}_exit`, unterminated
    pub fn create_for_loop_blocks(&mut self, label: &str) -> ForLoopBlocks {
        ForLoopBlocks {
            header: self.new_block(format!("{label}_header")),
            body: self.new_block(format!("{label}_body")),
            latch: self.new_block(format!("{label}_latch")),
            exit: self.new_block(format!("{label}_exit")),
        }
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.function.basic_blocks[self.block];
        debug_assert!(
            matches!(block.terminator, Terminator::Unreachable),
            "bb{} is already terminated",
            self.block.index()
        );
        block.set_terminator(terminator);
    }

    pub fn terminate_with_jump(&mut self, target: BasicBlockId) {
        self.terminate(Terminator::jump(target));
    }

    pub fn terminate_with_branch(
        &mut self,
        condition: Value,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    ) {
        self.terminate(Terminator::branch(condition, then_target, else_target));
    }

    pub fn terminate_with_return(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Return { value });
    }
}
