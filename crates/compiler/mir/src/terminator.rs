//! # Block Terminators
//!
//! The last instruction of every basic block. Terminators are the only source of
//! CFG edges, so loop erasure is expressed purely as a terminator edit.

use rustc_hash::FxHashSet;

use crate::{BasicBlockId, PrettyPrint, Value, ValueId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Terminator {
    Jump {
        target: BasicBlockId,
    },
    /// Two-way branch; `then_target == else_target` is legal and makes the edge unconditional
    If {
        condition: Value,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    },
    Return {
        value: Option<Value>,
    },
    /// Placeholder for blocks that have not been terminated yet
    #[default]
    Unreachable,
}

impl Terminator {
    pub const fn jump(target: BasicBlockId) -> Self {
        Self::Jump { target }
    }

    pub const fn branch(
        condition: Value,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    ) -> Self {
        Self::If {
            condition,
            then_target,
            else_target,
        }
    }

    pub const fn return_value(value: Value) -> Self {
        Self::Return { value: Some(value) }
    }

    pub const fn return_void() -> Self {
        Self::Return { value: None }
    }

    /// Distinct successor blocks, then-target first
    pub fn target_blocks(&self) -> Vec<BasicBlockId> {
        match *self {
            Self::Jump { target } => vec![target],
            Self::If {
                then_target,
                else_target,
                ..
            } => {
                let mut targets = vec![then_target];
                if else_target != then_target {
                    targets.push(else_target);
                }
                targets
            }
            Self::Return { .. } | Self::Unreachable => Vec::new(),
        }
    }

    /// `(then_target, else_target)` of a conditional branch
    pub const fn branch_targets(&self) -> Option<(BasicBlockId, BasicBlockId)> {
        match *self {
            Self::If {
                then_target,
                else_target,
                ..
            } => Some((then_target, else_target)),
            _ => None,
        }
    }

    pub fn used_values(&self) -> FxHashSet<ValueId> {
        let operand = match self {
            Self::If { condition, .. } => Some(condition),
            Self::Return { value } => value.as_ref(),
            Self::Jump { .. } | Self::Unreachable => None,
        };
        operand.and_then(Value::as_operand).into_iter().collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Self::If {
            condition: Value::Error,
            ..
        } = self
        {
            return Err("branch on an error value".to_string());
        }
        Ok(())
    }

    /// Sends both arms of a conditional branch to `target`
    ///
    /// Any other terminator is left as is and false is returned.
    pub fn redirect_all_targets(&mut self, target: BasicBlockId) -> bool {
        let Self::If {
            then_target,
            else_target,
            ..
        } = self
        else {
            return false;
        };
        *then_target = target;
        *else_target = target;
        true
    }
}

impl PrettyPrint for Terminator {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::Jump { target } => format!("jump bb{}", target.index()),
            Self::If {
                condition,
                then_target,
                else_target,
            } => format!(
                "if {condition} then jump bb{} else jump bb{}",
                then_target.index(),
                else_target.index()
            ),
            Self::Return { value: Some(value) } => format!("return {value}"),
            Self::Return { value: None } => "return".to_string(),
            Self::Unreachable => "unreachable".to_string(),
        }
    }
}
