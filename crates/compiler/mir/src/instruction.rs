//! # Instructions
//!
//! Three-address operations that never transfer control. Each defines at most one
//! value, except calls, which may define several.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::{BasicBlockId, FunctionId, MirType, PrettyPrint, Value, ValueId};

/// Integer binary operators; comparisons yield a `bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    Eq,
    Ne,
    SLt,
    SLe,
    SGt,
    SGe,
    ULt,
    ULe,
    UGt,
    UGe,
}

impl BinaryOp {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::Ne
                | Self::SLt
                | Self::SLe
                | Self::SGt
                | Self::SGe
                | Self::ULt
                | Self::ULe
                | Self::UGt
                | Self::UGe
        )
    }

    const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::SDiv => "sdiv",
            Self::UDiv => "udiv",
            Self::SRem => "srem",
            Self::URem => "urem",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Shl => "shl",
            Self::LShr => "lshr",
            Self::AShr => "ashr",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::SLt => "slt",
            Self::SLe => "sle",
            Self::SGt => "sgt",
            Self::SGe => "sge",
            Self::ULt => "ult",
            Self::ULe => "ule",
            Self::UGt => "ugt",
            Self::UGe => "uge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    ZeroExtend,
    SignExtend,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    Assign {
        dest: ValueId,
        source: Value,
        ty: MirType,
    },
    UnaryOp {
        op: UnaryOp,
        dest: ValueId,
        source: Value,
    },
    BinaryOp {
        op: BinaryOp,
        dest: ValueId,
        left: Value,
        right: Value,
    },
    Cast {
        kind: CastKind,
        dest: ValueId,
        source: Value,
        ty: MirType,
    },
    Load {
        dest: ValueId,
        ty: MirType,
        address: Value,
    },
    Store {
        address: Value,
        value: Value,
        ty: MirType,
    },
    /// Address arithmetic over `base`; the last index varies fastest
    GetElementPtr {
        dest: ValueId,
        base: Value,
        indices: Vec<Value>,
    },
    /// Must sit in the phi prefix of its block
    Phi {
        dest: ValueId,
        ty: MirType,
        sources: Vec<(BasicBlockId, Value)>,
    },
    Call {
        dests: Vec<ValueId>,
        callee: FunctionId,
        args: Vec<Value>,
    },
    VoidCall {
        callee: FunctionId,
        args: Vec<Value>,
    },
    Nop,
}

impl From<InstructionKind> for Instruction {
    fn from(kind: InstructionKind) -> Self {
        Self { kind }
    }
}

impl Instruction {
    pub const fn assign(dest: ValueId, source: Value, ty: MirType) -> Self {
        Self {
            kind: InstructionKind::Assign { dest, source, ty },
        }
    }

    pub const fn unary_op(op: UnaryOp, dest: ValueId, source: Value) -> Self {
        Self {
            kind: InstructionKind::UnaryOp { op, dest, source },
        }
    }

    pub const fn binary_op(op: BinaryOp, dest: ValueId, left: Value, right: Value) -> Self {
        Self {
            kind: InstructionKind::BinaryOp {
                op,
                dest,
                left,
                right,
            },
        }
    }

    pub const fn cast(kind: CastKind, dest: ValueId, source: Value, ty: MirType) -> Self {
        Self {
            kind: InstructionKind::Cast {
                kind,
                dest,
                source,
                ty,
            },
        }
    }

    pub const fn load(dest: ValueId, ty: MirType, address: Value) -> Self {
        Self {
            kind: InstructionKind::Load { dest, ty, address },
        }
    }

    pub const fn store(address: Value, value: Value, ty: MirType) -> Self {
        Self {
            kind: InstructionKind::Store { address, value, ty },
        }
    }

    pub const fn get_element_ptr(dest: ValueId, base: Value, indices: Vec<Value>) -> Self {
        Self {
            kind: InstructionKind::GetElementPtr {
                dest,
                base,
                indices,
            },
        }
    }

    pub const fn phi(dest: ValueId, ty: MirType, sources: Vec<(BasicBlockId, Value)>) -> Self {
        Self {
            kind: InstructionKind::Phi { dest, ty, sources },
        }
    }

    pub const fn call(dests: Vec<ValueId>, callee: FunctionId, args: Vec<Value>) -> Self {
        Self {
            kind: InstructionKind::Call {
                dests,
                callee,
                args,
            },
        }
    }

    pub const fn void_call(callee: FunctionId, args: Vec<Value>) -> Self {
        Self {
            kind: InstructionKind::VoidCall { callee, args },
        }
    }

    pub const fn nop() -> Self {
        Self {
            kind: InstructionKind::Nop,
        }
    }

    pub const fn is_phi(&self) -> bool {
        matches!(self.kind, InstructionKind::Phi { .. })
    }

    pub const fn is_get_element_ptr(&self) -> bool {
        matches!(self.kind, InstructionKind::GetElementPtr { .. })
    }

    /// Last index of a getelementptr, the one that walks contiguous elements
    pub fn trailing_index(&self) -> Option<Value> {
        let InstructionKind::GetElementPtr { indices, .. } = &self.kind else {
            return None;
        };
        indices.last().copied()
    }

    pub fn destinations(&self) -> Vec<ValueId> {
        use InstructionKind as K;
        match &self.kind {
            K::Call { dests, .. } => dests.clone(),
            K::Assign { dest, .. }
            | K::UnaryOp { dest, .. }
            | K::BinaryOp { dest, .. }
            | K::Cast { dest, .. }
            | K::Load { dest, .. }
            | K::GetElementPtr { dest, .. }
            | K::Phi { dest, .. } => vec![*dest],
            K::Store { .. } | K::VoidCall { .. } | K::Nop => Vec::new(),
        }
    }

    /// The single value this instruction defines, if it defines exactly one
    pub fn destination(&self) -> Option<ValueId> {
        match self.destinations().as_slice() {
            [dest] => Some(*dest),
            _ => None,
        }
    }

    /// Operands in evaluation order: a store lists its value before its address
    pub fn operands(&self) -> Vec<Value> {
        use InstructionKind as K;
        match &self.kind {
            K::Assign { source, .. } | K::UnaryOp { source, .. } | K::Cast { source, .. } => {
                vec![*source]
            }
            K::BinaryOp { left, right, .. } => vec![*left, *right],
            K::Load { address, .. } => vec![*address],
            K::Store { address, value, .. } => vec![*value, *address],
            K::GetElementPtr { base, indices, .. } => {
                std::iter::once(*base).chain(indices.iter().copied()).collect()
            }
            K::Phi { sources, .. } => sources.iter().map(|&(_, value)| value).collect(),
            K::Call { args, .. } | K::VoidCall { args, .. } => args.clone(),
            K::Nop => Vec::new(),
        }
    }

    fn operands_mut(&mut self) -> Vec<&mut Value> {
        use InstructionKind as K;
        match &mut self.kind {
            K::Assign { source, .. } | K::UnaryOp { source, .. } | K::Cast { source, .. } => {
                vec![source]
            }
            K::BinaryOp { left, right, .. } => vec![left, right],
            K::Load { address, .. } => vec![address],
            K::Store { address, value, .. } => vec![value, address],
            K::GetElementPtr { base, indices, .. } => {
                std::iter::once(base).chain(indices.iter_mut()).collect()
            }
            K::Phi { sources, .. } => sources.iter_mut().map(|(_, value)| value).collect(),
            K::Call { args, .. } | K::VoidCall { args, .. } => args.iter_mut().collect(),
            K::Nop => Vec::new(),
        }
    }

    /// SSA values read by this instruction, literals excluded
    pub fn used_values(&self) -> FxHashSet<ValueId> {
        self.operands()
            .iter()
            .filter_map(Value::as_operand)
            .collect()
    }

    pub fn replace_value_uses(&mut self, from: ValueId, to: Value) {
        for operand in self.operands_mut() {
            if operand.is_operand_of(from) {
                *operand = to;
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.kind {
            InstructionKind::GetElementPtr { indices, .. } if indices.is_empty() => {
                Err("getelementptr without indices".to_string())
            }
            InstructionKind::Phi { sources, .. } if sources.is_empty() => {
                Err("phi without incoming values".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Stores and calls; everything else may be dropped when its result is unused
    pub const fn has_side_effects(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::Store { .. }
                | InstructionKind::Call { .. }
                | InstructionKind::VoidCall { .. }
        )
    }
}

struct Values<'a>(&'a [Value]);

impl fmt::Display for Values<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, value) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InstructionKind as K;
        let reg = |id: &ValueId| format!("%{}", id.index());
        match &self.kind {
            K::Assign { dest, source, .. } => write!(f, "{} = {source}", reg(dest)),
            K::UnaryOp { op, dest, source } => {
                let op = match op {
                    UnaryOp::Neg => "neg",
                    UnaryOp::Not => "not",
                };
                write!(f, "{} = {op} {source}", reg(dest))
            }
            K::BinaryOp {
                op,
                dest,
                left,
                right,
            } => write!(f, "{} = {} {left}, {right}", reg(dest), op.mnemonic()),
            K::Cast {
                kind,
                dest,
                source,
                ty,
            } => {
                let kind = match kind {
                    CastKind::ZeroExtend => "zext",
                    CastKind::SignExtend => "sext",
                    CastKind::Truncate => "trunc",
                };
                write!(f, "{} = {kind} {source} to {ty}", reg(dest))
            }
            K::Load { dest, ty, address } => write!(f, "{} = load {ty}, {address}", reg(dest)),
            K::Store { address, value, ty } => write!(f, "store {ty} {value}, {address}"),
            K::GetElementPtr {
                dest,
                base,
                indices,
            } => write!(
                f,
                "{} = getelementptr {base}, {}",
                reg(dest),
                Values(indices)
            ),
            K::Phi { dest, ty, sources } => {
                write!(f, "{} = phi {ty}", reg(dest))?;
                for (position, (block, value)) in sources.iter().enumerate() {
                    let sep = if position == 0 { " " } else { ", " };
                    write!(f, "{sep}[bb{}: {value}]", block.index())?;
                }
                Ok(())
            }
            K::Call {
                dests,
                callee,
                args,
            } => {
                let dests: Vec<String> = dests.iter().map(reg).collect();
                write!(
                    f,
                    "{} = call f{}({})",
                    dests.join(", "),
                    callee.index(),
                    Values(args)
                )
            }
            K::VoidCall { callee, args } => {
                write!(f, "call f{}({})", callee.index(), Values(args))
            }
            K::Nop => f.write_str("nop"),
        }
    }
}

impl PrettyPrint for Instruction {
    fn pretty_print(&self, _indent: usize) -> String {
        self.to_string()
    }
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod tests;
