//! # Operands
//!
//! Every instruction operand is either a compile-time literal or a reference to
//! an SSA value. Operand identity is `ValueId` identity: the loop analyses treat
//! two operands as the same index variable only when they name the same value.

use std::fmt;

use crate::{PrettyPrint, ValueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Literal(Literal),
    /// A parameter, phi or instruction result
    Operand(ValueId),
    /// Stands in for an operand that could not be built
    Error,
}

/// A compile-time constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(i64),
    Boolean(bool),
    Unit,
}

impl Value {
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    pub const fn operand(id: ValueId) -> Self {
        Self::Operand(id)
    }

    pub const fn error() -> Self {
        Self::Error
    }

    pub const fn as_operand(&self) -> Option<ValueId> {
        match self {
            Self::Operand(id) => Some(*id),
            Self::Literal(_) | Self::Error => None,
        }
    }

    /// Returns true if this operand refers to `id`
    pub fn is_operand_of(&self, id: ValueId) -> bool {
        self.as_operand() == Some(id)
    }
}

impl PrettyPrint for Value {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::Literal(literal) => literal.to_string(),
            Self::Operand(id) => format!("%{}", id.index()),
            Self::Error => "<error>".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(0))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Unit => f.write_str("()"),
        }
    }
}
