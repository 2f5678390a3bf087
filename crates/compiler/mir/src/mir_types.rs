//! # Types
//!
//! Just enough typing to print the IR and to check the signatures of runtime
//! entry points before calls to them are inserted.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirType {
    Int {
        bits: u8,
    },
    /// Result type of comparisons
    Bool,
    Pointer {
        element: Box<MirType>,
    },
    Array {
        element: Box<MirType>,
        size: usize,
    },
    Function {
        params: Vec<MirType>,
        return_type: Box<MirType>,
    },
    Unit,
    /// Type of a value nobody recorded a type for
    Unknown,
}

impl MirType {
    pub const fn i32() -> Self {
        Self::Int { bits: 32 }
    }

    pub const fn bool() -> Self {
        Self::Bool
    }

    pub const fn unit() -> Self {
        Self::Unit
    }

    pub fn pointer(element: Self) -> Self {
        Self::Pointer {
            element: Box::new(element),
        }
    }

    pub fn function(params: Vec<Self>, return_type: Self) -> Self {
        Self::Function {
            params,
            return_type: Box::new(return_type),
        }
    }

    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int { .. })
    }
}

impl fmt::Display for MirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { bits } => write!(f, "i{bits}"),
            Self::Bool => f.write_str("bool"),
            Self::Pointer { element } => write!(f, "{element}*"),
            Self::Array { element, size } => write!(f, "[{element}; {size}]"),
            Self::Function {
                params,
                return_type,
            } => {
                let params: Vec<String> = params.iter().map(ToString::to_string).collect();
                write!(f, "fn({}) -> {return_type}", params.join(", "))
            }
            Self::Unit => f.write_str("()"),
            Self::Unknown => f.write_str("<unknown>"),
        }
    }
}
