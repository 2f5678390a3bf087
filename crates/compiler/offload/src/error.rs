use thiserror::Error;

/// Why the `[start, end)` bounds of a loop could not be recovered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("loop has no merge value to take the start from")]
    NoMergeValue,
    #[error("loop has no exit comparison to take the bound from")]
    NoExitComparison,
    #[error("loop starts from non-constant value {0}")]
    NonConstantStart(String),
    #[error("exit comparison bound {0} is not a constant")]
    NonConstantBound(String),
    #[error("loop range [{start}, {end}) is inverted")]
    Inverted { start: i64, end: i64 },
}

/// Errors raised while rewriting a function for offload
///
/// None of these abort the pass: the affected insertion or erasure is skipped
/// and the error is kept as a diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OffloadError {
    #[error("runtime entry point '{name}' is not declared in the module")]
    MissingEntryPoint { name: String },
    #[error("runtime entry point '{name}' has signature {found}, expected {expected}")]
    EntryPointSignature {
        name: String,
        expected: String,
        found: String,
    },
    #[error("loop headed by bb{header} has no unique exit block")]
    NoExitBlock { header: usize },
    #[error("loop header bb{header} does not end in a conditional branch")]
    NotConditional { header: usize },
    #[error("IR edit failed: {0}")]
    Edit(String),
}
