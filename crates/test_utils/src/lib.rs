#![allow(clippy::option_if_let_else)]

//! Shared MIR kernels and test setup for the AutoPIM crates.

pub mod kernels;

pub use kernels::{
    declare_runtime, early_exit, emit_counted_loop, escaping_reduction, grim_filter,
    mixed_subloops, non_constant_start, raw_pointer_store, row_reduction, triple_nest,
    CountedLoop, EarlyExit, EscapingReduction, GrimFilter, Kernel, MixedSubloops,
    NonConstantStart, RawPointerStore, RowReduction, TripleNest, INIT_SUBREGION, RUN_SUBREGION,
};

use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
});

/// Installs a test-friendly `tracing` subscriber once per test binary
pub fn init_tracing() {
    Lazy::force(&TRACING);
}
