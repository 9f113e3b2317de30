//! CLI command implementations.

mod compare;

pub use compare::run_compare;
