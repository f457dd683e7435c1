//! CLI command implementations

pub mod create;

pub use create::{print_result, run_create};
