//! CLI command implementations.

pub mod ast;
pub mod batch;
pub mod check;
pub mod diff;
pub mod tokens;
