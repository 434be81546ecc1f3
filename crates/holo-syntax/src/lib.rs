//! AST and syntax definitions for HoloScript+.
//!
//! This crate defines the tree produced by the parser and consumed by
//! everything downstream of it (cache, parallel coordinator, tools).

mod ast;
mod directive;
mod value;
mod writer;

pub use ast::*;
pub use directive::*;
pub use value::*;
pub use writer::escape_string;
