//! Common utilities and data structures for HoloScript+.
//!
//! This crate provides foundational types used across the pipeline:
//! - `Span`: byte ranges into the source text
//! - `Position` / `Location`: 1-based line and column tracking

mod position;
mod span;

pub use position::{Location, Position};
pub use span::{BytePos, Span};
