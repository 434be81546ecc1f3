//! Incremental parsing for HoloScript+.
//!
//! A document is split into top-level chunks; each chunk is parsed on its
//! own and its fragment cached under its id and content hash. Re-parsing an
//! edited document only parses the chunks that changed and the chunks that
//! refer to them.

mod cache;
mod chunk;
mod hash;
mod incremental;

pub use cache::{CacheConfig, CacheEntry, CacheStatistics, DEFAULT_CAPACITY, Fragment, ParseCache};
pub use chunk::{Chunk, ChunkDetector};
pub use hash::ChunkHash;
pub use incremental::{IncrementalParser, IncrementalResult};
