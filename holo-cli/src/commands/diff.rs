//! The `holo diff` command.

use crate::config::HoloConfig;
use crate::output;
use holo_cache::{IncrementalParser, ParseCache};

/// Parse `before`, then `after` incrementally, and report the chunks that
/// had to be parsed again.
pub fn run(before: &str, after: &str, config: &HoloConfig) -> Result<(), String> {
    let old = output::read_source(before)?;
    let new = output::read_source(after)?;

    let mut cache = ParseCache::from_config(&config.cache);
    let mut parser = IncrementalParser::with_options(config.parser);
    parser.parse_incremental(&old, &mut cache);
    let result = parser.parse_incremental(&new, &mut cache);

    if result.changed_chunk_ids.is_empty() {
        output::info("no chunks changed");
    } else {
        for id in &result.changed_chunk_ids {
            println!("changed  {}", id);
        }
    }

    let stats = cache.stats();
    output::info(&format!(
        "{} chunk(s) reused, {} parsed in {:?} (cache hit rate {:.0}%)",
        result.cached_chunk_count,
        result.freshly_parsed_chunk_count,
        result.elapsed,
        stats.hit_rate() * 100.0
    ));

    if result.success() {
        Ok(())
    } else {
        let errors = result.diagnostics.iter().filter(|d| d.is_error()).count();
        Err(format!("{} error(s) in '{}'", errors, after))
    }
}
