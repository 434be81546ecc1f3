//! Incremental re-parsing on top of [`ParseCache`].

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use holo_common::Location;
use holo_diagnostic::Diagnostic;
use holo_parser::{ParserOptions, parse_with_options};
use holo_syntax::Node;
use tracing::debug;

use crate::{Chunk, ChunkDetector, ChunkHash, Fragment, ParseCache};

/// What one incremental parse produced.
#[derive(Debug, Clone)]
pub struct IncrementalResult {
    pub ast: Node,
    /// Chunks served from the cache
    pub cached_chunk_count: usize,
    /// Chunks parsed during this call
    pub freshly_parsed_chunk_count: usize,
    pub elapsed: Duration,
    /// New, edited and removed chunk ids, in document order with removed
    /// ids last
    pub changed_chunk_ids: Vec<String>,
    /// Diagnostics of every chunk, positioned in the whole document
    pub diagnostics: Vec<Diagnostic>,
}

impl IncrementalResult {
    pub fn success(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// What the previous parse saw of a chunk.
#[derive(Debug, Clone)]
struct ChunkRecord {
    hash: ChunkHash,
    name: Option<String>,
}

/// Re-parses only the chunks of a document that changed since the last call,
/// plus the unchanged chunks that refer to them by name.
#[derive(Debug, Default)]
pub struct IncrementalParser {
    options: ParserOptions,
    previous: HashMap<String, ChunkRecord>,
    cache_hits: u64,
    parse_count: u64,
}

impl IncrementalParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Total chunks served from the cache across all calls.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Total chunks parsed across all calls.
    pub fn parse_count(&self) -> u64 {
        self.parse_count
    }

    /// Forget the previous chunk map, so the next call treats every chunk
    /// as new.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    pub fn parse_incremental(&mut self, source: &str, cache: &mut ParseCache) -> IncrementalResult {
        let start = Instant::now();
        let chunks = ChunkDetector::detect(source);
        let hashes: Vec<ChunkHash> = chunks.iter().map(|c| ChunkHash::of_str(&c.content)).collect();

        // Changed: new ids, edited content, ids that disappeared
        let mut changed_ids = Vec::new();
        let mut changed_names = BTreeSet::new();
        let mut changed = vec![false; chunks.len()];
        for (i, chunk) in chunks.iter().enumerate() {
            let same = self.previous.get(&chunk.id).is_some_and(|r| r.hash == hashes[i]);
            if !same {
                changed[i] = true;
                changed_ids.push(chunk.id.clone());
                changed_names.extend(chunk.name.clone());
            }
        }
        let current_ids: BTreeSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        let mut removed: Vec<(&String, &ChunkRecord)> = self
            .previous
            .iter()
            .filter(|(id, _)| !current_ids.contains(id.as_str()))
            .collect();
        removed.sort_by(|a, b| a.0.cmp(b.0));
        for (id, record) in removed {
            changed_ids.push(id.clone());
            changed_names.extend(record.name.clone());
        }

        let dependent: Vec<bool> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| !changed[i] && changed_names.iter().any(|n| chunk.refers_to(n)))
            .collect();

        let mut cached = 0;
        let mut fresh = 0;
        let mut nodes = Vec::with_capacity(chunks.len());
        let mut diagnostics = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let reuse = if changed[i] || dependent[i] {
                None
            } else {
                cache.get(&chunk.id, &hashes[i]).cloned()
            };

            let fragment = match reuse {
                Some(fragment) => {
                    cached += 1;
                    self.cache_hits += 1;
                    fragment
                }
                None => {
                    let fragment = self.parse_chunk(chunk);
                    cache.set(chunk.id.clone(), hashes[i], fragment.clone());
                    fresh += 1;
                    self.parse_count += 1;
                    fragment
                }
            };

            let (ast, chunk_diagnostics) = place(fragment, chunk);
            nodes.push(ast);
            diagnostics.extend(chunk_diagnostics);
        }

        self.previous = chunks
            .iter()
            .zip(&hashes)
            .map(|(chunk, hash)| {
                (
                    chunk.id.clone(),
                    ChunkRecord {
                        hash: *hash,
                        name: chunk.name.clone(),
                    },
                )
            })
            .collect();

        let ast = assemble(nodes);
        let elapsed = start.elapsed();
        debug!(
            chunks = chunks.len(),
            cached,
            fresh,
            changed = changed_ids.len(),
            ?elapsed,
            "incremental parse"
        );

        IncrementalResult {
            ast,
            cached_chunk_count: cached,
            freshly_parsed_chunk_count: fresh,
            elapsed,
            changed_chunk_ids: changed_ids,
            diagnostics,
        }
    }

    fn parse_chunk(&self, chunk: &Chunk) -> Fragment {
        let result = parse_with_options(&chunk.content, &self.options);
        let mut diagnostics = result.diagnostics;
        diagnostics.extend(result.warnings);
        Fragment {
            ast: result.ast,
            diagnostics,
        }
    }
}

/// Move a chunk-relative fragment to the chunk's place in the document.
fn place(fragment: Fragment, chunk: &Chunk) -> (Node, Vec<Diagnostic>) {
    let lines = chunk.start_line.saturating_sub(1);
    let bytes = chunk.start_offset as u32;
    let Fragment {
        mut ast,
        mut diagnostics,
    } = fragment;
    ast.offset_lines(lines);
    for diagnostic in &mut diagnostics {
        diagnostic.relocate(lines, bytes);
    }
    (ast, diagnostics)
}

/// One node for the whole document: the sole chunk's node, or a fragment
/// holding every chunk's roots and loose directives.
fn assemble(mut nodes: Vec<Node>) -> Node {
    if nodes.len() == 1 {
        return nodes.remove(0);
    }

    let loc = match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) => first.loc.merge(last.loc),
        _ => Location::default(),
    };
    let mut root = Node::fragment(Vec::new(), loc);
    for node in nodes {
        if node.is_fragment() {
            root.children.extend(node.children);
            root.directives.extend(node.directives);
            root.traits.extend(node.traits);
        } else {
            root.children.push(node);
        }
    }
    root
}
