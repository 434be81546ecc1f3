//! Splitting a document into top-level chunks.

use std::collections::{BTreeSet, HashMap};

use holo_lexer::{Token, TokenKind, tokenize};
use serde::{Deserialize, Serialize};

/// A contiguous top-level segment of a document: one element together with
/// the directives written before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identity: `keyword:name`, `keyword:#index`, or with a `~n`
    /// suffix when an id repeats.
    pub id: String,
    /// Keyword of the chunk's element, or `directive` for trailing
    /// directives with no element.
    pub kind: String,
    pub name: Option<String>,
    /// Source text from the start of the chunk's first line.
    pub content: String,
    /// 1-based lines the chunk spans
    pub start_line: u32,
    pub end_line: u32,
    /// Byte offset of `content` in the document
    pub start_offset: usize,
    /// Identifiers and `using` targets appearing in the chunk
    pub references: BTreeSet<String>,
}

impl Chunk {
    /// Does this chunk mention `name` anywhere other than as its own name?
    pub fn refers_to(&self, name: &str) -> bool {
        self.references.contains(name)
    }
}

/// Token-based chunk detector.
///
/// Boundaries are line breaks at brace depth zero and indentation level zero,
/// so a chunk always starts at the beginning of a line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkDetector;

impl ChunkDetector {
    pub fn detect(source: &str) -> Vec<Chunk> {
        let tokens = tokenize(source);
        let mut chunks = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        let mut brace = 0usize;
        let mut indent = 0usize;
        // The current chunk: index of its first token and of its last content token
        let mut current: Option<(usize, usize)> = None;
        let mut has_element = false;
        let mut item_ended = false;
        let mut last_line = 0;

        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    if brace == 0 && indent == 0 {
                        item_ended = true;
                    }
                    continue;
                }
                TokenKind::Indent => {
                    indent += 1;
                    continue;
                }
                TokenKind::Dedent => {
                    indent = indent.saturating_sub(1);
                    if brace == 0 && indent == 0 {
                        item_ended = true;
                    }
                    continue;
                }
                _ => {}
            }

            let at_top = brace == 0 && indent == 0;
            let first_on_line = token.line != last_line;
            last_line = token.line;
            match current {
                Some((first, last)) if at_top && item_ended && has_element => {
                    chunks.push(build_chunk(source, &tokens[first..=last], chunks.len(), &mut seen));
                    current = Some((i, i));
                    has_element = false;
                }
                Some((first, _)) => current = Some((first, i)),
                None => current = Some((i, i)),
            }

            if at_top && first_on_line && token.kind == TokenKind::Identifier {
                has_element = true;
            }
            item_ended = false;

            match token.kind {
                TokenKind::LBrace => brace += 1,
                TokenKind::RBrace => brace = brace.saturating_sub(1),
                _ => {}
            }
        }

        if let Some((first, last)) = current {
            chunks.push(build_chunk(source, &tokens[first..=last], chunks.len(), &mut seen));
        }
        chunks
    }
}

fn build_chunk(source: &str, tokens: &[Token], index: usize, seen: &mut HashMap<String, usize>) -> Chunk {
    let first = &tokens[0];
    let last = &tokens[tokens.len() - 1];

    let start_offset = line_start(source, first.span.start.0 as usize);
    let end_offset = (last.span.end.0 as usize).min(source.len());
    let content = source.get(start_offset..end_offset).unwrap_or("").to_string();

    // The element keyword is the first identifier not inside a directive
    let head = element_head(tokens);
    let (kind, name) = match head {
        Some(at) => {
            let keyword = tokens[at].text.clone();
            let name = tokens.get(at + 1).and_then(|t| match t.kind {
                TokenKind::String | TokenKind::UnterminatedString => Some(t.text.clone()),
                TokenKind::Identifier if t.text != "using" => Some(t.text.clone()),
                TokenKind::Hash => tokens
                    .get(at + 2)
                    .filter(|t| t.kind == TokenKind::Identifier)
                    .map(|t| t.text.clone()),
                _ => None,
            });
            (keyword, name)
        }
        None => ("directive".to_string(), None),
    };

    let base = match &name {
        Some(name) => format!("{}:{}", kind, name),
        None => format!("{}:#{}", kind, index),
    };
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    let id = if *count == 1 {
        base
    } else {
        format!("{}~{}", base, *count - 1)
    };

    let mut references = BTreeSet::new();
    for (i, token) in tokens.iter().enumerate() {
        let is_own = Some(i) == head
            || (Some(i + 1) == head && token.is_ident("export"))
            || name.as_deref() == Some(token.text.as_str());
        match token.kind {
            TokenKind::Identifier if !is_own => {
                references.insert(token.text.clone());
            }
            TokenKind::String if i > 0 && tokens[i - 1].is_ident("using") => {
                references.insert(token.text.clone());
            }
            _ => {}
        }
    }

    Chunk {
        id,
        kind,
        name,
        content,
        start_line: first.line,
        end_line: last.line,
        start_offset,
        references,
    }
}

/// Index of the element keyword: the first identifier at depth zero that
/// starts a line, or the keyword after a leading `export`. Directive lines
/// start with `@` and are passed over.
fn element_head(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    let mut last_line = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind.is_layout() {
            continue;
        }
        let first_on_line = token.line != last_line;
        last_line = token.line;
        match token.kind {
            TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Identifier if depth == 0 && first_on_line => {
                let exported = token.is_ident("export")
                    && tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Identifier);
                return Some(if exported { i + 1 } else { i });
            }
            _ => {}
        }
    }
    None
}

/// Byte offset of the start of the line containing `offset`.
fn line_start(source: &str, offset: usize) -> usize {
    source
        .get(..offset)
        .and_then(|s| s.rfind('\n'))
        .map_or(0, |p| p + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_chunk_per_top_level_element() {
        let source = "orb \"A\" {\n  color: \"red\"\n}\n\ncube \"B\" {}\nlight {}\n";
        let chunks = ChunkDetector::detect(source);
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["orb:A", "cube:B", "light:#2"]);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[1].content, "cube \"B\" {}");
        assert_eq!(chunks[1].start_offset, source.find("cube").unwrap());
    }

    #[test]
    fn test_leading_directives_join_the_next_element() {
        let source = "@import \"./lib.holo\"\n@grabbable\norb \"A\" {}\norb \"B\" {}\n";
        let chunks = ChunkDetector::detect(source);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "orb:A");
        assert!(chunks[0].content.starts_with("@import"));
    }

    #[test]
    fn test_indented_body_stays_in_chunk() {
        let source = "orb \"A\"\n  color: \"red\"\n  size: 2\norb \"B\"\n";
        let chunks = ChunkDetector::detect(source);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].end_line, 3);
    }

    #[test]
    fn test_repeated_ids_are_disambiguated() {
        let chunks = ChunkDetector::detect("orb \"A\" {}\norb \"A\" {}\n");
        assert_eq!(chunks[0].id, "orb:A");
        assert_eq!(chunks[1].id, "orb:A~1");
    }

    #[test]
    fn test_exported_and_function_chunks() {
        let chunks = ChunkDetector::detect("export template \"Card\" {}\nfunction greet(name) { return name }\n");
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["template:Card", "function:greet"]);
        assert!(!chunks[0].refers_to("export"));
    }

    #[test]
    fn test_references() {
        let chunks = ChunkDetector::detect("template \"Card\" {}\nobject \"C\" using \"Card\" { target: Ball }\n");
        assert!(chunks[1].refers_to("Card"));
        assert!(chunks[1].refers_to("Ball"));
        assert!(!chunks[1].refers_to("object"));
    }
}
