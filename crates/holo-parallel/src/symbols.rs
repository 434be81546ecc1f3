//! Cross-file symbol table and dependency graph.
//! 跨文件符号表与依赖图。

use std::collections::BTreeMap;

use holo_common::{Position, Span};
use holo_diagnostic::{Diagnostic, ErrorCode};
use serde::{Deserialize, Serialize};

use crate::protocol::{ParseTaskResult, SymbolKind};

/// Where an exported name comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
}

/// Exported names of every file, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol. A name already present is taken over by the new file.
    pub fn insert(&mut self, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(symbol.name.clone(), symbol)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Names `file` won.
    pub fn exported_by<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.symbols.values().filter(move |s| s.file == file)
    }
}

/// File → paths it imports, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file and its imports. Repeated paths are kept once.
    pub fn add_file(&mut self, file: impl Into<String>, imports: impl IntoIterator<Item = String>) {
        let deps = self.edges.entry(file.into()).or_default();
        for path in imports {
            if !deps.contains(&path) {
                deps.push(path);
            }
        }
    }

    pub fn dependencies(&self, file: &str) -> &[String] {
        self.edges.get(file).map_or(&[], Vec::as_slice)
    }

    /// Files importing `path`.
    pub fn dependents<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |(_, deps)| deps.iter().any(|d| d == path))
            .map(|(file, _)| file.as_str())
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Build the symbol table and dependency graph from results given in input
/// order, so that on a name collision the later file wins.
pub fn link<'a>(results: impl IntoIterator<Item = &'a ParseTaskResult>) -> (SymbolTable, DependencyGraph) {
    let mut table = SymbolTable::new();
    let mut graph = DependencyGraph::new();
    for result in results {
        for export in &result.exports {
            table.insert(Symbol {
                name: export.name.clone(),
                kind: export.kind,
                file: result.file_path.clone(),
            });
        }
        graph.add_file(
            result.file_path.clone(),
            result.imports.iter().map(|i| i.path.clone()),
        );
    }
    (table, graph)
}

/// A warning for every imported name no file exports.
pub fn unresolved_imports<'a>(
    results: impl IntoIterator<Item = &'a ParseTaskResult>,
    table: &SymbolTable,
) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();
    for result in results {
        for import in &result.imports {
            for name in &import.names {
                if table.contains(&name.name) {
                    continue;
                }
                warnings.push(
                    Diagnostic::warning(
                        ErrorCode::UnresolvedImport,
                        Span::DUMMY,
                        Position::START,
                        format!("`{}` imported from \"{}\" is not exported by any file", name.name, import.path),
                    )
                    .with_note(format!("imported by {}", result.file_path))
                    .with_help("check that the imported file exports this name"),
                );
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Export;
    use holo_syntax::{ImportDecl, ImportName};
    use std::time::Duration;

    fn result(path: &str, exports: &[&str], imports: &[(&str, &[&str])]) -> ParseTaskResult {
        ParseTaskResult {
            file_path: path.to_string(),
            ast: None,
            success: true,
            diagnostics: Vec::new(),
            exports: exports
                .iter()
                .map(|name| Export {
                    name: name.to_string(),
                    kind: SymbolKind::Element,
                })
                .collect(),
            imports: imports
                .iter()
                .map(|(path, names)| ImportDecl {
                    path: path.to_string(),
                    names: names
                        .iter()
                        .map(|n| ImportName {
                            name: n.to_string(),
                            alias: None,
                        })
                        .collect(),
                    alias: None,
                })
                .collect(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_last_writer_wins() {
        let results = [result("a.holo", &["Ball"], &[]), result("b.holo", &["Ball", "Cube"], &[])];
        let (table, _) = link(&results);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Ball").map(|s| s.file.as_str()), Some("b.holo"));
        assert_eq!(table.exported_by("a.holo").count(), 0);
    }

    #[test]
    fn test_dependency_graph() {
        let results = [
            result("main.holo", &[], &[("./a.holo", &["Ball"]), ("./a.holo", &["Cube"])]),
            result("a.holo", &["Ball"], &[]),
        ];
        let (_, graph) = link(&results);
        assert_eq!(graph.dependencies("main.holo"), ["./a.holo".to_string()]);
        assert!(graph.dependencies("a.holo").is_empty());
        assert_eq!(graph.dependents("./a.holo").collect::<Vec<_>>(), vec!["main.holo"]);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_unresolved_import_warnings() {
        let results = [
            result("main.holo", &[], &[("./a.holo", &["Ball", "Missing"])]),
            result("a.holo", &["Ball"], &[]),
        ];
        let (table, _) = link(&results);
        let warnings = unresolved_imports(&results, &table);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, ErrorCode::UnresolvedImport);
        assert!(!warnings[0].is_error());
        assert!(warnings[0].message.contains("Missing"));
    }
}
