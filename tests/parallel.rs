//! Multi-file parsing tests.

use std::sync::{Arc, Mutex};

use holo_diagnostic::ErrorCode;
use holo_parallel::{ParallelOptions, ParallelParser, SourceFile, SymbolKind};

fn files() -> Vec<SourceFile> {
    vec![
        SourceFile::new("shapes.holo", "orb \"Ball\" { color: \"red\" }\ncube \"Crate\" {}\n"),
        SourceFile::new("broken.holo", "orb \"Bad\" { color: }\n"),
        SourceFile::new(
            "scene.holo",
            "@import { Ball, Missing } from \"./shapes.holo\"\ncomposition \"Level\" {\n  orb \"Sun\" {}\n}\n",
        ),
    ]
}

#[test]
fn test_one_invalid_file_among_three() {
    let mut parser = ParallelParser::new(ParallelOptions::new().worker_count(2));
    let result = parser.parse_files(files()).unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(result.fail_count, 1);
    assert!(!result.all_succeeded());

    let broken = result.get("broken.holo").unwrap();
    assert!(!broken.success);
    assert!(broken.error_count() > 0);
    assert!(result.get("shapes.holo").unwrap().success);
    assert!(result.get("scene.holo").unwrap().success);
    assert_eq!(result.failures().count(), 1);
}

#[test]
fn test_symbol_table_and_dependencies() {
    let mut parser = ParallelParser::new(ParallelOptions::new().worker_count(2));
    let result = parser.parse_files(files()).unwrap();

    let ball = result.symbol_table.get("Ball").unwrap();
    assert_eq!(ball.file, "shapes.holo");
    assert_eq!(ball.kind, SymbolKind::Element);
    assert_eq!(result.symbol_table.get("Level").unwrap().kind, SymbolKind::Composition);
    assert!(result.symbol_table.contains("Sun"));

    assert_eq!(
        result.dependency_graph.dependencies("scene.holo"),
        &["./shapes.holo".to_string()]
    );

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, ErrorCode::UnresolvedImport);
    assert!(result.warnings[0].message.contains("Missing"));
}

#[test]
fn test_sequential_fallback_gives_the_same_answer() {
    let mut pooled = ParallelParser::new(ParallelOptions::new().worker_count(3));
    let mut sequential = ParallelParser::new(ParallelOptions::new().worker_count(0));
    let a = pooled.parse_files(files()).unwrap();
    let b = sequential.parse_files(files()).unwrap();

    assert_eq!(a.success_count, b.success_count);
    assert_eq!(a.fail_count, b.fail_count);
    for (path, result) in &a.results {
        let other = b.get(path).unwrap();
        assert_eq!(result.success, other.success);
        assert_eq!(result.ast, other.ast);
        assert_eq!(result.exports, other.exports);
    }
}

#[test]
fn test_progress_reaches_completion() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let mut parser = ParallelParser::new(ParallelOptions::new().worker_count(2).batch_size(1));
    parser.on_progress(move |event| sink.lock().unwrap().push(event.clone()));
    parser.parse_files(files()).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.windows(2).all(|w| w[0].completed < w[1].completed));
    let last = events.last().unwrap();
    assert!(last.is_done());
    assert_eq!(last.failed, 1);
    assert_eq!(last.percentage, 100.0);
}

#[test]
fn test_many_files_across_batches() {
    let files: Vec<_> = (0..40)
        .map(|i| SourceFile::new(format!("f{}.holo", i), format!("orb \"O{}\" {{ size: {} }}\n", i, i)))
        .collect();
    let mut parser = ParallelParser::new(ParallelOptions::new().worker_count(4).batch_size(7));
    let result = parser.parse_files(files).unwrap();

    assert_eq!(result.results.len(), 40);
    assert_eq!(result.success_count, 40);
    assert_eq!(result.symbol_table.len(), 40);
}

#[test]
fn test_parse_after_shutdown_fails() {
    let mut parser = ParallelParser::new(ParallelOptions::new().worker_count(1));
    parser.shutdown();
    assert!(parser.parse_files(files()).is_err());
}
