//! The `holo batch` command.
//! `holo batch` 命令。

use crate::output;
use holo_parallel::{ParallelOptions, ParallelParser, SourceFile};

/// Parse many files across worker threads and summarize.
/// 并行解析多个文件并汇总。
pub fn run(files: &[String], options: ParallelOptions, verbose: bool) -> Result<(), String> {
    let sources = files
        .iter()
        .map(|path| output::read_source(path).map(|content| SourceFile::new(path.clone(), content)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut parser = ParallelParser::new(options.enable_progress(verbose));
    if verbose {
        parser.on_progress(|event| {
            eprintln!(
                "[{:>5.1}%] {}/{} {}",
                event.percentage, event.completed, event.total, event.current_file
            );
        });
    }

    let result = parser.parse_files(sources).map_err(|e| e.to_string())?;
    parser.shutdown();

    for (path, file) in &result.results {
        if file.success {
            output::success(&format!("ok    {} ({} exports)", path, file.exports.len()));
        } else {
            output::error(&format!("{}: {} error(s)", path, file.error_count()));
            for diag in file.diagnostics.iter().filter(|d| d.is_error()) {
                eprintln!("    {}:{}: {}", diag.line, diag.column, diag.message);
            }
        }
    }

    for warning in &result.warnings {
        let notes = warning.notes.join("; ");
        output::warning(&format!("{} ({})", warning.message, notes));
    }

    output::info(&format!(
        "{} file(s), {} ok, {} failed, {} symbol(s) in {:?}",
        result.results.len(),
        result.success_count,
        result.fail_count,
        result.symbol_table.len(),
        result.total_elapsed
    ));

    if result.fail_count > 0 {
        Err(format!("{} file(s) failed to parse", result.fail_count))
    } else {
        Ok(())
    }
}
