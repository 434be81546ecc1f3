//! The `holo check` command.
//! `holo check` 命令。

use crate::config::HoloConfig;
use crate::output;
use holo_diagnostic::emit;
use holo_parser::parse_with_options;

/// Parse a file and print every diagnostic.
/// 解析文件并打印所有诊断。
pub fn run(file: &str, config: &HoloConfig, verbose: bool) -> Result<(), String> {
    let source = output::read_source(file)?;
    let result = parse_with_options(&source, &config.parser);

    for diag in result.all_diagnostics() {
        emit(&source, file, diag).map_err(|e| format!("cannot write diagnostics: {}", e))?;
    }

    if verbose {
        output::info(&format!("Parsed {} nodes", result.ast.count()));
        if !result.features.is_empty() {
            let features: Vec<_> = result.features.iter().map(|f| f.as_str()).collect();
            output::info(&format!("Features: {}", features.join(", ")));
        }
    }

    if !result.success {
        output::error(&format!("{} error(s) found", result.diagnostics.len()));
        return Err("parse error".to_string());
    }

    if !result.warnings.is_empty() {
        output::warning(&format!("{} warning(s)", result.warnings.len()));
    }
    output::success("OK - No errors found");
    Ok(())
}
