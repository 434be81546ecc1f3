//! The `holo ast` command.

use crate::config::HoloConfig;
use crate::output;
use holo_diagnostic::emit;
use holo_parser::parse_with_options;

/// Print the syntax tree as JSON. Diagnostics go to stderr.
pub fn run(file: &str, config: &HoloConfig, compact: bool) -> Result<(), String> {
    let source = output::read_source(file)?;
    let result = parse_with_options(&source, &config.parser);

    for diag in result.all_diagnostics() {
        emit(&source, file, diag).map_err(|e| format!("cannot write diagnostics: {}", e))?;
    }

    let json = if compact {
        serde_json::to_string(&result.ast)
    } else {
        serde_json::to_string_pretty(&result.ast)
    }
    .map_err(|e| format!("cannot serialize syntax tree: {}", e))?;
    println!("{}", json);

    if result.success {
        Ok(())
    } else {
        Err("parse error".to_string())
    }
}
