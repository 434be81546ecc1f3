//! Holo CLI - the HoloScript+ command line interface.
//! Holo CLI - HoloScript+ 命令行界面。

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::HoloConfig;

/// Main CLI structure.
/// 主 CLI 结构体。
#[derive(Parser)]
#[command(name = "holo")]
#[command(author, version, about = "Holo - parse and check HoloScript+ scenes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output and debug logging. / 启用详细输出。
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output. / 抑制输出。
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (default: ./holo.json when present). / 配置文件。
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Available CLI commands.
/// 可用的 CLI 命令。
#[derive(Subcommand)]
enum Commands {
    /// Parse a file and report diagnostics. / 解析文件并报告诊断。
    Check {
        /// The file to check. / 要检查的文件。
        file: String,
    },

    /// Print the syntax tree of a file as JSON. / 以 JSON 打印语法树。
    Ast {
        /// The file to parse. / 要解析的文件。
        file: String,
        /// Single-line JSON. / 单行 JSON。
        #[arg(long)]
        compact: bool,
    },

    /// Print the token stream of a file. / 打印词法单元流。
    Tokens {
        /// The file to tokenize. / 要分词的文件。
        file: String,
    },

    /// Parse many files in parallel. / 并行解析多个文件。
    Batch {
        /// Files to parse. / 要解析的文件。
        #[arg(required = true)]
        files: Vec<String>,
        /// Worker threads. / 工作线程数。
        #[arg(long)]
        workers: Option<usize>,
        /// Files per batch. / 每批文件数。
        #[arg(long)]
        batch_size: Option<usize>,
        /// Parse on the calling thread. / 在当前线程解析。
        #[arg(long)]
        sequential: bool,
        /// Fail a file whose parse runs longer than this. / 单个任务超时。
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Re-parse an edited file incrementally and report what changed.
    /// 增量重新解析并报告变化。
    Diff {
        /// The original file. / 原始文件。
        before: String,
        /// The edited file. / 修改后的文件。
        after: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main entry point.
/// 主入口点。
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = std::env::current_dir()
        .map_err(|e| format!("cannot read working directory: {}", e))
        .and_then(|dir| HoloConfig::discover(cli.config.as_deref(), &dir).map_err(|e| e.to_string()))
        .and_then(|config| run(cli.command, &config, cli.verbose));

    if let Err(e) = result {
        if !cli.quiet {
            output::error(&e);
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &HoloConfig, verbose: bool) -> Result<(), String> {
    match command {
        Commands::Check { file } => commands::check::run(&file, config, verbose),
        Commands::Ast { file, compact } => commands::ast::run(&file, config, compact),
        Commands::Tokens { file } => commands::tokens::run(&file),
        Commands::Batch {
            files,
            workers,
            batch_size,
            sequential,
            timeout_ms,
        } => {
            let mut options = config.parallel.clone().parser(config.parser);
            if let Some(workers) = workers {
                options = options.worker_count(workers);
            }
            if let Some(size) = batch_size {
                options = options.batch_size(size);
            }
            if sequential {
                options = options.worker_count(0);
            }
            if let Some(ms) = timeout_ms {
                options.task_timeout_ms = Some(ms);
            }
            commands::batch::run(&files, options, verbose)
        }
        Commands::Diff { before, after } => commands::diff::run(&before, &after, config),
    }
}
