//! sitter-lsp - tree-sitter backed language server
//!
//! Usage:
//!   sitter-lsp [--stdio] [--log-file <path>]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sitter_lsp::lsp::server::run_server;

#[derive(Parser)]
#[command(name = "sitter-lsp")]
#[command(about = "Language server for JSON, TOML and YAML backed by tree-sitter")]
#[command(version)]
struct Cli {
    /// Communicate over stdin/stdout (the only supported transport)
    #[arg(long = "stdio")]
    _stdio: bool,

    /// Write logs here instead of the data directory
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_server(cli.log_file).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("sitter-lsp: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
