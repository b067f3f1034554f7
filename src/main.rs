use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tower_lsp::{LspService, Server};
use tracing::info;

use isaac_api_language_server::logging::init_logger;
use isaac_api_language_server::lsp::backend::IsaacBackend;
use isaac_api_language_server::registry::NamespaceRegistry;

/// Language server completing Binding of Isaac: Repentance API enums in Lua files
#[derive(Parser, Debug)]
#[command(name = "isaac-api-language-server", version, about)]
struct Args {
    /// Communicate over stdin/stdout (the only supported transport)
    #[arg(long)]
    stdio: bool,

    /// Log filter for stderr, e.g. "debug" or "isaac_api_language_server=trace"
    /// (defaults to RUST_LOG, then "info")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr logs
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log to the user cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Load namespace definitions from this JSON file instead of the built-in API enums
    #[arg(long, value_name = "PATH")]
    namespaces: Option<PathBuf>,
}

fn load_registry(path: Option<&PathBuf>) -> anyhow::Result<NamespaceRegistry> {
    match path {
        Some(path) => {
            let source = std::fs::read_to_string(path).with_context(|| {
                format!("failed to read namespace definitions from {}", path.display())
            })?;
            NamespaceRegistry::from_json(&source)
                .with_context(|| format!("invalid namespace definitions in {}", path.display()))
        }
        None => NamespaceRegistry::builtin().context("invalid built-in namespace definitions"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)
        .context("failed to initialize logging")?;

    let registry = Arc::new(load_registry(args.namespaces.as_ref())?);
    info!(
        "Starting {} {} with {} namespaces (stdio)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        registry.len()
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| IsaacBackend::new(client, registry));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Server stopped");
    Ok(())
}
