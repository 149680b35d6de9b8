//! Main entry point for the annomarket CLI

use annomarket::cli::{Cli, CliError};
use annomarket::logging::init_tracing;
use annomarket::shutdown::{self, ShutdownCoordinator};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Install global shutdown coordinator and Ctrl+C handler
    let shutdown = ShutdownCoordinator::shared();
    shutdown::set_global_shutdown(shutdown.clone());
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - stopping...");
                shutdown.request_shutdown();
            }
        }
    });

    let result: anyhow::Result<()> = cli.run(shutdown).await.map_err(anyhow::Error::from);

    if let Err(e) = result {
        error!("Command failed: {}", e);
        if let Some(diagnostic) = e.downcast_ref::<CliError>().and_then(CliError::diagnostic) {
            let rendered = serde_json::to_string_pretty(diagnostic)
                .unwrap_or_else(|_| diagnostic.to_string());
            eprintln!("{rendered}");
        }
        std::process::exit(1);
    }
}
