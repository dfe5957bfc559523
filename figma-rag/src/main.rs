use clap::Parser;
use figma_rag::cli::{run, Cli};
use figma_rag::console;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays readable.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => {
                tracing::info!("CLI completed successfully");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "CLI exited with error");
                console::error_panel("Error", &format!("{e:#}"));
                ExitCode::from(1)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted");
            console::warning_panel("Interrupted", "Operation cancelled by user.");
            ExitCode::from(130)
        }
    }
}
