use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the assessment web UI.
    Serve {
        #[arg(long, default_value_t = 8501, help = "Port for the web server.")]
        port: u16,
    },
    /// Run the assessment as a terminal chat session.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,readiness=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    info!("Starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve { port } => {
            let server = readiness::web_server::start_web_server(port);
            tokio::select! {
                res = server => res.context("Web server failed")?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down");
                }
            }
        }
        Commands::Chat => {
            readiness::chat::run_assessment_chat()
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
