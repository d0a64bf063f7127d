use clap::Parser;
use intake::cli::Cli;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = intake::commands::run(cli).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}
