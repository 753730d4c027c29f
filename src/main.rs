// src/main.rs

use clap::Parser;
use securityscan::cli::{Cli, Commands};
use securityscan::{app, logging};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Err(e) = logging::initialize_logging() {
        eprintln!("Warning: file logging disabled: {e}");
    }

    let code = match cli.command {
        Commands::Run(args) => app::run(args).await,
    };
    std::process::exit(code);
}
