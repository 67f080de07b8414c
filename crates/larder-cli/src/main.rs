//! CLI application for vendor invoice import and inventory reconciliation.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, convert, detect, import};

/// Larder - import vendor invoices into an inventory catalog
#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a vendor invoice file against a catalog
    Import(import::ImportArgs),

    /// Detect the vendor format of an invoice file
    Detect(detect::DetectArgs),

    /// Convert a quantity between units of measure
    Convert(convert::ConvertArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Import(args) => import::run(args, cli.config.as_deref()).await,
        Commands::Detect(args) => detect::run(args).await,
        Commands::Convert(args) => convert::run(args).await,
        Commands::Config(args) => config::run(args).await,
    }
}
