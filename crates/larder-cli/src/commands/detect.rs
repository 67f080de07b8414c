//! Detect command - vendor detection without extraction.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use larder_core::{detect_vendor, InvoiceFile, LopdfTextExtractor};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Invoice file (CSV or PDF)
    #[arg(required = true)]
    input: PathBuf,
}

pub async fn run(args: DetectArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("invoice")
        .to_string();
    let bytes = fs::read(&args.input)?;
    let file = InvoiceFile::new(file_name, bytes);

    let pdf = LopdfTextExtractor::new();
    let vendor = detect_vendor(&file, &pdf)?;

    println!("{} Detected vendor: {}", style("✓").green(), vendor);

    Ok(())
}
