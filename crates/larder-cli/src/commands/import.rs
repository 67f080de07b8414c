//! Import command - run an invoice file through the full pipeline.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use larder_core::{
    apply_import, DraftSnapshot, DraftStore, ImportPipeline, ImportSession, InventoryStore,
    InvoiceFile, JsonDraftStore, JsonStore, LarderConfig, LopdfTextExtractor,
};

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Invoice file (CSV or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Catalog store (JSON file)
    #[arg(long, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the reconciliation batch back to the catalog store
    #[arg(long)]
    apply: bool,

    /// Snapshot the session to the draft store
    #[arg(long)]
    save_draft: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text report
    Text,
}

pub async fn run(args: ImportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = if let Some(path) = config_path {
        LarderConfig::from_file(std::path::Path::new(path))?
    } else {
        LarderConfig::default()
    };

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("invoice")
        .to_string();

    info!("Importing invoice: {}", args.input.display());

    // Create progress bar
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    pb.set_message("Loading catalog...");
    pb.set_position(10);

    let mut store = JsonStore::new(&args.catalog);
    let catalog = store.load()?;
    debug!("catalog has {} items", catalog.len());

    pb.set_message("Detecting and extracting...");
    pb.set_position(30);

    let bytes = fs::read(&args.input)?;
    let file = InvoiceFile::new(file_name, bytes);
    let pdf = LopdfTextExtractor::new();

    let mut pipeline = ImportPipeline::new(&pdf, &config);
    let session = match pipeline.run(&file, &catalog) {
        Ok(session) => session,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    pb.set_message("Formatting report...");
    pb.set_position(80);

    let output = format_session(&session, args.format)?;

    pb.finish_with_message("Done");

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.save_draft {
        let draft_path = draft_store_path(&config);
        let mut drafts = JsonDraftStore::new(&draft_path, config.drafts.max_drafts);
        drafts.push(DraftSnapshot::from_session(&session))?;
        println!(
            "{} Draft saved to {}",
            style("✓").green(),
            draft_path.display()
        );
    }

    if args.apply {
        let batch = apply_import(&session, &mut store)?;
        println!(
            "{} Applied to {}: {} created, {} updated",
            style("✓").green(),
            args.catalog.display(),
            batch.created.len(),
            batch.updated.len()
        );
    }

    debug!("Total import time: {:?}", start.elapsed());

    Ok(())
}

fn draft_store_path(config: &LarderConfig) -> PathBuf {
    if config.drafts.draft_dir.as_os_str().is_empty() {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("larder")
            .join("drafts.json")
    } else {
        config.drafts.draft_dir.join("drafts.json")
    }
}

fn format_session(session: &ImportSession, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(session)?),
        OutputFormat::Csv => format_csv(session),
        OutputFormat::Text => format_text(session),
    }
}

fn format_csv(session: &ImportSession) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "result_id",
        "vendor_sku",
        "name",
        "qty_shipped",
        "case_cost",
        "unit_cost",
        "match_type",
        "confidence",
        "requires_review",
        "matched_id",
    ])?;

    for result in &session.results {
        let item = &result.extracted_item;
        wtr.write_record([
            &result.id.to_string(),
            &item.vendor_sku,
            &item.name,
            &item.quantity_shipped.to_string(),
            &item.case_cost.to_string(),
            &item.unit_cost.to_string(),
            &result.match_type.to_string(),
            &format!("{:.2}", result.confidence),
            &result.requires_review.to_string(),
            &result
                .matched_item
                .as_ref()
                .map(|m| m.id.clone())
                .unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(session: &ImportSession) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str(&format!(
        "Invoice {} from {} ({})\n",
        session.invoice_number, session.vendor, session.invoice_date
    ));
    output.push('\n');

    for result in &session.results {
        let item = &result.extracted_item;
        let marker = if result.is_new_item {
            style("new").yellow().to_string()
        } else if result.requires_review {
            style("review").red().to_string()
        } else {
            style("ok").green().to_string()
        };

        output.push_str(&format!(
            "  [{marker}] {} {} x{} @ {} ({} {:.0}%)",
            item.vendor_sku,
            item.name,
            item.quantity_shipped,
            item.case_cost,
            result.match_type,
            result.confidence * 100.0
        ));
        if let Some(matched) = &result.matched_item {
            output.push_str(&format!(" -> {}", matched.name));
        }
        output.push('\n');
    }

    output.push('\n');
    output.push_str("Summary:\n");
    output.push_str(&format!("  Total items:  {}\n", session.summary.total_items));
    output.push_str(&format!("  Auto-matched: {}\n", session.summary.auto_matched));
    output.push_str(&format!("  Needs review: {}\n", session.summary.needs_review));
    output.push_str(&format!("  New items:    {}\n", session.summary.new_items));
    output.push_str(&format!(
        "  Portions:     {}\n",
        session.summary.portions_parsed
    ));

    Ok(output)
}
