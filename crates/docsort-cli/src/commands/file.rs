//! File command - classify and file every attachment of a local inbox.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use docsort_core::filing::FiledDocument;
use docsort_core::AttachmentFiler;

use crate::local::{LocalArchive, LocalInbox};

/// Arguments for the file command.
#[derive(Args)]
pub struct FileArgs {
    /// Inbox directory (one sub-directory with a message.json per message)
    #[arg(short, long, required = true)]
    inbox: PathBuf,

    /// Archive directory that receives the folder hierarchy
    #[arg(short, long, default_value = "archive")]
    archive: PathBuf,

    /// Only consider messages from the last N days (overrides mail.days_back)
    #[arg(long)]
    days_back: Option<u32>,

    /// Write a CSV summary of filed documents
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Model directory (overrides ocr.model_dir)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: FileArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    if let Some(days) = args.days_back {
        config.mail.days_back = days;
    }

    if !args.inbox.is_dir() {
        anyhow::bail!("Inbox directory not found: {}", args.inbox.display());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    pb.set_message("Loading OCR models...");
    let pipeline = super::process::build_pipeline(&config, args.model_dir.as_deref())?;

    pb.set_message(format!("Filing attachments from {}...", args.inbox.display()));
    let inbox = LocalInbox::new(&args.inbox, config.mail.processed_label.clone());
    let archive = LocalArchive::new(&args.archive);
    let filer = AttachmentFiler::new(inbox, archive, pipeline).with_config(&config);
    let report = filer.run()?;

    pb.finish_and_clear();
    debug!("Created {} folders", filer.sink().created_folders().len());

    for doc in &report.filed {
        println!(
            "  {} {} -> {}/{}",
            style(doc.document_type).cyan(),
            doc.original_filename,
            doc.folder,
            doc.filename
        );
    }

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &report.filed)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Checked {} messages in {:?}",
        style("✓").green(),
        report.messages,
        start.elapsed()
    );
    println!("  Filed:   {}", style(report.processed).green());
    println!("  Skipped: {}", style(report.skipped).yellow());
    if report.failed > 0 {
        println!("  Failed:  {}", style(report.failed).red());
    }

    Ok(())
}

fn write_summary(path: &Path, filed: &[FiledDocument]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for doc in filed {
        wtr.serialize(doc)?;
    }
    wtr.flush()?;
    Ok(())
}
