//! Classify command - run classification and extraction on plain text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::info;

use docsort_core::{DocumentClassifier, DocumentRecord, FieldDispatcher};

use super::process::{format_record, OutputFormat};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Text file to classify ("-" reads stdin)
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;

    let text = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        if !args.input.exists() {
            anyhow::bail!("Input file not found: {}", args.input.display());
        }
        fs::read_to_string(&args.input)?
    };

    let classifier = DocumentClassifier::with_taxonomy(config.classification.clone());
    let dispatcher = FieldDispatcher::from_config(&config);

    let document_type = classifier.classify(&text);
    let fields = dispatcher.extract(&text, document_type);
    info!("Classified {} as {}", args.input.display(), document_type);

    let record = DocumentRecord::new(document_type, text, fields, Utc::now());
    println!("{}", format_record(&record, args.format)?);

    Ok(())
}
