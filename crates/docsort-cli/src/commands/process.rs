//! Process command - classify one attachment and extract its fields.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docsort_core::models::config::DocsortConfig;
use docsort_core::{DocumentPipeline, DocumentRecord, OnnxTextRecognizer};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory (overrides ocr.model_dir)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Append the recognized text to text output (JSON always carries it)
    #[arg(long)]
    with_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let Some(mime_type) = mime_type_for(&args.input) else {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    };

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);

    pb.set_message("Loading OCR models...");
    let pipeline = build_pipeline(&config, args.model_dir.as_deref())?;

    pb.set_message("Recognizing text...");
    let data = fs::read(&args.input)?;
    let record = pipeline.process(&data, mime_type);

    pb.finish_and_clear();

    let Some(mut record) = record else {
        anyhow::bail!("No text could be recognized in {}", args.input.display());
    };
    if !args.with_text && matches!(args.format, OutputFormat::Text) {
        record.extracted_text.clear();
    }

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// MIME type for a supported attachment extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "tif" | "tiff" => Some("image/tiff"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Pipeline backed by the ONNX OCR models named in the config.
pub fn build_pipeline(
    config: &DocsortConfig,
    model_dir: Option<&Path>,
) -> anyhow::Result<DocumentPipeline> {
    let mut ocr = config.ocr.clone();
    if let Some(dir) = model_dir {
        ocr.model_dir = dir.to_path_buf();
    }

    let recognizer = OnnxTextRecognizer::from_config(&ocr).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load OCR models from {}: {}",
            ocr.model_dir.display(),
            e
        )
    })?;
    debug!("Using OCR models from {}", ocr.model_dir.display());

    Ok(DocumentPipeline::from_config(config, Box::new(recognizer)))
}

pub fn format_record(record: &DocumentRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => format_text(record),
    }
}

/// Field names and display values, sorted by name.
fn field_rows(record: &DocumentRecord) -> anyhow::Result<Vec<(String, String)>> {
    let value = serde_json::to_value(&record.extracted_fields)?;
    let Some(fields) = value.as_object() else {
        return Ok(Vec::new());
    };

    Ok(fields
        .iter()
        .map(|(key, value)| {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                other => other.to_string(),
            };
            (key.clone(), shown)
        })
        .collect())
}

fn format_csv(record: &DocumentRecord) -> anyhow::Result<String> {
    let rows = field_rows(record)?;
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["document_type".to_string(), "processed_at".to_string()];
    header.extend(rows.iter().map(|(k, _)| k.clone()));
    wtr.write_record(&header)?;

    let mut values = vec![
        record.document_type.to_string(),
        record.processed_at.to_rfc3339(),
    ];
    values.extend(rows.into_iter().map(|(_, v)| v));
    wtr.write_record(&values)?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(record: &DocumentRecord) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str(&format!("Type: {}\n", record.document_type));
    output.push_str(&format!("Processed: {}\n", record.processed_at.to_rfc3339()));

    let rows = field_rows(record)?;
    if !rows.is_empty() {
        output.push('\n');
        for (key, value) in rows {
            let shown = if value.is_empty() { "-" } else { value.as_str() };
            output.push_str(&format!("  {}: {}\n", key, shown));
        }
    }

    if !record.extracted_text.is_empty() {
        output.push_str("\nText:\n");
        output.push_str(&record.extracted_text);
        output.push('\n');
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docsort_core::{DocumentType, FieldSet, InvoiceFields};

    fn record(text: &str) -> DocumentRecord {
        let fields = InvoiceFields {
            invoice_number: "AB12345678".to_string(),
            amount: "3000".to_string(),
            ..InvoiceFields::default()
        };
        DocumentRecord::new(DocumentType::Invoice, text.to_string(), FieldSet::Invoice(fields), Utc::now())
    }

    #[test]
    fn test_json_always_has_text() {
        let json = format_record(&record("統一發票"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["extracted_text"], "統一發票");
        assert_eq!(value["extracted_fields"]["amount"], "3000");
    }

    #[test]
    fn test_text_output_shows_text_only_when_present() {
        let with_text = format_record(&record("統一發票"), OutputFormat::Text).unwrap();
        assert!(with_text.contains("Type: invoice"));
        assert!(with_text.contains("  buyer: -\n"));
        assert!(with_text.ends_with("\nText:\n統一發票\n"));

        let without = format_record(&record(""), OutputFormat::Text).unwrap();
        assert!(!without.contains("Text:"));
    }

    #[test]
    fn test_csv_has_sorted_field_columns() {
        let csv = format_record(&record("統一發票"), OutputFormat::Csv).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "document_type,processed_at,amount,buyer,invoice_date,invoice_number,seller,tax_id"
        );
        assert!(!csv.contains("統一發票"));
    }
}
