//! Output formatting for build summaries and extractor results
//!
//! JSON and YAML are meant for scripts; the human format is what a maintainer
//! sees after a local build. Everything is written to stdout while logs go to
//! stderr.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::catalog::{BuildMetadata, PrinterEntry, SourceStatus};
use crate::extractors::Extraction;
use crate::pipeline::BuildReport;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct SkippedView<'a> {
    name: &'a str,
    reason: String,
}

#[derive(Serialize)]
struct ExtractionView<'a> {
    source: String,
    printers: &'a [PrinterEntry],
    skipped: Vec<SkippedView<'a>>,
}

impl<'a> From<&'a Extraction> for ExtractionView<'a> {
    fn from(extraction: &'a Extraction) -> Self {
        Self {
            source: extraction.source.to_string(),
            printers: &extraction.entries,
            skipped: extraction
                .skipped
                .iter()
                .map(|s| SkippedView {
                    name: &s.name,
                    reason: s.reason.to_string(),
                })
                .collect(),
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the metadata of a finished build
    pub fn format_build(&self, report: &BuildReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&report.metadata)
                .context("Failed to serialize build metadata to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&report.metadata)
                .context("Failed to serialize build metadata to YAML"),
            OutputFormat::Human => Ok(self.format_build_human(report)),
        }
    }

    /// Formats the result of a single extractor run
    pub fn format_extraction(&self, extraction: &Extraction) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ExtractionView::from(extraction))
                .context("Failed to serialize extraction to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&ExtractionView::from(extraction))
                .context("Failed to serialize extraction to YAML"),
            OutputFormat::Human => Ok(self.format_extraction_human(extraction)),
        }
    }

    fn format_build_human(&self, report: &BuildReport) -> String {
        let metadata = &report.metadata;
        let mut output = String::new();

        if report.is_degraded() {
            output.push_str("\u{26A0} Printer Database Built (Degraded)\n");
        } else {
            output.push_str("\u{2713} Printer Database Built\n");
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Printers:    {}\n", metadata.total_printers));
        output.push_str(&format!("\u{251C}\u{2500} FDM:     {}\n", metadata.fdm_count));
        output.push_str(&format!("\u{2514}\u{2500} SLA:     {}\n", metadata.sla_count));
        output.push_str(&format!("Brands:      {}\n", metadata.brand_count));
        output.push_str(&format!("With images: {}\n", metadata.with_images));
        if metadata.duplicates_removed > 0 {
            output.push_str(&format!(
                "Duplicates:  {} removed\n",
                metadata.duplicates_removed
            ));
        }
        output.push('\n');

        output.push_str(&format_sources(metadata));

        output.push_str(&format!(
            "\nWrote {} and {}\n",
            report.printers_path.display(),
            report.metadata_path.display()
        ));
        output
    }

    fn format_extraction_human(&self, extraction: &Extraction) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} ({}): {} printers, {} skipped\n",
            extraction.source,
            extraction.source.technology(),
            extraction.entries.len(),
            extraction.skipped_count()
        ));
        output.push_str(RULE);
        output.push('\n');

        for entry in &extraction.entries {
            output.push_str(&format!(
                "{} {}  {} x {} x {} mm",
                entry.brand, entry.model, entry.volume.x, entry.volume.y, entry.volume.z
            ));
            if entry.image_url.is_some() {
                output.push_str("  [image]");
            }
            output.push('\n');
        }

        if !extraction.skipped.is_empty() {
            output.push_str("\nSkipped:\n");
            for skipped in &extraction.skipped {
                output.push_str(&format!("  - {}: {}\n", skipped.name, skipped.reason));
            }
        }
        output
    }
}

fn format_sources(metadata: &BuildMetadata) -> String {
    let mut output = String::from("Sources:\n");
    let count = metadata.sources.len();

    for (i, report) in metadata.sources.values().enumerate() {
        let connector = if i + 1 == count { "\u{2514}" } else { "\u{251C}" };
        let detail = match report.status {
            SourceStatus::Success => format!(
                "\u{2713} {} printers, {} skipped",
                report.printers, report.skipped_entries
            ),
            SourceStatus::Failed => format!(
                "\u{2717} failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            ),
            SourceStatus::Skipped => "- disabled".to_string(),
        };
        output.push_str(&format!(
            "{}\u{2500} {:<11} {}\n",
            connector,
            report.source.as_str(),
            detail
        ));
    }
    output
}
