//! Build metadata aggregation

use super::types::{PrinterEntry, Source, Technology};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one source for a build run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Success,
    Failed,
    Skipped,
}

/// Per-source section of `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: Source,
    pub technology: Technology,
    /// URL or local path the source was read from
    pub upstream: String,
    pub status: SourceStatus,
    /// Entries the extractor produced, before cross-source merging
    pub printers: usize,
    pub skipped_entries: usize,
    pub error: Option<String>,
}

impl SourceReport {
    pub fn success(source: Source, upstream: String, printers: usize, skipped: usize) -> Self {
        Self {
            source,
            technology: source.technology(),
            upstream,
            status: SourceStatus::Success,
            printers,
            skipped_entries: skipped,
            error: None,
        }
    }

    pub fn failed(source: Source, upstream: String, error: impl ToString) -> Self {
        Self {
            source,
            technology: source.technology(),
            upstream,
            status: SourceStatus::Failed,
            printers: 0,
            skipped_entries: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn skipped(source: Source, upstream: String) -> Self {
        Self {
            source,
            technology: source.technology(),
            upstream,
            status: SourceStatus::Skipped,
            printers: 0,
            skipped_entries: 0,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SourceStatus::Success
    }
}

/// Summary written next to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub last_updated: DateTime<Utc>,
    pub total_printers: usize,
    pub fdm_count: usize,
    pub sla_count: usize,
    pub by_technology: BTreeMap<Technology, usize>,
    pub by_source: BTreeMap<Source, usize>,
    pub with_images: usize,
    pub brand_count: usize,
    pub brands: Vec<String>,
    pub duplicates_removed: usize,
    pub sources: BTreeMap<Source, SourceReport>,
}

impl BuildMetadata {
    pub fn compute(
        printers: &[PrinterEntry],
        reports: &[SourceReport],
        duplicates_removed: usize,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let mut by_technology: BTreeMap<Technology, usize> =
            Technology::ALL.iter().map(|t| (*t, 0)).collect();
        let mut by_source: BTreeMap<Source, usize> =
            Source::ALL.iter().map(|s| (*s, 0)).collect();
        let mut brands = BTreeSet::new();
        let mut with_images = 0;

        for printer in printers {
            *by_technology.entry(printer.technology).or_default() += 1;
            *by_source.entry(printer.source).or_default() += 1;
            brands.insert(printer.brand.clone());
            if printer.image_url.is_some() {
                with_images += 1;
            }
        }

        let sources = reports.iter().map(|r| (r.source, r.clone())).collect();

        Self {
            last_updated,
            total_printers: printers.len(),
            fdm_count: by_technology[&Technology::Fdm],
            sla_count: by_technology[&Technology::Sla],
            by_technology,
            by_source,
            with_images,
            brand_count: brands.len(),
            brands: brands.into_iter().collect(),
            duplicates_removed,
            sources,
        }
    }

    pub fn failed_sources(&self) -> Vec<Source> {
        self.sources
            .values()
            .filter(|r| r.status == SourceStatus::Failed)
            .map(|r| r.source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::BuildVolume;
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn sample_printers() -> Vec<PrinterEntry> {
        vec![
            PrinterEntry::new(
                "Acme",
                "X1",
                Source::OrcaSlicer,
                BuildVolume::new(250.0, 250.0, 250.0),
            )
            .with_image(Some("https://example.com/x1.png".to_string())),
            PrinterEntry::new(
                "Acme",
                "X2",
                Source::OrcaSlicer,
                BuildVolume::new(300.0, 300.0, 300.0),
            ),
            PrinterEntry::new(
                "Resinator",
                "R1",
                Source::UvTools,
                BuildVolume::new(120.0, 68.0, 150.0),
            ),
        ]
    }

    #[test]
    fn test_counts() {
        let reports = vec![
            SourceReport::success(Source::OrcaSlicer, "orca".to_string(), 2, 1),
            SourceReport::success(Source::UvTools, "uvtools".to_string(), 1, 0),
        ];
        let metadata = BuildMetadata::compute(&sample_printers(), &reports, 3, timestamp());

        assert_eq!(metadata.total_printers, 3);
        assert_eq!(metadata.fdm_count, 2);
        assert_eq!(metadata.sla_count, 1);
        assert_eq!(metadata.by_source[&Source::UvTools], 1);
        assert_eq!(metadata.with_images, 1);
        assert_eq!(metadata.brands, vec!["Acme", "Resinator"]);
        assert_eq!(metadata.brand_count, 2);
        assert_eq!(metadata.duplicates_removed, 3);
        assert!(metadata.failed_sources().is_empty());
    }

    #[test]
    fn test_empty_technologies_still_reported() {
        let printers: Vec<PrinterEntry> = sample_printers()
            .into_iter()
            .filter(|p| p.technology == Technology::Sla)
            .collect();
        let reports = vec![
            SourceReport::failed(Source::OrcaSlicer, "orca".to_string(), "unreachable"),
            SourceReport::success(Source::UvTools, "uvtools".to_string(), 1, 0),
        ];
        let metadata = BuildMetadata::compute(&printers, &reports, 0, timestamp());

        assert_eq!(metadata.by_technology[&Technology::Fdm], 0);
        assert_eq!(metadata.failed_sources(), vec![Source::OrcaSlicer]);

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["by_technology"]["FDM"], 0);
        assert_eq!(json["sources"]["OrcaSlicer"]["status"], "failed");
        assert_eq!(json["sources"]["OrcaSlicer"]["error"], "unreachable");
        assert_eq!(json["sources"]["UVtools"]["status"], "success");
        assert_eq!(json["last_updated"], "2026-10-19T12:00:00Z");
    }
}
