//! Resin printers from the UVtools machine table
//!
//! UVtools keeps its printer list as C# constructor calls in
//! `UVtools.Core/Printer/Machine.cs`:
//!
//! ```text
//! new(PrinterBrand.Anycubic, "Photon M3", 4096, 2560, 163.84f, 102.40f, 180f, FlipDirection.Horizontally),
//! ```
//!
//! The arguments after the model name are resolution X/Y, display width and
//! height (mm) and machine Z (mm).

use super::common::{checked_volume, SeenModels};
use super::{ExtractError, Extraction, PrinterExtractor, SkipReason};
use crate::catalog::merge::sort_catalog;
use crate::catalog::{PrinterEntry, Source};
use crate::upstream::{GitHubRepo, Upstream};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::info;

pub const MACHINE_FILE_PATH: &str = "UVtools.Core/Printer/Machine.cs";

/// Placeholder model names, matched exactly
const BLACKLIST_MODELS: &[&str] = &["custom", "default", "generic", "unknown", "test"];

pub fn default_repo() -> GitHubRepo {
    GitHubRepo::new("sn4k3", "UVtools", "master")
}

/// One constructor call as it appears in the source table
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDefinition {
    pub brand: String,
    pub model: String,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub display_width: String,
    pub display_height: String,
    pub machine_z: String,
}

fn machine_regex() -> &'static Regex {
    static MACHINE: OnceLock<Regex> = OnceLock::new();
    MACHINE.get_or_init(|| {
        Regex::new(
            r#"new\s*\(\s*PrinterBrand\.(\w+)\s*,\s*"([^"]+)"\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*([\d.]+)f?\s*,\s*([\d.]+)f?\s*,\s*([\d.]+)f?"#,
        )
        .expect("valid machine definition regex")
    })
}

/// Finds every machine constructor call in `Machine.cs`
pub fn parse_machine_table(source: &str) -> Vec<MachineDefinition> {
    machine_regex()
        .captures_iter(source)
        .filter_map(|cap| {
            Some(MachineDefinition {
                brand: cap[1].to_string(),
                model: cap[2].to_string(),
                resolution_x: cap[3].parse().ok()?,
                resolution_y: cap[4].parse().ok()?,
                display_width: cap[5].to_string(),
                display_height: cap[6].to_string(),
                machine_z: cap[7].to_string(),
            })
        })
        .collect()
}

pub struct UvToolsExtractor {
    upstream: Arc<dyn Upstream>,
}

impl UvToolsExtractor {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    fn entry_for(definition: &MachineDefinition) -> Result<PrinterEntry, SkipReason> {
        let parse = |field: &str, raw: &str| {
            raw.parse::<f64>()
                .map_err(|_| SkipReason::Malformed(format!("{} '{}' is not a number", field, raw)))
        };

        let x = parse("display width", &definition.display_width)?;
        let y = parse("display height", &definition.display_height)?;
        let z = parse("machine Z", &definition.machine_z)?;
        let volume = checked_volume(Some(x), Some(y), Some(z))?;

        Ok(PrinterEntry::new(
            definition.brand.clone(),
            definition.model.clone(),
            Source::UvTools,
            volume,
        ))
    }

    /// Converts parsed definitions into sorted, deduplicated entries
    pub fn build_extraction(definitions: &[MachineDefinition]) -> Extraction {
        let mut extraction = Extraction::new(Source::UvTools);
        let mut seen = SeenModels::new();

        for definition in definitions {
            let label = format!("{} {}", definition.brand, definition.model);

            if is_blacklisted(&definition.model) {
                extraction.skip(label, SkipReason::Blacklisted);
                continue;
            }

            let entry = match Self::entry_for(definition) {
                Ok(entry) => entry,
                Err(reason) => {
                    extraction.skip(label, reason);
                    continue;
                }
            };

            if !seen.insert(&entry.brand, &entry.model) {
                extraction.skip(label, SkipReason::Duplicate);
                continue;
            }

            extraction.push(entry);
        }

        sort_catalog(&mut extraction.entries);
        extraction
    }
}

#[async_trait]
impl PrinterExtractor for UvToolsExtractor {
    fn source(&self) -> Source {
        Source::UvTools
    }

    fn upstream(&self) -> String {
        self.upstream.describe()
    }

    async fn extract(&self) -> Result<Extraction, ExtractError> {
        info!(upstream = %self.upstream.describe(), "Extracting SLA printers from UVtools");

        let source = self.upstream.read_text(MACHINE_FILE_PATH).await?;
        info!(bytes = source.len(), "Downloaded machine table");

        let definitions = parse_machine_table(&source);
        let extraction = Self::build_extraction(&definitions);

        if extraction.entries.is_empty() {
            return Err(ExtractError::NoData(Source::UvTools));
        }

        info!(
            printers = extraction.entries.len(),
            skipped = extraction.skipped_count(),
            "Extracted SLA printers"
        );
        Ok(extraction)
    }
}

pub fn is_blacklisted(model: &str) -> bool {
    let lower = model.trim().to_lowercase();
    BLACKLIST_MODELS.contains(&lower.as_str())
}
