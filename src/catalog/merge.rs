//! Catalog merging and deduplication
//!
//! Batches are merged in the order they are given. The first entry seen for a
//! (brand, model, technology) key is kept and every later one is dropped, then
//! the result is sorted so the written catalog does not depend on upstream
//! listing order.

use super::types::{CatalogKey, PrinterEntry};
use std::collections::HashSet;
use tracing::debug;

/// Result of merging extractor outputs
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub printers: Vec<PrinterEntry>,
    pub duplicates_removed: usize,
}

/// Merges entry batches, keeping the first occurrence of each catalog key
pub fn merge_printers<I>(batches: I) -> MergeOutcome
where
    I: IntoIterator<Item = Vec<PrinterEntry>>,
{
    let mut seen: HashSet<CatalogKey> = HashSet::new();
    let mut printers = Vec::new();
    let mut duplicates_removed = 0;

    for batch in batches {
        for entry in batch {
            if seen.insert(entry.catalog_key()) {
                printers.push(entry);
            } else {
                debug!(
                    brand = %entry.brand,
                    model = %entry.model,
                    source = %entry.source,
                    "Dropping duplicate printer"
                );
                duplicates_removed += 1;
            }
        }
    }

    sort_catalog(&mut printers);

    MergeOutcome {
        printers,
        duplicates_removed,
    }
}

/// Sorts by lowercase brand, lowercase model, then technology
pub fn sort_catalog(printers: &mut [PrinterEntry]) {
    printers.sort_by(|a, b| {
        a.brand
            .to_lowercase()
            .cmp(&b.brand.to_lowercase())
            .then_with(|| a.model.to_lowercase().cmp(&b.model.to_lowercase()))
            .then_with(|| a.technology.cmp(&b.technology))
            .then_with(|| a.brand.cmp(&b.brand))
            .then_with(|| a.model.cmp(&b.model))
    });
}
