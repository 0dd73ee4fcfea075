//! Printer extractors
//!
//! Each extractor turns one upstream's native printer definitions into
//! [`PrinterEntry`] records. Extractors are registered in an
//! [`ExtractorRegistry`] and the build treats them uniformly.

pub mod common;
pub mod orca;
pub mod registry;
pub mod uvtools;

pub use orca::OrcaSlicerExtractor;
pub use registry::ExtractorRegistry;
pub use uvtools::UvToolsExtractor;

use crate::catalog::{PrinterEntry, Source, Technology};
use crate::upstream::FetchError;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Source-level failure; the whole source contributes nothing to the build
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to fetch upstream data: {0}")]
    Fetch(#[from] FetchError),

    #[error("No printers extracted from {0}")]
    NoData(Source),
}

/// Why a single upstream entry was left out
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The file could not be fetched or read
    Unreadable(String),
    /// The file or definition could not be parsed
    Malformed(String),
    MissingVolume(&'static str),
    InvalidVolume { axis: &'static str, value: f64 },
    TooSmall { axis: &'static str, value: f64 },
    Blacklisted,
    Duplicate,
}

impl SkipReason {
    /// Expected filtering, logged at debug rather than warn
    pub fn is_routine(&self) -> bool {
        matches!(self, SkipReason::Blacklisted | SkipReason::Duplicate)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
            SkipReason::Malformed(e) => write!(f, "malformed: {}", e),
            SkipReason::MissingVolume(axis) => write!(f, "missing build volume {}", axis),
            SkipReason::InvalidVolume { axis, value } => {
                write!(f, "build volume {} must be positive, got {}", axis, value)
            }
            SkipReason::TooSmall { axis, value } => {
                write!(f, "build volume {} of {} mm is implausibly small", axis, value)
            }
            SkipReason::Blacklisted => write!(f, "not a printer (accessory or generic entry)"),
            SkipReason::Duplicate => write!(f, "duplicate model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// File name or upstream model name
    pub name: String,
    pub reason: SkipReason,
}

/// Entries produced by one extractor run, plus everything it skipped
#[derive(Debug, Clone)]
pub struct Extraction {
    pub source: Source,
    pub entries: Vec<PrinterEntry>,
    pub skipped: Vec<SkippedEntry>,
}

impl Extraction {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: PrinterEntry) {
        debug_assert_eq!(entry.source, self.source);
        self.entries.push(entry);
    }

    /// Records and logs a skipped entry
    pub fn skip(&mut self, name: impl Into<String>, reason: SkipReason) {
        let name = name.into();
        if reason.is_routine() {
            debug!(source = %self.source, entry = %name, reason = %reason, "Skipping entry");
        } else {
            warn!(source = %self.source, entry = %name, reason = %reason, "Skipping entry");
        }
        self.skipped.push(SkippedEntry { name, reason });
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Produces unified printer entries from one upstream
#[async_trait]
pub trait PrinterExtractor: Send + Sync {
    fn source(&self) -> Source;

    fn technology(&self) -> Technology {
        self.source().technology()
    }

    /// URL or path of the upstream this extractor reads
    fn upstream(&self) -> String;

    async fn extract(&self) -> Result<Extraction, ExtractError>;
}
