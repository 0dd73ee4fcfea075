//! Unified printer catalog: record types, merging, metadata and file output

pub mod merge;
pub mod metadata;
pub mod types;
pub mod writer;

pub use merge::{merge_printers, MergeOutcome};
pub use metadata::{BuildMetadata, SourceReport, SourceStatus};
pub use types::{BuildVolume, CatalogKey, PrinterEntry, Source, Technology};
pub use writer::{
    stage_json, StagedFile, WriteError, METADATA_FILE, PRINTERS_FILE,
};
