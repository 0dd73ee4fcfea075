//! Build pipeline: runs every registered extractor and writes the catalog

pub mod orchestrator;

pub use orchestrator::{BuildError, BuildOrchestrator, BuildReport};
