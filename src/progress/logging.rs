//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                output_dir,
                sources,
            } => {
                info!(output_dir = %output_dir, sources, "Starting printer database build");
            }
            ProgressEvent::SourceStarted { source } => {
                info!(source = %source, "Extracting");
            }
            ProgressEvent::SourceCompleted {
                source,
                printers,
                skipped,
                duration,
            } => {
                info!(
                    source = %source,
                    printers,
                    skipped,
                    time_ms = duration.as_millis(),
                    "Source extracted"
                );
            }
            ProgressEvent::SourceFailed { source, error } => {
                warn!(source = %source, error = %error, "Source failed, continuing without it");
            }
            ProgressEvent::SourceSkipped { source } => {
                info!(source = %source, "Source disabled, skipping");
            }
            ProgressEvent::Merged {
                printers,
                duplicates_removed,
            } => {
                info!(printers, duplicates_removed, "Merged unique printers");
            }
            ProgressEvent::Written { path } => {
                info!(path = %path, "Wrote output file");
            }
            ProgressEvent::Completed {
                total_printers,
                total_time,
            } => {
                info!(
                    total_printers,
                    total_time_ms = total_time.as_millis(),
                    "Build complete"
                );
            }
            ProgressEvent::Failed { error } => {
                error!(error = %error, "Build failed");
            }
        }
    }
}
