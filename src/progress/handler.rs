//! Progress handler trait and events

use crate::catalog::Source;
use std::time::Duration;

/// Events emitted while a catalog build runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build started
    Started { output_dir: String, sources: usize },

    /// A source is being fetched and extracted
    SourceStarted { source: Source },

    /// A source produced entries
    SourceCompleted {
        source: Source,
        printers: usize,
        skipped: usize,
        duration: Duration,
    },

    /// A source failed and contributes nothing to this build
    SourceFailed { source: Source, error: String },

    /// A source was disabled by configuration
    SourceSkipped { source: Source },

    /// Source outputs merged
    Merged {
        printers: usize,
        duplicates_removed: usize,
    },

    /// An output file was written
    Written { path: String },

    /// Build finished and both files are on disk
    Completed {
        total_printers: usize,
        total_time: Duration,
    },

    /// Build aborted
    Failed { error: String },
}

/// Trait for handling progress events during a build
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::SourceStarted {
            source: Source::OrcaSlicer,
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            output_dir: "data".to_string(),
            sources: 2,
        });
        handler.on_progress(&ProgressEvent::Merged {
            printers: 10,
            duplicates_removed: 1,
        });
        handler.on_progress(&ProgressEvent::Completed {
            total_printers: 10,
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::SourceSkipped {
            source: Source::UvTools,
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("SourceSkipped"));
        assert!(debug_str.contains("UvTools"));
    }
}
