use crate::catalog::{
    merge_printers, stage_json, BuildMetadata, PrinterEntry, Source, SourceReport, StagedFile,
    WriteError, METADATA_FILE, PRINTERS_FILE,
};
use crate::extractors::{ExtractorRegistry, PrinterExtractor};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BuildError {
    /// Every enabled source failed; nothing was written
    #[error("No source produced any printers: {0}")]
    NoData(String),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What a successful build produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub metadata: BuildMetadata,
    pub printers_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl BuildReport {
    /// True when some enabled source failed and the catalog is partial
    pub fn is_degraded(&self) -> bool {
        !self.metadata.failed_sources().is_empty()
    }
}

/// Runs fetch → extract → merge → write for every registered source
pub struct BuildOrchestrator {
    registry: ExtractorRegistry,
    disabled: Vec<(Source, String)>,
    output_dir: PathBuf,
    progress_handler: Arc<dyn ProgressHandler>,
    build_time: Option<DateTime<Utc>>,
}

impl BuildOrchestrator {
    pub fn new(registry: ExtractorRegistry, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            disabled: Vec::new(),
            output_dir: output_dir.into(),
            progress_handler: Arc::new(LoggingHandler),
            build_time: None,
        }
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = handler;
        self
    }

    /// Records a source that is turned off for this run
    pub fn with_disabled(mut self, source: Source, upstream: impl Into<String>) -> Self {
        self.disabled.push((source, upstream.into()));
        self
    }

    /// Pins the metadata timestamp instead of using the current time
    pub fn with_build_time(mut self, at: DateTime<Utc>) -> Self {
        self.build_time = Some(at);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn printers_path(&self) -> PathBuf {
        self.output_dir.join(PRINTERS_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(METADATA_FILE)
    }

    pub async fn execute(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let build_time = self.build_time.unwrap_or_else(Utc::now);

        self.emit(ProgressEvent::Started {
            output_dir: self.output_dir.display().to_string(),
            sources: self.registry.len(),
        });

        let results = join_all(self.registry.iter().map(|e| self.run_source(e.as_ref()))).await;

        let mut reports = Vec::with_capacity(results.len() + self.disabled.len());
        let mut batches = Vec::with_capacity(results.len());
        for (report, entries) in results {
            reports.push(report);
            batches.extend(entries);
        }

        for (source, upstream) in &self.disabled {
            self.emit(ProgressEvent::SourceSkipped { source: *source });
            reports.push(SourceReport::skipped(*source, upstream.clone()));
        }

        if !reports.iter().any(SourceReport::is_success) {
            let summary = failure_summary(&reports);
            self.emit(ProgressEvent::Failed {
                error: summary.clone(),
            });
            return Err(BuildError::NoData(summary));
        }

        let outcome = merge_printers(batches);
        self.emit(ProgressEvent::Merged {
            printers: outcome.printers.len(),
            duplicates_removed: outcome.duplicates_removed,
        });

        let metadata = BuildMetadata::compute(
            &outcome.printers,
            &reports,
            outcome.duplicates_removed,
            build_time,
        );

        let printers_path = self.printers_path();
        let metadata_path = self.metadata_path();
        let staged_printers = self.stage(&printers_path, &outcome.printers)?;
        let staged_metadata = self.stage(&metadata_path, &metadata)?;
        self.write_all(vec![staged_printers, staged_metadata])?;

        self.emit(ProgressEvent::Completed {
            total_printers: metadata.total_printers,
            total_time: start.elapsed(),
        });

        Ok(BuildReport {
            metadata,
            printers_path,
            metadata_path,
        })
    }

    /// Extracts one source; failures become a failed report instead of an error
    async fn run_source(
        &self,
        extractor: &dyn PrinterExtractor,
    ) -> (SourceReport, Option<Vec<PrinterEntry>>) {
        let source = extractor.source();
        let upstream = extractor.upstream();
        self.emit(ProgressEvent::SourceStarted { source });

        let started = Instant::now();
        match extractor.extract().await {
            Ok(extraction) => {
                self.emit(ProgressEvent::SourceCompleted {
                    source,
                    printers: extraction.entries.len(),
                    skipped: extraction.skipped_count(),
                    duration: started.elapsed(),
                });
                let report = SourceReport::success(
                    source,
                    upstream,
                    extraction.entries.len(),
                    extraction.skipped_count(),
                );
                (report, Some(extraction.entries))
            }
            Err(e) => {
                self.emit(ProgressEvent::SourceFailed {
                    source,
                    error: e.to_string(),
                });
                (SourceReport::failed(source, upstream, &e), None)
            }
        }
    }

    fn stage<T>(&self, path: &Path, value: &T) -> Result<StagedFile, BuildError>
    where
        T: serde::Serialize + ?Sized,
    {
        stage_json(path, value).map_err(|e| self.write_failed(e))
    }

    /// Renames staged files into place once every one of them is on disk
    fn write_all(&self, staged: Vec<StagedFile>) -> Result<(), BuildError> {
        for file in staged {
            let path = file.path().display().to_string();
            file.commit().map_err(|e| self.write_failed(e))?;
            self.emit(ProgressEvent::Written { path });
        }
        Ok(())
    }

    fn write_failed(&self, error: WriteError) -> BuildError {
        self.emit(ProgressEvent::Failed {
            error: error.to_string(),
        });
        error.into()
    }

    fn emit(&self, event: ProgressEvent) {
        debug!(?event, "progress");
        self.progress_handler.on_progress(&event);
    }
}

fn failure_summary(reports: &[SourceReport]) -> String {
    if reports.is_empty() {
        return "no sources enabled".to_string();
    }

    let summary = reports
        .iter()
        .map(|r| match &r.error {
            Some(error) => format!("{}: {}", r.source, error),
            None => format!("{}: {:?}", r.source, r.status).to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    debug!(summary = %summary, "All sources unavailable");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildVolume, SourceStatus};
    use crate::extractors::{ExtractError, Extraction};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Extractor returning canned entries or a canned failure
    struct StaticExtractor {
        source: Source,
        entries: Option<Vec<(&'static str, &'static str)>>,
    }

    #[async_trait]
    impl PrinterExtractor for StaticExtractor {
        fn source(&self) -> Source {
            self.source
        }

        fn upstream(&self) -> String {
            format!("static://{}", self.source)
        }

        async fn extract(&self) -> Result<Extraction, ExtractError> {
            let entries = self
                .entries
                .as_ref()
                .ok_or(ExtractError::NoData(self.source))?;
            let mut extraction = Extraction::new(self.source);
            for (brand, model) in entries {
                extraction.push(PrinterEntry::new(
                    *brand,
                    *model,
                    self.source,
                    BuildVolume::new(200.0, 200.0, 200.0),
                ));
            }
            Ok(extraction)
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<String>>,
    }

    impl ProgressHandler for RecordingHandler {
        fn on_progress(&self, event: &ProgressEvent) {
            let name = format!("{:?}", event);
            let name = name.split([' ', '{']).next().unwrap_or_default().to_string();
            self.events.lock().unwrap().push(name);
        }
    }

    fn registry(
        fdm: Option<Vec<(&'static str, &'static str)>>,
        sla: Option<Vec<(&'static str, &'static str)>>,
    ) -> ExtractorRegistry {
        ExtractorRegistry::new()
            .with(Arc::new(StaticExtractor {
                source: Source::OrcaSlicer,
                entries: fdm,
            }))
            .with(Arc::new(StaticExtractor {
                source: Source::UvTools,
                entries: sla,
            }))
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 3, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_full_build_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let handler = Arc::new(RecordingHandler::default());
        let orchestrator = BuildOrchestrator::new(
            registry(Some(vec![("Acme", "X1")]), Some(vec![("Resinator", "R1")])),
            dir.path(),
        )
        .with_progress(handler.clone())
        .with_build_time(fixed_time());

        let report = orchestrator.execute().await.unwrap();

        assert_eq!(report.metadata.total_printers, 2);
        assert!(!report.is_degraded());
        assert!(report.printers_path.exists());
        assert!(report.metadata_path.exists());

        let events = handler.events.lock().unwrap().clone();
        assert_eq!(events.first().map(String::as_str), Some("Started"));
        assert_eq!(events.last().map(String::as_str), Some("Completed"));
        assert_eq!(events.iter().filter(|e| *e == "Written").count(), 2);
    }

    #[tokio::test]
    async fn test_partial_build_records_failure() {
        let dir = TempDir::new().unwrap();
        let orchestrator =
            BuildOrchestrator::new(registry(None, Some(vec![("Resinator", "R1")])), dir.path());

        let report = orchestrator.execute().await.unwrap();

        assert!(report.is_degraded());
        assert_eq!(report.metadata.fdm_count, 0);
        assert_eq!(report.metadata.sla_count, 1);
        let orca = &report.metadata.sources[&Source::OrcaSlicer];
        assert_eq!(orca.status, SourceStatus::Failed);
        assert!(orca.error.as_deref().unwrap().contains("No printers"));
    }

    #[tokio::test]
    async fn test_all_sources_failed_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let printers = dir.path().join(PRINTERS_FILE);
        fs::write(&printers, "[]\n").unwrap();

        let orchestrator = BuildOrchestrator::new(registry(None, None), dir.path());
        let result = orchestrator.execute().await;

        assert!(matches!(result, Err(BuildError::NoData(_))));
        assert_eq!(fs::read_to_string(&printers).unwrap(), "[]\n");
        assert!(!dir.path().join(METADATA_FILE).exists());
    }

    #[tokio::test]
    async fn test_disabled_source_reported_as_skipped() {
        let dir = TempDir::new().unwrap();
        let registry = ExtractorRegistry::new().with(Arc::new(StaticExtractor {
            source: Source::OrcaSlicer,
            entries: Some(vec![("Acme", "X1")]),
        }));
        let orchestrator = BuildOrchestrator::new(registry, dir.path())
            .with_disabled(Source::UvTools, "https://github.com/sn4k3/UVtools@master");

        let report = orchestrator.execute().await.unwrap();

        let uvtools = &report.metadata.sources[&Source::UvTools];
        assert_eq!(uvtools.status, SourceStatus::Skipped);
        assert!(!report.is_degraded());
    }

    #[tokio::test]
    async fn test_only_disabled_sources_is_no_data() {
        let dir = TempDir::new().unwrap();
        let orchestrator = BuildOrchestrator::new(ExtractorRegistry::new(), dir.path())
            .with_disabled(Source::OrcaSlicer, "orca");

        let result = orchestrator.execute().await;
        assert!(matches!(result, Err(BuildError::NoData(msg)) if msg.contains("skipped")));
    }

    #[tokio::test]
    async fn test_cross_source_duplicates_counted() {
        let dir = TempDir::new().unwrap();
        let orchestrator = BuildOrchestrator::new(
            registry(
                Some(vec![("Acme", "X1"), ("acme", "x1"), ("Acme", "X2")]),
                Some(vec![("Acme", "X1")]),
            ),
            dir.path(),
        );

        let report = orchestrator.execute().await.unwrap();

        assert_eq!(report.metadata.duplicates_removed, 1);
        assert_eq!(report.metadata.fdm_count, 2);
        assert_eq!(report.metadata.sla_count, 1);
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_catalog_untouched() {
        let dir = TempDir::new().unwrap();
        let printers = dir.path().join(PRINTERS_FILE);
        fs::write(&printers, "[]\n").unwrap();
        // A directory in the way of the metadata temp file
        fs::create_dir(dir.path().join("metadata.json.tmp")).unwrap();

        let orchestrator = BuildOrchestrator::new(
            registry(Some(vec![("Acme", "X1")]), Some(vec![("Resinator", "R1")])),
            dir.path(),
        );

        assert!(matches!(
            orchestrator.execute().await,
            Err(BuildError::Write(_))
        ));
        assert_eq!(fs::read_to_string(&printers).unwrap(), "[]\n");
        assert!(!dir.path().join("printers.json.tmp").exists());
        assert!(!dir.path().join(METADATA_FILE).exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let orchestrator = BuildOrchestrator::new(
            registry(Some(vec![("Acme", "X1")]), None),
            blocker.join("out"),
        );

        assert!(matches!(
            orchestrator.execute().await,
            Err(BuildError::Write(_))
        ));
    }
}
