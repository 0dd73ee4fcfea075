//! Upstream read from a local checkout

use super::{join_url, sort_entries, EntryKind, FetchError, Upstream, UpstreamEntry};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A repository checkout on disk
///
/// `public_base` is the raw URL the same tree is published under; without it
/// no image URLs are produced.
#[derive(Debug, Clone)]
pub struct LocalUpstream {
    root: PathBuf,
    public_base: Option<String>,
}

impl LocalUpstream {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base: None,
        }
    }

    pub fn with_public_base(mut self, public_base: impl Into<String>) -> Self {
        self.public_base = Some(public_base.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn io_error(path: PathBuf, source: std::io::Error) -> FetchError {
        if source.kind() == ErrorKind::NotFound {
            FetchError::NotFound(path.display().to_string())
        } else {
            FetchError::Io { path, source }
        }
    }
}

#[async_trait]
impl Upstream for LocalUpstream {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<UpstreamEntry>, FetchError> {
        let dir = self.resolve(path)?;
        debug!(dir = %dir.display(), "Listing local directory");

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Self::io_error(dir.clone(), e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Self::io_error(dir.clone(), e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Self::io_error(entry.path(), e))?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", path.trim_end_matches('/'), name)
            };
            entries.push(UpstreamEntry {
                name,
                path: entry_path,
                kind,
            });
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn read_text(&self, path: &str) -> Result<String, FetchError> {
        let file = self.resolve(path)?;
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| Self::io_error(file.clone(), e))
    }

    async fn public_url(&self, path: &str) -> Option<String> {
        let base = self.public_base.as_ref()?;
        let file = self.resolve(path).ok()?;
        if !tokio::fs::metadata(&file).await.ok()?.is_file() {
            return None;
        }
        join_url(base, path).ok().map(|u| u.to_string())
    }
}
