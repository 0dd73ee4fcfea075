//! Access to upstream repositories
//!
//! Extractors only see the [`Upstream`] trait, so the same parsing code runs
//! against GitHub over HTTP or against a local checkout of the same repository.

pub mod github;
pub mod local;

pub use github::{GitHubRepo, GitHubUpstream};
pub use local::LocalUpstream;

use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching upstream data
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid response from {location}: {message}")]
    Decode { location: String, message: String },

    #[error("Invalid upstream path or URL: {0}")]
    InvalidPath(String),
}

impl FetchError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A directory listing entry, with `path` relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

impl UpstreamEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Read-only view of an upstream repository
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Where the data comes from (URL or local path), for logs and metadata
    fn describe(&self) -> String;

    /// Lists a directory, sorted by name
    async fn list_dir(&self, path: &str) -> Result<Vec<UpstreamEntry>, FetchError>;

    /// Reads a file as UTF-8 text
    async fn read_text(&self, path: &str) -> Result<String, FetchError>;

    /// Public URL of a file if it exists; lookup failures count as absent
    async fn public_url(&self, path: &str) -> Option<String>;
}

/// Appends a repository-relative path to a base URL, percent-encoding each segment
pub fn join_url(base: &str, path: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base).map_err(|e| FetchError::InvalidPath(format!("{base}: {e}")))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| FetchError::InvalidPath(base.to_string()))?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}

pub(crate) fn sort_entries(entries: &mut [UpstreamEntry]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_encodes_spaces() {
        let url = join_url(
            "https://raw.githubusercontent.com/SoftFever/OrcaSlicer/main",
            "resources/profiles/Acme/Acme X1_cover.png",
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/SoftFever/OrcaSlicer/main/resources/profiles/Acme/Acme%20X1_cover.png"
        );
    }

    #[test]
    fn test_join_url_trailing_slash_base() {
        let url = join_url("https://example.com/base/", "a/b.json").unwrap();
        assert_eq!(url.as_str(), "https://example.com/base/a/b.json");
    }

    #[test]
    fn test_join_url_rejects_garbage() {
        assert!(matches!(
            join_url("not a url", "a"),
            Err(FetchError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_transient_classification() {
        let server_error = FetchError::Status {
            status: 502,
            url: "u".to_string(),
        };
        let rate_limited = FetchError::Status {
            status: 429,
            url: "u".to_string(),
        };
        let forbidden = FetchError::Status {
            status: 403,
            url: "u".to_string(),
        };

        assert!(server_error.is_transient());
        assert!(rate_limited.is_transient());
        assert!(!forbidden.is_transient());
        assert!(!FetchError::NotFound("x".to_string()).is_transient());
    }
}
