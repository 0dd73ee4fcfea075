//! GitHub-hosted upstream (contents API for listings, raw host for files)

use super::{join_url, sort_entries, EntryKind, FetchError, Upstream, UpstreamEntry};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Coordinates of a GitHub repository at a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl GitHubRepo {
    pub fn new(owner: &str, repo: &str, branch: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    /// Raw file base URL for this repository and branch
    pub fn raw_base(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            GITHUB_RAW_BASE, self.owner, self.repo, self.branch
        )
    }
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

pub struct GitHubUpstream {
    repo: GitHubRepo,
    client: Client,
    api_base: String,
    raw_base: String,
    token: Option<String>,
    retries: u32,
}

impl GitHubUpstream {
    pub fn new(
        repo: GitHubRepo,
        timeout: Duration,
        retries: u32,
        token: Option<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("printerdb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Transport {
                url: GITHUB_API_BASE.to_string(),
                source,
            })?;

        Ok(Self {
            raw_base: repo.raw_base(),
            repo,
            client,
            api_base: GITHUB_API_BASE.to_string(),
            token,
            retries,
        })
    }

    /// Points the client at other hosts (mirrors, GitHub Enterprise)
    pub fn with_bases(mut self, api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.raw_base = raw_base.into();
        self
    }

    pub fn repo(&self) -> &GitHubRepo {
        &self.repo
    }

    fn contents_url(&self, path: &str) -> Result<reqwest::Url, FetchError> {
        let base = format!(
            "{}/repos/{}/{}/contents",
            self.api_base.trim_end_matches('/'),
            self.repo.owner,
            self.repo.repo
        );
        let mut url = join_url(&base, path)?;
        url.query_pairs_mut().append_pair("ref", &self.repo.branch);
        Ok(url)
    }

    fn raw_url(&self, path: &str) -> Result<reqwest::Url, FetchError> {
        join_url(&self.raw_base, path)
    }

    fn api_request(&self, url: reqwest::Url) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request, retrying transient failures up to the configured count
    async fn send<F>(&self, url: &str, build: F) -> Result<Response, FetchError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = match build().send().await {
                Ok(response) => check_status(response, url),
                Err(source) => Err(FetchError::Transport {
                    url: url.to_string(),
                    source,
                }),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(url, attempt, error = %e, "Transient fetch failure, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                other => return other,
            }
        }
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, FetchError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

fn parse_listing(body: &str, location: &str) -> Result<Vec<UpstreamEntry>, FetchError> {
    let items: Vec<ContentItem> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode {
            location: location.to_string(),
            message: e.to_string(),
        })?;

    let mut entries: Vec<UpstreamEntry> = items
        .into_iter()
        .filter_map(|item| {
            let kind = match item.kind.as_str() {
                "file" => EntryKind::File,
                "dir" => EntryKind::Dir,
                _ => return None,
            };
            Some(UpstreamEntry {
                name: item.name,
                path: item.path,
                kind,
            })
        })
        .collect();
    sort_entries(&mut entries);
    Ok(entries)
}

#[async_trait]
impl Upstream for GitHubUpstream {
    fn describe(&self) -> String {
        format!("{}@{}", self.repo.html_url(), self.repo.branch)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<UpstreamEntry>, FetchError> {
        let url = self.contents_url(path)?;
        let url_str = url.to_string();
        debug!(url = %url_str, "Listing upstream directory");

        let response = self
            .send(&url_str, || self.api_request(url.clone()))
            .await?;
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        parse_listing(&body, &url_str)
    }

    async fn read_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.raw_url(path)?;
        let url_str = url.to_string();
        debug!(url = %url_str, "Downloading upstream file");

        let response = self
            .send(&url_str, || self.client.get(url.clone()))
            .await?;
        response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str,
                source,
            })
    }

    async fn public_url(&self, path: &str) -> Option<String> {
        let url = self.raw_url(path).ok()?;
        let url_str = url.to_string();

        match self.send(&url_str, || self.client.head(url.clone())).await {
            Ok(_) => Some(url_str),
            Err(e) => {
                if !e.is_not_found() {
                    debug!(url = %url_str, error = %e, "Image lookup failed");
                }
                None
            }
        }
    }
}
