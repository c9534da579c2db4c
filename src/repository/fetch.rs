//! Model document fetching.
//!
//! A fetcher turns a content path into raw document text. The backend is
//! chosen once from the repository location and never changes afterwards.

use std::io;
use std::path::Path;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::repository::{ContentPath, RepositoryLocation};

/// Failure to retrieve a single content path.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Model document not found at {path}")]
    NotFound { path: String },

    #[error("Access denied to {path} (HTTP {status})")]
    Unauthorized { path: String, status: u16 },

    #[error("Request for {path} failed: {reason}")]
    Transport { path: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Content path that failed.
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::Unauthorized { path, .. }
            | Self::Transport { path, .. }
            | Self::Io { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A successfully fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Content path that produced the document
    pub content_path: ContentPath,
    /// Raw document text
    pub document: String,
    /// Whether the document came from an expanded (batch) path
    pub is_batch: bool,
}

/// Fetches model documents from a remote repository over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher sharing an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            path: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    path: url.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Unauthorized {
                    path: url.to_string(),
                    status: status.as_u16(),
                })
            }
            _ if !status.is_success() => {
                return Err(FetchError::Transport {
                    path: url.to_string(),
                    reason: format!("HTTP {}", status),
                })
            }
            _ => {}
        }

        response.text().await.map_err(transport)
    }
}

/// Reads model documents from a directory on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub async fn fetch(&self, path: &Path) -> Result<String, FetchError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => FetchError::NotFound {
                    path: path.display().to_string(),
                },
                _ => FetchError::Io {
                    path: path.display().to_string(),
                    source,
                },
            })
    }
}

/// Fetcher backend bound to a repository.
#[derive(Debug, Clone)]
pub enum ModelFetcher {
    Http(HttpFetcher),
    File(FileFetcher),
}

impl ModelFetcher {
    /// Select the backend for a repository location.
    ///
    /// `client` is only used for remote locations.
    pub fn for_location(location: &RepositoryLocation, client: Client) -> Self {
        match location {
            RepositoryLocation::Remote(_) => Self::Http(HttpFetcher::with_client(client)),
            RepositoryLocation::Local(_) => Self::File(FileFetcher),
        }
    }

    /// Fetch a content path produced by the same repository location.
    pub async fn fetch(&self, path: &ContentPath) -> Result<String, FetchError> {
        match (self, path) {
            (Self::Http(fetcher), ContentPath::Remote(url)) => fetcher.fetch(url).await,
            (Self::File(fetcher), ContentPath::Local(path)) => fetcher.fetch(path).await,
            (_, path) => Err(FetchError::Transport {
                path: path.to_string(),
                reason: "content path does not belong to this repository backend".to_string(),
            }),
        }
    }
}
