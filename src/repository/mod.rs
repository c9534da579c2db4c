//! Model repositories: where documents live and how they are resolved.
//!
//! This module provides:
//! - Repository location parsing and the content path convention
//! - Document fetching from remote (HTTP) or local (filesystem) repositories (`fetch`)
//! - Cancellation and deadlines for resolution calls (`context`)
//! - Dependency-closure resolution (`resolver`)

pub mod context;
pub mod fetch;
pub mod resolver;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::dtmi::Dtmi;

pub use context::{CancellationHandle, ResolveContext};
pub use fetch::{FetchError, FetchOutcome, FileFetcher, HttpFetcher, ModelFetcher};
pub use resolver::{DependencyResolver, ResolutionError, ResolutionMode, ResolvedModels};

/// Errors raised while interpreting a repository location string.
#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Repository location is empty")]
    Empty,

    #[error("Invalid repository URL '{location}': {source}")]
    InvalidUrl {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported repository scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("File URL '{location}' does not name a local path")]
    InvalidFileUrl { location: String },
}

/// Base location of a model repository.
///
/// The variant decides which fetcher backend a resolver binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    /// `http`/`https` endpoint.
    Remote(Url),
    /// Directory on the local filesystem.
    Local(PathBuf),
}

impl RepositoryLocation {
    /// Interpret a location string.
    ///
    /// `http(s)://` URLs are remote, `file://` URLs and plain paths are local.
    pub fn parse(location: &str) -> Result<Self, LocationError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(LocationError::Empty);
        }

        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|_| LocationError::InvalidFileUrl {
                        location: location.to_string(),
                    }),
                // Windows drive letters parse as single-character schemes
                scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(location))),
                scheme => Err(LocationError::UnsupportedScheme {
                    scheme: scheme.to_string(),
                }),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Self::Local(PathBuf::from(location)))
            }
            Err(source) => Err(LocationError::InvalidUrl {
                location: location.to_string(),
                source,
            }),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Full content path of a model in this repository.
    ///
    /// Pure and deterministic: equal inputs always yield identical paths.
    /// Remote bases keep their query string; the fragment is dropped.
    pub fn content_path(&self, dtmi: &Dtmi, expanded: bool) -> ContentPath {
        let relative = dtmi.relative_path(expanded);
        match self {
            Self::Remote(base) => {
                let mut url = base.clone();
                url.set_fragment(None);
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().extend(relative.split('/'));
                }
                ContentPath::Remote(url)
            }
            Self::Local(base) => {
                let mut path = base.clone();
                path.extend(relative.split('/'));
                ContentPath::Local(path)
            }
        }
    }
}

/// Location of one model document inside a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPath {
    Remote(Url),
    Local(PathBuf),
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl std::str::FromStr for RepositoryLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
