//! Dependency-closure resolution.
//!
//! A resolution call seeds a FIFO worklist with validated root identifiers,
//! then drains it one fetch at a time:
//! - identifiers already in the result are skipped (this is how cycles end)
//! - `TryFromExpanded` tries the expanded document before the canonical one
//! - expanded documents are merged wholesale and enqueue nothing
//! - single documents enqueue their declared dependencies when resolution is on
//!
//! Any failure ends the call without a partial result.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dtmi::Dtmi;
use crate::model::document::{parse_expanded, parse_model, DocumentError};
use crate::repository::context::ResolveContext;
use crate::repository::fetch::{FetchError, FetchOutcome, ModelFetcher};
use crate::repository::RepositoryLocation;

/// Resolved model documents keyed by identifier.
pub type ResolvedModels = HashMap<Dtmi, String>;

/// How dependencies of requested models are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Fetch only the requested models
    Disabled,
    /// Follow dependencies one document at a time
    Enabled,
    /// Prefer expanded documents, falling back to per-document resolution
    #[default]
    TryFromExpanded,
}

impl ResolutionMode {
    /// Whether declared dependencies are followed.
    pub fn follows_dependencies(self) -> bool {
        matches!(self, Self::Enabled | Self::TryFromExpanded)
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Enabled => write!(f, "enabled"),
            Self::TryFromExpanded => write!(f, "try_from_expanded"),
        }
    }
}

impl FromStr for ResolutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "disabled" => Ok(Self::Disabled),
            "enabled" => Ok(Self::Enabled),
            "tryfromexpanded" => Ok(Self::TryFromExpanded),
            _ => Err(format!("Unknown dependency resolution mode '{}'", s)),
        }
    }
}

/// Terminal failure of a resolution call.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Invalid DTMI: '{0}'")]
    InvalidIdentifier(String),

    #[error("Failed to fetch {dtmi}: {source}")]
    Fetch {
        dtmi: Dtmi,
        #[source]
        source: FetchError,
    },

    #[error("Malformed document for {dtmi} at {path}: {source}")]
    MalformedDocument {
        dtmi: Dtmi,
        path: String,
        #[source]
        source: DocumentError,
    },

    #[error("Resolution cancelled")]
    Cancelled,
}

/// Resolves models and their dependency closure from one repository.
///
/// Holds no per-call state; share it freely between concurrent calls.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    location: RepositoryLocation,
    fetcher: ModelFetcher,
}

impl DependencyResolver {
    /// Bind a resolver to a repository. `client` is used for remote repositories.
    pub fn new(location: RepositoryLocation, client: Client) -> Self {
        let fetcher = ModelFetcher::for_location(&location, client);
        Self { location, fetcher }
    }

    pub fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    /// Resolve `dtmis` and, depending on `mode`, everything they depend on.
    pub async fn resolve<I, S>(
        &self,
        dtmis: I,
        mode: ResolutionMode,
        ctx: &ResolveContext,
    ) -> Result<ResolvedModels, ResolutionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolution = Resolution::seed(dtmis, mode)?;
        log::debug!(
            "Resolving {} model(s) from {} ({})",
            resolution.worklist.len(),
            self.location,
            mode
        );

        while let Some(dtmi) = resolution.worklist.pop_front() {
            if resolution.resolved.contains_key(&dtmi) {
                continue;
            }

            let outcome = self.fetch_with_fallback(&dtmi, mode, ctx).await?;
            resolution.absorb(dtmi, outcome)?;
        }

        log::debug!("Resolved {} model(s)", resolution.resolved.len());
        Ok(resolution.resolved)
    }

    /// Try the expanded path first when `mode` asks for it, then the
    /// canonical path. Only the canonical path's failure is surfaced.
    async fn fetch_with_fallback(
        &self,
        dtmi: &Dtmi,
        mode: ResolutionMode,
        ctx: &ResolveContext,
    ) -> Result<FetchOutcome, ResolutionError> {
        if mode == ResolutionMode::TryFromExpanded {
            let path = self.location.content_path(dtmi, true);
            match ctx.run(self.fetcher.fetch(&path)).await? {
                Ok(document) => {
                    return Ok(FetchOutcome {
                        content_path: path,
                        document,
                        is_batch: true,
                    })
                }
                Err(e) => log::debug!("Expanded fetch for {} failed, falling back: {}", dtmi, e),
            }
        }

        let path = self.location.content_path(dtmi, false);
        let document = ctx
            .run(self.fetcher.fetch(&path))
            .await?
            .map_err(|source| {
                log::warn!("Failed to fetch {}: {}", dtmi, source);
                ResolutionError::Fetch {
                    dtmi: dtmi.clone(),
                    source,
                }
            })?;

        Ok(FetchOutcome {
            content_path: path,
            document,
            is_batch: false,
        })
    }
}

/// State of one resolution call. Never shared between calls.
struct Resolution {
    mode: ResolutionMode,
    worklist: VecDeque<Dtmi>,
    resolved: ResolvedModels,
}

impl Resolution {
    /// Validate every root before any I/O happens.
    fn seed<I, S>(dtmis: I, mode: ResolutionMode) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let worklist = dtmis
            .into_iter()
            .map(|dtmi| {
                let dtmi = dtmi.as_ref();
                Dtmi::parse(dtmi).map_err(|_| ResolutionError::InvalidIdentifier(dtmi.to_string()))
            })
            .collect::<Result<VecDeque<_>, _>>()?;

        Ok(Self {
            mode,
            worklist,
            resolved: HashMap::new(),
        })
    }

    fn absorb(&mut self, dtmi: Dtmi, outcome: FetchOutcome) -> Result<(), ResolutionError> {
        let malformed = |source: DocumentError| ResolutionError::MalformedDocument {
            dtmi: dtmi.clone(),
            path: outcome.content_path.to_string(),
            source,
        };

        if outcome.is_batch {
            let entries = parse_expanded(&outcome.document).map_err(malformed)?;
            log::debug!(
                "Expanded document {} supplied {} model(s)",
                outcome.content_path,
                entries.len()
            );
            for (id, document) in entries {
                self.resolved.entry(id).or_insert(document);
            }
            return Ok(());
        }

        let metadata = parse_model(&outcome.document).map_err(malformed)?;
        if metadata.id != dtmi {
            return Err(malformed(DocumentError::IdMismatch {
                expected: dtmi.clone(),
                found: metadata.id,
            }));
        }

        if self.mode.follows_dependencies() {
            self.worklist.extend(metadata.dependencies);
        }
        self.resolved.entry(dtmi).or_insert(outcome.document);
        Ok(())
    }
}
