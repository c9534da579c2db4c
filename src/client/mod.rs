//! High-level client API for model repositories.
//!
//! Provides the main user-facing interface: configure a repository once,
//! then fetch models together with their dependencies.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::repository::{
    DependencyResolver, RepositoryLocation, ResolutionMode, ResolveContext, ResolvedModels,
};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Repository base: an `http(s)://` endpoint, a `file://` URL or a directory
    #[serde(default = "defaults::repository_endpoint")]
    pub repository_endpoint: String,
    /// Mode used by `get_model`/`get_models`
    #[serde(default = "defaults::dependency_resolution")]
    pub dependency_resolution: ResolutionMode,
    /// Per-request timeout for remote repositories, in milliseconds
    #[serde(default = "defaults::request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            repository_endpoint: defaults::repository_endpoint(),
            dependency_resolution: defaults::DEPENDENCY_RESOLUTION,
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientOptions {
    /// Defaults overridden by `DTMI_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(endpoint) = lookup(defaults::ENV_REPOSITORY_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                options.repository_endpoint = endpoint;
            }
        }

        if let Some(mode) = lookup(defaults::ENV_DEPENDENCY_RESOLUTION) {
            match mode.parse() {
                Ok(mode) => options.dependency_resolution = mode,
                Err(e) => log::warn!("Ignoring {}: {}", defaults::ENV_DEPENDENCY_RESOLUTION, e),
            }
        }

        if let Some(millis) = lookup(defaults::ENV_REQUEST_TIMEOUT_MS) {
            match millis.trim().parse() {
                Ok(millis) => options.request_timeout_ms = millis,
                Err(e) => log::warn!(
                    "Ignoring {}='{}': {}",
                    defaults::ENV_REQUEST_TIMEOUT_MS,
                    millis,
                    e
                ),
            }
        }

        options
    }

    pub fn with_repository_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.repository_endpoint = endpoint.into();
        self
    }

    pub fn with_dependency_resolution(mut self, mode: ResolutionMode) -> Self {
        self.dependency_resolution = mode;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Client for a single model repository.
#[derive(Debug, Clone)]
pub struct ModelsRepositoryClient {
    resolver: DependencyResolver,
    dependency_resolution: ResolutionMode,
}

impl ModelsRepositoryClient {
    /// Create a client for the default public repository.
    pub fn new() -> Result<Self> {
        Self::with_options(ClientOptions::default())
    }

    /// Create a client from explicit options.
    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let location = RepositoryLocation::parse(&options.repository_endpoint)?;

        let client = Client::builder()
            .timeout(options.request_timeout())
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        log::debug!(
            "Models repository client bound to {} ({})",
            location,
            if location.is_remote() { "remote" } else { "local" }
        );

        Ok(Self {
            resolver: DependencyResolver::new(location, client),
            dependency_resolution: options.dependency_resolution,
        })
    }

    pub fn repository_location(&self) -> &RepositoryLocation {
        self.resolver.location()
    }

    pub fn default_resolution(&self) -> ResolutionMode {
        self.dependency_resolution
    }

    /// Fetch one model and its dependencies using the configured mode.
    pub async fn get_model(&self, dtmi: &str) -> Result<ResolvedModels> {
        self.get_models([dtmi]).await
    }

    pub async fn get_model_with(
        &self,
        dtmi: &str,
        mode: ResolutionMode,
        ctx: &ResolveContext,
    ) -> Result<ResolvedModels> {
        self.get_models_with([dtmi], mode, ctx).await
    }

    /// Fetch several models and their dependencies using the configured mode.
    pub async fn get_models<I, S>(&self, dtmis: I) -> Result<ResolvedModels>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.get_models_with(dtmis, self.dependency_resolution, &ResolveContext::new())
            .await
    }

    pub async fn get_models_with<I, S>(
        &self,
        dtmis: I,
        mode: ResolutionMode,
        ctx: &ResolveContext,
    ) -> Result<ResolvedModels>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.resolver.resolve(dtmis, mode, ctx).await?)
    }
}
