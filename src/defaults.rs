//! Default values and environment overrides for client configuration.

use crate::repository::ResolutionMode;

pub const REPOSITORY_ENDPOINT: &str = "https://devicemodels.azure.com";
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEPENDENCY_RESOLUTION: ResolutionMode = ResolutionMode::TryFromExpanded;

pub const ENV_REPOSITORY_ENDPOINT: &str = "DTMI_REPOSITORY_ENDPOINT";
pub const ENV_DEPENDENCY_RESOLUTION: &str = "DTMI_DEPENDENCY_RESOLUTION";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "DTMI_REQUEST_TIMEOUT_MS";

pub fn repository_endpoint() -> String { REPOSITORY_ENDPOINT.to_string() }
pub fn request_timeout_ms() -> u64 { REQUEST_TIMEOUT_MS }
pub fn dependency_resolution() -> ResolutionMode { DEPENDENCY_RESOLUTION }
