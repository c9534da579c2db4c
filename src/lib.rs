//! dtmi-resolver - resolve DTDL models and their dependency closure from
//! remote or local model repositories.

mod defaults;
pub mod error;

pub mod client;
pub mod dtmi;
pub mod model;
pub mod repository;

pub use error::{Error, Result};

pub use client::{ClientOptions, ModelsRepositoryClient};
pub use dtmi::{is_valid_dtmi, Dtmi, DtmiError};
pub use model::{parse_expanded, parse_model, DocumentError, ModelMetadata};
pub use repository::{
    CancellationHandle, ContentPath, DependencyResolver, FetchError, FetchOutcome, FileFetcher,
    HttpFetcher, LocationError, ModelFetcher, RepositoryLocation, ResolutionError,
    ResolutionMode, ResolveContext, ResolvedModels,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
