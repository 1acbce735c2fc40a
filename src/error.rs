//! Errors surfaced by the reputation pipeline

use crate::provider::ProviderError;
use thiserror::Error;

/// Errors that abort a report. There is no partial or degraded report:
/// the caller retries the whole query.
#[derive(Error, Debug)]
pub enum ReputerError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("unsupported git provider: {0}")]
    UnsupportedProvider(String),

    #[error("{provider} provider is not usable: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("error listing commits for {repo} (page {page}): {source}")]
    Collection {
        repo: String,
        page: u32,
        #[source]
        source: ProviderError,
    },

    #[error("error loading author {login}: {source}")]
    Enrichment {
        login: String,
        #[source]
        source: ProviderError,
    },

    #[error("enrichment cancelled after a sibling task failed")]
    Cancelled,

    #[error("enrichment worker panicked")]
    WorkerPanicked,
}

pub type ReputerResult<T> = Result<T, ReputerError>;
