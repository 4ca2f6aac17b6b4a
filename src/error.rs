use thiserror::Error;

/// Failure taxonomy for the ingestion and answering pipeline.
///
/// Ingestion-time variants (`Io`, `DimensionMismatch`) are fatal at startup:
/// the process never reaches the ready state with a partially built index.
/// Per-query variants are mapped to structured HTTP responses in the `api`
/// module so callers can tell a not-ready service from an upstream outage.
#[derive(Debug, Error)]
pub enum Error {
    /// The document source directory (or a file in it) could not be read.
    #[error("document source unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding vectors of inconsistent dimension, or an attempt to
    /// re-embed an index with a different model. Mixing models corrupts
    /// similarity comparisons silently, so this fails fast instead.
    #[error("embedding dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A caller-supplied value was out of range (empty message, k = 0).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A query arrived before document embedding finished.
    #[error("index is still being built; try again shortly")]
    NotReady,

    /// The embedding or completion provider returned an error.
    #[error("{service} request failed: {detail}")]
    Upstream {
        service: &'static str,
        detail: String,
    },

    /// The embedding or completion provider did not answer in time.
    #[error("{service} request timed out after {timeout_secs}s")]
    UpstreamTimeout {
        service: &'static str,
        timeout_secs: u64,
    },
}

impl Error {
    /// Stable machine-readable code for the API error payload.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "io_error",
            Error::DimensionMismatch(_) => "dimension_mismatch",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::NotReady => "not_ready",
            Error::Upstream { .. } => "upstream_error",
            Error::UpstreamTimeout { .. } => "upstream_timeout",
        }
    }

    /// Classify a transport-level `reqwest` failure from `service`.
    /// Timeouts get their own variant so callers can distinguish a slow
    /// provider from a broken one.
    pub(crate) fn from_reqwest(
        service: &'static str,
        err: reqwest::Error,
        timeout_secs: u64,
    ) -> Self {
        if err.is_timeout() {
            Error::UpstreamTimeout {
                service,
                timeout_secs,
            }
        } else {
            Error::Upstream {
                service,
                detail: err.to_string(),
            }
        }
    }
}
