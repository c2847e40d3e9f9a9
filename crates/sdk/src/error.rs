use thiserror::Error;

/// SDK error taxonomy.
///
/// Per-stream fetch failures surface as [`SdkError::SourceUnavailable`] and
/// are isolated by the history engine: the affected stream degrades to an
/// empty series while siblings proceed. Implausible replay results are not
/// errors; they are reported as [`crate::history::DataWarning`]s on a
/// best-effort result.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Indexer or node request failed.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("RPC transport error: {0}")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("contract call error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("indexer request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload or on-chain amount does not fit a normalized decimal.
    #[error("value does not fit a decimal: {0}")]
    InvalidDecimal(String),

    /// Indexer payload is missing a field the requested kind requires.
    #[error("malformed indexer payload: {0}")]
    MalformedPayload(String),

    /// Pagination cursor ran past the safety bound without a short page.
    #[error("pagination exceeded safety bound at cursor {0}")]
    PaginationOverflow(u64),
}
