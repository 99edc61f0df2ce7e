/// An error encountered while building, sending, or decoding a table request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filter was built with an operator outside the supported set.
    #[error("Filter operator not supported: {0}")]
    UnsupportedOperator(String),
    /// A raw filter was merged with another filter.
    #[error("Raw filters cannot be merged")]
    RawMerge,
    /// The query passed to a read was not one of the accepted shapes.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// The client has no table bound.
    #[error("Table name is required")]
    MissingTable,
    /// A pagination range did not have exactly two elements.
    #[error("Range must have exactly two elements, got {0}")]
    InvalidRange(usize),
    /// An update or delete was attempted without any filters.
    #[error("At least one filter is required")]
    MissingFilters,
    /// The server responded with a non-success status.
    #[error("Error: {status} - {body}")]
    Request {
        /// The HTTP status of the response.
        status: http::StatusCode,
        /// The response body, verbatim.
        body: String,
    },
    /// The response had a success status, but the body could not be decoded.
    #[error("Invalid response ({0})")]
    InvalidResponse(http::StatusCode, #[source] serde_json::Error),
    /// The request body could not be serialized.
    #[error("Failed to encode request body")]
    Encode(#[source] serde_json::Error),
    /// The request could not be assembled.
    #[error("Invalid request")]
    InvalidRequest(#[from] http::Error),
    /// The HTTP transport failed before a response was received.
    #[error("Transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// The HTTP status of the response, if the server responded with an
    /// error.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Error::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Transport(Box::new(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Error::InvalidRequest(err.into())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::InvalidRequest(err.into())
    }
}
