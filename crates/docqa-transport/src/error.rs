use docqa_protocol::ProtocolError;

/// Errors that can occur in the request pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured base URL (or a path joined onto it) is not a URL.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request never produced a response (connect error, timeout,
    /// body read failure).
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server rejected the credential with `401 Unauthorized`.
    ///
    /// By the time a caller sees this on a guarded request, the
    /// invalidation hook has already run.
    #[error("unauthorized: {}", detail.as_deref().unwrap_or("credential rejected"))]
    Unauthorized { detail: Option<String> },

    /// Any other non-2xx response.
    #[error("server returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    /// The response body didn't match the expected shape.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// The HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-supplied `detail` message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { detail } | Self::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
