use std::io;

/// Errors surfaced by [`crate::Client`] and the parsing helpers.
///
/// Connection-level failures (resolution, refused connects, TLS handshakes,
/// mid-request transport errors) all land in [`Error::Request`] with the
/// underlying cause preserved as the source. The other variants identify the
/// situations callers actually branch on: an empty reply (drives the
/// stale-connection retry), a failed proxy CONNECT, and an unsupported URL
/// scheme.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic request failure wrapping the underlying cause.
    #[error("request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server closed the connection without sending a single byte.
    #[error("empty response received")]
    EmptyResponse,

    /// The proxy rejected the CONNECT request; carries its first reply line.
    #[error("malformed CONNECT response: {0}")]
    Proxy(String),

    /// The URL scheme is neither http nor https.
    #[error("scheme not implemented: {0}")]
    SchemeNotImplemented(String),
}

impl Error {
    /// Wrap any foreign error into the generic request-failure kind.
    pub fn request(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Request(err.into())
    }

    /// Whether this error was caused by a socket timeout.
    ///
    /// Blocking sockets report read/write timeouts as `WouldBlock` on Unix
    /// and `TimedOut` on Windows, so both kinds are checked.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Request(source) => source
                .downcast_ref::<io::Error>()
                .is_some_and(|e| {
                    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
                }),
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Request(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
