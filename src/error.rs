use thiserror::Error;

use super::wire::problem::AcmeProblem;

pub type AcmeResult<T> = Result<T, AcmeError>;

#[derive(Error, Debug)]
pub enum AcmeError {
    /// The server answered with a problem document (RFC 7807). The document
    /// is kept verbatim so callers can inspect its `type` URN.
    #[error("{0}")]
    AcmeProblem(AcmeProblem),

    /// Non-2xx response without a decodable problem body.
    #[error("http status {0}")]
    HttpStatus(u16),

    /// Non-2xx response carrying a parseable Retry-After header. Advisory:
    /// the client never sleeps on its own.
    #[error("retry after {seconds}s")]
    RetryAfter { seconds: u64 },

    /// Error propagated from the HTTP transport collaborator.
    #[error("http: [{}] {0}", .0.status())]
    Transport(http_client::Error),

    /// A HEAD on newNonce failed or the response lacked a Replay-Nonce
    /// header.
    #[error("could not obtain a replay nonce")]
    NonceUnavailable,

    #[error("order contains no identifiers")]
    NoIdentifiers,

    #[error("invalid revocation reason code {0}")]
    InvalidReasonCode(u32),

    #[error("invalid PEM certificate")]
    InvalidPem,

    #[error(transparent)]
    CryptoError(anyhow::Error),

    #[error("json: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("missing expected field {0}")]
    MissingExpectedField(&'static str),

    #[error("missing expected header {0}")]
    MissingExpectedHeader(&'static str),

    #[error("{0}")]
    InvalidState(String),
}

impl From<http_client::Error> for AcmeError {
    fn from(err: http_client::Error) -> Self {
        AcmeError::Transport(err)
    }
}
