//! Session client error types.

/// Errors from signing in or calling the API under test.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error (connect, timeout, TLS).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API answered with a status above 299.
    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: u16 },
    /// The response body was not JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Sign-in answered 2xx but refused the credentials.
    #[error("sign-in rejected with status {status}")]
    Rejected { status: String },
    /// A credential needed for sign-in is not configured.
    #[error("{name} is not configured")]
    MissingCredential { name: &'static str },
    /// Sign-in succeeded without issuing a session cookie.
    #[error("sign-in response from {endpoint} carried no Set-Cookie header")]
    NoSessionCookie { endpoint: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
