use thiserror::Error;

/// Top-level error type for the `bmsly-api` crate.
///
/// Covers every failure mode across the access layer: token lifecycle,
/// transport, server-side API errors, and response-shape normalization.
/// Consumers map these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Token lifecycle ─────────────────────────────────────────────
    /// No access token stored when one was required.
    #[error("Not logged in -- no access token stored")]
    NoToken,

    /// Refresh attempted with no refresh token stored. Fatal for the
    /// session; auth state has been cleared.
    #[error("Session cannot be renewed -- no refresh token stored")]
    NoRefreshToken,

    /// The refresh endpoint was reachable but returned an unsuccessful
    /// or malformed envelope. Fatal for the session; auth state has
    /// been cleared.
    #[error("Token refresh failed: {message}")]
    RefreshFailed { message: String },

    /// Login rejected (wrong credentials, account disabled, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    /// The request never produced a server response.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Server ──────────────────────────────────────────────────────
    /// Non-2xx response from the server, other than a first-time 401
    /// (which is consumed by the single retry path). A 401 surfacing
    /// through this variant is a genuine authorization failure.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// 2xx response whose body matches none of the known envelope
    /// shapes. Carries the raw body for diagnostics.
    #[error("Unexpected response format")]
    UnexpectedShape { body: serde_json::Value },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error ended the session: auth state has
    /// been cleared and the only recovery path is a fresh interactive
    /// login.
    pub fn is_auth_fatal(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::RefreshFailed { .. })
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the request never reached the server.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect() || e.is_timeout())
    }
}
