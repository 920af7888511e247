//! CLI error types with miette diagnostics.
//!
//! Maps `bmsly_api::Error` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the BMS API at {url}")]
    #[diagnostic(
        code(bmsly::connection_failed),
        help(
            "Check your network connection and the API base URL.\n\
             URL: {url}\n\
             Override with --api-url or the profile's api_url."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(bmsly::timeout),
        help("Increase the timeout with --timeout or check API responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(
        code(bmsly::not_logged_in),
        help("Run: bmsly login --profile {profile}")
    )]
    NotLoggedIn { profile: String },

    #[error("Session expired: {message}")]
    #[diagnostic(
        code(bmsly::session_expired),
        help(
            "The stored session could not be renewed and has been cleared.\n\
             Run: bmsly login --profile {profile}"
        )
    )]
    SessionExpired { profile: String, message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(bmsly::auth_failed),
        help("Verify your username and password, then try again.")
    )]
    AuthFailed { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(bmsly::no_credentials),
        help(
            "Set BMSLY_PASSWORD, store one with: bmsly config set-password,\n\
             or run login interactively."
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(bmsly::api_error))]
    ApiError { status: u16, message: String },

    #[error("The API returned a response in an unexpected format: {preview}")]
    #[diagnostic(
        code(bmsly::unexpected_response),
        help("Re-run with -vv to see the raw response, or try --output json.")
    )]
    UnexpectedResponse { preview: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bmsly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bmsly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bmsly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(bmsly::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(bmsly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(bmsly::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotLoggedIn { .. }
            | Self::SessionExpired { .. }
            | Self::AuthFailed { .. }
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── bmsly_config::ConfigError → CliError ─────────────────────────────

impl From<bmsly_config::ConfigError> for CliError {
    fn from(err: bmsly_config::ConfigError) -> Self {
        match err {
            bmsly_config::ConfigError::Validation { field, reason } => {
                Self::Validation { field, reason }
            }
            bmsly_config::ConfigError::NoCredentials { profile } => {
                Self::NoCredentials { profile }
            }
            bmsly_config::ConfigError::Figment(e) => Self::Config(e),
            bmsly_config::ConfigError::Io(e) => Self::Io(e),
            bmsly_config::ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
        }
    }
}

// ── bmsly_api::Error → CliError ──────────────────────────────────────

/// Map an API-layer error for the active profile. Not a plain `From`
/// impl because the profile name feeds the help text.
pub fn map_api_error(err: bmsly_api::Error, profile: &str, timeout_secs: u64) -> CliError {
    use bmsly_api::Error;

    match err {
        Error::NoToken => CliError::NotLoggedIn {
            profile: profile.to_owned(),
        },

        Error::NoRefreshToken | Error::RefreshFailed { .. } => CliError::SessionExpired {
            profile: profile.to_owned(),
            message: err.to_string(),
        },

        Error::Authentication { message } => CliError::AuthFailed { message },

        Error::Transport(e) if e.is_timeout() => CliError::Timeout {
            seconds: timeout_secs,
        },

        Error::Transport(e) => {
            let url = e
                .url()
                .map_or_else(|| "(unknown)".to_owned(), ToString::to_string);
            CliError::ConnectionFailed {
                url,
                source: e.into(),
            }
        }

        Error::InvalidUrl(e) => CliError::Validation {
            field: "api_url".into(),
            reason: e.to_string(),
        },

        Error::Api { status, message } => CliError::ApiError { status, message },

        Error::UnexpectedShape { body } => {
            let preview = body.to_string();
            CliError::UnexpectedResponse {
                preview: preview.chars().take(200).collect(),
            }
        }

        Error::Deserialization { message, body } => CliError::UnexpectedResponse {
            preview: format!("{message}: {}", body.chars().take(200).collect::<String>()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_exit_three() {
        let err = map_api_error(bmsly_api::Error::NoToken, "default", 30);
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = map_api_error(
            bmsly_api::Error::RefreshFailed {
                message: "rejected".into(),
            },
            "default",
            30,
        );
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn api_errors_exit_general() {
        let err = map_api_error(
            bmsly_api::Error::Api {
                status: 500,
                message: "boom".into(),
            },
            "default",
            30,
        );
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
