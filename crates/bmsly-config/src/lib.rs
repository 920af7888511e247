//! Shared configuration for the bmsly CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and per-profile session file paths. The CLI layers flag overrides
//! on top of what this crate loads.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use bmsly_api::{DEFAULT_BASE_URL, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles (e.g. one per deployment).
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named API profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL. Defaults to the production deployment.
    pub api_url: Option<String>,

    /// Login username.
    pub username: Option<String>,

    /// Login password (plaintext — prefer keyring or env).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override request timeout in seconds.
    pub timeout: Option<u64>,
}

impl Config {
    /// Look up a profile, falling back to a default-constructed one so
    /// a fresh install works against the production API without any
    /// config file.
    pub fn profile(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }

    /// The profile name to use when none is given on the command line.
    pub fn effective_profile(&self) -> String {
        self.default_profile.clone().unwrap_or_else(|| "default".into())
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("in", "vyntar", "bmsly")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Path of the on-disk session file for a profile. Each profile keeps
/// its own token state so switching profiles never mixes sessions.
pub fn session_path(profile: &str) -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("sessions");
            p.push(format!("{profile}.json"));
            p
        },
        |dirs| dirs.data_dir().join("sessions").join(format!("{profile}.json")),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bmsly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// Environment variables use the `BMSLY_` prefix and `_` as the path
/// separator, e.g. `BMSLY_DEFAULTS_OUTPUT=json`.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("BMSLY_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a login password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. BMSLY_PASSWORD always wins
    if let Ok(pw) = std::env::var("BMSLY_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 2. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new("bmsly", &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for a profile.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new("bmsly", &format!("{profile_name}/password")).map_err(|e| {
        ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        }
    })?;
    entry.set_password(password).map_err(|e| ConfigError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    })
}

// ── Profile → client settings ───────────────────────────────────────

/// Resolve the API base URL for a profile (profile value or the
/// production default).
pub fn resolve_base_url(profile: &Profile) -> Result<Url, ConfigError> {
    let raw = profile.api_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build transport settings from a profile and the global defaults.
pub fn resolve_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    TransportConfig::default().with_timeout(Duration::from_secs(timeout))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn missing_profile_falls_back_to_defaults() {
        let cfg = Config::default();
        let profile = cfg.profile("nope");
        assert!(profile.api_url.is_none());
        assert_eq!(resolve_base_url(&profile).unwrap().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn profile_url_overrides_default() {
        let profile = Profile {
            api_url: Some("https://staging.vyntar.in/api".into()),
            ..Profile::default()
        };
        let url = resolve_base_url(&profile).unwrap();
        assert_eq!(url.host_str(), Some("staging.vyntar.in"));
    }

    #[test]
    fn invalid_profile_url_is_a_validation_error() {
        let profile = Profile {
            api_url: Some("not a url".into()),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_base_url(&profile),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn session_paths_are_per_profile() {
        let a = session_path("default");
        let b = session_path("staging");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("default.json"));
    }

    #[test]
    fn plaintext_password_resolves_last() {
        let profile = Profile {
            password: Some("hunter2".into()),
            ..Profile::default()
        };
        let pw = resolve_password(&profile, "default").unwrap();
        use secrecy::ExposeSecret as _;
        assert_eq!(pw.expose_secret(), "hunter2");
    }
}
