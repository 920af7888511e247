//! CLI-side configuration glue.
//!
//! Bridges `bmsly_config` (TOML profiles, credential chain, session
//! paths) with `GlobalOpts` flag overrides and builds the API client.

use std::sync::Arc;

pub use bmsly_config::{
    Config, Profile, config_path, load_config_or_default, resolve_password, save_config,
    session_path, store_password,
};
use bmsly_api::{ApiClient, FileSessionStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile name in effect: `--profile` beats the config default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| cfg.effective_profile())
}

/// Everything a command handler needs to talk to the API.
pub struct ApiContext {
    pub client: ApiClient,
    pub profile_name: String,
    pub profile: Profile,
    pub timeout_secs: u64,
}

impl ApiContext {
    /// Map an API-layer error with this context's profile and timeout.
    pub fn map_err(&self, err: bmsly_api::Error) -> CliError {
        crate::error::map_api_error(err, &self.profile_name, self.timeout_secs)
    }
}

/// Build the API client from config file, profile, and CLI overrides.
///
/// Session state lives in a per-profile JSON file, so commands in
/// separate invocations share one login.
pub fn build_context(global: &GlobalOpts) -> Result<ApiContext, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let mut profile = cfg.profile(&profile_name);

    if let Some(ref url) = global.api_url {
        profile.api_url = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let base_url = bmsly_config::resolve_base_url(&profile)?;
    let transport = bmsly_config::resolve_transport(&profile, &cfg.defaults);
    let timeout_secs = profile.timeout.unwrap_or(cfg.defaults.timeout);

    let store = Arc::new(FileSessionStore::open(session_path(&profile_name)));
    let client = ApiClient::with_transport(base_url, store, &transport)
        .map_err(|e| crate::error::map_api_error(e, &profile_name, timeout_secs))?;

    Ok(ApiContext {
        client,
        profile_name,
        profile,
        timeout_secs,
    })
}
