// Authentication endpoints: login, logout, user profile.
//
// Login/logout are the only operations that mutate the session flags;
// everything else just reads tokens through the pipeline.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::normalize::{Payload, normalize};
use crate::session::SessionKey;
use crate::token::TokenPair;

/// Authenticated user profile. The API returns more fields than we
/// model; anything unrecognized is retained in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiClient {
    /// Authenticate with username/password.
    ///
    /// On success both tokens, the login flag, and the cached username
    /// are written to the session store. Tokens are accepted either
    /// under `data.access`/`data.refresh` or at the top level (older
    /// deployments).
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<TokenPair, Error> {
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let value = match self.post_public("auth/login/", body).await {
            Ok(value) => value,
            Err(Error::Api { status, message }) if matches!(status, 400 | 401 | 403) => {
                return Err(Error::Authentication {
                    message: format!("login rejected (HTTP {status}): {message}"),
                });
            }
            Err(err) => return Err(err),
        };

        let access = extract_token(&value, "access");
        let refresh = extract_token(&value, "refresh");
        let (Some(access), Some(refresh)) = (access, refresh) else {
            return Err(Error::UnexpectedShape { body: value });
        };

        let store = self.store();
        store.set(SessionKey::AccessToken, &access);
        store.set(SessionKey::RefreshToken, &refresh);
        store.set(SessionKey::IsLoggedIn, "true");
        store.set(SessionKey::Username, username);
        if let Some(user) = value.get("data").and_then(|d| d.get("user")) {
            store.set(SessionKey::UserData, &user.to_string());
        }

        debug!("login successful for {username}");
        Ok(TokenPair { access, refresh })
    }

    /// End the session.
    ///
    /// The server is told to revoke the refresh token on a best-effort
    /// basis; local state is cleared unconditionally, so all seven
    /// session keys are empty afterwards even when the network call
    /// fails.
    pub async fn logout(&self) -> Result<(), Error> {
        if let Some(refresh) = self.store().get(SessionKey::RefreshToken) {
            let req = ApiRequest::post("auth/logout/", json!({ "refresh": refresh }));
            if let Err(err) = self.execute(&req).await {
                warn!("server-side logout failed, clearing local session anyway: {err}");
            }
        }
        self.store().clear();
        debug!("session cleared");
        Ok(())
    }

    /// Fetch the authenticated user's profile, falling back from
    /// `/auth/user/` to `/auth/me` on deployments that only serve the
    /// older path. The raw profile is cached in the session store.
    pub async fn user_profile(&self) -> Result<UserProfile, Error> {
        let value = match self.get("auth/user/", &[]).await {
            Err(Error::Api { status: 404, .. }) => self.get("auth/me", &[]).await?,
            other => other?,
        };

        // Profile endpoints sometimes return the bare user object with
        // no envelope at all; degrade to the raw body in that case.
        let profile_value = match normalize(&value, None) {
            Ok(Payload::Object(map)) => Value::Object(map),
            Ok(Payload::Array(items)) => Value::Array(items),
            Err(err) => {
                warn!("user profile response has no recognized envelope: {err}");
                value
            }
        };

        self.store()
            .set(SessionKey::FullUserData, &profile_value.to_string());

        serde_json::from_value(profile_value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: profile_value.to_string(),
        })
    }

    /// Record the last-selected feature area (energy, temperature,
    /// fire-safety). Pure session-store convenience -- no network call.
    pub fn select_app(&self, app: &str) {
        self.store().set(SessionKey::ActiveApp, app);
    }
}

/// Look for a token under `data.<key>` first, then at the top level.
fn extract_token(value: &Value, key: &str) -> Option<String> {
    value
        .get("data")
        .and_then(|data| data.get(key))
        .and_then(Value::as_str)
        .or_else(|| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}
