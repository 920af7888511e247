// Token lifecycle management.
//
// Access-token validity is a purely local decision: the JWT payload
// segment is decoded (no signature verification -- the server does that)
// and `exp` is compared against the wall clock. Refresh is the only
// network operation here, and a refresh failure is fatal for the
// session: state is cleared and the caller has to log in again.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::session::{SessionKey, SessionStore};

// ── Local JWT decoding ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode the `exp` claim (Unix seconds) from a JWT's payload segment.
///
/// Returns `None` for anything that isn't a decodable three-segment JWT
/// with a numeric `exp`.
pub fn decode_exp(token: &str) -> Option<i64> {
    let payload_b64 = token.split('.').nth(1)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&payload).ok()?;
    claims.exp
}

/// A token is valid iff `exp` is strictly greater than now (floor
/// seconds). Undecodable tokens are treated as expired (fail closed).
pub fn is_expired(token: &str) -> bool {
    match decode_exp(token) {
        Some(exp) => exp <= Utc::now().timestamp(),
        None => true,
    }
}

// ── Token pair ──────────────────────────────────────────────────────

/// An access/refresh credential pair, replaced wholesale on refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

// ── Token manager ───────────────────────────────────────────────────

/// Decides whether the stored access token is still usable and performs
/// the refresh exchange when it isn't.
///
/// Refreshes are serialized behind an async mutex so that concurrent
/// 401s coalesce onto a single refresh call instead of racing -- the
/// refresh endpoint rotates the refresh token, so a duplicate exchange
/// with the already-consumed token would kill the session.
pub struct TokenManager {
    http: reqwest::Client,
    refresh_url: Url,
    store: Arc<dyn SessionStore>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl TokenManager {
    /// `base_url` must end with a trailing slash (the client normalizes
    /// it before constructing the manager).
    pub fn new(
        base_url: &Url,
        http: reqwest::Client,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, Error> {
        let refresh_url = base_url.join("auth/refresh/")?;
        Ok(Self {
            http,
            refresh_url,
            store,
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Return an access token that is valid right now, refreshing first
    /// if the stored one has expired.
    ///
    /// Fails with [`Error::NoToken`] when nothing is stored at all --
    /// that means the user never logged in, and no request should be
    /// sent.
    pub async fn valid_access_token(&self) -> Result<String, Error> {
        let token = self
            .store
            .get(SessionKey::AccessToken)
            .ok_or(Error::NoToken)?;
        if !is_expired(&token) {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another task may have rotated the pair while we waited.
        if let Some(current) = self.store.get(SessionKey::AccessToken) {
            if !is_expired(&current) {
                return Ok(current);
            }
        }
        let pair = self.refresh_locked().await?;
        Ok(pair.access)
    }

    /// Refresh after a 401, coalescing with any refresh that completed
    /// while we waited for the lock.
    ///
    /// `stale` is the token the failed request carried: if the stored
    /// token already differs and is live, that refresh outcome is
    /// reused instead of issuing another exchange.
    pub async fn force_refresh(&self, stale: &str) -> Result<String, Error> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.store.get(SessionKey::AccessToken) {
            if current != stale && !is_expired(&current) {
                return Ok(current);
            }
        }
        let pair = self.refresh_locked().await?;
        Ok(pair.access)
    }

    /// Exchange the stored refresh token for a new pair.
    pub async fn refresh(&self) -> Result<TokenPair, Error> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Must be called with `refresh_lock` held.
    ///
    /// Any failure -- missing refresh token, network error, non-success
    /// envelope, malformed response -- clears all auth state. Refresh is
    /// never retried; the only recovery is interactive login.
    async fn refresh_locked(&self) -> Result<TokenPair, Error> {
        let Some(refresh) = self.store.get(SessionKey::RefreshToken) else {
            self.store.clear();
            return Err(Error::NoRefreshToken);
        };

        debug!("POST {} (token refresh)", self.refresh_url);

        match self.exchange(&refresh).await {
            Ok(pair) => {
                self.store.set(SessionKey::AccessToken, &pair.access);
                self.store.set(SessionKey::RefreshToken, &pair.refresh);
                debug!("token refresh succeeded");
                Ok(pair)
            }
            Err(err) => {
                warn!("token refresh failed, session ended: {err}");
                self.store.clear();
                Err(err)
            }
        }
    }

    async fn exchange(&self, refresh: &str) -> Result<TokenPair, Error> {
        let resp = self
            .http
            .post(self.refresh_url.clone())
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RefreshFailed {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: Value = resp.json().await.map_err(|e| Error::RefreshFailed {
            message: format!("unreadable refresh response: {e}"),
        })?;

        let success = body.get("success").and_then(Value::as_bool) == Some(true);
        let access = body
            .get("data")
            .and_then(|d| d.get("access"))
            .and_then(Value::as_str);
        let refresh = body
            .get("data")
            .and_then(|d| d.get("refresh"))
            .and_then(Value::as_str);

        match (success, access, refresh) {
            (true, Some(access), Some(refresh)) => Ok(TokenPair {
                access: access.to_owned(),
                refresh: refresh.to_owned(),
            }),
            _ => Err(Error::RefreshFailed {
                message: format!("unexpected refresh envelope: {body}"),
            }),
        }
    }
}
