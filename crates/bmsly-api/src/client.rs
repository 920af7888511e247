// Authenticated HTTP client.
//
// Every outbound call goes through an explicit three-stage pipeline:
// attach_token (suspends for refresh if needed), dispatch, and a single
// retry after a 401. Requests capture method, path, query, and body up
// front so the retry replays exactly the same request.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::session::SessionStore;
use crate::token::TokenManager;
use crate::transport::TransportConfig;

/// A replayable request: everything needed to dispatch it twice.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub(crate) fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_owned(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn post(path: &str, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.to_owned(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub(crate) fn with_query(mut self, query: &[(&str, String)]) -> Self {
        self.query = query
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        self
    }
}

/// Async client for the BMS telemetry API.
///
/// Wraps `reqwest::Client` with bearer-token attachment, one automatic
/// retry on 401, and envelope-aware response handling. Endpoint modules
/// (dashboard, devices, reports, ...) are implemented as inherent
/// methods via separate files to keep this module focused on transport
/// mechanics.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenManager,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    /// Create a client with default transport settings (30s timeout).
    pub fn new(base_url: Url, store: Arc<dyn SessionStore>) -> Result<Self, Error> {
        Self::with_transport(base_url, store, &TransportConfig::default())
    }

    /// Create a client with explicit transport settings.
    pub fn with_transport(
        base_url: Url,
        store: Arc<dyn SessionStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url);
        let http = transport.build_client()?;
        let tokens = TokenManager::new(&base_url, http.clone(), Arc::clone(&store))?;
        Ok(Self {
            http,
            base_url,
            tokens,
            store,
        })
    }

    /// The session store backing this client.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// The token lifecycle manager (for embedders that refresh eagerly).
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Run a request through the full pipeline:
    /// attach_token -> dispatch -> retry_once_401.
    ///
    /// At most one automatic retry per logical request. A 401 after the
    /// refreshed token is a genuine authorization failure and surfaces
    /// unchanged -- never a signal to refresh again.
    pub(crate) async fn execute(&self, req: &ApiRequest) -> Result<Value, Error> {
        // If no usable token can be produced, the request is never sent.
        let token = self.tokens.valid_access_token().await?;

        match self.dispatch(req, Some(&token)).await {
            Err(Error::Api { status: 401, .. }) => {
                debug!("{} {} returned 401, refreshing once", req.method, req.path);
                let token = self.tokens.force_refresh(&token).await?;
                self.dispatch(req, Some(&token)).await
            }
            other => other,
        }
    }

    /// Dispatch without auth (login, other pre-session calls).
    pub(crate) async fn execute_public(&self, req: &ApiRequest) -> Result<Value, Error> {
        self.dispatch(req, None).await
    }

    /// The dispatch stage: build, send, and read one HTTP exchange.
    async fn dispatch(&self, req: &ApiRequest, token: Option<&str>) -> Result<Value, Error> {
        let url = self.base_url.join(&req.path)?;
        debug!("{} {}", req.method, url);

        let mut builder = self.http.request(req.method.clone(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        debug!("{} {} -> {}", req.method, req.path, status);

        read_json(resp).await
    }

    // ── Convenience wrappers for endpoint modules ────────────────────

    pub(crate) async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, Error> {
        self.execute(&ApiRequest::get(path).with_query(query)).await
    }

    pub(crate) async fn post(&self, path: &str, body: Value) -> Result<Value, Error> {
        self.execute(&ApiRequest::post(path, body)).await
    }

    pub(crate) async fn post_public(&self, path: &str, body: Value) -> Result<Value, Error> {
        self.execute_public(&ApiRequest::post(path, body)).await
    }
}

/// Ensure the base path ends with `/` so relative joins append instead
/// of replacing the last segment.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Read a response body: non-2xx becomes `Error::Api`, 2xx is parsed as
/// JSON (empty bodies count as `null`).
async fn read_json(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: error_message(&body, status),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Pull a human-readable message out of an error body, falling back to
/// the status line.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "detail", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_owned();
            }
        }
    }
    if body.is_empty() {
        status.to_string()
    } else {
        // Truncate by chars, not bytes -- error pages can be HTML or
        // localized text with multi-byte characters.
        let preview: String = body.chars().take(200).collect();
        format!("{status}: {preview}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url(Url::parse("https://bms.api.v1.vyntar.in/api").unwrap());
        assert_eq!(url.as_str(), "https://bms.api.v1.vyntar.in/api/");
        // Relative joins now append instead of replacing /api
        assert_eq!(
            url.join("admin/slaves/").unwrap().as_str(),
            "https://bms.api.v1.vyntar.in/api/admin/slaves/"
        );
    }

    #[test]
    fn error_message_truncates_multibyte_bodies_on_char_boundaries() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;

        // 300 bytes of three-byte chars; a byte-offset cut at 200 would
        // land mid-character.
        let msg = error_message(&"€".repeat(100), status);
        assert!(msg.contains('€'));
        assert!(msg.chars().count() <= "500 Internal Server Error: ".len() + 200);

        let msg = error_message(&"€".repeat(500), status);
        assert_eq!(msg.chars().filter(|c| *c == '€').count(), 200);
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(r#"{"message":"nope"}"#, status),
            "nope".to_owned()
        );
        assert_eq!(
            error_message(r#"{"detail":"missing field"}"#, status),
            "missing field".to_owned()
        );
        assert_eq!(error_message("", status), status.to_string());
    }
}
