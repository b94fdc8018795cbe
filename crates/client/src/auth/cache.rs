//! Cached bearer token with single-flight refresh.
//!
//! Concurrency invariants:
//! - At most one login is in flight per expiry event: the fast path reads
//!   under a shared lock, and refreshers serialize on `refresh_gate` with a
//!   re-check after acquiring it.
//! - An invalidation is never masked by a racing refresh: every clear bumps
//!   `epoch`, and a login that started before the bump discards its result
//!   and tries again.

use std::time::Duration;

use jamfpro_domain::{JamfError, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use url::Url;

use super::login;
use super::token::BearerToken;
use crate::config::AuthMethod;

#[derive(Default)]
struct TokenState {
    token: Option<BearerToken>,
    epoch: u64,
}

pub(crate) struct TokenCache {
    http: reqwest::Client,
    base_url: Url,
    method: AuthMethod,
    refresh_buffer: Duration,
    hide_sensitive: bool,
    state: RwLock<TokenState>,
    refresh_gate: Mutex<()>,
}

impl TokenCache {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        method: AuthMethod,
        refresh_buffer: Duration,
        hide_sensitive: bool,
    ) -> Self {
        Self {
            http,
            base_url,
            method,
            refresh_buffer,
            hide_sensitive,
            state: RwLock::new(TokenState::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    /// A valid token value, logging in when the cached one is missing,
    /// expired, or inside the refresh buffer.
    pub(crate) async fn acquire(&self) -> Result<String> {
        loop {
            if let Some(token) = self.cached_valid().await {
                return Ok(token.value);
            }

            let _gate = self.refresh_gate.lock().await;

            // Another task may have refreshed while we waited on the gate.
            if let Some(token) = self.cached_valid().await {
                return Ok(token.value);
            }

            let started_epoch = self.state.read().await.epoch;
            let token = login::login(&self.http, &self.base_url, &self.method).await?;

            let mut state = self.state.write().await;
            if state.epoch == started_epoch {
                info!(
                    token = %self.display_token(&token.value),
                    expires_at = %token.expires_at,
                    "acquired bearer token"
                );
                state.token = Some(token.clone());
                return Ok(token.value);
            }
            // Invalidated while the login was in flight; the result must not
            // be reused. Loop and log in again.
            debug!("discarding token acquired across an invalidation");
        }
    }

    /// The cached token, if any, without refreshing.
    pub(crate) async fn current(&self) -> Option<BearerToken> {
        self.state.read().await.token.clone()
    }

    /// Drop the cached token locally and bump the epoch. Used by the 401
    /// retry path, where the server has already rejected the token.
    pub(crate) async fn discard(&self) {
        let mut state = self.state.write().await;
        state.token = None;
        state.epoch += 1;
        debug!(epoch = state.epoch, "discarded cached bearer token");
    }

    /// Revoke the current token server-side and drop it locally. Holding no
    /// token is a no-op; there is nothing to revoke.
    ///
    /// The local state is cleared before the revoke call, so a failed revoke
    /// still forces the next `acquire` to log in fresh.
    pub(crate) async fn invalidate(&self) -> Result<()> {
        let token = {
            let mut state = self.state.write().await;
            let token = state.token.take();
            state.epoch += 1;
            token
        };

        match token {
            Some(token) => {
                login::invalidate(&self.http, &self.base_url, &token.value).await?;
                info!("bearer token invalidated");
            }
            None => debug!("no token held; skipping remote revoke"),
        }
        Ok(())
    }

    /// Extend the current token via the keep-alive endpoint.
    pub(crate) async fn keep_alive(&self) -> Result<()> {
        let (current, started_epoch) = {
            let state = self.state.read().await;
            (state.token.clone(), state.epoch)
        };
        let current =
            current.ok_or_else(|| JamfError::Auth("no token held; nothing to keep alive".into()))?;

        let renewed = login::keep_alive(&self.http, &self.base_url, &current.value).await?;

        let mut state = self.state.write().await;
        if state.epoch == started_epoch {
            info!(expires_at = %renewed.expires_at, "bearer token renewed via keep-alive");
            state.token = Some(renewed);
        }
        Ok(())
    }

    async fn cached_valid(&self) -> Option<BearerToken> {
        let state = self.state.read().await;
        state.token.as_ref().filter(|t| !t.is_expired(self.refresh_buffer)).cloned()
    }

    fn display_token(&self, value: &str) -> String {
        if self.hide_sensitive {
            return "<redacted>".into();
        }
        let prefix: String = value.chars().take(8).collect();
        format!("{prefix}…")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn oauth_method() -> AuthMethod {
        AuthMethod::OAuth2 { client_id: "cid".into(), client_secret: "secret".into() }
    }

    fn cache_for(server: &MockServer) -> TokenCache {
        let http = reqwest::Client::builder().no_proxy().build().expect("reqwest client");
        let base = Url::parse(&server.uri()).expect("server url");
        TokenCache::new(http, base, oauth_method(), Duration::from_secs(300), false)
    }

    fn token_response(value: &str, expires_in: u64) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": value,
            "expires_in": expires_in,
        }))
    }

    #[tokio::test]
    async fn concurrent_acquires_log_in_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/oauth/token"))
            .respond_with(token_response("tok-1", 3600))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(cache_for(&server));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.acquire().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok-1");
        }
    }

    #[tokio::test]
    async fn expired_token_triggers_exactly_one_refresh() {
        let server = MockServer::start().await;
        // First token already inside the 300s buffer, second one long-lived.
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        Mock::given(method("POST"))
            .and(path("/api/v1/oauth/token"))
            .respond_with(move |_req: &wiremock::Request| {
                let n = hits_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if n == 0 {
                    token_response("short", 60)
                } else {
                    token_response("long", 3600)
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        assert_eq!(cache.acquire().await.unwrap(), "short");
        // The short token sits inside the refresh buffer, so this refreshes.
        assert_eq!(cache.acquire().await.unwrap(), "long");
        assert_eq!(cache.acquire().await.unwrap(), "long");
    }

    #[tokio::test]
    async fn invalidate_forces_fresh_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/oauth/token"))
            .respond_with(token_response("tok", 3600))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/invalidate-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        cache.acquire().await.unwrap();
        cache.invalidate().await.unwrap();
        assert!(cache.current().await.is_none());
        cache.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn invalidate_without_token_is_a_no_op() {
        let server = MockServer::start().await;
        // No invalidate-token mock mounted: the call must not reach the wire.
        let cache = cache_for(&server);
        cache.invalidate().await.unwrap();
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn keep_alive_swaps_in_the_renewed_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/oauth/token"))
            .respond_with(token_response("tok-old", 3600))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/keep-alive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "tok-new",
                "expires": "2099-01-01T00:00:00Z",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        cache.acquire().await.unwrap();
        cache.keep_alive().await.unwrap();
        assert_eq!(cache.acquire().await.unwrap(), "tok-new");
    }

    #[tokio::test]
    async fn failed_login_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        assert!(matches!(cache.acquire().await, Err(JamfError::Auth(_))));
    }
}
