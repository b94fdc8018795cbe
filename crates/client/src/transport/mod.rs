//! The shared HTTP transport behind every SDK operation.
//!
//! One [`Transport`] per configured instance: it owns the reqwest client
//! (connection pool + cookie jar), the token cache, and the retry policy.
//! The only retry performed anywhere is the single refresh-and-retry after
//! a 401; transient failures surface to the caller untouched.

pub(crate) mod multipart;
pub(crate) mod pagination;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jamfpro_domain::{JamfError, Response, Result, RsqlQuery};
use reqwest::Method;
use tokio::sync::Semaphore;
use tracing::{debug, info_span, warn, Instrument};
use url::Url;

use crate::auth::TokenCache;
use crate::config::AuthConfig;
use crate::errors::WireError;
use crate::ports::{Headers, HttpClient, MergePage, MultipartUpload, Payload};
use crate::translate::translate;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = concat!("jamfpro-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Request body variants the executor knows how to (re)send.
enum BodyKind<'a> {
    Plain(&'a Payload),
    Form(&'a [(String, String)]),
    Multipart(reqwest::multipart::Form),
}

/// Shared HTTP transport for one Jamf Pro instance.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenCache,
    global_headers: Headers,
    semaphore: Option<Arc<Semaphore>>,
    tracing_enabled: AtomicBool,
    span: tracing::Span,
}

impl Transport {
    /// Start building a transport for `config`.
    #[must_use]
    pub fn builder(config: AuthConfig) -> TransportBuilder {
        TransportBuilder::new(config)
    }

    /// Toggle per-request tracing spans at runtime. Retry and auth semantics
    /// are unaffected.
    pub fn set_tracing(&self, enabled: bool) {
        self.tracing_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Execute a request with a plain (rebuildable) body.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
        body: &Payload,
    ) -> Result<Response> {
        let _permit = self.acquire_permit().await?;
        let token = self.tokens.acquire().await?;
        let response =
            self.send_once(&method, path, query, headers, &token, BodyKind::Plain(body)).await?;

        let response = if response.status_code == 401 {
            debug!(%method, path, "401 received; refreshing token and retrying once");
            self.tokens.discard().await;
            let token = self.tokens.acquire().await?;
            let retry = self
                .send_once(&method, path, query, headers, &token, BodyKind::Plain(body))
                .await?;
            if retry.status_code == 401 {
                return Err(JamfError::Auth(format!(
                    "{method} {path} was rejected with 401 twice; credentials are not accepted"
                )));
            }
            retry
        } else {
            response
        };

        self.finish(&method, path, response)
    }

    /// Execute an urlencoded form POST (used for token-style endpoints).
    pub(crate) async fn execute_form(
        &self,
        path: &str,
        form: &[(String, String)],
        headers: &Headers,
    ) -> Result<Response> {
        let _permit = self.acquire_permit().await?;
        let token = self.tokens.acquire().await?;
        let response =
            self.send_once(&Method::POST, path, None, headers, &token, BodyKind::Form(form)).await?;

        let response = if response.status_code == 401 {
            debug!(path, "401 received; refreshing token and retrying once");
            self.tokens.discard().await;
            let token = self.tokens.acquire().await?;
            let retry = self
                .send_once(&Method::POST, path, None, headers, &token, BodyKind::Form(form))
                .await?;
            if retry.status_code == 401 {
                return Err(JamfError::Auth(format!(
                    "POST {path} was rejected with 401 twice; credentials are not accepted"
                )));
            }
            retry
        } else {
            response
        };

        self.finish(&Method::POST, path, response)
    }

    /// Execute a streamed multipart upload. The form is rebuilt from the
    /// upload source for the retry attempt, so the stream always restarts
    /// at byte zero.
    pub(crate) async fn execute_multipart(
        &self,
        path: &str,
        upload: &MultipartUpload,
        headers: &Headers,
    ) -> Result<Response> {
        let _permit = self.acquire_permit().await?;
        let token = self.tokens.acquire().await?;
        let form = multipart::build_form(upload).await?;
        let response = self
            .send_once(&Method::POST, path, None, headers, &token, BodyKind::Multipart(form))
            .await?;

        let response = if response.status_code == 401 {
            debug!(path, "401 received on upload; refreshing token and retrying once");
            self.tokens.discard().await;
            let token = self.tokens.acquire().await?;
            let form = multipart::build_form(upload).await?;
            let retry = self
                .send_once(&Method::POST, path, None, headers, &token, BodyKind::Multipart(form))
                .await?;
            if retry.status_code == 401 {
                return Err(JamfError::Auth(format!(
                    "POST {path} was rejected with 401 twice; credentials are not accepted"
                )));
            }
            retry
        } else {
            response
        };

        self.finish(&Method::POST, path, response)
    }

    async fn acquire_permit(&self) -> Result<Option<tokio::sync::SemaphorePermit<'_>>> {
        match &self.semaphore {
            Some(semaphore) => {
                let permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| JamfError::Network("concurrency limiter closed".into()))?;
                Ok(Some(permit))
            }
            None => Ok(None),
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
        token: &str,
        body: BodyKind<'_>,
    ) -> Result<Response> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| JamfError::Config(format!("invalid request path '{path}': {err}")))?;

        let mut request = self.http.request(method.clone(), url);

        if let Some(query) = query {
            let pairs: Vec<(&str, &str)> = query.iter().collect();
            if !pairs.is_empty() {
                request = request.query(&pairs);
            }
        }

        request = match body {
            BodyKind::Plain(Payload::Empty) => request,
            BodyKind::Plain(Payload::Json(value)) => request.json(value),
            BodyKind::Plain(Payload::Xml(document)) => request.body(document.clone()),
            BodyKind::Plain(Payload::Raw { content_type, data }) => {
                request
                    .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
                    .body(data.clone())
            }
            BodyKind::Form(fields) => request.form(fields),
            BodyKind::Multipart(form) => request.multipart(form),
        };

        // One value per header name: caller headers override global ones,
        // and both override anything the body serializer set.
        let mut header_map = reqwest::header::HeaderMap::new();
        for (name, value) in self.global_headers.iter().chain(headers.iter()) {
            let name: reqwest::header::HeaderName = name
                .parse()
                .map_err(|_| JamfError::Config(format!("invalid header name '{name}'")))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|_| JamfError::Config(format!("invalid value for header '{name}'")))?;
            header_map.insert(name, value);
        }
        request = request.headers(header_map).bearer_auth(token);

        let span = if self.tracing_enabled.load(Ordering::Relaxed) {
            info_span!(
                parent: &self.span,
                "http_request",
                method = %method,
                path,
                status = tracing::field::Empty
            )
        } else {
            tracing::Span::none()
        };

        async move {
            let started = Instant::now();
            let raw = request.send().await.map_err(|err| JamfError::from(WireError::from(err)))?;

            let status = raw.status();
            tracing::Span::current().record("status", status.as_u16());

            let mut response_headers = HashMap::with_capacity(raw.headers().len());
            for (name, value) in raw.headers() {
                response_headers.insert(
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                );
            }

            let body =
                raw.bytes().await.map_err(|err| JamfError::from(WireError::from(err)))?;
            debug!(status = status.as_u16(), bytes = body.len(), "response received");

            Ok(Response {
                status_code: status.as_u16(),
                status: status.canonical_reason().unwrap_or("").to_owned(),
                headers: response_headers,
                body,
                duration: started.elapsed(),
                received_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    /// Final classification of a completed exchange.
    fn finish(&self, method: &Method, path: &str, response: Response) -> Result<Response> {
        if let Some(deprecation) = response.header("deprecation") {
            warn!(%method, path, deprecation, "endpoint is deprecated");
        }
        if response.is_success() {
            Ok(response)
        } else {
            Err(translate(method.as_str(), path, response).into())
        }
    }
}

#[async_trait]
impl HttpClient for Transport {
    async fn get(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
    ) -> Result<Response> {
        self.execute(Method::GET, path, query, headers, &Payload::Empty).await
    }

    async fn get_bytes(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
    ) -> Result<Response> {
        self.execute(Method::GET, path, query, headers, &Payload::Empty).await
    }

    async fn post(&self, path: &str, body: Payload, headers: &Headers) -> Result<Response> {
        self.execute(Method::POST, path, None, headers, &body).await
    }

    async fn post_with_query(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        body: Payload,
        headers: &Headers,
    ) -> Result<Response> {
        self.execute(Method::POST, path, query, headers, &body).await
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        headers: &Headers,
    ) -> Result<Response> {
        self.execute_form(path, form, headers).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        upload: MultipartUpload,
        headers: &Headers,
    ) -> Result<Response> {
        self.execute_multipart(path, &upload, headers).await
    }

    async fn put(&self, path: &str, body: Payload, headers: &Headers) -> Result<Response> {
        self.execute(Method::PUT, path, None, headers, &body).await
    }

    async fn patch(&self, path: &str, body: Payload, headers: &Headers) -> Result<Response> {
        self.execute(Method::PATCH, path, None, headers, &body).await
    }

    async fn delete(&self, path: &str, headers: &Headers) -> Result<Response> {
        self.execute(Method::DELETE, path, None, headers, &Payload::Empty).await
    }

    async fn delete_with_body(
        &self,
        path: &str,
        body: Payload,
        headers: &Headers,
    ) -> Result<Response> {
        self.execute(Method::DELETE, path, None, headers, &body).await
    }

    async fn get_paginated(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
        merge_page: MergePage<'_>,
    ) -> Result<Response> {
        pagination::run(self, path, query, headers, merge_page).await
    }

    async fn invalidate_token(&self) -> Result<()> {
        self.tokens.invalidate().await
    }

    async fn keep_alive_token(&self) -> Result<()> {
        self.tokens.keep_alive().await
    }

    fn logger(&self) -> tracing::Span {
        self.span.clone()
    }
}

/// Builder for [`Transport`].
pub struct TransportBuilder {
    config: AuthConfig,
    timeout: Duration,
    user_agent: Option<String>,
    global_headers: Headers,
    max_concurrent_requests: Option<usize>,
    tracing_enabled: bool,
    accept_invalid_certs: bool,
}

impl TransportBuilder {
    fn new(config: AuthConfig) -> Self {
        Self {
            config,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            global_headers: Headers::new(),
            max_concurrent_requests: None,
            tracing_enabled: false,
            accept_invalid_certs: false,
        }
    }

    /// Per-request timeout (default 30s).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default user agent.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Header attached to every request (caller headers take precedence).
    #[must_use]
    pub fn global_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_headers.insert(name.into(), value.into());
        self
    }

    /// Cap the number of in-flight requests through this transport.
    #[must_use]
    pub fn max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = Some(limit.max(1));
        self
    }

    /// Emit a tracing span per HTTP request.
    #[must_use]
    pub fn tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    #[must_use]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// Validate the configuration and construct the transport.
    ///
    /// No token is fetched here; the first request logs in lazily.
    pub fn build(self) -> Result<Transport> {
        self.config.validate()?;
        let base_url = self.config.base_url()?;

        let mut builder =
            reqwest::Client::builder().timeout(self.timeout).cookie_store(true).no_proxy();
        builder = builder.user_agent(self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.into()));
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| JamfError::from(WireError::from(err)))?;

        let tokens = TokenCache::new(
            http.clone(),
            base_url.clone(),
            self.config.method.clone(),
            self.config.token_refresh_buffer,
            self.config.hide_sensitive_data,
        );

        let span = info_span!(
            "jamfpro_client",
            instance = %base_url.host_str().unwrap_or(""),
            auth = self.config.method_label()
        );

        Ok(Transport {
            http,
            base_url,
            tokens,
            global_headers: self.global_headers,
            semaphore: self.max_concurrent_requests.map(|n| Arc::new(Semaphore::new(n))),
            tracing_enabled: AtomicBool::new(self.tracing_enabled),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_incomplete_config() {
        let config = AuthConfig::oauth2("https://x.jamfcloud.com", "", "");
        let result = Transport::builder(config).build();
        assert!(matches!(result, Err(JamfError::Config(_))));
    }

    #[test]
    fn build_rejects_unparseable_domain() {
        let config = AuthConfig::basic("https://", "u", "p");
        let result = Transport::builder(config).build();
        assert!(matches!(result, Err(JamfError::Config(_))));
    }

    #[test]
    fn builder_accepts_options() {
        let config = AuthConfig::oauth2("https://x.jamfcloud.com", "cid", "secret");
        let transport = Transport::builder(config)
            .timeout(Duration::from_secs(5))
            .user_agent("test-agent/1")
            .global_header("X-Env", "test")
            .max_concurrent_requests(4)
            .tracing(true)
            .build()
            .expect("transport builds");
        transport.set_tracing(false);
    }
}
