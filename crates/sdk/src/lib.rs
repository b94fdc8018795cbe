//! # jamfpro
//!
//! A client SDK for the Jamf Pro device-management REST APIs: the modern
//! JSON API under `/api/...` and the Classic XML API under
//! `/JSSResource/...`, behind one authenticated client.
//!
//! ```no_run
//! use jamfpro::{AuthConfig, Client};
//!
//! # async fn run() -> jamfpro::Result<()> {
//! let config = AuthConfig::oauth2("acme.jamfcloud.com", "client-id", "client-secret");
//! let client = Client::new(config)?;
//! let page = client.categories.list(None).await?;
//! println!("{} categories", page.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! Authentication is lazy: no token is fetched until the first request
//! needs one, and a single in-flight login is shared across concurrent
//! callers. A request answered with 401 is retried exactly once with a
//! fresh token; nothing else is ever retried.

pub mod services;

use std::sync::Arc;

use jamfpro_client::{HttpClient, Transport, TransportBuilder};

pub use jamfpro_client::{
    headers, AuthConfig, AuthMethod, BearerToken, Headers, MergePage, MultipartUpload, Payload,
    ProgressCallback, UploadSource,
};
pub use jamfpro_domain::{
    ApiError, ErrorKind, JamfError, Response, Result, RsqlFilter, RsqlQuery,
};

/// The top-level Jamf Pro client.
///
/// Construction is cheap and performs no network I/O. All services share
/// one transport, so the token cache, connection pool, and concurrency
/// limit are common across them.
pub struct Client {
    transport: Arc<Transport>,
    /// `/api/v1/categories`.
    pub categories: services::categories::CategoriesService,
    /// `/api/v1/departments`.
    pub departments: services::departments::DepartmentsService,
    /// `/api/v1/scripts`.
    pub scripts: services::scripts::ScriptsService,
    /// `/api/v1/packages`, including binary upload.
    pub packages: services::packages::PackagesService,
    /// `/api/v1/icon` upload and download.
    pub icons: services::icons::IconsService,
    /// `/JSSResource/sites` (Classic API).
    pub sites: services::sites::SitesService,
}

impl Client {
    /// A client with default transport settings.
    pub fn new(config: AuthConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// A builder for tuning timeouts, headers, and concurrency.
    pub fn builder(config: AuthConfig) -> ClientBuilder {
        ClientBuilder { inner: Transport::builder(config) }
    }

    /// A client configured entirely from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(AuthConfig::from_env()?)
    }

    fn from_transport(transport: Transport) -> Self {
        let transport = Arc::new(transport);
        let shared: Arc<dyn HttpClient> = transport.clone();
        Self {
            categories: services::categories::CategoriesService::new(shared.clone()),
            departments: services::departments::DepartmentsService::new(shared.clone()),
            scripts: services::scripts::ScriptsService::new(shared.clone()),
            packages: services::packages::PackagesService::new(shared.clone()),
            icons: services::icons::IconsService::new(shared.clone()),
            sites: services::sites::SitesService::new(shared),
            transport,
        }
    }

    /// The shared transport, for services defined outside this crate.
    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        self.transport.clone()
    }

    /// Revoke the cached token server-side and locally. The next request
    /// logs in again.
    pub async fn invalidate_token(&self) -> Result<()> {
        self.transport.invalidate_token().await
    }

    /// Extend the current token's lifetime without a fresh login.
    pub async fn keep_alive_token(&self) -> Result<()> {
        self.transport.keep_alive_token().await
    }

    /// Toggle per-request tracing spans at runtime.
    pub fn set_tracing(&self, enabled: bool) {
        self.transport.set_tracing(enabled);
    }

    /// The client's root tracing span.
    pub fn logger(&self) -> tracing::Span {
        self.transport.logger()
    }
}

/// Configures and builds a [`Client`].
pub struct ClientBuilder {
    inner: TransportBuilder,
}

impl ClientBuilder {
    /// Per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Override the `User-Agent` header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.inner = self.inner.user_agent(agent);
        self
    }

    /// A header attached to every request.
    pub fn global_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.global_header(name, value);
        self
    }

    /// Cap the number of requests in flight at once.
    pub fn max_concurrent_requests(mut self, limit: usize) -> Self {
        self.inner = self.inner.max_concurrent_requests(limit);
        self
    }

    /// Emit a tracing span per request. Defaults to off.
    pub fn tracing(mut self, enabled: bool) -> Self {
        self.inner = self.inner.tracing(enabled);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<Client> {
        Ok(Client::from_transport(self.inner.build()?))
    }
}
