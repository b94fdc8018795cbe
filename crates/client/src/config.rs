//! Client configuration loading
//!
//! Resolves instance and credential settings from environment variables or
//! from a JSON/TOML file (format detected by extension).
//!
//! ## Environment Variables
//! - `INSTANCE_DOMAIN`: Jamf Pro instance, e.g. `https://acme.jamfcloud.com`
//! - `AUTH_METHOD`: `oauth2` or `basic`
//! - `CLIENT_ID` / `CLIENT_SECRET`: OAuth2 client credentials
//! - `BASIC_AUTH_USERNAME` / `BASIC_AUTH_PASSWORD`: Basic credentials
//! - `TOKEN_REFRESH_BUFFER_SECONDS`: refresh this long before expiry
//!   (default 300)
//! - `HIDE_SENSITIVE_DATA`: redact tokens in trace output (true/false)

use std::path::Path;
use std::time::Duration;

use jamfpro_domain::{JamfError, Result};
use serde::Deserialize;
use url::Url;

/// Default refresh buffer: tokens are renewed five minutes before expiry.
pub const DEFAULT_TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Credential scheme for the instance. Exactly one applies per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// OAuth2 client-credentials grant against `/api/v1/oauth/token`.
    OAuth2 {
        /// API client identifier.
        client_id: String,
        /// API client secret.
        client_secret: String,
    },
    /// Username/password exchanged for a bearer token at `/api/v1/auth/token`.
    Basic {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
    },
}

impl AuthMethod {
    fn label(&self) -> &'static str {
        match self {
            Self::OAuth2 { .. } => "oauth2",
            Self::Basic { .. } => "basic",
        }
    }
}

/// Connection and credential settings for one Jamf Pro instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Instance domain, e.g. `https://acme.jamfcloud.com`. A bare host is
    /// accepted and normalized to `https://`.
    pub instance_domain: String,
    /// Credential scheme.
    pub method: AuthMethod,
    /// Tokens within this window of expiry are treated as expired.
    pub token_refresh_buffer: Duration,
    /// Redact token values in trace output.
    pub hide_sensitive_data: bool,
}

/// On-disk shape of a config file (flat keys, matching the env variables).
#[derive(Debug, Deserialize)]
struct AuthConfigFile {
    instance_domain: String,
    auth_method: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    basic_auth_username: Option<String>,
    #[serde(default)]
    basic_auth_password: Option<String>,
    #[serde(default)]
    token_refresh_buffer_period_seconds: Option<u64>,
    #[serde(default)]
    hide_sensitive_data: Option<bool>,
}

impl AuthConfig {
    /// OAuth2 client-credentials configuration with defaults.
    pub fn oauth2(
        instance_domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            instance_domain: instance_domain.into(),
            method: AuthMethod::OAuth2 {
                client_id: client_id.into(),
                client_secret: client_secret.into(),
            },
            token_refresh_buffer: DEFAULT_TOKEN_REFRESH_BUFFER,
            hide_sensitive_data: false,
        }
    }

    /// Basic-to-bearer configuration with defaults.
    pub fn basic(
        instance_domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            instance_domain: instance_domain.into(),
            method: AuthMethod::Basic { username: username.into(), password: password.into() },
            token_refresh_buffer: DEFAULT_TOKEN_REFRESH_BUFFER,
            hide_sensitive_data: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns `JamfError::Config` if required variables are missing or have
    /// invalid values.
    pub fn from_env() -> Result<Self> {
        let instance_domain = env_var("INSTANCE_DOMAIN")?;
        let method = match env_var("AUTH_METHOD")?.to_ascii_lowercase().as_str() {
            "oauth2" => AuthMethod::OAuth2 {
                client_id: env_var("CLIENT_ID")?,
                client_secret: env_var("CLIENT_SECRET")?,
            },
            "basic" => AuthMethod::Basic {
                username: env_var("BASIC_AUTH_USERNAME")?,
                password: env_var("BASIC_AUTH_PASSWORD")?,
            },
            other => {
                return Err(JamfError::Config(format!(
                    "Invalid AUTH_METHOD '{other}' (expected 'oauth2' or 'basic')"
                )))
            }
        };

        let token_refresh_buffer = match std::env::var("TOKEN_REFRESH_BUFFER_SECONDS") {
            Ok(raw) => {
                let seconds = raw.parse::<u64>().map_err(|e| {
                    JamfError::Config(format!("Invalid TOKEN_REFRESH_BUFFER_SECONDS: {e}"))
                })?;
                Duration::from_secs(seconds)
            }
            Err(_) => DEFAULT_TOKEN_REFRESH_BUFFER,
        };

        let config = Self {
            instance_domain,
            method,
            token_refresh_buffer,
            hide_sensitive_data: env_bool("HIDE_SENSITIVE_DATA", false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON or TOML file (detected by extension).
    ///
    /// # Errors
    /// Returns `JamfError::Config` if the file is missing, unparseable, or
    /// describes an incomplete credential set.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(JamfError::Config(format!("Config file not found: {}", path.display())));
        }

        tracing::info!(path = %path.display(), "Loading client configuration from file");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| JamfError::Config(format!("Failed to read config file: {e}")))?;
        let file = parse_config_file(&contents, path)?;

        let method = match file.auth_method.to_ascii_lowercase().as_str() {
            "oauth2" => AuthMethod::OAuth2 {
                client_id: file.client_id.unwrap_or_default(),
                client_secret: file.client_secret.unwrap_or_default(),
            },
            "basic" => AuthMethod::Basic {
                username: file.basic_auth_username.unwrap_or_default(),
                password: file.basic_auth_password.unwrap_or_default(),
            },
            other => {
                return Err(JamfError::Config(format!(
                    "Invalid auth_method '{other}' (expected 'oauth2' or 'basic')"
                )))
            }
        };

        let config = Self {
            instance_domain: file.instance_domain,
            method,
            token_refresh_buffer: file
                .token_refresh_buffer_period_seconds
                .map_or(DEFAULT_TOKEN_REFRESH_BUFFER, Duration::from_secs),
            hide_sensitive_data: file.hide_sensitive_data.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is complete and self-consistent.
    ///
    /// # Errors
    /// Returns `JamfError::Config` naming the first missing or invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.instance_domain.trim().is_empty() {
            return Err(JamfError::Config("instance domain must not be empty".into()));
        }
        self.base_url()?;

        match &self.method {
            AuthMethod::OAuth2 { client_id, client_secret } => {
                if client_id.is_empty() || client_secret.is_empty() {
                    return Err(JamfError::Config(
                        "oauth2 auth requires both client_id and client_secret".into(),
                    ));
                }
            }
            AuthMethod::Basic { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Err(JamfError::Config(
                        "basic auth requires both username and password".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The instance domain as a parsed base URL, defaulting to `https://`
    /// when no scheme was given.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.instance_domain.trim();
        let candidate = if raw.contains("://") { raw.to_owned() } else { format!("https://{raw}") };
        let url = Url::parse(&candidate)
            .map_err(|e| JamfError::Config(format!("Invalid instance domain '{raw}': {e}")))?;
        if url.host_str().is_none() {
            return Err(JamfError::Config(format!("Instance domain '{raw}' has no host")));
        }
        Ok(url)
    }

    /// Short label of the active auth method, for logging.
    #[must_use]
    pub fn method_label(&self) -> &'static str {
        self.method.label()
    }
}

fn parse_config_file(contents: &str, path: &Path) -> Result<AuthConfigFile> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| JamfError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| JamfError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(JamfError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Get required environment variable.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| JamfError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse boolean from environment variable.
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
