//! Wire-level calls against the token endpoints.

use chrono::{DateTime, Utc};
use jamfpro_domain::{JamfError, Result};
use serde::Deserialize;
use url::Url;

use super::token::BearerToken;
use crate::config::AuthMethod;
use crate::errors::WireError;

pub(crate) const OAUTH_TOKEN_PATH: &str = "/api/v1/oauth/token";
pub(crate) const AUTH_TOKEN_PATH: &str = "/api/v1/auth/token";
pub(crate) const INVALIDATE_PATH: &str = "/api/v1/auth/invalidate-token";
pub(crate) const KEEP_ALIVE_PATH: &str = "/api/v1/auth/keep-alive";

/// `/api/v1/oauth/token` envelope.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: i64,
}

/// `/api/v1/auth/token` and `/api/v1/auth/keep-alive` envelope.
#[derive(Debug, Deserialize)]
struct AuthTokenResponse {
    token: String,
    expires: DateTime<Utc>,
}

fn endpoint(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|err| JamfError::Config(format!("invalid token endpoint '{path}': {err}")))
}

/// Perform one login attempt for the configured credential scheme.
pub(crate) async fn login(
    http: &reqwest::Client,
    base: &Url,
    method: &AuthMethod,
) -> Result<BearerToken> {
    match method {
        AuthMethod::OAuth2 { client_id, client_secret } => {
            let url = endpoint(base, OAUTH_TOKEN_PATH)?;
            let form = [
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ];
            let response = http
                .post(url)
                .form(&form)
                .send()
                .await
                .map_err(|err| JamfError::from(WireError::from(err)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(JamfError::Auth(format!(
                    "oauth2 login rejected with HTTP {}",
                    status.as_u16()
                )));
            }
            let body: OAuthTokenResponse = response.json().await.map_err(|err| {
                JamfError::Auth(format!("oauth2 token response was malformed: {err}"))
            })?;
            Ok(BearerToken::from_lifetime(body.access_token, body.expires_in))
        }
        AuthMethod::Basic { username, password } => {
            let url = endpoint(base, AUTH_TOKEN_PATH)?;
            let response = http
                .post(url)
                .basic_auth(username, Some(password))
                .send()
                .await
                .map_err(|err| JamfError::from(WireError::from(err)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(JamfError::Auth(format!(
                    "basic login rejected with HTTP {}",
                    status.as_u16()
                )));
            }
            let body: AuthTokenResponse = response.json().await.map_err(|err| {
                JamfError::Auth(format!("bearer token response was malformed: {err}"))
            })?;
            Ok(BearerToken::new(body.token, body.expires))
        }
    }
}

/// Revoke `token` server-side.
pub(crate) async fn invalidate(http: &reqwest::Client, base: &Url, token: &str) -> Result<()> {
    let url = endpoint(base, INVALIDATE_PATH)?;
    let response = http
        .post(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|err| JamfError::from(WireError::from(err)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(JamfError::Auth(format!(
            "token invalidation rejected with HTTP {}",
            status.as_u16()
        )));
    }
    Ok(())
}

/// Exchange `token` for a renewed one via keep-alive.
pub(crate) async fn keep_alive(
    http: &reqwest::Client,
    base: &Url,
    token: &str,
) -> Result<BearerToken> {
    let url = endpoint(base, KEEP_ALIVE_PATH)?;
    let response = http
        .post(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|err| JamfError::from(WireError::from(err)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(JamfError::Auth(format!("keep-alive rejected with HTTP {}", status.as_u16())));
    }
    let body: AuthTokenResponse = response
        .json()
        .await
        .map_err(|err| JamfError::Auth(format!("keep-alive response was malformed: {err}")))?;
    Ok(BearerToken::new(body.token, body.expires))
}
