//! OAuth client-credentials flow for machine-to-machine access
//!
//! The token is fetched lazily on the first call and reused until shortly
//! before it expires.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{ClientError, ClientResult};

const CLIENT_CREDENTIALS_GRANT_TYPE: &str = "client_credentials";
const TOKEN_PATH: &str = "/oauth/token";

/// Tokens are renewed this long before the platform would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// OAuth client id and secret of a machine-to-machine client
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + EXPIRY_MARGIN < at,
            None => true,
        }
    }
}

/// Fetches and caches bearer tokens for one set of credentials
pub(crate) struct TokenSource {
    token_url: String,
    credentials: ClientCredentials,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub(crate) fn new(base_url: &str, credentials: ClientCredentials) -> Self {
        Self {
            token_url: format!("{}{}", base_url, TOKEN_PATH),
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, requesting a new one when missing or stale
    pub(crate) async fn bearer(&self, http: &reqwest::Client) -> ClientResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh()
        {
            return Ok(token.value.clone());
        }

        let token = self.request_token(http).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn request_token(&self, http: &reqwest::Client) -> ClientResult<AccessToken> {
        log::debug!("Requesting access token from {}", self.token_url);

        let body = TokenRequest {
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            grant_type: CLIENT_CREDENTIALS_GRANT_TYPE,
        };
        let response = http
            .post(&self.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: TOKEN_PATH.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Auth { status, message });
        }

        let token: TokenResponse = response.json().await.map_err(|e| ClientError::Auth {
            status,
            message: format!("failed to parse token response: {}", e),
        })?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }
}
