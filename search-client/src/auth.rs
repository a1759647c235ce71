use base64::Engine;
use hashfeed_core::{AppConfig, CoreError, SearchApiError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error, info};

const TOKEN_ENDPOINT: &str = "https://api.twitter.com/oauth2/token";
const LOGIN_BODY: &str = "grant_type=client_credentials";

/// The client-id/secret pair used for the application-only grant.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl From<&AppConfig> for AppCredentials {
    fn from(config: &AppConfig) -> Self {
        Self {
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
        }
    }
}

impl AppCredentials {
    /// Basic-auth material for the token exchange: each half is form-url
    /// encoded, joined with `:`, then base64 encoded without line wraps.
    pub fn basic_token(&self) -> String {
        let key: String =
            url::form_urlencoded::byte_serialize(self.consumer_key.as_bytes()).collect();
        let secret: String =
            url::form_urlencoded::byte_serialize(self.consumer_secret.as_bytes()).collect();
        base64::engine::general_purpose::STANDARD.encode(format!("{key}:{secret}"))
    }
}

/// Process-wide bearer token holder. Explicitly constructed and handed to
/// whoever needs it; readable synchronously from the search path.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, token: String) {
        debug!("saving bearer token");
        *self.inner.write().expect("token store lock poisoned") = Some(token);
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .expect("token store lock poisoned")
            .clone()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn clear(&self) {
        *self.inner.write().expect("token store lock poisoned") = None;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    access_token: String,
}

/// Performs the application-only login and saves the resulting bearer
/// token into the shared store.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http_client: Client,
    credentials: AppCredentials,
    token_store: TokenStore,
}

impl Authenticator {
    pub fn new(credentials: AppCredentials, token_store: TokenStore) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            credentials,
            token_store,
        }
    }

    pub async fn login(&self) -> Result<(), CoreError> {
        info!("exchanging app credentials for a bearer token");
        let response = self
            .http_client
            .post(TOKEN_ENDPOINT)
            .header(
                "Authorization",
                format!("Basic {}", self.credentials.basic_token()),
            )
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body(LOGIN_BODY)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "token exchange rejected");
            let err = if status.as_u16() == 401 || status.as_u16() == 403 {
                SearchApiError::InvalidToken
            } else {
                SearchApiError::RequestFailed {
                    status_code: status.as_u16(),
                    body,
                }
            };
            return Err(err.into());
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            error!("failed to parse token response: {e}");
            SearchApiError::InvalidResponse {
                details: "malformed token response".to_string(),
            }
        })?;

        if token.token_type != "bearer" {
            return Err(SearchApiError::InvalidResponse {
                details: format!("unexpected token_type: {}", token.token_type),
            }
            .into());
        }
        if token.access_token.trim().is_empty() {
            return Err(SearchApiError::InvalidResponse {
                details: "empty access_token".to_string(),
            }
            .into());
        }

        self.token_store.save(token.access_token);
        info!("login successful");
        Ok(())
    }
}
