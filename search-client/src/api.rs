use crate::auth::TokenStore;
use hashfeed_core::{CoreError, Post, SearchApiError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

const SEARCH_ENDPOINT: &str = "https://api.twitter.com/1.1/search/tweets.json";

/// One page of search results: a JSON object with a `statuses` array.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub statuses: Vec<StatusData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub id: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub retweet_count: Option<CountField>,
    #[serde(default)]
    pub favorite_count: Option<CountField>,
    #[serde(default)]
    pub user: Option<UserData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub profile_image_url_https: String,
}

/// The API has served counts both as JSON numbers and as strings across
/// versions; either way they are opaque display text downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CountField {
    Number(u64),
    Text(String),
}

impl CountField {
    fn into_display(self) -> String {
        match self {
            CountField::Number(n) => n.to_string(),
            CountField::Text(s) => s,
        }
    }
}

impl From<StatusData> for Post {
    fn from(status: StatusData) -> Self {
        let (author_name, author_handle, image_url) = match status.user {
            Some(user) => (user.name, user.screen_name, user.profile_image_url_https),
            None => Default::default(),
        };
        Self {
            id: status.id,
            author_name,
            author_handle,
            body: status.text,
            created_at: status.created_at,
            image_url,
            retweet_count: status
                .retweet_count
                .map(CountField::into_display)
                .unwrap_or_default(),
            favorite_count: status
                .favorite_count
                .map(CountField::into_display)
                .unwrap_or_default(),
        }
    }
}

/// Client for the hashtag search endpoint. Stateless apart from the shared
/// HTTP connection pool and the injected token store; it never touches the
/// timeline or the image cache.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http_client: Client,
    token_store: TokenStore,
    page_size: u32,
}

impl SearchClient {
    pub fn new(token_store: TokenStore, page_size: u32) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            token_store,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch one page of posts containing `#query`.
    ///
    /// `since_id` restricts to posts newer than it; `max_id` restricts to
    /// posts at-or-older than it (inclusive, the API's convention — the
    /// caller owns the boundary arithmetic). A bound of 0 or `None` is
    /// omitted. Fails fast without a network call on an empty query or a
    /// missing bearer token; never retries.
    pub async fn fetch(
        &self,
        query: &str,
        since_id: Option<u64>,
        max_id: Option<u64>,
    ) -> Result<Vec<Post>, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "empty search query".to_string(),
            });
        }

        let token = self
            .token_store
            .get()
            .ok_or(SearchApiError::MissingToken)?;

        let params = self.build_query(query, since_id, max_id);
        info!(query, ?since_id, ?max_id, "fetching search page");

        let response = self
            .http_client
            .get(SEARCH_ENDPOINT)
            .bearer_auth(&token)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!(query, "search request failed: {e}");
                if e.is_timeout() {
                    CoreError::SearchApi(SearchApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // Capture the error body for diagnostics before failing.
            let body = response.text().await.unwrap_or_default();
            error!(query, status = status.as_u16(), %body, "search request rejected");
            let err = if status.as_u16() == 401 {
                SearchApiError::InvalidToken
            } else if status.is_server_error() {
                SearchApiError::ServerError {
                    status_code: status.as_u16(),
                }
            } else {
                SearchApiError::RequestFailed {
                    status_code: status.as_u16(),
                    body,
                }
            };
            return Err(err.into());
        }

        let page: SearchResponse = response.json().await.map_err(|e| {
            error!(query, "failed to parse search response: {e}");
            SearchApiError::InvalidResponse {
                details: format!("malformed search response for #{query}"),
            }
        })?;

        debug!(query, count = page.statuses.len(), "search page parsed");
        Ok(page.statuses.into_iter().map(Post::from).collect())
    }

    pub(crate) fn build_query(
        &self,
        query: &str,
        since_id: Option<u64>,
        max_id: Option<u64>,
    ) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(4);
        params.push(("q".to_string(), format!("#{query}")));
        params.push(("count".to_string(), self.page_size.to_string()));
        if let Some(since_id) = since_id.filter(|id| *id > 0) {
            params.push(("since_id".to_string(), since_id.to_string()));
        }
        if let Some(max_id) = max_id.filter(|id| *id > 0) {
            params.push(("max_id".to_string(), max_id.to_string()));
        }
        params
    }
}
