use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ErrorBody, SearchRequest, SearchResponse};

const API_BASE: &str = "https://google.serper.dev";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum SerperError {
    #[error("SERPER_API_KEY not set. Get one at https://serper.dev")]
    ApiKeyNotSet,

    #[error("search API rate limit exceeded")]
    RateLimited,

    #[error("search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Abstraction over the web search API.
/// Implemented by `SerperClient` for production; mock implementations used in tests.
pub trait SearchProvider {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SerperError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone, Debug)]
pub struct SerperClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl SerperClient {
    pub fn from_env(http: Client) -> Result<Self, SerperError> {
        let api_key = env::var("SERPER_API_KEY").map_err(|_| SerperError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(SerperError::ApiKeyNotSet);
        }
        let base_url = env::var("SERPER_BASE_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| API_BASE.to_string());
        Ok(Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            base_url,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            base_url: base_url.to_string(),
        }
    }
}

impl SearchProvider for SerperClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SerperError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("X-API-KEY", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("search API rate limited");
            return Err(SerperError::RateLimited);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text));
        }

        let body: SearchResponse = serde_json::from_str(&text)?;
        debug!(
            q = %request.q,
            search_type = ?request.search_type,
            start = request.start,
            organic = body.organic.len(),
            news = body.news.len(),
            images = body.images.len(),
            "search call complete"
        );
        Ok(body)
    }
}

fn classify_error(status: u16, text: &str) -> SerperError {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(text)
        && let Some(message) = body.message
    {
        let code = body.status_code.unwrap_or(status);
        if code == 429 {
            return SerperError::RateLimited;
        }
        warn!(code, %message, "search API error");
        return SerperError::Api { code, message };
    }
    let end = text.floor_char_boundary(200);
    warn!(status, "search API error (no structured body)");
    SerperError::Api {
        code: status,
        message: format!("HTTP {status}: {}", &text[..end]),
    }
}
