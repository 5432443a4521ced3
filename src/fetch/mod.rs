//! Seed page download for query expansion.

mod ssrf;

pub(crate) use ssrf::TokioDnsResolver;

use std::time::Duration;

use encoding_rs::Encoding;
use reqwest::Client;
use ssrf::{DnsResolver, redact_url_credentials, ssrf_check};
use tracing::debug;

const MAX_RESPONSE_BYTES: usize = 5_000_000;
const SEED_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Seed pages are fetched the way a browser would; many news sites reject bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("blocked: internal/private host not allowed")]
    InternalHost,

    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("fetch failed: status {0}")]
    Status(u16),

    #[error("response too large (>{} bytes)", MAX_RESPONSE_BYTES)]
    TooLarge,

    #[error("{0}")]
    Timeout(String),
}

/// Source of raw HTML for a seed URL.
/// Implemented by `HttpPageSource` for production; tests supply canned pages.
pub trait PageSource {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpPageSource {
    http: Client,
}

impl HttpPageSource {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::timeout(SEED_FETCH_TIMEOUT, fetch_html(&self.http, url, &TokioDnsResolver))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout(format!(
                    "seed fetch timed out after {}s",
                    SEED_FETCH_TIMEOUT.as_secs()
                )))
            })
    }
}

pub(crate) async fn fetch_html(
    client: &Client,
    url: &str,
    resolver: &impl DnsResolver,
) -> Result<String, FetchError> {
    ssrf_check(url, resolver).await?;

    let (final_url, html) = download(client, url).await?;

    if final_url != url {
        ssrf_check(&final_url, resolver).await?;
    }

    debug!(url = %redact_url_credentials(&final_url), bytes = html.len(), "seed page fetched");
    Ok(html)
}

async fn download(client: &Client, url: &str) -> Result<(String, String), FetchError> {
    let response = client
        .get(url)
        .header("User-Agent", BROWSER_USER_AGENT)
        .header("Accept", "text/html,application/xhtml+xml")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let final_url = response.url().to_string();
    let charset = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_from_content_type);

    if let Some(len) = response.content_length()
        && len as usize > MAX_RESPONSE_BYTES
    {
        return Err(FetchError::TooLarge);
    }

    let mut body = Vec::new();
    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_RESPONSE_BYTES {
            return Err(FetchError::TooLarge);
        }
    }

    Ok((final_url, decode_body(&body, charset.as_deref())))
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Decodes with the declared charset, falling back to UTF-8 (BOM sniffing wins over both).
fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|c| Encoding::for_label(c.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}
