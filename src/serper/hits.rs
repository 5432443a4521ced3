use tracing::debug;

use super::types::{Hit, ImageHit, SearchResponse};
use crate::search::domain::{host_of, normalize_domain};
use crate::search::types::{ResultKind, SearchResult};

/// Flattens a provider response into results tagged with `kind`.
///
/// Hits without a usable link are dropped. Image hits are keyed by the page
/// that hosts the image, not the image file itself.
pub fn collect_results(response: &SearchResponse, kind: ResultKind) -> Vec<SearchResult> {
    let web = response.organic.iter().chain(&response.news);
    let mut results: Vec<SearchResult> = web.filter_map(|hit| from_hit(hit, kind)).collect();
    results.extend(response.images.iter().filter_map(|hit| from_image(hit, kind)));

    let total = response.organic.len() + response.news.len() + response.images.len();
    if results.len() < total {
        debug!(dropped = total - results.len(), "skipped hits without link");
    }
    results
}

fn from_hit(hit: &Hit, kind: ResultKind) -> Option<SearchResult> {
    let link = hit.link.as_ref().filter(|l| !l.trim().is_empty())?.clone();
    let source = resolve_source(&link, hit.source.as_deref())?;
    Some(SearchResult {
        title: hit.title.clone().unwrap_or_default(),
        snippet: hit.snippet.clone().unwrap_or_default(),
        date: hit.date.clone().filter(|d| !d.is_empty()),
        link,
        source,
        kind,
    })
}

fn from_image(hit: &ImageHit, kind: ResultKind) -> Option<SearchResult> {
    let link = hit
        .link
        .as_ref()
        .or(hit.image_url.as_ref())
        .filter(|l| !l.trim().is_empty())?
        .clone();
    let fallback = hit.domain.as_deref().or(hit.source.as_deref());
    let source = resolve_source(&link, fallback)?;
    Some(SearchResult {
        title: hit.title.clone().unwrap_or_default(),
        snippet: String::new(),
        date: None,
        link,
        source,
        kind,
    })
}

/// Hostname of the link, else the provider's domain field when it is itself a hostname.
/// Publisher names such as `PR Newswire` are not usable as a source.
fn resolve_source(link: &str, fallback: Option<&str>) -> Option<String> {
    host_of(link).or_else(|| {
        fallback
            .map(normalize_domain)
            .filter(|s| is_hostname(s))
    })
}

fn is_hostname(s: &str) -> bool {
    s.contains('.') && matches!(url::Host::parse(s), Ok(url::Host::Domain(_)))
}
