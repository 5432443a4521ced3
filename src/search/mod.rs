//! Deal search pipeline: query expansion, site discovery, paced multi-source sweeps,
//! and aggregation of the collected results.

pub(crate) mod aggregate;
pub(crate) mod discover;
pub(crate) mod domain;
pub(crate) mod engine;
pub(crate) mod expand;
pub(crate) mod pacer;
pub(crate) mod report;
pub(crate) mod types;

use tracing::{debug, warn};

use crate::config::{DelayPolicy, Phase};
use crate::serper::client::SearchProvider;
use crate::serper::hits::collect_results;
use crate::serper::types::SearchRequest;
use pacer::Pacer;
use types::{CallRecord, ResultKind, SearchResult};

/// Executes `requests` through the pacer and flattens the hits, tagged with `kind`.
///
/// A failed call is logged and recorded with its error; it contributes no results
/// and never aborts the batch.
pub(crate) async fn run_calls<I>(
    provider: &impl SearchProvider,
    pacer: &Pacer,
    delays: &DelayPolicy,
    phase: Phase,
    kind: ResultKind,
    requests: I,
) -> (Vec<SearchResult>, Vec<CallRecord>)
where
    I: IntoIterator<Item = SearchRequest>,
{
    let outcomes = pacer
        .run(requests, delays.for_phase(phase), move |request| async move {
            let outcome = provider.search(&request).await;
            (request, outcome)
        })
        .await;

    let mut results = Vec::new();
    let mut calls = Vec::with_capacity(outcomes.len());
    for (request, outcome) in outcomes {
        let (hits, error) = match outcome {
            Ok(response) => (collect_results(&response, kind), None),
            Err(e) => {
                warn!(?phase, query = %request.q, error = %e, "search call failed (continuing)");
                (Vec::new(), Some(e.to_string()))
            }
        };
        debug!(
            ?phase,
            query = %request.q,
            search_type = ?request.search_type,
            start = request.start,
            hits = hits.len(),
            "search call"
        );
        calls.push(CallRecord {
            phase,
            query: request.q,
            kind,
            search_type: request.search_type,
            start: request.start,
            num: request.num,
            hits: hits.len(),
            error,
        });
        results.extend(hits);
    }
    (results, calls)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use crate::fetch::{FetchError, PageSource};
    use crate::serper::client::{SearchProvider, SerperError};
    use crate::serper::types::{Hit, SearchRequest, SearchResponse};

    type Handler = Box<dyn Fn(&SearchRequest) -> Result<SearchResponse, SerperError>>;

    /// Provider answering every call through `handler` and remembering what was asked.
    pub struct MockProvider {
        handler: Handler,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl MockProvider {
        pub fn new(
            handler: impl Fn(&SearchRequest) -> Result<SearchResponse, SerperError> + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<SearchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl SearchProvider for MockProvider {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SerperError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.handler)(request)
        }
    }

    pub fn organic(links: &[&str]) -> SearchResponse {
        SearchResponse {
            organic: links
                .iter()
                .map(|link| Hit {
                    title: Some("Acme Corp closes growth round".into()),
                    snippet: Some("Growth equity round led by Northwind Partners.".into()),
                    link: Some(link.to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Seed page with fixed HTML, or `None` for a page that cannot be fetched.
    pub struct StaticPage(pub Option<String>);

    impl PageSource for StaticPage {
        async fn fetch_html(&self, _url: &str) -> Result<String, FetchError> {
            self.0.clone().ok_or(FetchError::Status(404))
        }
    }
}
