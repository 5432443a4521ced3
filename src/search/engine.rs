use serde::Serialize;
use tracing::info;

use super::aggregate::{Concentration, DomainCount, concentration, deduplicate, domain_counts};
use super::discover::discover_sites;
use super::domain::{DomainSet, host_of, is_trusted};
use super::expand::{enrich_query, expand, key_terms, seed_queries, top_bigrams};
use super::pacer::Pacer;
use super::run_calls;
use super::types::{CallRecord, QueryPlan, ResultKind, SearchResult};
use crate::config::{Phase, SearchPolicy};
use crate::fetch::PageSource;
use crate::serper::client::SearchProvider;
use crate::serper::types::{SearchRequest, SearchType};

pub const DEFAULT_NUM_RESULTS: usize = 300;

/// Main-sweep types, in execution order.
const MAIN_TYPES: [SearchType; 3] = [SearchType::News, SearchType::Search, SearchType::Images];

#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub query: String,
    /// Drives main-sweep pagination; the final collection may be larger or smaller.
    pub num_results: usize,
    pub seed_url: Option<String>,
}

impl SweepRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_results: DEFAULT_NUM_RESULTS,
            seed_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    /// Query after seed-step enrichment; equals `query` without a seed URL.
    pub effective_query: String,
    pub requested: usize,
    /// Results gathered before deduplication.
    pub collected: usize,
    pub results: Vec<SearchResult>,
    pub domains: Vec<DomainCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concentration: Option<Concentration>,
    /// Whether the concentration check fired and forced anchor searches were planned.
    pub rebalanced: bool,
    pub calls: Vec<CallRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("num_results must be greater than 0")]
    ZeroResults,
}

/// Runs the full sweep pipeline for one query.
///
/// Individual provider failures never fail the search; they show up in
/// `SearchOutcome::calls` with their error and add no results.
pub async fn search(
    provider: &impl SearchProvider,
    pages: &impl PageSource,
    policy: &SearchPolicy,
    request: &SweepRequest,
) -> Result<SearchOutcome, SearchError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    if request.num_results == 0 {
        return Err(SearchError::ZeroResults);
    }

    let pacer = Pacer::new(policy.concurrency, policy.delays.jitter_ms);
    let mut sweep = Sweep::default();
    let mut effective_query = query.to_string();
    let mut discovered = None;

    if let Some(seed_url) = request.seed_url.as_deref() {
        let seed = seed_step(provider, pages, &pacer, policy, query, seed_url).await;
        effective_query = enrich_query(query, &seed.key_terms);
        discovered = Some(seed.domains);
        sweep.absorb(seed.sweep);
    }

    let pages_per_type = request.num_results.div_ceil(policy.page_size);
    let main = main_sweep(provider, &pacer, policy, &effective_query, pages_per_type).await;

    let site_domains = match discovered {
        Some(domains) => domains,
        None => domains_from_results(&main.results, policy),
    };
    let site_pages = policy.site_pages.min(pages_per_type);
    let site_requests = site_domains.iter().flat_map(|domain| {
        let q = format!("site:{domain} {effective_query}");
        (0..site_pages).map(move |page| {
            SearchRequest::page(q.clone(), SearchType::Search, policy.page_size, page * policy.page_size)
        })
    });
    let site = Sweep::run(
        provider,
        &pacer,
        policy,
        Phase::Site,
        ResultKind::SiteSpecific,
        site_requests,
    )
    .await;

    let titles = main.results.iter().take(policy.bigram_window).map(|r| r.title.as_str());
    let bigrams = top_bigrams(titles, &effective_query, policy.bigram_count);
    let plan = alternative_queries(&effective_query, &policy.alternative_phrasings, &bigrams);
    let alternative_requests = plan
        .into_vec()
        .into_iter()
        .map(|q| SearchRequest::web(q, policy.page_size));
    let alternative = Sweep::run(
        provider,
        &pacer,
        policy,
        Phase::Alternative,
        ResultKind::Alternative,
        alternative_requests,
    )
    .await;

    info!(
        domains = site_domains.len(),
        main = main.results.len(),
        site = site.results.len(),
        alternative = alternative.results.len(),
        "sweeps complete"
    );
    sweep.absorb(main);
    sweep.absorb(site);
    sweep.absorb(alternative);

    let rebalanced = match concentration(&sweep.results) {
        Some(c) if c.exceeds(policy.concentration_threshold) => {
            let anchors = underrepresented_anchors(&sweep.results, policy);
            info!(
                domain = %c.domain,
                ratio = c.ratio,
                anchors = anchors.len(),
                "results concentrated, forcing anchor domains"
            );
            let forced_requests = anchors.iter().map(|anchor| {
                SearchRequest::web(format!("site:{anchor} {effective_query}"), policy.forced_results)
            });
            let forced = Sweep::run(
                provider,
                &pacer,
                policy,
                Phase::Forced,
                ResultKind::ForcedDomain,
                forced_requests,
            )
            .await;
            sweep.absorb(forced);
            true
        }
        _ => false,
    };

    let collected = sweep.results.len();
    let results = deduplicate(sweep.results, policy.duplicates);
    let failed = sweep.calls.iter().filter(|c| c.failed()).count();
    info!(
        query,
        calls = sweep.calls.len(),
        failed,
        collected,
        unique = results.len(),
        "search complete"
    );

    Ok(SearchOutcome {
        query: query.to_string(),
        effective_query,
        requested: request.num_results,
        collected,
        domains: domain_counts(&results),
        concentration: concentration(&results),
        results,
        rebalanced,
        calls: sweep.calls,
    })
}

/// Results and call records of one or more sweeps, in execution order.
#[derive(Debug, Default)]
struct Sweep {
    results: Vec<SearchResult>,
    calls: Vec<CallRecord>,
}

impl Sweep {
    async fn run<I>(
        provider: &impl SearchProvider,
        pacer: &Pacer,
        policy: &SearchPolicy,
        phase: Phase,
        kind: ResultKind,
        requests: I,
    ) -> Self
    where
        I: IntoIterator<Item = SearchRequest>,
    {
        let (results, calls) = run_calls(provider, pacer, &policy.delays, phase, kind, requests).await;
        Self { results, calls }
    }

    fn absorb(&mut self, other: Sweep) {
        self.results.extend(other.results);
        self.calls.extend(other.calls);
    }
}

struct SeedStep {
    sweep: Sweep,
    domains: Vec<String>,
    key_terms: Vec<String>,
}

async fn seed_step(
    provider: &impl SearchProvider,
    pages: &impl PageSource,
    pacer: &Pacer,
    policy: &SearchPolicy,
    query: &str,
    seed_url: &str,
) -> SeedStep {
    let expansion = expand(pages, seed_url, policy.max_entities).await;
    let discovery = discover_sites(
        provider,
        pacer,
        policy,
        &expansion.entities,
        expansion.title.as_deref(),
    )
    .await;

    let seed_host = host_of(seed_url);
    let plan = seed_queries(&expansion, query, seed_host.as_deref());
    let requests = plan
        .into_vec()
        .into_iter()
        .map(|q| SearchRequest::web(q, policy.page_size));
    let seeded = Sweep::run(
        provider,
        pacer,
        policy,
        Phase::Seed,
        ResultKind::UrlExtracted,
        requests,
    )
    .await;
    let key_terms = key_terms(&seeded.results, query, policy.key_term_count);
    info!(
        entities = expansion.entities.len(),
        results = seeded.results.len(),
        ?key_terms,
        "seed step complete"
    );

    let mut sweep = Sweep {
        results: Vec::new(),
        calls: discovery.calls,
    };
    sweep.absorb(seeded);
    SeedStep {
        sweep,
        domains: discovery.domains,
        key_terms,
    }
}

async fn main_sweep(
    provider: &impl SearchProvider,
    pacer: &Pacer,
    policy: &SearchPolicy,
    query: &str,
    pages: usize,
) -> Sweep {
    let mut sweep = Sweep::default();
    for search_type in MAIN_TYPES {
        let requests = (0..pages)
            .map(|page| SearchRequest::page(query, search_type, policy.page_size, page * policy.page_size));
        let part = Sweep::run(
            provider,
            pacer,
            policy,
            Phase::Main,
            ResultKind::for_type(search_type),
            requests,
        )
        .await;
        sweep.absorb(part);
    }
    sweep
}

/// Trusted sites plus up to `extra_site_domains` new hosts from the leading main-sweep results.
fn domains_from_results(results: &[SearchResult], policy: &SearchPolicy) -> Vec<String> {
    let mut domains = DomainSet::seeded(&policy.trusted_sites);
    let mut added = 0;
    for result in results.iter().take(policy.extra_site_window) {
        if added >= policy.extra_site_domains {
            break;
        }
        if domains.insert(&result.source) {
            added += 1;
        }
    }
    domains.prioritized(&policy.trusted_sites)
}

fn alternative_queries(query: &str, phrasings: &[String], bigrams: &[String]) -> QueryPlan {
    let mut plan = QueryPlan::default();
    for suffix in phrasings.iter().chain(bigrams) {
        plan.push(format!("{query} {suffix}"));
    }
    plan
}

/// Anchors holding fewer than `min_anchor_results` results, subdomains included.
fn underrepresented_anchors<'a>(results: &[SearchResult], policy: &'a SearchPolicy) -> Vec<&'a str> {
    policy
        .anchor_domains
        .iter()
        .filter(|anchor| {
            let held = results
                .iter()
                .filter(|r| is_trusted(&r.source, std::slice::from_ref(*anchor)))
                .count();
            held < policy.min_anchor_results
        })
        .map(String::as_str)
        .collect()
}
