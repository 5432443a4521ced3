//! Site discovery: exploratory entity/deal-term searches that grow a domain set
//! seeded with the trusted list.

use tracing::{debug, info};

use super::domain::DomainSet;
use super::pacer::Pacer;
use super::run_calls;
use super::types::{CallRecord, QueryPlan, ResultKind};
use crate::config::{Phase, SearchPolicy};
use crate::serper::client::SearchProvider;
use crate::serper::types::SearchRequest;

/// Qualifiers paired with each entity, unquoted, to surface financial coverage.
const FINANCIAL_QUALIFIERS: [&str; 4] = ["acquisition", "investor", "funding", "financial"];
const DISCOVERY_RESULTS: usize = 100;

#[derive(Debug)]
pub struct Discovery {
    /// Trusted domains first, then newly discovered ones in discovery order.
    pub domains: Vec<String>,
    pub calls: Vec<CallRecord>,
}

pub fn discovery_queries(entities: &[String], title: Option<&str>, deal_terms: &[String]) -> QueryPlan {
    let mut plan = QueryPlan::default();
    if let Some(title) = title {
        plan.push(format!("\"{title}\""));
    }
    for entity in entities {
        for term in deal_terms {
            plan.push(format!("\"{entity}\" \"{term}\""));
        }
    }
    for entity in entities {
        for qualifier in FINANCIAL_QUALIFIERS {
            plan.push(format!("{entity} {qualifier}"));
        }
    }
    plan
}

pub async fn discover_sites(
    provider: &impl SearchProvider,
    pacer: &Pacer,
    policy: &SearchPolicy,
    entities: &[String],
    title: Option<&str>,
) -> Discovery {
    let plan = discovery_queries(entities, title, &policy.deal_terms);
    if plan.is_empty() {
        debug!("seed page gave nothing to discover from");
    }
    let requests = plan
        .into_vec()
        .into_iter()
        .map(|q| SearchRequest::web(q, DISCOVERY_RESULTS));

    // Discovery hits only feed the domain set; they are not part of the collection.
    let (hits, calls) = run_calls(
        provider,
        pacer,
        &policy.delays,
        Phase::Discovery,
        ResultKind::Web,
        requests,
    )
    .await;

    let mut domains = DomainSet::seeded(&policy.trusted_sites);
    let seeded = domains.len();
    for hit in &hits {
        if domains.insert(&hit.source) {
            debug!(domain = %hit.source, "discovered site");
        }
    }

    info!(
        queries = calls.len(),
        discovered = domains.len() - seeded,
        "site discovery complete"
    );

    Discovery {
        domains: domains.prioritized(&policy.trusted_sites),
        calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::test_support::{MockProvider, organic};

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn queries_cover_title_pairs_and_qualifiers() {
        let plan = discovery_queries(
            &terms(&["Acme Corp"]),
            Some("Acme Corp Raises $50 million"),
            &terms(&["acquisition", "funding"]),
        );

        assert_eq!(
            plan.queries(),
            [
                "\"Acme Corp Raises $50 million\"",
                "\"Acme Corp\" \"acquisition\"",
                "\"Acme Corp\" \"funding\"",
                "Acme Corp acquisition",
                "Acme Corp investor",
                "Acme Corp funding",
                "Acme Corp financial",
            ]
        );
    }

    #[test]
    fn no_entities_and_no_title_plans_nothing() {
        assert!(discovery_queries(&[], None, &terms(&["deal"])).is_empty());
    }

    #[tokio::test]
    async fn discovered_domains_follow_trusted_seeds() {
        let provider = MockProvider::new(|req| {
            if req.q.contains("investor") {
                Ok(organic(&[
                    "https://blog.dealflow.io/acme",
                    "https://www.reuters.com/acme",
                    "https://smallcapnews.net/acme",
                ]))
            } else {
                Ok(organic(&["https://www.fintechweekly.com/acme"]))
            }
        });
        let policy = SearchPolicy {
            trusted_sites: terms(&["reuters.com", "ft.com"]),
            deal_terms: terms(&["funding"]),
            delays: crate::config::DelayPolicy::none(),
            ..Default::default()
        };

        let discovery =
            discover_sites(&provider, &Pacer::new(1, 0), &policy, &terms(&["Acme"]), None).await;

        assert_eq!(
            discovery.domains,
            terms(&[
                "reuters.com",
                "ft.com",
                "fintechweekly.com",
                "blog.dealflow.io",
                "smallcapnews.net",
            ])
        );
        assert_eq!(discovery.calls.len(), 5);
        assert!(discovery.calls.iter().all(|c| c.num == DISCOVERY_RESULTS));
    }

    #[tokio::test]
    async fn failed_discovery_queries_are_skipped() {
        let provider = MockProvider::new(|req| {
            if req.q.contains("acquisition") {
                Err(crate::serper::client::SerperError::RateLimited)
            } else {
                Ok(organic(&["https://dealbook.example.org/a"]))
            }
        });
        let policy = SearchPolicy {
            trusted_sites: terms(&["ft.com"]),
            deal_terms: terms(&["merger"]),
            delays: crate::config::DelayPolicy::none(),
            ..Default::default()
        };

        let discovery =
            discover_sites(&provider, &Pacer::new(1, 0), &policy, &terms(&["Acme"]), None).await;

        assert_eq!(discovery.domains, terms(&["ft.com", "dealbook.example.org"]));
        assert_eq!(discovery.calls.iter().filter(|c| c.failed()).count(), 1);
    }
}
