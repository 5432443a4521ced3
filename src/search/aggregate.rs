//! Pure aggregation over collected results: per-domain counts, concentration, deduplication.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use super::types::SearchResult;
use crate::config::DuplicatePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Share of the collection held by its most frequent domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concentration {
    pub domain: String,
    pub count: usize,
    pub total: usize,
    pub ratio: f64,
}

impl Concentration {
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.ratio > threshold
    }
}

/// Results per hostname, most frequent first; ties sort by hostname.
pub fn domain_counts(results: &[SearchResult]) -> Vec<DomainCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for result in results {
        *counts.entry(result.source.as_str()).or_default() += 1;
    }
    let mut sorted: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount {
            domain: domain.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    sorted
}

pub fn concentration(results: &[SearchResult]) -> Option<Concentration> {
    let top = domain_counts(results).into_iter().next()?;
    let total = results.len();
    Some(Concentration {
        ratio: top.count as f64 / total as f64,
        domain: top.domain,
        count: top.count,
        total,
    })
}

/// Collapses results sharing an identical link. Output keeps the order in which
/// each link was first collected; `policy` decides whose fields survive.
pub fn deduplicate(results: Vec<SearchResult>, policy: DuplicatePolicy) -> Vec<SearchResult> {
    let before = results.len();
    let deduped = match policy {
        DuplicatePolicy::FirstSeen => {
            let mut seen = HashSet::new();
            results
                .into_iter()
                .filter(|r| seen.insert(r.link.clone()))
                .collect::<Vec<_>>()
        }
        DuplicatePolicy::LastSeen => {
            let mut slots: HashMap<String, usize> = HashMap::new();
            let mut out: Vec<SearchResult> = Vec::new();
            for result in results {
                match slots.get(&result.link) {
                    Some(&idx) => out[idx] = result,
                    None => {
                        slots.insert(result.link.clone(), out.len());
                        out.push(result);
                    }
                }
            }
            out
        }
    };
    debug!(before, after = deduped.len(), "deduplicated by link");
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::ResultKind;

    fn is_concentrated(results: &[SearchResult], threshold: f64) -> bool {
        concentration(results).is_some_and(|c| c.exceeds(threshold))
    }

    fn result(link: &str, source: &str, kind: ResultKind) -> SearchResult {
        SearchResult {
            title: format!("{source} story"),
            snippet: String::new(),
            link: link.into(),
            date: None,
            source: source.into(),
            kind,
        }
    }

    fn spread(counts: &[(&str, usize)]) -> Vec<SearchResult> {
        counts
            .iter()
            .flat_map(|(domain, n)| {
                (0..*n).map(move |i| result(&format!("https://{domain}/{i}"), domain, ResultKind::Web))
            })
            .collect()
    }

    #[test]
    fn counts_sort_by_frequency_then_name() {
        let results = spread(&[("b.com", 2), ("a.com", 2), ("c.com", 3)]);
        let counts = domain_counts(&results);
        let order: Vec<_> = counts.iter().map(|c| (c.domain.as_str(), c.count)).collect();
        assert_eq!(order, vec![("c.com", 3), ("a.com", 2), ("b.com", 2)]);
    }

    #[test]
    fn dominant_domain_is_concentrated() {
        let results = spread(&[("prnewswire.com", 6), ("ft.com", 2), ("wsj.com", 2)]);
        let c = concentration(&results).unwrap();
        assert_eq!(c.domain, "prnewswire.com");
        assert_eq!(c.total, 10);
        assert!((c.ratio - 0.6).abs() < f64::EPSILON);
        assert!(is_concentrated(&results, 0.5));
    }

    #[test]
    fn exactly_half_is_not_concentrated() {
        let results = spread(&[("prnewswire.com", 5), ("ft.com", 5)]);
        assert!(!is_concentrated(&results, 0.5));
    }

    #[test]
    fn balanced_results_are_not_concentrated() {
        let results = spread(&[("a.com", 3), ("b.com", 3), ("c.com", 4)]);
        assert!(!is_concentrated(&results, 0.5));
    }

    #[test]
    fn empty_collection_has_no_concentration() {
        assert!(concentration(&[]).is_none());
        assert!(!is_concentrated(&[], 0.5));
    }

    #[test]
    fn first_seen_keeps_earliest_copy() {
        let results = vec![
            result("https://a.com/1", "a.com", ResultKind::UrlExtracted),
            result("https://b.com/1", "b.com", ResultKind::News),
            result("https://a.com/1", "a.com", ResultKind::Web),
        ];

        let deduped = deduplicate(results, DuplicatePolicy::FirstSeen);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].kind, ResultKind::UrlExtracted);
        assert_eq!(deduped[1].link, "https://b.com/1");
    }

    #[test]
    fn last_seen_overwrites_in_place() {
        let results = vec![
            result("https://a.com/1", "a.com", ResultKind::UrlExtracted),
            result("https://b.com/1", "b.com", ResultKind::News),
            result("https://a.com/1", "a.com", ResultKind::Web),
        ];

        let deduped = deduplicate(results, DuplicatePolicy::LastSeen);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].link, "https://a.com/1");
        assert_eq!(deduped[0].kind, ResultKind::Web);
    }

    #[test]
    fn deduplicated_links_are_unique() {
        let mut results = spread(&[("a.com", 4), ("b.com", 3)]);
        results.extend(spread(&[("a.com", 2), ("b.com", 5)]));

        for policy in [DuplicatePolicy::FirstSeen, DuplicatePolicy::LastSeen] {
            let deduped = deduplicate(results.clone(), policy);
            let unique: HashSet<_> = deduped.iter().map(|r| r.link.as_str()).collect();
            assert_eq!(unique.len(), deduped.len());
            assert_eq!(deduped.len(), 9);
        }
    }
}
