use serde::Serialize;

use crate::config::Phase;
use crate::serper::types::SearchType;

/// Which sweep produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Web,
    News,
    Image,
    SiteSpecific,
    Alternative,
    ForcedDomain,
    UrlExtracted,
}

impl ResultKind {
    /// Kind assigned to main-sweep hits of the given provider type.
    pub fn for_type(search_type: SearchType) -> Self {
        match search_type {
            SearchType::Search => ResultKind::Web,
            SearchType::News => ResultKind::News,
            SearchType::Images => ResultKind::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Hostname of `link`, lowercased, without a leading `www.`.
    pub source: String,
    pub kind: ResultKind,
}

/// One provider call as seen by the engine. Failed calls keep `hits == 0` and carry the error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub phase: Phase,
    pub query: String,
    pub kind: ResultKind,
    #[serde(rename = "type")]
    pub search_type: SearchType,
    pub start: usize,
    pub num: usize,
    pub hits: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallRecord {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Ordered, duplicate-free list of queries to execute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    queries: Vec<String>,
}

impl QueryPlan {
    /// Appends a query unless it is blank or already planned.
    pub fn push(&mut self, query: impl Into<String>) -> bool {
        let query = query.into().trim().to_string();
        if query.is_empty() || self.queries.contains(&query) {
            return false;
        }
        self.queries.push(query);
        true
    }

    #[cfg(test)]
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ResultKind::ForcedDomain).unwrap();
        assert_eq!(json, r#""forced_domain""#);
    }

    #[test]
    fn main_sweep_kinds_follow_type() {
        assert_eq!(ResultKind::for_type(SearchType::Search), ResultKind::Web);
        assert_eq!(ResultKind::for_type(SearchType::News), ResultKind::News);
        assert_eq!(ResultKind::for_type(SearchType::Images), ResultKind::Image);
    }

    #[test]
    fn query_plan_skips_blank_and_duplicate_queries() {
        let mut plan = QueryPlan::default();
        assert!(plan.push("site:ft.com acme"));
        assert!(!plan.push("  site:ft.com acme "));
        assert!(!plan.push("   "));
        assert!(plan.push("\"Acme Corp\" acme"));
        assert_eq!(plan.queries(), ["site:ft.com acme", "\"Acme Corp\" acme"]);
    }

    #[test]
    fn result_omits_missing_date() {
        let result = SearchResult {
            title: "t".into(),
            snippet: "s".into(),
            link: "https://a.com/x".into(),
            date: None,
            source: "a.com".into(),
            kind: ResultKind::Web,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("date").is_none());
        assert_eq!(json["kind"], "web");
    }
}
