//! Search policy: every tunable of the sweep pipeline, with defaults.
//!
//! A policy can be loaded from a JSON file; fields missing from the file keep
//! their defaults. CLI flags are applied on top by `main`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::domain::normalize_domain;

const TRUSTED_SITES: [&str; 24] = [
    "reuters.com",
    "bloomberg.com",
    "wsj.com",
    "ft.com",
    "cnbc.com",
    "forbes.com",
    "businessinsider.com",
    "techcrunch.com",
    "crunchbase.com",
    "pitchbook.com",
    "prnewswire.com",
    "businesswire.com",
    "globenewswire.com",
    "marketwatch.com",
    "finance.yahoo.com",
    "seekingalpha.com",
    "axios.com",
    "fortune.com",
    "barrons.com",
    "economist.com",
    "nytimes.com",
    "sec.gov",
    "pehub.com",
    "privateequitywire.co.uk",
];

const ANCHOR_DOMAINS: [&str; 5] = [
    "reuters.com",
    "bloomberg.com",
    "wsj.com",
    "ft.com",
    "cnbc.com",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read policy file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid policy file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Which copy of a duplicated link survives deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Earliest sweep wins; targeted sweeps run first, so their tags survive.
    #[default]
    FirstSeen,
    LastSeen,
}

/// Pause after each provider call, per call type, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayPolicy {
    pub seed_ms: u64,
    pub discovery_ms: u64,
    pub main_ms: u64,
    pub site_ms: u64,
    pub alternative_ms: u64,
    pub forced_ms: u64,
    /// Upper bound of random extra delay added to every pause.
    pub jitter_ms: u64,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            seed_ms: 300,
            discovery_ms: 500,
            main_ms: 1000,
            site_ms: 500,
            alternative_ms: 500,
            forced_ms: 200,
            jitter_ms: 0,
        }
    }
}

impl DelayPolicy {
    pub fn none() -> Self {
        Self {
            seed_ms: 0,
            discovery_ms: 0,
            main_ms: 0,
            site_ms: 0,
            alternative_ms: 0,
            forced_ms: 0,
            jitter_ms: 0,
        }
    }
}

/// Stage of the sweep pipeline a provider call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Seed,
    Discovery,
    Main,
    Site,
    Alternative,
    Forced,
}

impl DelayPolicy {
    pub fn for_phase(&self, phase: Phase) -> Duration {
        let ms = match phase {
            Phase::Seed => self.seed_ms,
            Phase::Discovery => self.discovery_ms,
            Phase::Main => self.main_ms,
            Phase::Site => self.site_ms,
            Phase::Alternative => self.alternative_ms,
            Phase::Forced => self.forced_ms,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPolicy {
    /// Seed of the domain set; searched explicitly with `site:` and sorted first.
    pub trusted_sites: Vec<String>,
    /// Domains forced into the result set when one host dominates.
    pub anchor_domains: Vec<String>,
    /// Share of results above which the top domain counts as dominant.
    pub concentration_threshold: f64,
    /// Anchors with at least this many results are not forced.
    pub min_anchor_results: usize,
    /// `num` for each forced anchor search.
    pub forced_results: usize,
    /// Results requested per provider call; also the pagination stride.
    pub page_size: usize,
    /// Max pages per domain in the site-specific sweep.
    pub site_pages: usize,
    /// New domains taken from main-sweep results when no seed URL is given.
    pub extra_site_domains: usize,
    /// How many leading main-sweep results to mine for extra domains.
    pub extra_site_window: usize,
    pub deal_terms: Vec<String>,
    /// Suffixes appended to the query in the alternative-phrasing sweep.
    pub alternative_phrasings: Vec<String>,
    pub bigram_count: usize,
    /// Leading main-sweep titles mined for bigrams.
    pub bigram_window: usize,
    /// Frequent words appended to the main query after the seed step.
    pub key_term_count: usize,
    pub max_entities: usize,
    /// Provider calls allowed in flight at once.
    pub concurrency: usize,
    pub delays: DelayPolicy,
    pub duplicates: DuplicatePolicy,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            trusted_sites: TRUSTED_SITES.iter().map(|s| s.to_string()).collect(),
            anchor_domains: ANCHOR_DOMAINS.iter().map(|s| s.to_string()).collect(),
            concentration_threshold: 0.5,
            min_anchor_results: 5,
            forced_results: 20,
            page_size: 100,
            site_pages: 2,
            extra_site_domains: 10,
            extra_site_window: 50,
            deal_terms: ["acquisition", "merger", "investment", "funding", "deal", "partnership"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            alternative_phrasings: [
                "investment details",
                "funding round",
                "acquisition",
                "investors",
                "valuation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            bigram_count: 5,
            bigram_window: 30,
            key_term_count: 3,
            max_entities: 5,
            concurrency: 1,
            delays: DelayPolicy::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl SearchPolicy {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut policy: SearchPolicy = serde_json::from_str(&text)?;
        policy.normalize();
        Ok(policy)
    }

    /// Lowercases domain lists and strips schemes and `www.` so they compare with result hosts.
    pub fn normalize(&mut self) {
        for list in [&mut self.trusted_sites, &mut self.anchor_domains] {
            let mut normalized: Vec<String> = Vec::with_capacity(list.len());
            for domain in list.iter().map(|d| normalize_domain(d)) {
                if !domain.is_empty() && !normalized.contains(&domain) {
                    normalized.push(domain);
                }
            }
            *list = normalized;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.concentration_threshold > 0.0 && self.concentration_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "concentration_threshold must be in (0, 1], got {}",
                self.concentration_threshold
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be greater than 0".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be greater than 0".into()));
        }
        if self.forced_results == 0 {
            return Err(ConfigError::Invalid("forced_results must be greater than 0".into()));
        }
        Ok(())
    }
}
