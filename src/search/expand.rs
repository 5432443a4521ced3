//! Query expansion from a seed page: title, organization names, money amounts, dates.
//! Also the term-frequency helpers used to enrich queries from earlier results.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::types::{QueryPlan, SearchResult};
use crate::fetch::PageSource;

/// Body text beyond this is ignored; lead paragraphs carry the deal facts.
const MAX_BODY_CHARS: usize = 20_000;
const MAX_AMOUNTS_IN_PLAN: usize = 2;
const MAX_DATES_IN_PLAN: usize = 2;

/// Words that end a run of capitalized words: headline verbs, connectors, calendar words.
const BREAK_WORDS: &[&str] = &[
    "a", "after", "agrees", "an", "and", "announce", "announced", "announces", "as", "at", "buys",
    "by", "closes", "closed", "completes", "completed", "deal", "for", "from", "funding", "in",
    "into", "invests", "invested", "is", "its", "launches", "leads", "led", "million", "billion",
    "of", "on", "over", "raises", "raised", "round", "says", "secures", "secured", "seed",
    "sells", "series", "sold", "the", "to", "with", "acquires", "acquired", "acquire", "merges",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december",
];

/// Capitalized phrases that are never organizations.
const NOT_ORGANIZATIONS: &[&str] = &[
    "new york", "new york city", "san francisco", "los angeles", "united states",
    "united kingdom", "hong kong", "silicon valley", "north america", "south america",
    "latin america", "middle east", "new jersey", "san diego", "san jose", "las vegas",
    "palo alto", "menlo park", "washington dc", "south korea", "new zealand", "saudi arabia",
    "united arab emirates", "private equity", "venture capital", "press release",
    "read more", "privacy policy", "terms of service", "cookie policy", "all rights reserved",
    "sign up", "log in", "subscribe now", "related articles", "chief executive officer",
];

const CORPORATE_SUFFIXES: &[&str] = &[
    "inc", "corp", "corporation", "co", "llc", "llp", "lp", "ltd", "limited", "plc", "group",
    "holdings", "capital", "partners", "ventures", "equity", "technologies", "labs", "bank",
    "fund", "management", "advisors",
];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "but", "not", "you", "all", "how", "why", "who", "its",
    "has", "new", "with", "that", "this", "from", "have", "been", "were", "will", "their",
    "they", "about", "into", "more", "than", "also", "which", "said", "says", "after", "over",
    "other", "what", "when", "where", "your", "just", "like", "year", "years", "news", "according",
    "percent", "based", "first", "read", "here", "there", "these", "those", "would", "could",
    "should", "today", "week", "some", "most", "only", "while",
];

/// What a seed page yielded. Empty when the fetch failed or nothing matched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Cleaned article title.
    pub title: Option<String>,
    /// Organization candidates, most frequent first.
    pub entities: Vec<String>,
    pub amounts: Vec<String>,
    pub dates: Vec<String>,
}

impl Expansion {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.entities.is_empty()
            && self.amounts.is_empty()
            && self.dates.is_empty()
    }
}

/// Fetches and analyzes the seed page. Any failure yields an empty expansion.
pub async fn expand(pages: &impl PageSource, url: &str, max_entities: usize) -> Expansion {
    match pages.fetch_html(url).await {
        Ok(html) => {
            let expansion = analyze_html(&html, max_entities);
            debug!(
                title = ?expansion.title,
                entities = expansion.entities.len(),
                amounts = expansion.amounts.len(),
                dates = expansion.dates.len(),
                "seed page analyzed"
            );
            expansion
        }
        Err(e) => {
            warn!(error = %e, "seed fetch failed, falling back to the raw query");
            Expansion::default()
        }
    }
}

pub fn analyze_html(html: &str, max_entities: usize) -> Expansion {
    let raw_title = extract_title(html);
    let body = visible_text(html);
    // The site name in a title suffix is not a party to the deal.
    let text = match &raw_title {
        Some(title) => format!("{}\n{body}", strip_site_suffix(title)),
        None => body,
    };

    Expansion {
        title: raw_title.map(|t| clean_title(&t)).filter(|t| !t.is_empty()),
        entities: extract_entities(&text, max_entities),
        amounts: extract_amounts(&text),
        dates: extract_dates(&text),
    }
}

/// First `<title>` element, entity-decoded with whitespace collapsed.
pub fn extract_title(html: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let tag_start = lower.find("<title")?;
    let content_start = tag_start + lower[tag_start..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find("</title>")?;
    let title = collapse_whitespace(&decode_entities(&html[content_start..content_end]));
    if title.is_empty() { None } else { Some(title) }
}

/// Strips a trailing `| Site`, `- Site` (any dash) and a `: subtitle`.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = strip_site_suffix(title);
    if let Some((head, _)) = cleaned.split_once(": ")
        && !head.trim().is_empty()
    {
        cleaned = head.trim_end();
    }
    cleaned.to_string()
}

fn strip_site_suffix(title: &str) -> &str {
    let mut cleaned = title.trim();
    for sep in [" | ", " - ", " – ", " — "] {
        if let Some(idx) = cleaned.rfind(sep)
            && idx > 0
        {
            cleaned = cleaned[..idx].trim_end();
        }
    }
    cleaned
}

fn visible_text(html: &str) -> String {
    let without_blocks = hidden_block_re().replace_all(html, " ");
    let without_tags = tag_re().replace_all(&without_blocks, " ");
    let mut text = collapse_whitespace(&decode_entities(&without_tags));
    if text.len() > MAX_BODY_CHARS {
        let end = text.floor_char_boundary(MAX_BODY_CHARS);
        text.truncate(end);
    }
    text
}

/// Organization candidates from capitalized runs, ranked by frequency then first appearance.
/// Names ending in a corporate suffix rank ahead of equally frequent plain runs.
pub fn extract_entities(text: &str, max: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0;

    for run in capitalized_run_re().find_iter(text) {
        for candidate in split_run(run.as_str()) {
            let entry = counts.entry(candidate).or_insert((0, order));
            entry.0 += 1;
            order += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(name, (count, first))| (name, count, first))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| has_corporate_suffix(&b.0).cmp(&has_corporate_suffix(&a.0)))
            .then_with(|| a.2.cmp(&b.2))
    });
    ranked.into_iter().take(max).map(|(name, ..)| name).collect()
}

/// Splits a capitalized run at break words and keeps multi-word segments.
fn split_run(run: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |current: &mut Vec<&str>| {
        if current.len() >= 2 {
            let name = current.join(" ");
            if !NOT_ORGANIZATIONS.contains(&name.to_ascii_lowercase().as_str()) {
                segments.push(name);
            }
        }
        current.clear();
    };

    for word in run.split_whitespace() {
        let word = word.trim_end_matches(['.', ',', ':', ';']);
        // A possessive closes the name it belongs to.
        let (word, possessive) = match word.strip_suffix("'s").or_else(|| word.strip_suffix("’s")) {
            Some(stem) => (stem, true),
            None => (word.trim_end_matches(['\'', '’']), false),
        };
        let lower = word.to_lowercase();
        if word.is_empty() || BREAK_WORDS.contains(&lower.as_str()) {
            flush(&mut current);
        } else {
            current.push(word);
            if possessive {
                flush(&mut current);
            }
        }
    }
    flush(&mut current);
    segments
}

fn has_corporate_suffix(name: &str) -> bool {
    name.rsplit(' ')
        .next()
        .is_some_and(|last| CORPORATE_SUFFIXES.contains(&last.to_ascii_lowercase().as_str()))
}

/// Money amounts such as `$50 million`, `$1.2B`, `300 million dollars`, in order of appearance.
pub fn extract_amounts(text: &str) -> Vec<String> {
    unique_matches(amount_re(), text)
}

/// Calendar dates such as `March 3, 2024`, `3 March 2024`, `March 2024`, in order of appearance.
pub fn extract_dates(text: &str) -> Vec<String> {
    unique_matches(date_re(), text)
}

fn unique_matches(re: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let value = collapse_whitespace(m.as_str());
        if !found.contains(&value) {
            found.push(value);
        }
    }
    found
}

/// Queries derived from a seed URL. With nothing extracted, only the `site:` query remains.
pub fn seed_queries(expansion: &Expansion, query: &str, seed_host: Option<&str>) -> QueryPlan {
    let mut plan = QueryPlan::default();
    match seed_host {
        Some(host) => plan.push(format!("site:{host} {query}")),
        None => plan.push(query),
    };
    if expansion.is_empty() {
        return plan;
    }

    if let Some(title) = &expansion.title {
        plan.push(format!("\"{title}\""));
    }
    for entity in &expansion.entities {
        plan.push(format!("\"{entity}\" {query}"));
    }
    if let Some(lead) = expansion.entities.first() {
        for amount in expansion.amounts.iter().take(MAX_AMOUNTS_IN_PLAN) {
            plan.push(format!("\"{lead}\" {amount}"));
        }
        for date in expansion.dates.iter().take(MAX_DATES_IN_PLAN) {
            plan.push(format!("\"{lead}\" {date}"));
        }
    }
    plan
}

/// Most frequent words across titles and snippets that the query does not already contain.
pub fn key_terms(results: &[SearchResult], query: &str, count: usize) -> Vec<String> {
    let query_words = words(query);
    let mut freq = Frequency::default();
    for result in results {
        for text in [&result.title, &result.snippet] {
            for word in words(text) {
                if word.chars().count() >= 4
                    && !is_stopword(&word)
                    && !word.chars().all(|c| c.is_ascii_digit())
                    && !query_words.contains(&word)
                {
                    freq.add(word);
                }
            }
        }
    }
    freq.top(count)
}

/// Most frequent adjacent word pairs across titles. Pairs touching a query word are skipped.
pub fn top_bigrams<'a>(
    titles: impl IntoIterator<Item = &'a str>,
    query: &str,
    count: usize,
) -> Vec<String> {
    let query_words = words(query);
    let mut freq = Frequency::default();
    for title in titles {
        let tokens = words(title);
        for pair in tokens.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let usable = |w: &String| w.chars().count() >= 3 && !is_stopword(w);
            if usable(a)
                && usable(b)
                && a != b
                && !query_words.contains(a)
                && !query_words.contains(b)
            {
                freq.add(format!("{a} {b}"));
            }
        }
    }
    freq.top(count)
}

pub fn enrich_query(query: &str, terms: &[String]) -> String {
    if terms.is_empty() {
        query.to_string()
    } else {
        format!("{query} {}", terms.join(" "))
    }
}

#[derive(Default)]
struct Frequency {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl Frequency {
    fn add(&mut self, key: String) {
        let count = self.counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            self.order.push(key);
        }
        *count += 1;
    }

    /// Top entries by count; ties keep first-seen order.
    fn top(self, n: usize) -> Vec<String> {
        let mut ranked: Vec<(usize, String)> = self
            .order
            .into_iter()
            .map(|k| (self.counts[&k], k))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().take(n).map(|(_, k)| k).collect()
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn hidden_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<title\b.*?</title>|<!--.*?-->",
        )
        .expect("hidden block regex must compile")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex must compile"))
}

fn capitalized_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\p{Lu}[\p{L}\p{N}&'’.\-]*(?:[ \t]+\p{Lu}[\p{L}\p{N}&'’.\-]*)+")
            .expect("capitalized run regex must compile")
    })
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\$\s?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:\s?(?:million|billion|trillion|thousand|mn|bn|m|b|k)\b)?|\b(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?\s(?:million|billion|trillion)\s(?:dollars|usd)\b",
        )
        .expect("amount regex must compile")
    })
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let months = "(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)";
        Regex::new(&format!(
            r"\b{months}\b\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b|\b\d{{1,2}}\s+{months}\b\.?,?\s+\d{{4}}\b|\b{months}\b\.?\s+\d{{4}}\b"
        ))
        .expect("date regex must compile")
    })
}
