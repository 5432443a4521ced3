//! Renders a search outcome for humans (Markdown) or tools (JSON).

use super::engine::SearchOutcome;
use super::types::{ResultKind, SearchResult};
use crate::markdown::{escape_md_link, escape_table_cell, sanitize_heading, truncate};

const TOP_DOMAINS: usize = 20;
const SNIPPET_CHARS: usize = 300;

/// Section order: targeted sweeps first, images last.
const SECTIONS: [(ResultKind, &str); 7] = [
    (ResultKind::UrlExtracted, "From Seed URL"),
    (ResultKind::News, "News"),
    (ResultKind::Web, "Web"),
    (ResultKind::SiteSpecific, "Site-Specific"),
    (ResultKind::Alternative, "Alternative Phrasings"),
    (ResultKind::ForcedDomain, "Anchor Domains"),
    (ResultKind::Image, "Images"),
];

pub fn format_json(outcome: &SearchOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}

pub fn format_markdown(outcome: &SearchOutcome) -> String {
    let mut output = format!("# Deal Search: {}\n\n", sanitize_heading(&outcome.query));

    if outcome.effective_query != outcome.query {
        output.push_str(&format!(
            "Effective query: `{}`\n\n",
            sanitize_heading(&outcome.effective_query)
        ));
    }

    let failed = outcome.calls.iter().filter(|c| c.failed()).count();
    output.push_str(&format!(
        "{} unique results ({} collected) from {} search calls",
        outcome.results.len(),
        outcome.collected,
        outcome.calls.len()
    ));
    if failed > 0 {
        output.push_str(&format!(", {failed} failed"));
    }
    output.push_str(".\n\n");

    if let Some(c) = &outcome.concentration {
        output.push_str(&format!(
            "Top domain: {} with {} of {} results ({:.0}%).",
            c.domain,
            c.count,
            c.total,
            c.ratio * 100.0
        ));
        if outcome.rebalanced {
            output.push_str(" Collection was concentrated; anchor domains were searched explicitly.");
        }
        output.push_str("\n\n");
    }

    if !outcome.domains.is_empty() {
        output.push_str("## Domains\n\n| Domain | Results |\n| --- | ---: |\n");
        for d in outcome.domains.iter().take(TOP_DOMAINS) {
            output.push_str(&format!("| {} | {} |\n", escape_table_cell(&d.domain), d.count));
        }
        if outcome.domains.len() > TOP_DOMAINS {
            output.push_str(&format!(
                "\n({} more domains)\n",
                outcome.domains.len() - TOP_DOMAINS
            ));
        }
        output.push('\n');
    }

    for (kind, heading) in SECTIONS {
        let section: Vec<&SearchResult> = outcome.results.iter().filter(|r| r.kind == kind).collect();
        if section.is_empty() {
            continue;
        }
        output.push_str(&format!("## {heading} ({})\n\n", section.len()));
        for result in section {
            push_result(&mut output, result);
        }
        output.push('\n');
    }

    let failures: Vec<_> = outcome.calls.iter().filter(|c| c.failed()).collect();
    if !failures.is_empty() {
        output.push_str("## Failed Calls\n\n");
        for call in failures {
            output.push_str(&format!(
                "- `{}` ({:?}, start {}): {}\n",
                sanitize_heading(&call.query),
                call.search_type,
                call.start,
                call.error.as_deref().unwrap_or_default()
            ));
        }
    }

    output
}

fn push_result(output: &mut String, result: &SearchResult) {
    let title = if result.title.trim().is_empty() {
        result.link.as_str()
    } else {
        result.title.as_str()
    };
    output.push_str(&format!(
        "- [{}]({}) · {}",
        escape_md_link(&sanitize_heading(title)),
        escape_md_link(&result.link),
        result.source
    ));
    if let Some(date) = &result.date {
        output.push_str(&format!(" · {date}"));
    }
    output.push('\n');
    if !result.snippet.trim().is_empty() {
        output.push_str(&format!(
            "  {}\n",
            truncate(&sanitize_heading(&result.snippet), SNIPPET_CHARS)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Phase;
    use crate::search::aggregate::{Concentration, DomainCount};
    use crate::search::types::CallRecord;
    use crate::serper::types::SearchType;

    fn result(title: &str, link: &str, kind: ResultKind) -> SearchResult {
        SearchResult {
            title: title.into(),
            snippet: "Acme Corp raised a $50 million growth round.".into(),
            link: link.into(),
            date: Some("Mar 3, 2024".into()),
            source: "reuters.com".into(),
            kind,
        }
    }

    fn outcome() -> SearchOutcome {
        SearchOutcome {
            query: "acme".into(),
            effective_query: "acme growth round".into(),
            requested: 300,
            collected: 3,
            results: vec![
                result("Acme (ACME) raises $50M", "https://reuters.com/a", ResultKind::News),
                result("", "https://reuters.com/b", ResultKind::UrlExtracted),
            ],
            domains: vec![DomainCount {
                domain: "reuters.com".into(),
                count: 2,
            }],
            concentration: Some(Concentration {
                domain: "reuters.com".into(),
                count: 2,
                total: 2,
                ratio: 1.0,
            }),
            rebalanced: true,
            calls: vec![CallRecord {
                phase: Phase::Main,
                query: "acme growth round".into(),
                kind: ResultKind::News,
                search_type: SearchType::News,
                start: 100,
                num: 100,
                hits: 0,
                error: Some("search API rate limit exceeded".into()),
            }],
        }
    }

    #[test]
    fn markdown_includes_sections() {
        let text = format_markdown(&outcome());

        assert!(text.starts_with("# Deal Search: acme\n"));
        assert!(text.contains("Effective query: `acme growth round`"));
        assert!(text.contains("2 unique results (3 collected) from 1 search calls, 1 failed."));
        assert!(text.contains("(100%)"));
        assert!(text.contains("anchor domains were searched explicitly"));
        assert!(text.contains("| reuters.com | 2 |"));
        assert!(text.contains(r"[Acme \(ACME\) raises $50M](https://reuters.com/a) · reuters.com · Mar 3, 2024"));
        assert!(text.contains("## Failed Calls"));
        assert!(text.contains("rate limit exceeded"));
    }

    #[test]
    fn seed_results_come_first_and_untitled_use_link() {
        let text = format_markdown(&outcome());
        let seed = text.find("## From Seed URL (1)").unwrap();
        let news = text.find("## News (1)").unwrap();
        assert!(seed < news);
        assert!(text.contains("[https://reuters.com/b](https://reuters.com/b)"));
        assert!(!text.contains("## Web"));
    }

    #[test]
    fn link_targets_are_escaped() {
        let mut outcome = outcome();
        outcome.results = vec![result(
            "Acme wiki",
            "https://en.wikipedia.org/wiki/Acme_(company)",
            ResultKind::Web,
        )];

        let text = format_markdown(&outcome);

        assert!(text.contains(r"[Acme wiki](https://en.wikipedia.org/wiki/Acme_\(company\))"));
    }

    #[test]
    fn json_uses_wire_names() {
        let json: serde_json::Value = serde_json::from_str(&format_json(&outcome()).unwrap()).unwrap();
        assert_eq!(json["results"][0]["kind"], "news");
        assert_eq!(json["calls"][0]["type"], "news");
        assert_eq!(json["calls"][0]["phase"], "main");
        assert_eq!(json["rebalanced"], true);
        assert_eq!(json["concentration"]["domain"], "reuters.com");
    }
}
