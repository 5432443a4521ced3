use std::collections::HashSet;

/// Hostname of a link, lowercased and without a leading `www.`.
pub fn host_of(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
    if host.is_empty() { None } else { Some(host) }
}

/// Normalizes a user- or config-supplied domain the same way [`host_of`] does.
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().trim_end_matches('/').to_ascii_lowercase();
    let bare = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    bare.strip_prefix("www.").unwrap_or(bare).to_string()
}

/// True when `host` equals a trusted entry or is a subdomain of one.
pub fn is_trusted(host: &str, trusted: &[String]) -> bool {
    trusted.iter().any(|t| {
        host == t
            || host
                .strip_suffix(t.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Insertion-ordered, deduplicated set of hostnames.
#[derive(Debug, Default, Clone)]
pub struct DomainSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl DomainSet {
    pub fn seeded(seeds: &[String]) -> Self {
        let mut set = Self::default();
        for seed in seeds {
            set.insert(seed);
        }
        set
    }

    /// Returns true if the domain was not present before.
    pub fn insert(&mut self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        if domain.is_empty() || !self.seen.insert(domain.clone()) {
            return false;
        }
        self.order.push(domain);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Trusted domains first; otherwise discovery order is kept.
    pub fn prioritized(&self, trusted: &[String]) -> Vec<String> {
        let mut domains = self.order.clone();
        domains.sort_by_key(|d| !is_trusted(d, trusted));
        domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn host_of_strips_www_and_lowercases() {
        assert_eq!(host_of("https://WWW.Reuters.com/markets/x"), Some("reuters.com".into()));
        assert_eq!(host_of("https://finance.yahoo.com/q"), Some("finance.yahoo.com".into()));
    }

    #[test]
    fn host_of_rejects_garbage() {
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("mailto:someone@example.com"), None);
    }

    #[test]
    fn normalize_domain_accepts_urls_and_bare_hosts() {
        assert_eq!(normalize_domain("https://www.WSJ.com/"), "wsj.com");
        assert_eq!(normalize_domain(" ft.com "), "ft.com");
    }

    #[test]
    fn subdomains_of_trusted_are_trusted() {
        let trusted = list(&["yahoo.com", "ft.com"]);
        assert!(is_trusted("finance.yahoo.com", &trusted));
        assert!(is_trusted("ft.com", &trusted));
        assert!(!is_trusted("notyahoo.com", &trusted));
        assert!(!is_trusted("example.org", &trusted));
    }

    #[test]
    fn domain_set_deduplicates_in_order() {
        let mut set = DomainSet::seeded(&list(&["a.com", "b.com"]));
        assert!(set.insert("c.com"));
        assert!(!set.insert("www.a.com"));
        assert_eq!(set.len(), 3);
        assert_eq!(set.prioritized(&[]), list(&["a.com", "b.com", "c.com"]));
    }

    #[test]
    fn prioritized_puts_trusted_first_and_is_stable() {
        let trusted = list(&["reuters.com", "ft.com"]);
        let mut set = DomainSet::default();
        for d in ["blog.example.com", "ft.com", "news.site.io", "reuters.com", "another.net"] {
            set.insert(d);
        }

        let first = set.prioritized(&trusted);
        assert_eq!(
            first,
            list(&["ft.com", "reuters.com", "blog.example.com", "news.site.io", "another.net"])
        );
        assert_eq!(first, set.prioritized(&trusted));
    }
}
