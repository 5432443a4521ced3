//! Seed URLs come from the caller, so they are checked before any request:
//! HTTP(S) only, and never a host that is or resolves to a private address.

use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use tracing::warn;

use super::FetchError;

const DNS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) trait DnsResolver {
    async fn lookup(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, FetchError>;
}

pub(crate) struct TokioDnsResolver;

impl DnsResolver for TokioDnsResolver {
    async fn lookup(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, FetchError> {
        let addrs = tokio::time::timeout(
            DNS_LOOKUP_TIMEOUT,
            tokio::net::lookup_host(format!("{host}:{port}")),
        )
        .await
        .map_err(|_| FetchError::DnsResolution("DNS lookup timed out".to_string()))?
        .map_err(|e| FetchError::DnsResolution(e.to_string()))?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// Drops `user:pass@` before a URL reaches the logs.
pub(super) fn redact_url_credentials(raw: &str) -> Cow<'_, str> {
    if !raw.contains('@') {
        return Cow::Borrowed(raw);
    }
    match url::Url::parse(raw) {
        Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            Cow::Owned(parsed.to_string())
        }
        _ => Cow::Borrowed(raw),
    }
}

pub(super) async fn ssrf_check(raw: &str, resolver: &impl DnsResolver) -> Result<(), FetchError> {
    let parsed = url::Url::parse(raw)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidScheme);
    }

    let domain = match parsed.host() {
        Some(url::Host::Ipv4(v4)) => return guard_ip(raw, IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => return guard_ip(raw, IpAddr::V6(v6)),
        Some(url::Host::Domain(domain)) => domain.to_ascii_lowercase(),
        None => return Err(FetchError::InternalHost),
    };

    if is_internal_name(&domain) {
        warn!(url = %redact_url_credentials(raw), "blocked seed fetch to internal host");
        return Err(FetchError::InternalHost);
    }

    let port = parsed.port_or_known_default().unwrap_or(80);
    for ip in resolver.lookup(&domain, port).await? {
        if is_private_ip(ip) {
            warn!(host = %domain, %ip, "seed host resolves to private IP");
            return Err(FetchError::InternalHost);
        }
    }
    Ok(())
}

fn guard_ip(raw: &str, ip: IpAddr) -> Result<(), FetchError> {
    if is_private_ip(ip) {
        warn!(url = %redact_url_credentials(raw), "blocked seed fetch to private IP");
        return Err(FetchError::InternalHost);
    }
    Ok(())
}

fn is_internal_name(domain: &str) -> bool {
    domain == "localhost"
        || [".localhost", ".local", ".internal", ".arpa"]
            .iter()
            .any(|suffix| domain.ends_with(suffix))
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || is_ipv6_link_local(&v6)
                || is_ipv6_unique_local(&v6)
                || v6.to_ipv4_mapped().is_some_and(is_private_v4)
        }
    }
}

fn is_private_v4(v4: Ipv4Addr) -> bool {
    let [a, b, ..] = v4.octets();
    v4.is_loopback()
        || v4.is_private()
        || v4.is_link_local()
        || v4.is_broadcast()
        || a == 0
        || (a == 100 && (64..=127).contains(&b))
}

fn is_ipv6_link_local(v6: &Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xffc0) == 0xfe80
}

fn is_ipv6_unique_local(v6: &Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}
