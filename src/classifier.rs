//! URL safety classification — the decision half of SSRF protection.

use crate::address::classify_ip;
use crate::error::DenyReason;
use crate::resolver::{Resolver, SystemResolver};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::{Host, Url};

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Outcome of classifying one URL at one moment in time.
///
/// Produced fresh per evaluation and never mutated; a redirect hop gets a new
/// verdict with new DNS answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub allowed: bool,
    pub reason: Option<DenyReason>,
}

impl SafetyVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

/// Decides whether a URL is safe to fetch.
///
/// Checks run in order and short-circuit: parse, scheme allowlist, localhost
/// shortcut, DNS resolution, then per-address range classification. Expected
/// unsafe input is a verdict, never an error. The classifier holds no state
/// across calls and never caches a resolution — a stale answer would reopen
/// the rebinding window.
pub struct UrlClassifier {
    resolver: Arc<dyn Resolver>,
    dns_timeout: Duration,
}

impl UrlClassifier {
    pub fn new(resolver: Arc<dyn Resolver>, dns_timeout: Duration) -> Self {
        Self {
            resolver,
            dns_timeout,
        }
    }

    /// Classifier backed by the operating system resolver.
    pub fn system(dns_timeout: Duration) -> Self {
        Self::new(Arc::new(SystemResolver), dns_timeout)
    }

    /// Classify a raw URL string.
    pub async fn classify(&self, raw: &str) -> SafetyVerdict {
        let Ok(url) = Url::parse(raw) else {
            warn!(url = raw, "deny: URL failed to parse");
            return SafetyVerdict::deny(DenyReason::InvalidUrl);
        };
        self.classify_url(&url).await
    }

    /// Classify an already-parsed URL. Used by the fetcher on redirect hops.
    pub async fn classify_url(&self, url: &Url) -> SafetyVerdict {
        let scheme = url.scheme();
        if !ALLOWED_SCHEMES.contains(&scheme) {
            warn!(url = %url, scheme, "deny: scheme not in http/https allowlist");
            return SafetyVerdict::deny(DenyReason::UnsafeScheme {
                scheme: scheme.to_string(),
            });
        }

        let Some(host) = url.host() else {
            warn!(url = %url, "deny: URL has no host");
            return SafetyVerdict::deny(DenyReason::InvalidUrl);
        };

        match host {
            // IP-literal hosts classify directly, no DNS round-trip.
            Host::Ipv4(v4) => self.check_addresses(url, &[IpAddr::V4(v4)]),
            Host::Ipv6(v6) => self.check_addresses(url, &[IpAddr::V6(v6)]),
            Host::Domain(domain) => {
                let lower = domain.to_ascii_lowercase();
                // Label-boundary match: "foo.localhost" is denied,
                // "notlocalhost" is not. Saves a DNS lookup; the address
                // check below would still catch 127.0.0.1.
                if lower == "localhost" || lower.ends_with(".localhost") {
                    warn!(url = %url, host = %lower, "deny: localhost");
                    return SafetyVerdict::deny(DenyReason::LocalhostDenied);
                }
                let port = url.port_or_known_default().unwrap_or(443);
                let lookup = tokio::time::timeout(
                    self.dns_timeout,
                    self.resolver.resolve(&lower, port),
                );
                let addrs = match lookup.await {
                    Ok(Ok(addrs)) if !addrs.is_empty() => addrs,
                    Ok(Ok(_)) => {
                        // Empty-but-successful answer: fail safe.
                        warn!(url = %url, host = %lower, "deny: DNS returned no records");
                        return SafetyVerdict::deny(DenyReason::ResolutionFailed {
                            host: lower,
                        });
                    }
                    Ok(Err(err)) => {
                        warn!(url = %url, host = %lower, error = %err, "deny: DNS lookup failed");
                        return SafetyVerdict::deny(DenyReason::ResolutionFailed {
                            host: lower,
                        });
                    }
                    Err(_) => {
                        warn!(url = %url, host = %lower, "deny: DNS lookup timed out");
                        return SafetyVerdict::deny(DenyReason::ResolutionFailed {
                            host: lower,
                        });
                    }
                };
                self.check_addresses(url, &addrs)
            }
        }
    }

    /// Allow only if every resolved address is global unicast. One private
    /// answer among public ones is enough to deny (multi-answer rebinding).
    fn check_addresses(&self, url: &Url, addrs: &[IpAddr]) -> SafetyVerdict {
        for &addr in addrs {
            let classification = classify_ip(addr);
            if !classification.is_global_unicast() {
                warn!(
                    url = %url,
                    address = %addr,
                    classification = %classification,
                    "deny: resolved address is not global unicast"
                );
                return SafetyVerdict::deny(DenyReason::PrivateAddress {
                    address: addr,
                    classification,
                });
            }
        }
        debug!(url = %url, addresses = addrs.len(), "allow");
        SafetyVerdict::allow()
    }
}
