use serde::Deserialize;
use std::time::Duration;

/// Browser-like user agent, matching what article servers expect to see.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Tunable knobs for [`crate::GuardedFetcher`].
///
/// The allowed schemes (`http`, `https`) are deliberately not here — they are
/// a hard-coded safety floor, not configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
    /// Per-hop DNS lookup timeout, seconds.
    pub dns_timeout_secs: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            request_timeout_secs: 30,
            dns_timeout_secs: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchOptions {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }
}
