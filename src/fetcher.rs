//! Redirect-guarded fetching — the enforcement half of SSRF protection.

use crate::classifier::UrlClassifier;
use crate::error::{DenyReason, FetchError};
use crate::options::FetchOptions;
use crate::resolver::Resolver;
use reqwest::header::LOCATION;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Fetches a URL while re-validating every redirect hop.
///
/// Transport-level redirect following is disabled; the fetcher observes each
/// 3xx itself, resolves the `Location` against the current URL, and runs the
/// full classifier (including fresh DNS) before the next request. A chain
/// that starts on a public host therefore cannot pivot to an internal one.
///
/// Each call is strictly sequential and holds no state across calls, so one
/// fetcher is safe to share between concurrent callers. Dropping the returned
/// future aborts the in-flight DNS lookup or request.
pub struct GuardedFetcher {
    client: reqwest::Client,
    classifier: UrlClassifier,
    max_redirects: usize,
}

impl GuardedFetcher {
    /// Fetcher with the system resolver and a client built from `options`.
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        GuardedFetcherBuilder::new(options).build()
    }

    pub fn builder(options: FetchOptions) -> GuardedFetcherBuilder {
        GuardedFetcherBuilder::new(options)
    }

    /// Fetch `raw` following at most `max_redirects` hops, classifying every
    /// hop before requesting it.
    ///
    /// The terminal response is returned whatever its status — 4xx/5xx are
    /// the caller's concern. Only safety violations, transport failures, and
    /// redirect-protocol violations are errors.
    pub async fn fetch(&self, raw: &str) -> Result<reqwest::Response, FetchError> {
        let mut current = Url::parse(raw).map_err(|_| FetchError::Denied {
            url: raw.to_string(),
            reason: DenyReason::InvalidUrl,
        })?;
        let mut chain = vec![current.clone()];

        loop {
            let verdict = self.classifier.classify_url(&current).await;
            if let Some(reason) = verdict.reason {
                return Err(FetchError::Denied {
                    url: current.to_string(),
                    reason,
                });
            }

            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if !status.is_redirection() {
                debug!(url = %current, status = status.as_u16(), hops = chain.len() - 1, "fetch complete");
                return Ok(response);
            }

            // An absent Location and a present-but-unparsable one are
            // distinct failures: the first is a protocol violation by the
            // server, the second a bad redirect target.
            let Some(value) = response.headers().get(LOCATION) else {
                return Err(FetchError::RedirectMissingLocation {
                    url: current.to_string(),
                });
            };
            let location = value.to_str().map_err(|_| FetchError::InvalidRedirectTarget {
                location: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            })?;

            // Resolve against the current URL so relative redirects work.
            let next = current
                .join(location)
                .map_err(|_| FetchError::InvalidRedirectTarget {
                    location: location.to_string(),
                })?;

            if chain.len() > self.max_redirects {
                warn!(
                    start = %chain[0],
                    hops = chain.len(),
                    "redirect chain exceeded bound"
                );
                return Err(FetchError::TooManyRedirects {
                    max: self.max_redirects,
                });
            }

            debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
            chain.push(next.clone());
            current = next;
        }
    }

    /// Guarded fetch that also requires a success status and returns the
    /// body — the shape a content-extraction pipeline consumes.
    pub async fn fetch_text(&self, raw: &str) -> Result<String, FetchError> {
        let response = self.fetch(raw).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Builder for [`GuardedFetcher`]. The resolver and HTTP client seams exist
/// for callers with custom DNS or connection pools; an injected client must
/// already have redirect following disabled.
pub struct GuardedFetcherBuilder {
    options: FetchOptions,
    resolver: Option<Arc<dyn Resolver>>,
    client: Option<reqwest::Client>,
}

impl GuardedFetcherBuilder {
    pub fn new(options: FetchOptions) -> Self {
        Self {
            options,
            resolver: None,
            client: None,
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<GuardedFetcher, FetchError> {
        let classifier = match self.resolver {
            Some(resolver) => UrlClassifier::new(resolver, self.options.dns_timeout()),
            None => UrlClassifier::system(self.options.dns_timeout()),
        };
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(self.options.request_timeout())
                .user_agent(self.options.user_agent.clone())
                .build()?,
        };
        Ok(GuardedFetcher {
            client,
            classifier,
            max_redirects: self.options.max_redirects,
        })
    }
}
