use crate::address::AddressClassification;
use std::net::IpAddr;
use thiserror::Error;

/// Why a URL was refused by the classifier.
///
/// Every variant is a hard stop; nothing downgrades a deny to an allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("URL failed to parse")]
    InvalidUrl,

    #[error("scheme '{scheme}' is not http or https")]
    UnsafeScheme { scheme: String },

    #[error("access to localhost is denied")]
    LocalhostDenied,

    #[error("hostname '{host}' did not resolve to any address")]
    ResolutionFailed { host: String },

    #[error("resolved address {address} is {classification}, not global unicast")]
    PrivateAddress {
        address: IpAddr,
        classification: AddressClassification,
    },
}

/// Fatal failure of a guarded fetch. None of these are retried internally;
/// retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsafe URL {url}: {reason}")]
    Denied { url: String, reason: DenyReason },

    #[error("redirect from {url} carries no Location header")]
    RedirectMissingLocation { url: String },

    #[error("redirect target '{location}' is not a valid URL")]
    InvalidRedirectTarget { location: String },

    #[error("too many redirects (max {max})")]
    TooManyRedirects { max: usize },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    HttpStatus { status: u16, url: String },
}

impl FetchError {
    /// The deny reason, if this failure came from the classifier.
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Denied { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
