#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

//! SSRF-safe URL validation and redirect-guarded fetching.
//!
//! When a server fetches an arbitrary user-supplied URL (link previews,
//! article extraction, webhooks), an attacker can point it at internal
//! infrastructure: loopback services, RFC 1918 hosts, or the cloud metadata
//! endpoint at `169.254.169.254`. This crate provides the two pieces needed
//! to do such fetches safely:
//!
//! - [`UrlClassifier`] — resolves a URL's hostname and decides ALLOW/DENY
//!   based on scheme, hostname, and every resolved address.
//! - [`GuardedFetcher`] — follows redirects manually, re-running the
//!   classifier on every hop so a redirect chain cannot pivot from a public
//!   host to an internal one.
//!
//! The address policy is an allowlist: only global-unicast addresses are
//! fetchable. Anything unrecognized is denied.

pub mod address;
pub mod classifier;
pub mod error;
pub mod fetcher;
pub mod options;
pub mod resolver;

pub use address::{AddressClassification, classify_ip};
pub use classifier::{SafetyVerdict, UrlClassifier};
pub use error::{DenyReason, FetchError};
pub use fetcher::{GuardedFetcher, GuardedFetcherBuilder};
pub use options::FetchOptions;
pub use resolver::{Resolver, SystemResolver};
