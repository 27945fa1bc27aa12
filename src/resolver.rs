//! DNS resolution seam. The classifier only ever sees this trait, so tests
//! can substitute a canned resolver and verify when lookups happen.

use async_trait::async_trait;
use std::io;
use std::net::IpAddr;

/// Resolves a hostname to the full set of addresses the system resolver
/// returns — both families, all records, not just the first. Checking every
/// address is what defeats multi-answer DNS rebinding.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system via `tokio::net::lookup_host`.
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}
