use async_trait::async_trait;
use std::io;
use std::net::IpAddr;

use crate::config::IpVersion;
use crate::error::PingfluxError;

/// Source of candidate addresses for a host name.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// System resolver backed by `tokio::net::lookup_host`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl Lookup for SystemLookup {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// Pick the first candidate accepted by `policy`.
pub fn select_ip(candidates: &[IpAddr], policy: IpVersion) -> Option<IpAddr> {
    candidates.iter().copied().find(|ip| match policy {
        IpVersion::Any => true,
        IpVersion::V4 => !ip.is_ipv6(),
        IpVersion::V6 => ip.is_ipv6(),
    })
}

/// Resolve the IP address for a host name according to the family policy.
///
/// Lookup is performed on every call; nothing is cached.
pub async fn resolve_ip(
    lookup: &dyn Lookup,
    host: &str,
    policy: IpVersion,
) -> Result<IpAddr, PingfluxError> {
    let candidates = lookup
        .lookup(host)
        .await
        .map_err(|e| PingfluxError::NoAddress(format!("lookup of '{}' failed: {}", host, e)))?;

    if candidates.is_empty() {
        return Err(PingfluxError::NoAddress(format!(
            "no address found for '{}'",
            host
        )));
    }

    select_ip(&candidates, policy).ok_or_else(|| {
        PingfluxError::NoAddress(format!(
            "no {} address found for '{}'",
            policy, host
        ))
    })
}
