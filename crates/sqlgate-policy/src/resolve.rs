//! Target address resolution.
//!
//! Turns a parsed [`ConnectionTarget`] into candidate IP addresses:
//! a direct parse when the host is already an IP literal, the loopback
//! pair for the bare `.` shortcut, and a DNS lookup otherwise.
//!
//! DNS lookup is the only suspending operation in this crate; failures
//! surface as errors for the validator to map into a rejection, never
//! as panics.

use sqlgate_core::ConnectionTarget;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Resolve a connection target to its candidate IP addresses.
///
/// # Errors
/// Returns the underlying lookup error when the host name cannot be
/// resolved. An empty resolution result is also an error.
pub async fn resolve_target(target: &ConnectionTarget) -> std::io::Result<Vec<IpAddr>> {
    let host = target.host.trim();

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    if host == "." {
        // Local-machine shortcut
        return Ok(vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ]);
    }

    tracing::debug!("Resolving host {host}");
    let addrs = tokio::net::lookup_host((host, target.port)).await?;

    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }

    if ips.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no addresses found for {host}"),
        ));
    }

    Ok(ips)
}
