//! Server address discovery.
//!
//! Resolves the configured server hosts into an ordered list of IP addresses.
//! The first address is the one bootstrap is attempted against.

use std::collections::HashSet;
use std::net::IpAddr;

use warden_common::{AclInitError, ServerAddress};

/// Resolve hosts (IP literals or DNS names) into unique server addresses
pub async fn resolve_servers(hosts: &[String]) -> Result<Vec<ServerAddress>, AclInitError> {
    let mut seen = HashSet::new();
    let mut servers = Vec::new();

    for host in hosts {
        let host = host.trim();
        if host.is_empty() {
            continue;
        }

        let ips: Vec<IpAddr> = match host.parse::<IpAddr>() {
            Ok(ip) => vec![ip],
            Err(_) => tokio::net::lookup_host((host, 0))
                .await
                .map_err(|e| AclInitError::Discovery(format!("resolving {:?}: {}", host, e)))?
                .map(|addr| addr.ip())
                .collect(),
        };

        tracing::debug!(host = %host, resolved = ?ips, "Resolved server host");

        for ip in ips {
            if seen.insert(ip) {
                servers.push(ServerAddress::new(ip));
            }
        }
    }

    if servers.is_empty() {
        return Err(AclInitError::Discovery(
            "no server addresses configured or resolved".to_string(),
        ));
    }

    Ok(servers)
}
