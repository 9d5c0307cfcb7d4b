// Address parsing and name resolution for the dial stage.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::system_conf::read_system_conf;

use crate::prober::ProbeError;

/// Split `host:port`, accepting bracketed IPv6 literals (`[::1]:22`).
pub fn split_host_port(addr: &str) -> Result<(String, u16), ProbeError> {
    let invalid = |reason| ProbeError::InvalidAddress {
        addr: addr.to_string(),
        reason,
    };

    let (host, port) = addr.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner
            .strip_suffix(']')
            .ok_or_else(|| invalid("unterminated bracket"))?,
        None if host.contains(':') => return Err(invalid("too many colons")),
        None => host,
    };
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
    Ok((host.to_string(), port))
}

/// Resolve `host` to every candidate socket address, finishing before `deadline`.
pub async fn resolve_socket_addrs(
    host: &str,
    port: u16,
    timeout: Duration,
    deadline: Instant,
) -> Result<Vec<SocketAddr>, ProbeError> {
    // First try to parse as IP address
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let (config, mut opts) =
        read_system_conf().map_err(|e| ProbeError::ResolverConfig(e.into()))?;
    opts.timeout = timeout;
    opts.attempts = 1;
    let resolver = TokioAsyncResolver::tokio(config, opts);

    let lookup = timeout_at(deadline, resolver.lookup_ip(host))
        .await
        .map_err(|_| ProbeError::LookupTimeout {
            host: host.to_string(),
            timeout,
        })?
        .map_err(|source| ProbeError::Lookup {
            host: host.to_string(),
            source,
        })?;

    let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect();
    if addrs.is_empty() {
        return Err(ProbeError::NoAddresses {
            host: host.to_string(),
        });
    }
    Ok(addrs)
}
