use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::{Mutex, OnceLock};

/// Process-wide resolved-hostname cache. Entries are immutable once
/// inserted and live for the lifetime of the process.
static CACHE: OnceLock<Mutex<HashMap<String, IpAddr>>> = OnceLock::new();

fn cache() -> &'static Mutex<HashMap<String, IpAddr>> {
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Resolve a hostname to a single IP address, caching the result.
///
/// Used when the client is configured for local DNS resolution, so the pool
/// key (and the proxy CONNECT target) is a numeric address.
pub fn ip_from_hostname(hostname: &str) -> io::Result<IpAddr> {
    if let Ok(guard) = cache().lock()
        && let Some(ip) = guard.get(hostname)
    {
        return Ok(*ip);
    }

    let ip = (hostname, 0u16)
        .to_socket_addrs()?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("hostname {hostname:?} did not resolve"),
            )
        })?;

    tracing::trace!(hostname, ip = %ip, "cached hostname resolution");
    if let Ok(mut guard) = cache().lock() {
        guard.insert(hostname.to_string(), ip);
    }
    Ok(ip)
}
