//! Transport layer: connection establishment, TLS wrapping, proxy CONNECT
//! tunneling, the per-destination connection pool, and the process-wide
//! hostname resolution cache.

pub mod pool;
pub mod resolve;
pub mod stream;
pub mod tunnel;

use std::time::Duration;

use native_tls::TlsConnector;

use crate::error::{Error, Result};
use crate::http::url::Url;
use crate::net::stream::Stream;

pub use pool::{Address, ConnectionPool, PooledConn};

/// Establish a new transport connection to `host:port`.
///
/// With a proxy configured, the TCP connection goes to the proxy instead and
/// a CONNECT tunnel is negotiated through it. A TLS connector, when given,
/// wraps the resulting stream with `tls_hostname` as the verified server
/// name (the original hostname even when dialing a resolved address).
pub fn establish(
    host: &str,
    port: u16,
    timeout: Duration,
    proxy: Option<&Url>,
    tls: Option<&TlsConnector>,
    tls_hostname: &str,
) -> Result<Stream> {
    let tcp = match proxy {
        Some(proxy) => {
            let proxy_port = proxy
                .port
                .ok_or_else(|| Error::request(format!("proxy URL has no port: {}", proxy.hostname)))?;
            tracing::debug!(proxy = %proxy.hostname, proxy_port, "connecting via proxy");
            let mut tcp = stream::tcp_connect(&proxy.hostname, proxy_port, timeout)?;
            tunnel::establish(&mut tcp, proxy, host, port)?;
            tcp
        }
        None => {
            tracing::debug!(host, port, "connecting");
            stream::tcp_connect(host, port, timeout)?
        }
    };

    match tls {
        Some(connector) => Stream::wrap_tls(tcp, connector, tls_hostname),
        None => Ok(Stream::Plain(tcp)),
    }
}
