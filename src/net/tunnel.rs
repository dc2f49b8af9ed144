use std::io::{Read, Write};
use std::net::TcpStream;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Error, Result};
use crate::http::codec;
use crate::http::headers::HeaderMap;
use crate::http::url::Url;

/// Negotiate an HTTP CONNECT tunnel to `host:port` over a connection that
/// is already open to the proxy.
///
/// Only http/https proxies speak CONNECT; any other proxy scheme leaves the
/// stream untouched. The proxy must answer with status 200; anything else
/// raises [`Error::Proxy`] carrying the proxy's first reply line, and no
/// request bytes ever cross the unestablished tunnel.
pub fn establish(stream: &mut TcpStream, proxy: &Url, host: &str, port: u16) -> Result<()> {
    if proxy.scheme != "http" && proxy.scheme != "https" {
        return Ok(());
    }

    let mut headers = HeaderMap::new();
    if let Some(auth) = &proxy.auth {
        headers.set(
            "Proxy-Authorization",
            format!("Basic {}", BASE64.encode(auth.as_bytes())),
        );
    }

    let target = format!("{host}:{port}");
    tracing::debug!(proxy = %proxy.hostname, target = %target, "sending CONNECT");
    stream.write_all(&codec::encode_request("CONNECT", &target, &headers, None))?;
    stream.flush()?;

    // Consume the proxy's entire reply head so no stray bytes are left to
    // corrupt the first tunneled response.
    let mut reply = Vec::new();
    let mut tmp = [0u8; 4096];
    while !contains(&reply, b"\r\n\r\n") {
        let n = stream.read(&mut tmp)?;
        if n == 0 {
            return Err(Error::request("proxy closed connection during CONNECT"));
        }
        reply.extend_from_slice(&tmp[..n]);
    }

    let first_line = reply
        .split(|&b| b == b'\r')
        .next()
        .unwrap_or(&reply);
    let first_line = String::from_utf8_lossy(first_line).into_owned();

    // Status token is the second space-separated field of the reply line.
    let ok = first_line
        .split_once(' ')
        .is_some_and(|(_, rest)| rest.starts_with("200"));
    if !ok {
        return Err(Error::Proxy(first_line));
    }

    tracing::debug!(target = %target, "CONNECT tunnel established");
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
