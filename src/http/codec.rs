//! HTTP/1.1 wire codec: request serialization and response decoding.
//!
//! Decoding is a two-phase state machine. The head phase accumulates reads
//! until the CRLFCRLF separator appears, then parses the status line and
//! header block. The body phase picks a framing strategy by header
//! inspection (Content-Length, chunked transfer coding, or read-to-close)
//! and assembles the complete body. Close-delimited bodies leave no message
//! boundary behind, so the decoded response is flagged non-reusable.

use std::io::Read;

use bytes::BytesMut;

use crate::error::{Error, Result};
use crate::http::headers::HeaderMap;

/// Default per-read size when the caller does not override it.
pub const DEFAULT_CHUNK_SIZE: usize = 262_144;

/// A decoded response before content-decoding, plus whether the connection
/// that produced it still has a usable message boundary.
#[derive(Debug)]
pub struct WireResponse {
    pub status: u16,
    pub message: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub reusable: bool,
}

/// Serialize a request into wire bytes.
///
/// `METHOD SP path SP HTTP/1.1 CRLF`, one `Name: value CRLF` per header
/// value, a blank CRLF, then the raw body. Bodies are always sent whole;
/// chunked request encoding is not supported.
pub fn encode_request(
    method: &str,
    path: &str,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + body.map_or(0, <[u8]>::len));

    out.extend_from_slice(method.as_bytes());
    out.push(b' ');
    out.extend_from_slice(path.as_bytes());
    out.extend_from_slice(b" HTTP/1.1\r\n");

    for (name, value) in headers.iter() {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b"\r\n");

    if let Some(body) = body {
        out.extend_from_slice(body);
    }

    out
}

/// Read and decode one response from the transport.
///
/// A zero-length first read is [`Error::EmptyResponse`]; a close after
/// partial data is a protocol error, not an empty response.
pub fn read_response<S: Read>(stream: &mut S, chunk_size: usize) -> Result<WireResponse> {
    let mut buf = BytesMut::with_capacity(chunk_size.min(8192));
    let mut tmp = vec![0u8; chunk_size];

    // Head phase: accumulate until CRLFCRLF.
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut tmp)?;
        if n == 0 {
            if buf.is_empty() {
                return Err(Error::EmptyResponse);
            }
            return Err(Error::request("connection closed before end of response head"));
        }
        buf.extend_from_slice(&tmp[..n]);
    };

    let head = buf.split_to(head_end + 4);
    let head = std::str::from_utf8(&head[..head_end]).map_err(Error::request)?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or("");
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let status = parts
        .next()
        .ok_or_else(|| Error::request(format!("malformed status line: {status_line:?}")))?;
    let status: u16 = status
        .parse()
        .map_err(|_| Error::request(format!("invalid status code in line: {status_line:?}")))?;
    let message = parts.next().unwrap_or("").to_string();

    // Header lines without a colon are skipped rather than rejected.
    let mut headers = HeaderMap::new();
    headers.extend_raw(lines.filter(|line| !line.is_empty()).filter_map(|line| {
        line.split_once(':')
            .map(|(name, value)| (name.trim(), value.trim()))
    }));

    // Body phase: framing priority is Content-Length, then chunked, then
    // close-delimited. `buf` holds any body bytes read along with the head.
    let mut reusable = true;
    let body = if let Some(length) = headers.get("Content-Length") {
        let length: usize = length
            .trim()
            .parse()
            .map_err(|_| Error::request(format!("invalid Content-Length: {length:?}")))?;
        read_sized(stream, buf, length, &mut tmp)?
    } else if headers
        .get("Transfer-Encoding")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("chunked"))
    {
        read_chunked(stream, buf, &mut tmp)?
    } else {
        reusable = false;
        read_to_close(stream, buf, &mut tmp)?
    };

    Ok(WireResponse {
        status,
        message,
        headers,
        body,
        reusable,
    })
}

/// Exact byte-count framing: read until `length` bytes are buffered.
fn read_sized<S: Read>(
    stream: &mut S,
    mut buf: BytesMut,
    length: usize,
    tmp: &mut [u8],
) -> Result<Vec<u8>> {
    while buf.len() < length {
        // Never read past the declared length; the bytes after it belong
        // to the next message on this connection.
        let want = (length - buf.len()).min(tmp.len());
        let n = stream.read(&mut tmp[..want])?;
        if n == 0 {
            return Err(Error::request("connection closed before full body received"));
        }
        buf.extend_from_slice(&tmp[..n]);
    }
    buf.truncate(length);
    Ok(buf.to_vec())
}

/// Chunked framing: accumulate until the terminal `0 CRLF CRLF` marker is
/// present anywhere in the buffer, then walk the buffer from the start and
/// splice the chunk payloads together. Deferring the walk until the marker
/// arrives means length/payload pairs may be split across reads arbitrarily.
/// The marker sighting is only a hint: the same byte sequence can occur inside
/// a chunk payload, so a walk that runs off the end of the buffer resumes
/// reading instead of failing.
fn read_chunked<S: Read>(stream: &mut S, mut buf: BytesMut, tmp: &mut [u8]) -> Result<Vec<u8>> {
    let mut marker_seen = false;
    loop {
        if marker_seen || find(&buf, b"0\r\n\r\n").is_some() {
            marker_seen = true;
            if let Some(body) = walk_chunks(&buf)? {
                return Ok(body);
            }
        }
        let n = stream.read(tmp)?;
        if n == 0 {
            return Err(Error::request("connection closed before terminal chunk"));
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}

/// Walks length/payload pairs from the start of `buf`. `Ok(None)` means the
/// buffer ends mid-structure and more data is needed.
fn walk_chunks(buf: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    let mut index = 0;
    loop {
        let Some(rest) = buf.get(index..) else {
            return Ok(None);
        };
        let Some(rel) = find(rest, b"\r\n") else {
            return Ok(None);
        };
        let line_end = index + rel;
        let size_line =
            std::str::from_utf8(&buf[index..line_end]).map_err(Error::request)?;
        // Chunk extensions after ';' are tolerated and ignored.
        let size_token = size_line.split(';').next().unwrap_or(size_line).trim();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| Error::request(format!("invalid chunk size: {size_line:?}")))?;
        if size == 0 {
            return Ok(Some(body));
        }
        let payload_start = line_end + 2;
        let payload_end = payload_start + size;
        if payload_end > buf.len() {
            return Ok(None);
        }
        body.extend_from_slice(&buf[payload_start..payload_end]);
        // Skip the CRLF that trails the payload.
        index = payload_end + 2;
    }
}

/// Close-delimited framing: the peer closing its side terminates the body.
fn read_to_close<S: Read>(stream: &mut S, mut buf: BytesMut, tmp: &mut [u8]) -> Result<Vec<u8>> {
    loop {
        let n = stream.read(tmp)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
    }
    Ok(buf.to_vec())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_simple_get() {
        let mut headers = HeaderMap::new();
        headers.set("Host", "example.com");

        let bytes = encode_request("GET", "/", &headers, None);

        assert_eq!(bytes, b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
    }

    #[test]
    fn encode_skips_unset_headers() {
        let mut headers = HeaderMap::new();
        headers.set("Host", "example.com");
        headers.unset("Accept-Encoding");

        let text = String::from_utf8(encode_request("GET", "/", &headers, None)).unwrap();

        assert!(!text.contains("Accept-Encoding"));
    }
}
