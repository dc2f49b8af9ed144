use std::collections::VecDeque;
use std::io::{self, Read};

use courier::Error;
use courier::HeaderMap;
use courier::http::codec::{encode_request, read_response};

/// A transport stub that serves a scripted sequence of reads, so tests can
/// control exactly how response bytes are split across reads. An exhausted
/// reader behaves like a closed connection (zero-length reads).
struct SegmentedReader {
    segments: VecDeque<Vec<u8>>,
}

impl SegmentedReader {
    fn new<const N: usize>(segments: [&[u8]; N]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_vec()).collect(),
        }
    }
}

impl Read for SegmentedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(segment) = self.segments.pop_front() else {
            return Ok(0);
        };
        if segment.len() <= buf.len() {
            buf[..segment.len()].copy_from_slice(&segment);
            Ok(segment.len())
        } else {
            buf.copy_from_slice(&segment[..buf.len()]);
            self.segments.push_front(segment[buf.len()..].to_vec());
            Ok(buf.len())
        }
    }
}

const CHUNK: usize = 4096;

#[test]
fn test_encode_request_with_body() {
    let mut headers = HeaderMap::new();
    headers.set("Host", "example.com");
    headers.set("Content-Length", "4");

    let bytes = encode_request("POST", "/submit", &headers, Some(b"abcd"));

    assert_eq!(
        bytes,
        b"POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Length: 4\r\n\r\nabcd"
    );
}

#[test]
fn test_round_trip_content_length() {
    // Encode a request, then decode the reply a server would send back.
    let headers: HeaderMap = [("Content-Length", "4")].into_iter().collect();
    let request = encode_request("POST", "/", &headers, Some(b"abcd"));
    assert!(request.ends_with(b"\r\n\r\nabcd"));

    let mut reader =
        SegmentedReader::new([b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nwxyz"]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.status, 200);
    assert_eq!(wire.message, "OK");
    assert_eq!(wire.body, b"wxyz");
    assert!(wire.reusable);
}

#[test]
fn test_content_length_body_split_across_reads() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nhel",
        b"lo ",
        b"world",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"hello world"[..10].to_vec());
}

#[test]
fn test_content_length_is_an_exact_byte_count() {
    // Bytes past the declared length belong to the next message and must
    // not leak into the body.
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nwxyzEXTRA",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"wxyz");
}

#[test]
fn test_head_split_across_reads() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200",
        b" OK\r\nContent-Le",
        b"ngth: 2\r\n\r",
        b"\nok",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.status, 200);
    assert_eq!(wire.body, b"ok");
}

#[test]
fn test_chunked_decode() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"Wikipedia");
    assert!(wire.reusable);
}

#[test]
fn test_chunked_decode_split_across_reads() {
    // Length lines and payloads arrive sliced at awkward boundaries; the
    // decoded body must be identical regardless.
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r",
        b"\nWi",
        b"ki\r\n5\r\nped",
        b"ia\r\n0\r\n",
        b"\r\n",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"Wikipedia");
}

#[test]
fn test_chunked_terminal_marker_inside_payload() {
    // A payload that itself contains `0\r\n\r\n`, with a read boundary right
    // after it, must not be mistaken for the terminal chunk.
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\n0\r\n\r\n".as_slice(),
        b"\r\n0\r\n\r\n",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"0\r\n\r\n");
    assert!(wire.reusable);
}

#[test]
fn test_chunked_close_after_marker_lookalike_is_an_error() {
    // The stream closes right after a payload-embedded marker lookalike,
    // before the real terminal chunk ever arrives.
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\n0\r\n\r\n".as_slice(),
    ]);
    let err = read_response(&mut reader, CHUNK).unwrap_err();

    assert!(matches!(err, Error::Request(_)));
}

#[test]
fn test_chunked_tolerates_chunk_extensions() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;name=value\r\nWiki\r\n0\r\n\r\n",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"Wiki");
}

#[test]
fn test_close_delimited_body() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nServer: test\r\n\r\npart one ",
        b"part two",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.body, b"part one part two");
    // No next-message boundary: the connection is consumed.
    assert!(!wire.reusable);
}

#[test]
fn test_empty_response() {
    let mut reader = SegmentedReader::new::<0>([]);
    let err = read_response(&mut reader, CHUNK).unwrap_err();

    assert!(matches!(err, Error::EmptyResponse));
}

#[test]
fn test_close_after_partial_head_is_not_empty_response() {
    let mut reader = SegmentedReader::new([b"HTTP/1.1 200 OK\r\nContent-".as_slice()]);
    let err = read_response(&mut reader, CHUNK).unwrap_err();

    assert!(matches!(err, Error::Request(_)));
}

#[test]
fn test_close_before_full_sized_body_is_an_error() {
    let mut reader =
        SegmentedReader::new([b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort".as_slice()]);
    let err = read_response(&mut reader, CHUNK).unwrap_err();

    assert!(matches!(err, Error::Request(_)));
}

#[test]
fn test_duplicate_response_headers_are_preserved() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\nContent-Length: 0\r\n\r\n",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(
        wire.headers.get_all("Set-Cookie").unwrap(),
        &["a=1".to_string(), "b=2".to_string()]
    );
}

#[test]
fn test_header_line_without_colon_is_skipped() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 200 OK\r\ngarbage line\r\nContent-Length: 2\r\n\r\nok",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.headers.len(), 1);
    assert_eq!(wire.body, b"ok");
}

#[test]
fn test_status_message_may_contain_spaces() {
    let mut reader = SegmentedReader::new([
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n",
    ]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.status, 404);
    assert_eq!(wire.message, "Not Found");
}

#[test]
fn test_missing_status_message_is_empty() {
    let mut reader =
        SegmentedReader::new([b"HTTP/1.1 204\r\nContent-Length: 0\r\n\r\n".as_slice()]);
    let wire = read_response(&mut reader, CHUNK).unwrap();

    assert_eq!(wire.status, 204);
    assert_eq!(wire.message, "");
}
