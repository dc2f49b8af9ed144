//! HTTP protocol implementation.
//!
//! Everything above the transport: the permissive URL parser, the ordered
//! case-insensitive header container, the request/response wire codec with
//! its three body framing strategies, and the content decoder that reverses
//! gzip/deflate/brotli encodings on assembled bodies.

pub mod codec;
pub mod content;
pub mod headers;
pub mod response;
pub mod url;

pub use codec::DEFAULT_CHUNK_SIZE;
pub use headers::HeaderMap;
pub use response::Response;
pub use url::{Url, parse_url};
