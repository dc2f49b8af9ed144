//! Courier - Minimal blocking HTTP/1.1 client
//!
//! Built directly on TCP sockets for throughput: one reused connection per
//! destination, HTTP CONNECT proxy tunneling, TLS via native-tls, and
//! transparent handling of response framing (content-length, chunked,
//! connection-close) and content-encoding (gzip, deflate, brotli).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod net;

pub use client::{Client, ClientBuilder, RequestBuilder};
pub use config::Config;
pub use error::Error;
pub use http::headers::HeaderMap;
pub use http::response::Response;
pub use http::url::{Url, parse_url};
