use std::borrow::Cow;

use crate::http::headers::HeaderMap;

/// A fully assembled HTTP response.
///
/// The body is completely materialized and any declared content-encoding
/// has already been reversed; a `Response` is never returned half-built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Numeric status code from the status line.
    pub status: u16,
    /// Status message, possibly empty.
    pub message: String,
    /// Response headers as received, duplicates preserved.
    pub headers: HeaderMap,
    /// Decoded body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
