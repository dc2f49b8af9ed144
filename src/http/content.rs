use std::io::{self, Read};

use flate2::read::{DeflateDecoder, GzDecoder};

/// Reverse a declared `Content-Encoding` on a fully assembled body.
///
/// Recognizes gzip, raw deflate and brotli. Decoding is best-effort: an
/// unrecognized encoding name returns the body unchanged rather than
/// failing, a corrupt stream for a recognized one is an error.
pub fn decode_content(body: Vec<u8>, encoding: &str) -> io::Result<Vec<u8>> {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "gzip" => {
            let mut out = Vec::new();
            GzDecoder::new(body.as_slice()).read_to_end(&mut out)?;
            Ok(out)
        }
        "deflate" => {
            // Servers sending "deflate" almost universally mean a raw
            // deflate stream, not zlib-wrapped.
            let mut out = Vec::new();
            DeflateDecoder::new(body.as_slice()).read_to_end(&mut out)?;
            Ok(out)
        }
        "br" => {
            let mut out = Vec::new();
            brotli::Decompressor::new(body.as_slice(), 4096).read_to_end(&mut out)?;
            Ok(out)
        }
        _ => Ok(body),
    }
}
