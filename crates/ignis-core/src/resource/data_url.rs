//! Data URL encoding with optional gzip
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::io::Write;

/// Bytes escaped in `data:,` URLs: everything but RFC 3986 unreserved
/// characters and `$&+,:;=@`
const DATA_URL_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// An encoded resource body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub url: String,
    /// Whether `url` holds gzip data and the resource needs `compression: gzip`
    pub gzipped: bool,
}

/// Encode `data` without compression
///
/// UTF-8 text becomes a percent-escaped `data:,` URL and anything else a
/// base64 `data:;base64,` URL.
pub fn make_data_url(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => format!("data:,{}", utf8_percent_encode(text, DATA_URL_ESCAPE)),
        Err(_) => format!("data:;base64,{}", STANDARD.encode(data)),
    }
}

/// Encode gzipped `data` as a base64 data URL
pub fn make_gzip_data_url(data: &[u8]) -> std::io::Result<String> {
    Ok(format!("data:;base64,{}", STANDARD.encode(gzip(data)?)))
}

/// Encode `data`, gzipping it when `auto_compress` is set and the result is
/// shorter than the plain URL
pub fn encode(data: &[u8], auto_compress: bool) -> std::io::Result<Encoded> {
    let plain = make_data_url(data);
    if auto_compress {
        let compressed = make_gzip_data_url(data)?;
        if compressed.len() < plain.len() {
            return Ok(Encoded {
                url: compressed,
                gzipped: true,
            });
        }
    }
    Ok(Encoded {
        url: plain,
        gzipped: false,
    })
}

/// Deterministic gzip: best compression, zero mtime, no file name
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder: GzEncoder<Vec<u8>> =
        GzBuilder::new().mtime(0).write(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_plain_text() {
        assert_eq!(make_data_url(b"xyzzy"), "data:,xyzzy");
        assert_eq!(make_data_url(b"a b\n"), "data:,a%20b%0A");
        assert_eq!(make_data_url(b"k=v;x@y,z"), "data:,k=v;x@y,z");
        assert_eq!(make_data_url(b"100%"), "data:,100%25");
    }

    #[test]
    fn test_binary_uses_base64() {
        assert_eq!(make_data_url(&[0xff, 0x00]), "data:;base64,/wA=");
    }

    #[test]
    fn test_short_text_is_not_compressed() {
        let encoded = encode(b"xyzzy", true).unwrap();
        assert_eq!(encoded.url, "data:,xyzzy");
        assert!(!encoded.gzipped);
    }

    #[test]
    fn test_repetitive_text_is_compressed() {
        let text = "z".repeat(150);
        let encoded = encode(text.as_bytes(), true).unwrap();
        assert!(encoded.gzipped);
        let payload = encoded.url.strip_prefix("data:;base64,").unwrap();
        let compressed = STANDARD.decode(payload).unwrap();
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        assert_eq!(out, text);

        assert!(!encode(text.as_bytes(), false).unwrap().gzipped);
    }

    #[test]
    fn test_gzip_is_deterministic() {
        let data = b"the same bytes every time".repeat(10);
        assert_eq!(gzip(&data).unwrap(), gzip(&data).unwrap());
    }
}
