//! HTTP message model shared by live and recorded messages
//!
//! The transport layer adapts its own request/response types to the
//! [`Request`] and [`Response`] traits (or builds [`BasicRequest`] /
//! [`BasicResponse`] directly). Recorded messages implement the same traits
//! so a tape can match against them and hand them back on playback.

mod basic;
mod recorded;

pub use basic::{BasicRequest, BasicResponse, Headers};
pub use recorded::{Interaction, RecordedRequest, RecordedResponse, ResponseBody};

use std::io;

use bytes::Bytes;
use indexmap::IndexMap;

/// Hop-by-hop proxy header, never stored on a tape
pub const VIA: &str = "Via";

/// Marker header the proxy layer adds to responses served from a tape
pub const X_TAPEDECK: &str = "X-Tapedeck";

/// Content type header name
pub const CONTENT_TYPE: &str = "Content-Type";

/// Charset assumed when the content type does not name one
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Headers and body common to requests and responses
pub trait Message {
    /// Flattened header view: one entry per name, values joined with `", "`
    fn headers(&self) -> IndexMap<String, String>;

    /// Look up a header by name (ASCII case-insensitive)
    fn header(&self, name: &str) -> Option<String> {
        self.headers()
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Whether the body is non-empty
    fn has_body(&self) -> bool;

    /// Raw body bytes
    fn body_as_binary(&self) -> Bytes;

    /// Body decoded with the charset of the content type
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the bytes are not valid in the charset and
    /// `InvalidInput` if the charset is not supported
    fn body_as_text(&self) -> io::Result<String> {
        let charset = self.charset();
        decode(
            &self.body_as_binary(),
            charset.as_deref().unwrap_or(DEFAULT_CHARSET),
        )
    }

    /// Media type of the body without parameters, e.g. `text/plain`
    fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE)
            .map(|value| media_type(&value).to_string())
    }

    /// `charset` parameter of the content type, if any
    fn charset(&self) -> Option<String> {
        self.header(CONTENT_TYPE)
            .and_then(|value| charset_param(&value))
    }
}

/// An HTTP request
pub trait Request: Message {
    /// HTTP method (e.g., "GET", "POST")
    fn method(&self) -> &str;

    /// Request URI as sent by the client
    fn uri(&self) -> &str;
}

/// An HTTP response
pub trait Response: Message {
    /// HTTP status code
    fn status(&self) -> u16;
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Decode bytes in one of the supported charsets
pub(crate) fn decode(bytes: &[u8], charset: &str) -> io::Result<String> {
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8(bytes.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
        "iso-8859-1" | "iso8859-1" | "latin1" => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        "us-ascii" | "ascii" => {
            if bytes.is_ascii() {
                Ok(bytes.iter().map(|&b| char::from(b)).collect())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "body contains non-ASCII bytes",
                ))
            }
        }
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported charset: {other}"),
        )),
    }
}

/// Encode text back into bytes in one of the supported charsets
pub(crate) fn encode(text: &str, charset: &str) -> io::Result<Bytes> {
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Ok(Bytes::copy_from_slice(text.as_bytes())),
        "iso-8859-1" | "iso8859-1" | "latin1" => text
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("character {c:?} is not representable in ISO-8859-1"),
                    )
                })
            })
            .collect::<io::Result<Vec<u8>>>()
            .map(Bytes::from),
        "us-ascii" | "ascii" => {
            if text.is_ascii() {
                Ok(Bytes::copy_from_slice(text.as_bytes()))
            } else {
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "text contains non-ASCII characters",
                ))
            }
        }
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported charset: {other}"),
        )),
    }
}

/// Bytes of `text` in the message's charset, or its UTF-8 bytes when the
/// charset cannot represent it.
pub(crate) fn encode_or_utf8(text: &str, charset: &str) -> Bytes {
    encode(text, charset).unwrap_or_else(|_| Bytes::copy_from_slice(text.as_bytes()))
}
