//! Recorded (stored) form of requests and responses

use std::io;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classifier;

use super::{
    decode, encode_or_utf8, Message, Request, Response, DEFAULT_CHARSET, VIA, X_TAPEDECK,
};

/// One recorded request/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Recorded request
    pub request: RecordedRequest,
    /// Recorded response
    pub response: RecordedResponse,
    /// When the exchange was recorded
    pub recorded: DateTime<Utc>,
}

/// Request as stored on a tape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request URI
    pub uri: String,
    /// Flattened headers
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Body text, absent when the request had no body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Normalize a live request for storage
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be decoded as text
    pub fn capture(request: &dyn Request) -> io::Result<Self> {
        let body = if request.has_body() {
            Some(request.body_as_text()?)
        } else {
            None
        };

        Ok(Self {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            headers: strip_headers(request.headers(), &[VIA]),
            body,
        })
    }
}

impl Message for RecordedRequest {
    fn headers(&self) -> IndexMap<String, String> {
        self.headers.clone()
    }

    fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|body| !body.is_empty())
    }

    fn body_as_binary(&self) -> Bytes {
        let charset = self.charset();
        self.body
            .as_deref()
            .map(|body| encode_or_utf8(body, charset.as_deref().unwrap_or(DEFAULT_CHARSET)))
            .unwrap_or_default()
    }

    fn body_as_text(&self) -> io::Result<String> {
        Ok(self.body.clone().unwrap_or_default())
    }
}

impl Request for RecordedRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn uri(&self) -> &str {
        &self.uri
    }
}

/// Stored response body, text or raw bytes but never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    /// Printable text with a textual content type
    Text(String),
    /// Anything else
    Binary(Bytes),
}

/// Response as stored on a tape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    /// HTTP status code
    pub status: u16,
    /// Flattened headers
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Body, absent when the response had none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ResponseBody>,
}

impl RecordedResponse {
    /// Normalize a live response for storage
    pub fn capture(response: &dyn Response) -> Self {
        Self {
            status: response.status(),
            headers: strip_headers(response.headers(), &[VIA, X_TAPEDECK]),
            body: classifier::classify(response),
        }
    }
}

impl Message for RecordedResponse {
    fn headers(&self) -> IndexMap<String, String> {
        self.headers.clone()
    }

    fn has_body(&self) -> bool {
        match &self.body {
            Some(ResponseBody::Text(text)) => !text.is_empty(),
            Some(ResponseBody::Binary(bytes)) => !bytes.is_empty(),
            None => false,
        }
    }

    fn body_as_binary(&self) -> Bytes {
        match &self.body {
            Some(ResponseBody::Text(text)) => {
                let charset = self.charset();
                encode_or_utf8(text, charset.as_deref().unwrap_or(DEFAULT_CHARSET))
            }
            Some(ResponseBody::Binary(bytes)) => bytes.clone(),
            None => Bytes::new(),
        }
    }

    fn body_as_text(&self) -> io::Result<String> {
        match &self.body {
            Some(ResponseBody::Text(text)) => Ok(text.clone()),
            Some(ResponseBody::Binary(bytes)) => {
                let charset = self.charset();
                decode(bytes, charset.as_deref().unwrap_or(DEFAULT_CHARSET))
            }
            None => Ok(String::new()),
        }
    }
}

impl Response for RecordedResponse {
    fn status(&self) -> u16 {
        self.status
    }
}

fn strip_headers(headers: IndexMap<String, String>, excluded: &[&str]) -> IndexMap<String, String> {
    headers
        .into_iter()
        .filter(|(name, _)| !excluded.iter().any(|x| name.eq_ignore_ascii_case(x)))
        .collect()
}
