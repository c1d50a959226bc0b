//! Text-versus-binary classification of response bodies
//!
//! A body is stored as text only when its content type belongs to a textual
//! family *and* the decoded text is printable under the YAML character rules
//! used by tape serializers. Both gates are needed: binary payloads are often
//! served with a mislabeled `text/*` content type.

use std::sync::OnceLock;

use regex::Regex;

use crate::message::{Response, ResponseBody};

/// Textual content type families
static TEXT_CONTENT_TYPE: OnceLock<Regex> = OnceLock::new();

fn text_content_type_regex() -> &'static Regex {
    TEXT_CONTENT_TYPE.get_or_init(|| {
        Regex::new(r"^text/|application/(json|javascript|(\w+\+)?xml)")
            .expect("text content type pattern is valid")
    })
}

/// Whether the content type names a textual media type
#[must_use]
pub fn is_text_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| text_content_type_regex().is_match(ct))
}

/// Whether every character of `text` is printable
#[must_use]
pub fn is_printable(text: &str) -> bool {
    text.chars().all(is_printable_char)
}

fn is_printable_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{7E}'
            | '\u{85}'
            | '\u{A0}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Decide how a response body is stored
///
/// Returns `None` for an empty body. A textual body that does not decode in
/// its charset is stored as binary.
pub fn classify(response: &dyn Response) -> Option<ResponseBody> {
    if !response.has_body() {
        return None;
    }

    if is_text_content_type(response.content_type().as_deref()) {
        if let Ok(text) = response.body_as_text() {
            if is_printable(&text) {
                return Some(ResponseBody::Text(text));
            }
        }
    }

    Some(ResponseBody::Binary(response.body_as_binary()))
}
