//! Tape: an ordered, in-memory record of HTTP interactions
//!
//! A tape answers live requests from its recordings (`seek` / `play`) and
//! accepts new recordings (`record`). How it does so depends on its
//! [`TapeMode`]:
//!
//! - non-sequential modes look recordings up by content, scanning in
//!   insertion order so the first match wins, and `record` replaces a
//!   matching interaction in place;
//! - sequential modes consume recordings strictly in order through a cursor,
//!   and `record` always appends.

mod mode;

pub use mode::TapeMode;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::TapeConfig;
use crate::match_rules::{default_rules, rule_set, MatchRule, MatchRuleSet, RequestMatcher};
use crate::message::{Interaction, RecordedRequest, RecordedResponse, Request, Response};
use crate::{Result, TapeError};

/// An ordered set of recorded interactions
///
/// `seek`, `play` and `record` take `&self` so a tape can be shared across
/// request-handling threads behind an `Arc`. Configuration setters take
/// `&mut self`.
pub struct Tape {
    name: String,
    mode: TapeMode,
    match_rules: MatchRuleSet,
    interactions: RwLock<Vec<Interaction>>,
    /// Next sequential position. Lock order: cursor, then interactions.
    cursor: Mutex<usize>,
}

impl Tape {
    /// Create an empty read-write tape matching on method and URI
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: TapeMode::default(),
            match_rules: default_rules(),
            interactions: RwLock::new(Vec::new()),
            cursor: Mutex::new(0),
        }
    }

    /// Create an empty tape from configuration
    #[must_use]
    pub fn from_config(config: &TapeConfig) -> Self {
        let mut tape = Self::new(config.name.clone());
        tape.set_mode(config.mode);
        tape.set_match_rules(rule_set(&config.match_rules));
        tape
    }

    /// Tape name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the tape
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> TapeMode {
        self.mode
    }

    /// Replace the mode. The sequential cursor is left untouched.
    pub fn set_mode(&mut self, mode: TapeMode) {
        self.mode = mode;
    }

    /// Rules used to match live requests
    #[must_use]
    pub fn match_rules(&self) -> &[Arc<dyn MatchRule>] {
        &self.match_rules
    }

    /// Replace the match rules
    pub fn set_match_rules(&mut self, match_rules: MatchRuleSet) {
        self.match_rules = match_rules;
    }

    /// Whether `play` is allowed
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.mode.is_readable()
    }

    /// Whether `record` is allowed
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.mode.is_writable()
    }

    /// Whether the tape is consumed in order
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        self.mode.is_sequential()
    }

    /// Number of recorded interactions
    #[must_use]
    pub fn size(&self) -> usize {
        self.interactions.read().len()
    }

    /// Snapshot of the recorded interactions, for persisting the tape
    #[must_use]
    pub fn interactions(&self) -> Vec<Interaction> {
        self.interactions.read().clone()
    }

    /// Replace the recorded interactions, e.g. after loading a tape
    pub fn set_interactions(&mut self, interactions: Vec<Interaction>) {
        *self.interactions.get_mut() = interactions;
    }

    /// Whether `play` would currently succeed for `request`
    ///
    /// Nothing is consumed: in sequential mode the cursor is not advanced.
    ///
    /// # Errors
    ///
    /// Returns `Exhausted` in sequential mode when the cursor is past the last
    /// interaction
    pub fn seek(&self, request: &dyn Request) -> Result<bool> {
        let matcher = RequestMatcher::new(request, &self.match_rules);

        if self.is_sequential() {
            // Held for the whole check so a concurrent play cannot consume
            // the position being examined.
            let cursor = self.cursor.lock();
            let position = *cursor;
            let interactions = self.interactions.read();
            let interaction = interactions
                .get(position)
                .ok_or(TapeError::Exhausted { position })?;
            Ok(matcher.matches(&interaction.request))
        } else {
            let interactions = self.interactions.read();
            Ok(find_match(&interactions, &matcher).is_some())
        }
    }

    /// Answer `request` from the tape
    ///
    /// In sequential mode the cursor advances exactly once per call, before
    /// the recorded request is validated, so a mismatch still consumes the
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `NotReadable` if the mode forbids playback, `Exhausted` or
    /// `MismatchedRequest` in sequential mode, and `NoMatch` otherwise when no
    /// recording fits
    pub fn play(&self, request: &dyn Request) -> Result<RecordedResponse> {
        if !self.is_readable() {
            return Err(TapeError::NotReadable);
        }

        let matcher = RequestMatcher::new(request, &self.match_rules);

        if self.is_sequential() {
            let position = {
                let mut cursor = self.cursor.lock();
                let position = *cursor;
                *cursor += 1;
                position
            };

            let interactions = self.interactions.read();
            let Some(interaction) = interactions.get(position) else {
                warn!("{}: exhausted at position {}", self, position);
                return Err(TapeError::Exhausted { position });
            };

            if !matcher.matches(&interaction.request) {
                warn!(
                    "{}: {} {} does not match recording at position {}",
                    self,
                    request.method(),
                    request.uri(),
                    position
                );
                return Err(TapeError::MismatchedRequest {
                    live: describe(request),
                    recorded: describe(&interaction.request),
                });
            }

            debug!(
                "{}: played {} {} from position {}",
                self,
                request.method(),
                request.uri(),
                position
            );
            Ok(interaction.response.clone())
        } else {
            let interactions = self.interactions.read();
            if let Some(position) = find_match(&interactions, &matcher) {
                let response = &interactions[position].response;
                debug!(
                    "{}: hit {} {} -> {}",
                    self,
                    request.method(),
                    request.uri(),
                    response.status
                );
                Ok(response.clone())
            } else {
                warn!("{}: miss {} {}", self, request.method(), request.uri());
                Err(TapeError::NoMatch {
                    method: request.method().to_string(),
                    uri: request.uri().to_string(),
                })
            }
        }
    }

    /// Record a request/response exchange
    ///
    /// Sequential tapes append. Other tapes replace the first interaction
    /// matching `request`, or append when there is none.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the mode forbids recording, or `Io` if the
    /// request body cannot be decoded as text
    pub fn record(&self, request: &dyn Request, response: &dyn Response) -> Result<()> {
        if !self.is_writable() {
            return Err(TapeError::NotWritable);
        }

        let interaction = Interaction {
            request: RecordedRequest::capture(request)?,
            response: RecordedResponse::capture(response),
            recorded: Utc::now(),
        };

        let mut interactions = self.interactions.write();

        if self.is_sequential() {
            interactions.push(interaction);
            debug!(
                "{}: appended {} {} at position {}",
                self,
                request.method(),
                request.uri(),
                interactions.len() - 1
            );
            return Ok(());
        }

        let matcher = RequestMatcher::new(request, &self.match_rules);
        if let Some(position) = find_match(&interactions, &matcher) {
            interactions[position] = interaction;
            debug!(
                "{}: replaced {} {} at position {}",
                self,
                request.method(),
                request.uri(),
                position
            );
        } else {
            interactions.push(interaction);
            debug!(
                "{}: recorded {} {} (count: {})",
                self,
                request.method(),
                request.uri(),
                interactions.len()
            );
        }

        Ok(())
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tape[{}]", self.name)
    }
}

impl fmt::Debug for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("match_rules", &self.match_rules.len())
            .field("interactions", &self.size())
            .finish_non_exhaustive()
    }
}

/// Position of the first interaction accepted by `matcher`
fn find_match(interactions: &[Interaction], matcher: &RequestMatcher<'_>) -> Option<usize> {
    interactions
        .iter()
        .position(|interaction| matcher.matches(&interaction.request))
}

/// Human-readable request summary for mismatch diagnostics
fn describe(request: &dyn Request) -> String {
    let body = request
        .body_as_text()
        .unwrap_or_else(|_| String::from_utf8_lossy(&request.body_as_binary()).into_owned());
    format!(
        "method: {}, uri: {}, headers: {:?}, body: {}",
        request.method(),
        request.uri(),
        request.headers(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_rules::MatchRules;
    use bytes::Bytes;
    use crate::message::{BasicRequest, BasicResponse, ResponseBody, CONTENT_TYPE};

    fn get(uri: &str) -> BasicRequest {
        BasicRequest::new("GET", uri)
    }

    fn ok(body: &'static str) -> BasicResponse {
        BasicResponse::new(200)
            .with_header(CONTENT_TYPE, "text/plain")
            .with_body(body)
    }

    fn body_text(response: &RecordedResponse) -> Option<&str> {
        match &response.body {
            Some(ResponseBody::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn tape_with(mode: TapeMode) -> Tape {
        let mut tape = Tape::new("test");
        tape.record(&get("/a"), &ok("A")).unwrap();
        tape.record(&get("/b"), &ok("B")).unwrap();
        tape.set_mode(mode);
        tape
    }

    #[test]
    fn test_new_tape_defaults() {
        let tape = Tape::new("fresh");

        assert_eq!(tape.name(), "fresh");
        assert_eq!(tape.mode(), TapeMode::ReadWrite);
        assert_eq!(tape.match_rules().len(), 2);
        assert_eq!(tape.size(), 0);
        assert!(tape.is_readable());
        assert!(tape.is_writable());
        assert!(!tape.is_sequential());
        assert_eq!(tape.to_string(), "Tape[fresh]");
    }

    #[test]
    fn test_read_write_scenario() {
        let tape = tape_with(TapeMode::ReadWrite);

        assert!(tape.seek(&get("/a")).unwrap());
        assert_eq!(body_text(&tape.play(&get("/b")).unwrap()), Some("B"));
        assert!(matches!(
            tape.play(&get("/c")),
            Err(TapeError::NoMatch { ref uri, .. }) if uri == "/c"
        ));
    }

    #[test]
    fn test_non_sequential_play_is_idempotent() {
        let tape = tape_with(TapeMode::ReadOnly);

        for _ in 0..3 {
            assert_eq!(body_text(&tape.play(&get("/a")).unwrap()), Some("A"));
        }
    }

    #[test]
    fn test_record_replaces_matching_interaction() {
        let tape = Tape::new("test");
        tape.record(&get("/a"), &ok("first")).unwrap();
        tape.record(&get("/b"), &ok("B")).unwrap();
        tape.record(&get("/a"), &ok("second")).unwrap();

        assert_eq!(tape.size(), 2);
        let interactions = tape.interactions();
        assert_eq!(interactions[0].request.uri, "/a");
        assert_eq!(body_text(&interactions[0].response), Some("second"));
    }

    #[test]
    fn test_record_identical_pair_twice() {
        let tape = Tape::new("test");
        tape.record(&get("/a"), &ok("A")).unwrap();
        tape.record(&get("/a"), &ok("A")).unwrap();

        assert_eq!(tape.size(), 1);
    }

    #[test]
    fn test_sequential_mismatch_consumes_position() {
        let tape = tape_with(TapeMode::ReadWriteSequential);

        assert_eq!(body_text(&tape.play(&get("/a")).unwrap()), Some("A"));

        let (live, recorded) = match tape.play(&get("/a")) {
            Err(TapeError::MismatchedRequest { live, recorded }) => (live, recorded),
            other => panic!("expected MismatchedRequest, got {other:?}"),
        };
        assert!(live.contains("method: GET, uri: /a"));
        assert!(recorded.contains("method: GET, uri: /b"));

        // the failed play still advanced the cursor
        assert!(matches!(
            tape.play(&get("/b")),
            Err(TapeError::Exhausted { position: 2 })
        ));
    }

    #[test]
    fn test_sequential_seek_does_not_advance() {
        let tape = tape_with(TapeMode::ReadSequential);

        assert!(tape.seek(&get("/a")).unwrap());
        assert!(tape.seek(&get("/a")).unwrap());
        assert!(!tape.seek(&get("/b")).unwrap());

        tape.play(&get("/a")).unwrap();
        assert!(tape.seek(&get("/b")).unwrap());

        tape.play(&get("/b")).unwrap();
        assert!(matches!(
            tape.seek(&get("/a")),
            Err(TapeError::Exhausted { position: 2 })
        ));
    }

    #[test]
    fn test_sequential_record_appends_duplicates() {
        let mut tape = Tape::new("test");
        tape.set_mode(TapeMode::WriteSequential);
        tape.record(&get("/a"), &ok("1")).unwrap();
        tape.record(&get("/a"), &ok("2")).unwrap();

        assert_eq!(tape.size(), 2);
        assert!(matches!(tape.play(&get("/a")), Err(TapeError::NotReadable)));

        tape.set_mode(TapeMode::ReadSequential);
        assert_eq!(body_text(&tape.play(&get("/a")).unwrap()), Some("1"));
        assert_eq!(body_text(&tape.play(&get("/a")).unwrap()), Some("2"));
    }

    #[test]
    fn test_mode_guards() {
        let tape = tape_with(TapeMode::ReadOnly);
        assert!(matches!(
            tape.record(&get("/c"), &ok("C")),
            Err(TapeError::NotWritable)
        ));
        assert_eq!(tape.size(), 2);

        let tape = tape_with(TapeMode::WriteOnly);
        assert!(matches!(tape.play(&get("/a")), Err(TapeError::NotReadable)));
    }

    #[test]
    fn test_custom_match_rules() {
        let mut tape = Tape::new("test");
        tape.set_match_rules(rule_set(&[MatchRules::Method, MatchRules::Path]));
        tape.record(&get("/search?q=one"), &ok("results")).unwrap();

        assert!(tape.seek(&get("/search?q=two")).unwrap());
        assert!(!tape.seek(&BasicRequest::new("POST", "/search")).unwrap());

        // replaced, not appended, because the path matches
        tape.record(&get("/search?q=three"), &ok("more")).unwrap();
        assert_eq!(tape.size(), 1);
    }

    #[test]
    fn test_set_interactions() {
        let source = tape_with(TapeMode::ReadWrite);

        let mut loaded = Tape::new("loaded");
        loaded.set_interactions(source.interactions());
        loaded.set_mode(TapeMode::ReadOnly);

        assert_eq!(loaded.size(), 2);
        assert_eq!(body_text(&loaded.play(&get("/a")).unwrap()), Some("A"));
    }

    #[test]
    fn test_record_undecodable_request_body() {
        let tape = Tape::new("test");
        let request = BasicRequest::new("POST", "/upload").with_body(&b"\xff\xff"[..]);

        assert!(matches!(tape.record(&request, &ok("ok")), Err(TapeError::Io(_))));
        assert_eq!(tape.size(), 0);
    }

    #[test]
    fn test_record_undecodable_text_response_as_binary() {
        let tape = Tape::new("test");
        let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let response = BasicResponse::new(200)
            .with_header(CONTENT_TYPE, "text/plain")
            .with_body(png.clone());

        tape.record(&get("/img"), &response).unwrap();

        assert_eq!(tape.size(), 1);
        assert_eq!(
            tape.play(&get("/img")).unwrap().body,
            Some(ResponseBody::Binary(png))
        );
    }

    #[test]
    fn test_from_config() {
        let config = TapeConfig {
            name: "configured".to_string(),
            mode: TapeMode::ReadSequential,
            match_rules: vec![MatchRules::Method],
        };
        let tape = Tape::from_config(&config);

        assert_eq!(tape.name(), "configured");
        assert!(tape.is_sequential());
        assert_eq!(tape.match_rules().len(), 1);
    }
}
