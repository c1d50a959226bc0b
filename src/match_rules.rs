//! Rules deciding whether a live request corresponds to a recorded one

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use indexmap::IndexMap;

use crate::message::{Request, VIA};

/// Base used to resolve relative request URIs
const RELATIVE_BASE: &str = "http://localhost/";

/// A predicate comparing a live request with a recorded request
///
/// Rules must be pure: a tape may evaluate them in any order, any number of
/// times, and stops at the first rule that fails.
pub trait MatchRule: Send + Sync {
    /// Whether `live` and `recorded` agree on this rule's dimension
    fn is_match(&self, live: &dyn Request, recorded: &dyn Request) -> bool;
}

impl<F> MatchRule for F
where
    F: Fn(&dyn Request, &dyn Request) -> bool + Send + Sync,
{
    fn is_match(&self, live: &dyn Request, recorded: &dyn Request) -> bool {
        self(live, recorded)
    }
}

/// Ordered set of rules combined with logical AND
pub type MatchRuleSet = Vec<Arc<dyn MatchRule>>;

/// Built-in match rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRules {
    /// HTTP method, ignoring ASCII case
    Method,
    /// Full URI string
    Uri,
    /// URI host
    Host,
    /// URI path
    Path,
    /// URI port, defaulted from the scheme
    Port,
    /// Query parameters, ignoring their order
    Query,
    /// `Authorization` header
    Authorization,
    /// `Accept` header
    Accept,
    /// Body content
    Body,
    /// All headers except `Via`, which is never stored
    Headers,
}

impl MatchRules {
    /// Rules used by a tape unless configured otherwise
    pub const DEFAULT: [Self; 2] = [Self::Method, Self::Uri];

    /// Every built-in rule
    pub const ALL: [Self; 10] = [
        Self::Method,
        Self::Uri,
        Self::Host,
        Self::Path,
        Self::Port,
        Self::Query,
        Self::Authorization,
        Self::Accept,
        Self::Body,
        Self::Headers,
    ];
}

impl MatchRule for MatchRules {
    fn is_match(&self, live: &dyn Request, recorded: &dyn Request) -> bool {
        match self {
            Self::Method => live.method().eq_ignore_ascii_case(recorded.method()),
            Self::Uri => live.uri() == recorded.uri(),
            Self::Host => host(live.uri()) == host(recorded.uri()),
            Self::Path => path(live.uri()) == path(recorded.uri()),
            Self::Port => port(live.uri()) == port(recorded.uri()),
            Self::Query => query_pairs(live.uri()) == query_pairs(recorded.uri()),
            Self::Authorization => {
                live.header("Authorization") == recorded.header("Authorization")
            }
            Self::Accept => live.header("Accept") == recorded.header("Accept"),
            Self::Body => match (live.body_as_text(), recorded.body_as_text()) {
                (Ok(a), Ok(b)) => a == b,
                _ => live.body_as_binary() == recorded.body_as_binary(),
            },
            Self::Headers => stored_headers(live) == stored_headers(recorded),
        }
    }
}

/// Build a rule set from built-in rules
#[must_use]
pub fn rule_set(rules: &[MatchRules]) -> MatchRuleSet {
    rules
        .iter()
        .map(|&rule| Arc::new(rule) as Arc<dyn MatchRule>)
        .collect()
}

/// Default rule set: method and URI
#[must_use]
pub fn default_rules() -> MatchRuleSet {
    rule_set(&MatchRules::DEFAULT)
}

/// Tests recorded requests against one live request
pub struct RequestMatcher<'a> {
    request: &'a dyn Request,
    rules: &'a [Arc<dyn MatchRule>],
}

impl<'a> RequestMatcher<'a> {
    /// Create a matcher for `request`
    #[must_use]
    pub fn new(request: &'a dyn Request, rules: &'a [Arc<dyn MatchRule>]) -> Self {
        Self { request, rules }
    }

    /// Whether every rule accepts `recorded`
    #[must_use]
    pub fn matches(&self, recorded: &dyn Request) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.is_match(self.request, recorded))
    }
}

fn stored_headers(request: &dyn Request) -> IndexMap<String, String> {
    let mut headers = request.headers();
    headers.retain(|name, _| !name.eq_ignore_ascii_case(VIA));
    headers
}

fn parse_uri(uri: &str) -> Option<Url> {
    Url::parse(RELATIVE_BASE).ok()?.join(uri).ok()
}

fn host(uri: &str) -> Option<String> {
    parse_uri(uri).and_then(|url| url.host_str().map(str::to_string))
}

fn path(uri: &str) -> Option<String> {
    parse_uri(uri).map(|url| url.path().to_string())
}

fn port(uri: &str) -> Option<u16> {
    parse_uri(uri).and_then(|url| url.port_or_known_default())
}

/// Query parameters sorted by name then value
fn query_pairs(uri: &str) -> Option<Vec<(String, String)>> {
    parse_uri(uri).map(|url| {
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        pairs.sort();
        pairs
    })
}
