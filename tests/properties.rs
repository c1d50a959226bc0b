//! Property tests for matching and recording

use proptest::prelude::*;
use proptest::sample::subsequence;

use tapedeck::match_rules::rule_set;
use tapedeck::message::CONTENT_TYPE;
use tapedeck::{
    BasicRequest, BasicResponse, MatchRules, RecordedRequest, RequestMatcher, ResponseBody, Tape,
};

fn request_strategy() -> impl Strategy<Value = BasicRequest> {
    (
        "(GET|POST|PUT|DELETE|get|post)",
        "/[a-z0-9/]{0,16}",
        proptest::option::of("[a-z]{1,4}=[a-z0-9]{0,4}(&[a-z]{1,4}=[a-z0-9]{0,4}){0,2}"),
        proptest::collection::vec(("X-[A-Z][a-z]{0,6}", "[ -~]{0,16}"), 0..4),
        "[ -~]{0,32}",
    )
        .prop_map(|(method, path, query, headers, body)| {
            let uri = match query {
                Some(query) => format!("http://example.com{path}?{query}"),
                None => format!("http://example.com{path}"),
            };
            let mut request = BasicRequest::new(method, uri).with_body(body);
            for (name, value) in headers {
                request.headers.add(name, value);
            }
            request
        })
}

proptest! {
    #[test]
    fn matching_is_reflexive(
        request in request_strategy(),
        rules in subsequence(MatchRules::ALL.to_vec(), 0..=MatchRules::ALL.len()),
    ) {
        let rules = rule_set(&rules);
        let recorded = RecordedRequest::capture(&request).unwrap();

        prop_assert!(RequestMatcher::new(&request, &rules).matches(&request));
        prop_assert!(RequestMatcher::new(&recorded, &rules).matches(&recorded));
    }

    #[test]
    fn record_then_play_returns_recorded_response(
        paths in proptest::collection::vec("/[a-c]{1,2}", 1..12),
        body in "[a-z ]{1,24}",
    ) {
        let tape = Tape::new("property");
        let mut seen = std::collections::HashSet::new();

        for path in &paths {
            let before = tape.size();
            let request = BasicRequest::new("GET", path.as_str());
            let response = BasicResponse::new(200)
                .with_header(CONTENT_TYPE, "text/plain")
                .with_body(format!("{path} {body}"));

            tape.record(&request, &response).unwrap();

            let expected = if seen.insert(path.clone()) { before + 1 } else { before };
            prop_assert_eq!(tape.size(), expected);

            let played = tape.play(&request).unwrap();
            prop_assert_eq!(played.body, Some(ResponseBody::Text(format!("{path} {body}"))));
        }
    }
}
