//! Rule-chain matcher

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::uri::{truncate, UriPart};
use super::{Cardinality, RequestMatcher};
use crate::interaction::{Body, HttpRequest, InteractionMessage};

/// Predicate over (incoming request, recorded candidate)
pub type Rule = Arc<dyn Fn(&HttpRequest, &InteractionMessage) -> bool + Send + Sync>;

/// How header values are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueComparison {
    /// Exact comparison
    #[default]
    CaseSensitive,
    /// ASCII case-insensitive comparison
    CaseInsensitive,
}

impl ValueComparison {
    fn equals(self, left: &str, right: &str) -> bool {
        match self {
            Self::CaseSensitive => left == right,
            Self::CaseInsensitive => left.eq_ignore_ascii_case(right),
        }
    }
}

/// Matcher built from a conjunction of rules
///
/// Adding a rule returns a new matcher and leaves the receiver untouched, so
/// a base matcher can be shared and specialised per call site.
#[derive(Clone)]
pub struct RulesMatcher {
    rules: Arc<[Rule]>,
    cardinality: Cardinality,
}

impl RulesMatcher {
    /// Matcher that consumes what it matches
    #[must_use]
    pub fn match_once() -> Self {
        Self::with_cardinality(Cardinality::Once)
    }

    /// Matcher that leaves matched messages in the pool
    #[must_use]
    pub fn match_multiple() -> Self {
        Self::with_cardinality(Cardinality::Multiple)
    }

    /// Matcher with no rules and the given cardinality
    #[must_use]
    pub fn with_cardinality(cardinality: Cardinality) -> Self {
        Self {
            rules: Arc::from(Vec::new()),
            cardinality,
        }
    }

    /// Configured cardinality
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Number of rules in the chain
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// New matcher with `rule` appended
    #[must_use]
    pub fn by<F>(&self, rule: F) -> Self
    where
        F: Fn(&HttpRequest, &InteractionMessage) -> bool + Send + Sync + 'static,
    {
        let mut rules = self.rules.to_vec();
        rules.push(Arc::new(rule));
        Self {
            rules: Arc::from(rules),
            cardinality: self.cardinality,
        }
    }

    /// Match on the HTTP method (case-sensitive)
    #[must_use]
    pub fn by_http_method(&self) -> Self {
        self.by(|request, message| request.method == message.request().method)
    }

    /// Match on the request URI, compared up to `part`
    #[must_use]
    pub fn by_request_uri(&self, part: UriPart) -> Self {
        self.by(move |request, message| {
            truncate(&request.uri, part) == truncate(&message.request().uri, part)
        })
    }

    /// Match on the values of a header, compared case-sensitively
    #[must_use]
    pub fn by_header(&self, name: &str) -> Self {
        self.by_header_with(name, ValueComparison::CaseSensitive)
    }

    /// Match on the values of a header
    ///
    /// Repeated values are joined with `,` and body headers are included.
    /// A header missing from both requests counts as equal.
    #[must_use]
    pub fn by_header_with(&self, name: &str, comparison: ValueComparison) -> Self {
        let name = name.to_string();
        self.by(move |request, message| {
            match (
                request.header_value(&name),
                message.request().header_value(&name),
            ) {
                (None, None) => true,
                (Some(left), Some(right)) => comparison.equals(&left, &right),
                _ => false,
            }
        })
    }

    /// Match on the raw body bytes; a missing body equals an empty one
    #[must_use]
    pub fn by_content(&self) -> Self {
        self.by(|request, message| {
            body_bytes(request.body.as_ref()) == body_bytes(message.request().body.as_ref())
        })
    }

    /// Match on the JSON body deserialized as `T`, using `PartialEq`
    #[must_use]
    pub fn by_json_content<T>(&self) -> Self
    where
        T: DeserializeOwned + PartialEq + 'static,
    {
        self.by_json_content_with::<T, _>(|left, right| left == right)
    }

    /// Match on the JSON body deserialized as `T`, using `equals`
    ///
    /// An absent or empty body parses as "no value"; two absent bodies match.
    /// A body that fails to parse never matches.
    #[must_use]
    pub fn by_json_content_with<T, F>(&self, equals: F) -> Self
    where
        T: DeserializeOwned + 'static,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.by(move |request, message| {
            match (
                parse_json::<T>(request.body.as_ref()),
                parse_json::<T>(message.request().body.as_ref()),
            ) {
                (Ok(None), Ok(None)) => true,
                (Ok(Some(left)), Ok(Some(right))) => equals(&left, &right),
                _ => false,
            }
        })
    }

    fn is_match(&self, request: &HttpRequest, message: &InteractionMessage) -> bool {
        self.rules.iter().all(|rule| rule(request, message))
    }
}

impl Default for RulesMatcher {
    /// Match-once on method and full URI
    fn default() -> Self {
        Self::match_once()
            .by_http_method()
            .by_request_uri(UriPart::Full)
    }
}

impl fmt::Debug for RulesMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesMatcher")
            .field("rules", &self.rules.len())
            .field("cardinality", &self.cardinality)
            .finish()
    }
}

impl RequestMatcher for RulesMatcher {
    fn find_match(
        &self,
        request: &HttpRequest,
        pool: &mut Vec<InteractionMessage>,
    ) -> Option<InteractionMessage> {
        let index = pool
            .iter()
            .position(|message| self.is_match(request, message))?;

        debug!(
            "Matched {} {} to recorded message {} of {}",
            request.method,
            request.uri,
            index,
            pool.len()
        );

        match self.cardinality {
            Cardinality::Once => Some(pool.remove(index)),
            Cardinality::Multiple => Some(pool[index].clone()),
        }
    }
}

fn body_bytes(body: Option<&Body>) -> &[u8] {
    body.map(|body| body.content().as_ref()).unwrap_or_default()
}

fn parse_json<T: DeserializeOwned>(body: Option<&Body>) -> Result<Option<T>, serde_json::Error> {
    let bytes = body_bytes(body);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{HttpResponse, InteractionTimings};
    use chrono::Utc;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::time::Duration;

    fn message(request: HttpRequest) -> InteractionMessage {
        InteractionMessage::new(
            HttpResponse::new(200, request),
            InteractionTimings::new(Utc::now(), Duration::ZERO),
        )
    }

    fn get(uri: &str) -> HttpRequest {
        HttpRequest::get(uri).unwrap()
    }

    fn pool(requests: Vec<HttpRequest>) -> Vec<InteractionMessage> {
        requests.into_iter().map(message).collect()
    }

    #[test]
    fn test_no_rules_match_in_sequence() {
        let mut pool = pool(vec![get("http://first/"), get("http://second/")]);
        let matcher = RulesMatcher::match_once();
        let request = get("http://other/");

        let result = matcher.find_match(&request, &mut pool).unwrap();
        assert_eq!(result.request().uri, "http://first/");
        assert_eq!(pool.len(), 1);

        let result = matcher.find_match(&request, &mut pool).unwrap();
        assert_eq!(result.request().uri, "http://second/");
        assert!(pool.is_empty());

        assert!(matcher.find_match(&request, &mut pool).is_none());
    }

    #[test]
    fn test_match_by_http_method() {
        let mut pool = pool(vec![
            get("http://first/"),
            HttpRequest::new("HEAD", "http://second/").unwrap(),
        ]);
        let request = HttpRequest::new("HEAD", "http://any/").unwrap();

        let result = RulesMatcher::match_once()
            .by_http_method()
            .find_match(&request, &mut pool)
            .unwrap();

        assert_eq!(result.request().method, "HEAD");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let mut pool = pool(vec![HttpRequest::new("get", "http://first/").unwrap()]);
        let request = get("http://first/");

        assert!(RulesMatcher::match_once()
            .by_http_method()
            .find_match(&request, &mut pool)
            .is_none());
    }

    #[test]
    fn test_match_by_complete_uri() {
        let mut pool = pool(vec![
            get("http://first/?name=foo"),
            get("http://first/?name=bar"),
        ]);
        let request = get("http://first/?name=bar");

        let result = RulesMatcher::match_once()
            .by_request_uri(UriPart::Full)
            .find_match(&request, &mut pool)
            .unwrap();

        assert_eq!(result.request().uri, "http://first/?name=bar");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_match_by_partial_uri() {
        let mut pool = pool(vec![
            get("http://first/?name=foo"),
            get("http://first/?name=bar"),
        ]);
        let request = get("http://first/?name=bar");

        let result = RulesMatcher::match_once()
            .by_request_uri(UriPart::Path)
            .find_match(&request, &mut pool)
            .unwrap();

        assert_eq!(result.request().uri, "http://first/?name=foo");
    }

    #[test]
    fn test_match_by_header() {
        let mut pool = pool(vec![
            get("http://first/"),
            get("http://first/").with_header("If-None-Match", "first"),
            get("http://first/").with_header("If-None-Match", "second"),
        ]);
        let request = get("http://first/").with_header("if-none-match", "second");

        let result = RulesMatcher::match_once()
            .by_header("If-None-Match")
            .find_match(&request, &mut pool)
            .unwrap();

        assert_eq!(
            result.request().header_value("If-None-Match").as_deref(),
            Some("second")
        );
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_match_by_header_case_insensitive_value() {
        let mut pool = pool(vec![get("http://first/").with_header("X-Tenant", "ACME")]);
        let request = get("http://first/").with_header("X-Tenant", "acme");

        assert!(RulesMatcher::match_once()
            .by_header("X-Tenant")
            .find_match(&request, &mut pool)
            .is_none());
        assert!(RulesMatcher::match_once()
            .by_header_with("X-Tenant", ValueComparison::CaseInsensitive)
            .find_match(&request, &mut pool)
            .is_some());
    }

    #[test]
    fn test_match_by_header_in_body_headers() {
        let recorded = HttpRequest::post("http://first/", Body::with_content_type("a", "text/plain"))
            .unwrap();
        let mut pool = pool(vec![recorded]);
        let request = HttpRequest::post(
            "http://first/",
            Body::with_content_type("b", "text/plain"),
        )
        .unwrap();

        assert!(RulesMatcher::match_once()
            .by_header("Content-Type")
            .find_match(&request, &mut pool)
            .is_some());
    }

    #[test]
    fn test_match_by_content() {
        let mut pool = pool(vec![
            get("http://first/"),
            HttpRequest::post("http://first/", Body::new(vec![0u8, 1, 2, 3])).unwrap(),
            HttpRequest::post("http://first/", Body::new(vec![3u8, 2, 1, 0])).unwrap(),
        ]);
        let request = HttpRequest::post("http://first/", Body::new(vec![3u8, 2, 1, 0])).unwrap();

        let result = RulesMatcher::match_once()
            .by_content()
            .find_match(&request, &mut pool)
            .unwrap();

        assert_eq!(
            result.request().body.as_ref().unwrap().content().as_ref(),
            &[3, 2, 1, 0]
        );
        assert_eq!(pool.len(), 2);
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Model {
        name: String,
    }

    #[test]
    fn test_match_by_json_content() {
        let mut pool = pool(vec![
            get("http://first/"),
            HttpRequest::post("http://first/", Body::new(r#"{"name":"first"}"#)).unwrap(),
            HttpRequest::post("http://first/", Body::new(r#"{"name":"second"}"#)).unwrap(),
        ]);
        let request =
            HttpRequest::post("http://first/", Body::new(r#"{ "name": "second" }"#)).unwrap();

        let result = RulesMatcher::match_once()
            .by_json_content::<Model>()
            .find_match(&request, &mut pool)
            .unwrap();

        assert_eq!(
            result.request().body.as_ref().unwrap().text(),
            Some(r#"{"name":"second"}"#)
        );
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_match_by_json_content_with_custom_equality() {
        let mut pool = pool(vec![
            HttpRequest::post("http://first/", Body::new(r#"{"name":"BAR"}"#)).unwrap(),
        ]);
        let request = HttpRequest::post("http://first/", Body::new(r#"{"name":"bar"}"#)).unwrap();

        let matcher = RulesMatcher::match_once().by_json_content_with::<Model, _>(|a, b| {
            a.name.eq_ignore_ascii_case(&b.name)
        });

        assert!(matcher.find_match(&request, &mut pool).is_some());
    }

    #[test]
    fn test_unparsable_json_never_matches() {
        let mut pool = pool(vec![
            HttpRequest::post("http://first/", Body::new("not json")).unwrap(),
        ]);
        let request = HttpRequest::post("http://first/", Body::new("not json")).unwrap();

        assert!(RulesMatcher::match_once()
            .by_json_content::<serde_json::Value>()
            .find_match(&request, &mut pool)
            .is_none());
    }

    #[test]
    fn test_match_once_consumes_distinct_messages() {
        let mut pool = pool(vec![get("http://api/json"), get("http://api/json")]);
        let request = get("http://api/json");
        let matcher = RulesMatcher::default();

        assert!(matcher.find_match(&request, &mut pool).is_some());
        assert!(matcher.find_match(&request, &mut pool).is_some());
        assert!(matcher.find_match(&request, &mut pool).is_none());
    }

    #[test]
    fn test_match_multiple_keeps_pool() {
        let mut pool = pool(vec![get("https://reqres.in/api/register")]);
        let matcher = RulesMatcher::match_multiple().by_request_uri(UriPart::Authority);
        let request = HttpRequest::post("https://reqres.in/api/login", Body::new("{}")).unwrap();

        for _ in 0..3 {
            let result = matcher.find_match(&request, &mut pool).unwrap();
            assert_eq!(result.request().uri, "https://reqres.in/api/register");
            assert_eq!(pool.len(), 1);
        }
    }

    #[test]
    fn test_adding_rule_leaves_base_untouched() {
        let base = RulesMatcher::match_once().by_http_method();
        let strict = base.by_request_uri(UriPart::Full);

        assert_eq!(base.rule_count(), 1);
        assert_eq!(strict.rule_count(), 2);
        assert_eq!(strict.cardinality(), Cardinality::Once);
    }

    #[test]
    fn test_closure_is_a_matcher() {
        let matcher = |request: &HttpRequest, pool: &mut Vec<InteractionMessage>| {
            pool.iter()
                .find(|message| message.request().uri == request.uri)
                .cloned()
        };
        let mut pool = pool(vec![get("http://first/")]);

        assert!(matcher.find_match(&get("http://first/"), &mut pool).is_some());
        assert!(matcher.find_match(&get("http://second/"), &mut pool).is_none());
    }

    proptest! {
        #[test]
        fn prop_matching_is_deterministic(paths in prop::collection::vec("[a-c]{1,2}", 1..8), probe in "[a-c]{1,2}") {
            let requests: Vec<_> = paths.iter().map(|p| get(&format!("http://host/{p}"))).collect();
            let request = get(&format!("http://host/{probe}"));
            let matcher = RulesMatcher::default();

            let mut first_pool = pool(requests.clone());
            let mut second_pool = pool(requests);
            let first = matcher.find_match(&request, &mut first_pool);
            let second = matcher.find_match(&request, &mut second_pool);

            prop_assert_eq!(first.map(|m| m.request().uri.clone()), second.map(|m| m.request().uri.clone()));
            prop_assert_eq!(first_pool.len(), second_pool.len());
        }

        #[test]
        fn prop_match_multiple_never_shrinks_pool(paths in prop::collection::vec("[a-c]", 1..8), probes in prop::collection::vec("[a-c]", 1..8)) {
            let mut pool = pool(paths.iter().map(|p| get(&format!("http://host/{p}"))).collect());
            let size = pool.len();
            let matcher = RulesMatcher::match_multiple().by_request_uri(UriPart::Full);

            for probe in probes {
                let request = get(&format!("http://host/{probe}"));
                let found = matcher.find_match(&request, &mut pool);
                prop_assert_eq!(found.is_some(), paths.contains(&probe));
                prop_assert_eq!(pool.len(), size);
            }
        }
    }
}
