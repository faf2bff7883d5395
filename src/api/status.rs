//! Status classification for Platform responses
//!
//! Pure mapping from a transport result to an outcome. Nothing here retries;
//! callers that want retries wrap the call in [`crate::retry`].

use super::transport::{RawResponse, TransportError};
use crate::error::ProviderError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Message for a 2xx response with an empty body
pub const UNEXPECTED_END_OF_JSON: &str = "unexpected end of JSON input";

#[derive(Debug)]
pub enum Outcome {
    /// 2xx with the response body
    Ok(Vec<u8>),
    /// 2xx where no body was expected
    NoBody,
    /// 404
    NotFound,
    /// Transport failure, 5xx or 429
    Retryable(ProviderError),
    /// Any other failure
    Fatal(ProviderError),
}

/// Classify a transport result against the status the caller expected
pub fn classify(
    expected: u16,
    result: Result<RawResponse, TransportError>,
    expect_body: bool,
) -> Outcome {
    let response = match result {
        Ok(r) => r,
        Err(e) => return Outcome::Retryable(ProviderError::Transport(e.0)),
    };

    match response.status {
        200..=299 if expect_body => {
            if response.body.iter().all(u8::is_ascii_whitespace) {
                return Outcome::Fatal(ProviderError::decode(UNEXPECTED_END_OF_JSON));
            }
            match response.content_type.as_deref() {
                Some(content_type) if !is_json(content_type) => Outcome::Fatal(
                    ProviderError::decode(format!("expected a JSON response, got {}", content_type)),
                ),
                _ => Outcome::Ok(response.body),
            }
        }
        200..=299 => Outcome::NoBody,
        404 => Outcome::NotFound,
        status => {
            let err = ProviderError::Status {
                expected,
                status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            };
            if err.is_retryable() {
                Outcome::Retryable(err)
            } else {
                Outcome::Fatal(err)
            }
        }
    }
}

/// `application/json` or a `+json` media type, parameters ignored
fn is_json(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    media_type.eq_ignore_ascii_case("application/json")
        || media_type.to_ascii_lowercase().ends_with("+json")
}

impl Outcome {
    /// Body of a successful response; 404 becomes `NotFound`
    pub fn body(self, resource: &'static str, id: &str) -> Result<Vec<u8>, ProviderError> {
        match self.optional_body()? {
            Some(body) => Ok(body),
            None => Err(ProviderError::NotFound {
                resource,
                id: id.to_string(),
            }),
        }
    }

    /// Body of a successful response; 404 becomes `None`
    pub fn optional_body(self) -> Result<Option<Vec<u8>>, ProviderError> {
        match self {
            Outcome::Ok(body) => Ok(Some(body)),
            Outcome::NoBody => Ok(Some(Vec::new())),
            Outcome::NotFound => Ok(None),
            Outcome::Retryable(e) | Outcome::Fatal(e) => Err(e),
        }
    }

    /// Success without caring about the body; 404 is tolerated when `allow_missing`
    pub fn done(
        self,
        resource: &'static str,
        id: &str,
        allow_missing: bool,
    ) -> Result<(), ProviderError> {
        match self {
            Outcome::NotFound if allow_missing => Ok(()),
            other => other.body(resource, id).map(|_| ()),
        }
    }
}

/// Decode a JSON body into a typed record
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProviderError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProviderError::decode(UNEXPECTED_END_OF_JSON));
    }
    serde_json::from_slice(body)
        .map_err(|e| ProviderError::decode(format!("decoding response body: {}", e)))
}

/// Extract a required top-level field; missing or null is `EmptyPayload`
pub fn require_field(body: &[u8], field: &str) -> Result<Value, ProviderError> {
    let mut doc: Value = decode_json(body)?;
    match doc.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => Err(ProviderError::EmptyPayload),
        Some(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(status: u16, body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(status, body))
    }

    #[test]
    fn success_with_body() {
        match classify(200, ok(200, r#"{"id":"abc"}"#), true) {
            Outcome::Ok(body) => assert_eq!(body, br#"{"id":"abc"}"#.to_vec()),
            other => panic!("expected Ok, got {:?}", other),
        }
    }

    #[test]
    fn success_without_expected_body() {
        assert!(matches!(classify(200, ok(204, ""), false), Outcome::NoBody));
    }

    #[test]
    fn empty_body_when_one_is_expected() {
        match classify(200, ok(200, ""), true) {
            Outcome::Fatal(e) => assert!(e.to_string().contains(UNEXPECTED_END_OF_JSON)),
            other => panic!("expected Fatal, got {:?}", other),
        }
    }

    fn with_content_type(
        body: &str,
        content_type: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
            content_type: content_type.map(str::to_string),
        })
    }

    #[test]
    fn non_json_success_body_is_a_decode_error() {
        let result = with_content_type("<html>maintenance</html>", Some("text/html"));
        match classify(200, result, true) {
            Outcome::Fatal(e) => {
                assert!(matches!(e, ProviderError::Decode(_)));
                assert!(e.to_string().contains("text/html"));
            }
            other => panic!("expected Fatal, got {:?}", other),
        }
    }

    #[test]
    fn json_media_types_are_accepted() {
        for content_type in [
            Some("application/json"),
            Some("Application/JSON; charset=utf-8"),
            Some("application/problem+json"),
            None,
        ] {
            let result = with_content_type(r#"{"id":"abc"}"#, content_type);
            assert!(
                matches!(classify(200, result, true), Outcome::Ok(_)),
                "{:?}",
                content_type
            );
        }
    }

    #[test]
    fn content_type_is_ignored_when_no_body_is_expected() {
        let result = with_content_type("ok", Some("text/plain"));
        assert!(matches!(classify(200, result, false), Outcome::NoBody));
    }

    #[test]
    fn not_found() {
        assert!(matches!(classify(200, ok(404, "{}"), true), Outcome::NotFound));
    }

    #[test]
    fn server_errors_are_retryable() {
        match classify(200, ok(502, "bad gateway"), true) {
            Outcome::Retryable(e) => assert_eq!(
                e.to_string(),
                "expected status code 200, received: status=502 body=bad gateway"
            ),
            other => panic!("expected Retryable, got {:?}", other),
        }
        assert!(matches!(
            classify(200, ok(429, ""), true),
            Outcome::Retryable(_)
        ));
    }

    #[test]
    fn client_errors_are_fatal() {
        match classify(200, ok(400, r#"{"message":"bad"}"#), true) {
            Outcome::Fatal(e) => {
                assert!(e.to_string().contains("status=400"));
                assert!(e.to_string().contains(r#"body={"message":"bad"}"#));
            }
            other => panic!("expected Fatal, got {:?}", other),
        }
    }

    #[test]
    fn transport_errors_are_retryable() {
        let result = Err(TransportError("connection refused".into()));
        assert!(matches!(classify(200, result, true), Outcome::Retryable(_)));
    }

    #[test]
    fn required_field_null_is_empty_payload() {
        let err = require_field(br#"{"token": null}"#, "token").unwrap_err();
        assert!(matches!(err, ProviderError::EmptyPayload));
        assert_eq!(err.to_string(), "response was empty");

        let err = require_field(b"{}", "token").unwrap_err();
        assert!(matches!(err, ProviderError::EmptyPayload));
    }

    #[test]
    fn required_field_present() {
        let value = require_field(br#"{"token":"secret"}"#, "token").unwrap();
        assert_eq!(value, Value::String("secret".into()));
    }

    #[test]
    fn decode_of_empty_body() {
        let err = decode_json::<Value>(b"  ").unwrap_err();
        assert_eq!(err.to_string(), UNEXPECTED_END_OF_JSON);
    }

    #[test]
    fn not_found_handling() {
        let err = Outcome::NotFound.body("cluster", "c-1").unwrap_err();
        assert_eq!(err.to_string(), "cluster c-1 not found");
        assert!(Outcome::NotFound.optional_body().unwrap().is_none());
        assert!(Outcome::NotFound.done("cluster", "c-1", true).is_ok());
        assert!(Outcome::NotFound.done("cluster", "c-1", false).is_err());
    }
}
