//! Cluster token issue and replacement planning
//!
//! Tokens are one-shot secrets: the Platform hands one out per call and never
//! shows it again. A registration that lost its token must be replaced.

use crate::api::status::require_field;
use crate::api::PlatformClient;
use crate::error::ProviderError;
use crate::resource::ClusterRegistration;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Extract the token from a `POST /external-cluster/{id}/token` body
///
/// An empty body, a missing or null `token`, or an empty string are errors.
pub fn parse_token_response(body: &[u8]) -> Result<String, ProviderError> {
    match require_field(body, "token")? {
        Value::String(token) if token.is_empty() => Err(ProviderError::EmptyPayload),
        Value::String(token) => Ok(token),
        other => Err(ProviderError::decode(format!(
            "token must be a string, got {}",
            other
        ))),
    }
}

pub async fn create_cluster_token(
    client: &PlatformClient,
    cluster_id: &str,
) -> Result<String, ProviderError> {
    let body = client.create_cluster_token(cluster_id).await?;
    let token = parse_token_response(&body)?;
    info!(cluster_id = %cluster_id, "Cluster token issued");
    Ok(token)
}

/// Plan-time hook for registrations that lost their token
///
/// Writes a fresh random placeholder into the token and returns `true`,
/// meaning the registration must be replaced. Registrations without an id
/// or with a token are left alone.
pub fn plan_cluster_token(reg: &mut ClusterRegistration) -> bool {
    let registered = reg.id.as_deref().is_some_and(|id| !id.is_empty());
    let has_token = reg.cluster_token.as_deref().is_some_and(|t| !t.is_empty());
    if !registered || has_token {
        return false;
    }

    warn!(
        cluster_id = reg.id.as_deref().unwrap_or_default(),
        "Cluster token missing from state, registration will be replaced"
    );
    reg.cluster_token = Some(Uuid::new_v4().to_string());
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::RawResponse;
    use crate::resource::{ClusterProvider, GkeSpec};
    use serde_json::json;

    const TOKEN: &str = "POST /external-cluster/c-1/token";

    fn client(response: RawResponse) -> PlatformClient {
        PlatformClient::new(MockTransport::with_routes(vec![(TOKEN, response)]))
    }

    #[tokio::test]
    async fn token_is_returned() {
        let platform = client(RawResponse::json(200, &json!({"token": "abc"})));
        let token = create_cluster_token(&platform, "c-1").await.unwrap();
        assert_eq!(token, "abc");
    }

    #[tokio::test]
    async fn null_token_is_empty_payload() {
        let platform = client(RawResponse::json(200, &json!({"token": null})));
        let err = create_cluster_token(&platform, "c-1").await.unwrap_err();
        assert!(err.to_string().contains("response was empty"));
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let err = create_cluster_token(&client(RawResponse::new(200, "")), "c-1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unexpected end of JSON input"));
    }

    #[test]
    fn missing_field_and_wrong_type() {
        assert!(matches!(
            parse_token_response(b"{}"),
            Err(ProviderError::EmptyPayload)
        ));
        assert!(matches!(
            parse_token_response(br#"{"token": ""}"#),
            Err(ProviderError::EmptyPayload)
        ));
        assert!(matches!(
            parse_token_response(br#"{"token": 42}"#),
            Err(ProviderError::Decode(_))
        ));
    }

    fn registration(id: Option<&str>, token: Option<&str>) -> ClusterRegistration {
        let mut reg = ClusterRegistration::new(ClusterProvider::Gke(GkeSpec::default()));
        reg.id = id.map(str::to_string);
        reg.cluster_token = token.map(str::to_string);
        reg
    }

    #[test]
    fn lost_token_forces_replacement() {
        let mut reg = registration(Some("c-1"), None);
        assert!(plan_cluster_token(&mut reg));
        let placeholder = reg.cluster_token.clone().unwrap();
        assert!(Uuid::parse_str(&placeholder).is_ok());

        // a second plan sees the placeholder and does nothing
        assert!(!plan_cluster_token(&mut reg));
        assert_eq!(reg.cluster_token.as_deref(), Some(placeholder.as_str()));
    }

    #[test]
    fn new_or_complete_registrations_are_left_alone() {
        let mut fresh = registration(None, None);
        assert!(!plan_cluster_token(&mut fresh));
        assert!(fresh.cluster_token.is_none());

        let mut complete = registration(Some("c-1"), Some("tok"));
        assert!(!plan_cluster_token(&mut complete));
        assert_eq!(complete.cluster_token.as_deref(), Some("tok"));
    }
}
