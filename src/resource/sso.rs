use crate::api::types::{
    AzureAdConnector, CreateSsoConnectionRequest, OktaConnector, SsoConnection,
    UpdateSsoConnectionRequest,
};
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// Declared and persisted state of an SSO connection
///
/// Serialized with the connector as two optional blocks, `aad` and `okta`;
/// decoding fails unless exactly one is present.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "SsoConnectionBlocks", into = "SsoConnectionBlocks")]
pub struct SsoConnectionSpec {
    pub id: Option<String>,
    pub name: String,
    pub email_domain: String,
    pub additional_email_domains: Vec<String>,
    pub connector: SsoConnector,
}

/// Exactly one identity provider per connection
#[derive(Clone, Debug, PartialEq)]
pub enum SsoConnector {
    AzureAd {
        ad_domain: String,
        client_id: String,
        client_secret: String,
    },
    Okta {
        okta_domain: String,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Serialize, Deserialize)]
struct SsoConnectionBlocks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    email_domain: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    additional_email_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aad: Option<AzureAdBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    okta: Option<OktaBlock>,
}

#[derive(Serialize, Deserialize)]
struct AzureAdBlock {
    ad_domain: String,
    client_id: String,
    client_secret: String,
}

#[derive(Serialize, Deserialize)]
struct OktaBlock {
    okta_domain: String,
    client_id: String,
    client_secret: String,
}

impl TryFrom<SsoConnectionBlocks> for SsoConnectionSpec {
    type Error = ProviderError;

    fn try_from(blocks: SsoConnectionBlocks) -> Result<Self, Self::Error> {
        Ok(Self {
            connector: SsoConnector::from_blocks(blocks.aad, blocks.okta)?,
            id: blocks.id,
            name: blocks.name,
            email_domain: blocks.email_domain,
            additional_email_domains: blocks.additional_email_domains,
        })
    }
}

impl From<SsoConnectionSpec> for SsoConnectionBlocks {
    fn from(spec: SsoConnectionSpec) -> Self {
        let (aad, okta) = match spec.connector {
            SsoConnector::AzureAd {
                ad_domain,
                client_id,
                client_secret,
            } => (
                Some(AzureAdBlock {
                    ad_domain,
                    client_id,
                    client_secret,
                }),
                None,
            ),
            SsoConnector::Okta {
                okta_domain,
                client_id,
                client_secret,
            } => (
                None,
                Some(OktaBlock {
                    okta_domain,
                    client_id,
                    client_secret,
                }),
            ),
        };
        Self {
            id: spec.id,
            name: spec.name,
            email_domain: spec.email_domain,
            additional_email_domains: spec.additional_email_domains,
            aad,
            okta,
        }
    }
}

impl SsoConnector {
    fn from_blocks(
        aad: Option<AzureAdBlock>,
        okta: Option<OktaBlock>,
    ) -> Result<Self, ProviderError> {
        match (aad, okta) {
            (Some(a), None) => Ok(SsoConnector::AzureAd {
                ad_domain: a.ad_domain,
                client_id: a.client_id,
                client_secret: a.client_secret,
            }),
            (None, Some(o)) => Ok(SsoConnector::Okta {
                okta_domain: o.okta_domain,
                client_id: o.client_id,
                client_secret: o.client_secret,
            }),
            (Some(_), Some(_)) => Err(ProviderError::validation(
                "only one of aad or okta can be configured",
            )),
            (None, None) => Err(ProviderError::validation(
                "one of aad or okta must be configured",
            )),
        }
    }

    fn wire(&self) -> (Option<AzureAdConnector>, Option<OktaConnector>) {
        match self {
            SsoConnector::AzureAd {
                ad_domain,
                client_id,
                client_secret,
            } => (
                Some(AzureAdConnector {
                    ad_domain: ad_domain.clone(),
                    client_id: client_id.clone(),
                    client_secret: Some(client_secret.clone()),
                }),
                None,
            ),
            SsoConnector::Okta {
                okta_domain,
                client_id,
                client_secret,
            } => (
                None,
                Some(OktaConnector {
                    okta_domain: okta_domain.clone(),
                    client_id: client_id.clone(),
                    client_secret: Some(client_secret.clone()),
                }),
            ),
        }
    }
}

impl SsoConnectionSpec {
    pub fn create_request(&self) -> CreateSsoConnectionRequest {
        let (aad, okta) = self.connector.wire();
        CreateSsoConnectionRequest {
            name: self.name.clone(),
            email_domain: self.email_domain.clone(),
            additional_email_domains: self.additional_email_domains.clone(),
            aad,
            okta,
        }
    }

    /// Update carrying only the fields that differ from `prior`
    ///
    /// `None` when nothing declared changed.
    pub fn update_request(&self, prior: &SsoConnectionSpec) -> Option<UpdateSsoConnectionRequest> {
        let mut req = UpdateSsoConnectionRequest::default();
        let mut changed = false;

        if self.name != prior.name {
            req.name = Some(self.name.clone());
            changed = true;
        }
        if self.email_domain != prior.email_domain {
            req.email_domain = Some(self.email_domain.clone());
            changed = true;
        }
        if self.additional_email_domains != prior.additional_email_domains {
            req.additional_email_domains = Some(self.additional_email_domains.clone());
            changed = true;
        }
        if self.connector != prior.connector {
            let (aad, okta) = self.connector.wire();
            req.aad = aad;
            req.okta = okta;
            changed = true;
        }

        changed.then_some(req)
    }

    /// Refresh declared fields from a server read, keeping the write-only secret
    pub fn apply_observed(&mut self, conn: &SsoConnection) {
        self.id = Some(conn.id.clone());
        self.name = conn.name.clone();
        self.email_domain = conn.email_domain.clone();
        self.additional_email_domains = conn.additional_email_domains.clone();

        let replacement = match (&mut self.connector, &conn.aad, &conn.okta) {
            (
                SsoConnector::AzureAd {
                    ad_domain,
                    client_id,
                    ..
                },
                Some(aad),
                None,
            ) => {
                *ad_domain = aad.ad_domain.clone();
                *client_id = aad.client_id.clone();
                None
            }
            (
                SsoConnector::Okta {
                    okta_domain,
                    client_id,
                    ..
                },
                None,
                Some(okta),
            ) => {
                *okta_domain = okta.okta_domain.clone();
                *client_id = okta.client_id.clone();
                None
            }
            // connector switched outside of this declaration; the secret is unknown
            (_, Some(aad), None) => Some(SsoConnector::AzureAd {
                ad_domain: aad.ad_domain.clone(),
                client_id: aad.client_id.clone(),
                client_secret: String::new(),
            }),
            (_, None, Some(okta)) => Some(SsoConnector::Okta {
                okta_domain: okta.okta_domain.clone(),
                client_id: okta.client_id.clone(),
                client_secret: String::new(),
            }),
            _ => None,
        };

        if let Some(connector) = replacement {
            self.connector = connector;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn okta_spec() -> SsoConnectionSpec {
        SsoConnectionSpec {
            id: None,
            name: "corp".into(),
            email_domain: "example.com".into(),
            additional_email_domains: vec![],
            connector: SsoConnector::Okta {
                okta_domain: "example.okta.com".into(),
                client_id: "client".into(),
                client_secret: "secret".into(),
            },
        }
    }

    #[test]
    fn decodes_the_single_declared_connector() {
        let spec: SsoConnectionSpec = serde_json::from_str(
            r#"{
                "name": "corp",
                "email_domain": "example.com",
                "aad": {
                    "ad_domain": "example.onmicrosoft.com",
                    "client_id": "id",
                    "client_secret": "secret"
                }
            }"#,
        )
        .unwrap();

        assert!(spec.id.is_none());
        assert!(spec.additional_email_domains.is_empty());
        assert!(matches!(spec.connector, SsoConnector::AzureAd { .. }));
    }

    #[test]
    fn exactly_one_connector_is_required() {
        let both = r#"{
            "name": "corp",
            "email_domain": "example.com",
            "aad": {"ad_domain": "a", "client_id": "id", "client_secret": "s"},
            "okta": {"okta_domain": "o", "client_id": "id", "client_secret": "s"}
        }"#;
        let err = serde_json::from_str::<SsoConnectionSpec>(both).unwrap_err();
        assert!(err.to_string().contains("only one of aad or okta"));

        let neither = r#"{"name": "corp", "email_domain": "example.com"}"#;
        let err = serde_json::from_str::<SsoConnectionSpec>(neither).unwrap_err();
        assert!(err.to_string().contains("one of aad or okta must be configured"));
    }

    #[test]
    fn state_roundtrips_with_connector_blocks() {
        let mut spec = okta_spec();
        spec.id = Some("sso-1".into());

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["okta"]["okta_domain"], "example.okta.com");
        assert!(value.get("aad").is_none());
        assert!(value.get("connector").is_none());

        let reread: SsoConnectionSpec = serde_json::from_value(value).unwrap();
        assert_eq!(reread, spec);
    }

    #[test]
    fn create_request_carries_only_the_chosen_connector() {
        let req = okta_spec().create_request();
        assert!(req.aad.is_none());
        assert_eq!(req.okta.unwrap().client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn unchanged_spec_needs_no_update() {
        let spec = okta_spec();
        assert!(spec.update_request(&spec.clone()).is_none());
    }

    #[test]
    fn update_sends_only_changed_fields() {
        let prior = okta_spec();
        let mut next = prior.clone();
        next.additional_email_domains = vec!["example.org".into()];

        let req = next.update_request(&prior).unwrap();
        assert_eq!(
            req.additional_email_domains,
            Some(vec!["example.org".to_string()])
        );
        assert!(req.name.is_none());
        assert!(req.okta.is_none());
    }

    #[test]
    fn observed_read_keeps_secret() {
        let mut spec = okta_spec();
        let conn = SsoConnection {
            id: "sso-1".into(),
            name: "corp".into(),
            email_domain: "example.com".into(),
            okta: Some(OktaConnector {
                okta_domain: "new.okta.com".into(),
                client_id: "client".into(),
                client_secret: None,
            }),
            ..Default::default()
        };

        spec.apply_observed(&conn);
        assert_eq!(spec.id.as_deref(), Some("sso-1"));
        match spec.connector {
            SsoConnector::Okta {
                okta_domain,
                client_secret,
                ..
            } => {
                assert_eq!(okta_domain, "new.okta.com");
                assert_eq!(client_secret, "secret");
            }
            other => panic!("expected okta connector, got {:?}", other),
        }
    }
}
