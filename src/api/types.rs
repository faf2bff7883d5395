//! Wire records exchanged with the Platform REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// External cluster as returned by `GET /external-cluster/{id}`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCluster {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Cluster status (creating, ready, warning, failed, deleting, deleted, archived)
    #[serde(default)]
    pub status: String,

    /// Agent status (connecting, online, disconnecting, disconnected)
    #[serde(default)]
    pub agent_status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eks: Option<EksClusterParams>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gke: Option<GkeClusterParams>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aks: Option<AksClusterParams>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EksClusterParams {
    pub account_id: String,
    pub region: String,
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GkeClusterParams {
    pub project_id: String,
    pub location: String,
    pub cluster_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AksClusterParams {
    pub subscription_id: String,
    pub region: String,
    pub node_resource_group: String,
}

/// Body of `POST /external-cluster`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterClusterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eks: Option<EksClusterParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gke: Option<GkeClusterParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aks: Option<AksClusterParams>,
}

/// Body of `POST /external-cluster/{id}`; absent fields are left untouched
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eks: Option<UpdateEksParams>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEksParams {
    pub assume_role_arn: String,
}

/// Body of `POST /external-cluster/{id}/disconnect`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectClusterRequest {
    pub delete_provisioned_nodes: bool,
    pub keep_kubernetes_resources: bool,
}

/// Evictor advanced config: full replacement on `PUT`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvictorAdvancedConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eviction_config: Vec<EvictionConfig>,
}

/// One eviction rule in server shape
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvictionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_selector: Option<PodSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<NodeSelector>,
    #[serde(default)]
    pub settings: EvictionSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<LabelSelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<LabelSelectorRequirement>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl SelectorOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorOperator::In => "In",
            SelectorOperator::NotIn => "NotIn",
            SelectorOperator::Exists => "Exists",
            SelectorOperator::DoesNotExist => "DoesNotExist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "In" => Some(SelectorOperator::In),
            "NotIn" => Some(SelectorOperator::NotIn),
            "Exists" => Some(SelectorOperator::Exists),
            "DoesNotExist" => Some(SelectorOperator::DoesNotExist),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvictionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggressive: Option<SettingEnabled>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposable: Option<SettingEnabled>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_disabled: Option<SettingEnabled>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SettingEnabled {
    pub enabled: bool,
}

/// SSO connection as returned by the Platform
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SsoConnection {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email_domain: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_email_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<AzureAdConnector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okta: Option<OktaConnector>,
    #[serde(default)]
    pub status: SsoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SsoStatus {
    #[serde(alias = "STATUS_ACTIVE")]
    Active,
    #[serde(alias = "STATUS_INACTIVE")]
    Inactive,
    #[serde(alias = "STATUS_FAILED")]
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Azure AD connector; the secret is write-only and never echoed back
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureAdConnector {
    pub ad_domain: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Okta connector; the secret is write-only and never echoed back
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OktaConnector {
    pub okta_domain: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Body of `POST /sso/connections`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSsoConnectionRequest {
    pub name: String,
    pub email_domain: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_email_domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aad: Option<AzureAdConnector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub okta: Option<OktaConnector>,
}

/// Body of `POST /sso/connections/{id}`; only changed fields are sent
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSsoConnectionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_email_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aad: Option<AzureAdConnector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub okta: Option<OktaConnector>,
}
