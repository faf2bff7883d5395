use crate::api::types::{
    AksClusterParams, EksClusterParams, ExternalCluster, GkeClusterParams,
    RegisterClusterRequest, UpdateClusterRequest, UpdateEksParams,
};
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Written into the credentials field when the Platform reports different credentials
pub const CREDENTIALS_DRIFT_SENTINEL: &str = "credentials-drift-detected-force-apply";

/// Declared and persisted state of one external cluster registration
///
/// The caller owns serialization of this record between runs. `id`,
/// `credentials_id` and `cluster_token` are assigned by the Platform.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClusterRegistration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,

    /// One-shot agent token; sensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,

    /// Delete nodes provisioned by the Platform when the agent disconnects
    #[serde(default)]
    pub delete_nodes_on_disconnect: bool,

    pub provider: ClusterProvider,
}

/// Provider-specific part of a registration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ClusterProvider {
    Eks(EksSpec),
    Gke(GkeSpec),
    Aks(AksSpec),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Eks,
    Gke,
    Aks,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Eks => "eks",
            ProviderKind::Gke => "gke",
            ProviderKind::Aks => "aks",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EksSpec {
    pub account_id: String,
    pub region: String,
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GkeSpec {
    pub project_id: String,
    pub location: String,
    pub cluster_name: String,
    /// Service account key JSON; sensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_json: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AksSpec {
    pub subscription_id: String,
    pub region: String,
    pub cluster_name: String,
    pub node_resource_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub tenant_id: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ClusterRegistration {
    pub fn new(provider: ClusterProvider) -> Self {
        Self {
            id: None,
            credentials_id: None,
            cluster_token: None,
            ssh_public_key: None,
            delete_nodes_on_disconnect: false,
            provider,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match &self.provider {
            ClusterProvider::Eks(_) => ProviderKind::Eks,
            ClusterProvider::Gke(_) => ProviderKind::Gke,
            ClusterProvider::Aks(_) => ProviderKind::Aks,
        }
    }

    pub fn cluster_name(&self) -> &str {
        match &self.provider {
            ClusterProvider::Eks(s) => &s.cluster_name,
            ClusterProvider::Gke(s) => &s.cluster_name,
            ClusterProvider::Aks(s) => &s.cluster_name,
        }
    }

    /// Field that carries the credentials and receives the drift sentinel
    ///
    /// `assume_role_arn` for EKS, `credentials_json` for GKE, `client_id` for AKS.
    pub fn credentials_field(&self) -> (&'static str, Option<&str>) {
        match &self.provider {
            ClusterProvider::Eks(s) => ("assume_role_arn", s.assume_role_arn.as_deref()),
            ClusterProvider::Gke(s) => ("credentials_json", s.credentials_json.as_deref()),
            ClusterProvider::Aks(s) => ("client_id", s.client_id.as_deref()),
        }
    }

    pub(crate) fn credentials_field_mut(&mut self) -> &mut Option<String> {
        match &mut self.provider {
            ClusterProvider::Eks(s) => &mut s.assume_role_arn,
            ClusterProvider::Gke(s) => &mut s.credentials_json,
            ClusterProvider::Aks(s) => &mut s.client_id,
        }
    }

    pub fn register_request(&self) -> RegisterClusterRequest {
        let mut req = RegisterClusterRequest {
            name: self.cluster_name().to_string(),
            ..Default::default()
        };
        match &self.provider {
            ClusterProvider::Eks(s) => {
                req.eks = Some(EksClusterParams {
                    account_id: s.account_id.clone(),
                    region: s.region.clone(),
                    cluster_name: s.cluster_name.clone(),
                    assume_role_arn: None,
                })
            }
            ClusterProvider::Gke(s) => {
                req.gke = Some(GkeClusterParams {
                    project_id: s.project_id.clone(),
                    location: s.location.clone(),
                    cluster_name: s.cluster_name.clone(),
                })
            }
            ClusterProvider::Aks(s) => {
                req.aks = Some(AksClusterParams {
                    subscription_id: s.subscription_id.clone(),
                    region: s.region.clone(),
                    node_resource_group: s.node_resource_group.clone(),
                })
            }
        }
        req
    }

    /// Partial update pushing the current credentials and ssh key
    ///
    /// EKS accepts either an access key pair or an assume-role ARN, never both.
    /// A credentials field still holding the drift sentinel is rejected; the
    /// declared value has to be restored first.
    pub fn update_request(&self) -> Result<UpdateClusterRequest, ProviderError> {
        if let (field, Some(CREDENTIALS_DRIFT_SENTINEL)) = self.credentials_field() {
            return Err(ProviderError::validation(format!(
                "{} holds the credentials drift marker; restore the declared value before updating",
                field
            )));
        }

        let mut req = UpdateClusterRequest {
            ssh_public_key: self.ssh_public_key.clone(),
            ..Default::default()
        };

        match &self.provider {
            ClusterProvider::Eks(s) => {
                let key_pair = match (
                    non_empty(&s.access_key_id),
                    non_empty(&s.secret_access_key),
                ) {
                    (Some(id), Some(secret)) => Some((id, secret)),
                    (None, None) => None,
                    _ => {
                        return Err(ProviderError::validation(
                            "access_key_id and secret_access_key must be set together",
                        ))
                    }
                };
                match (key_pair, non_empty(&s.assume_role_arn)) {
                    (Some(_), Some(_)) => {
                        return Err(ProviderError::validation(
                            "access_key_id/secret_access_key cannot be combined \
                             with assume_role_arn",
                        ))
                    }
                    (Some((id, secret)), None) => {
                        req.credentials = Some(
                            json!({"accessKeyId": id, "secretAccessKey": secret}).to_string(),
                        );
                    }
                    (None, Some(arn)) => {
                        req.eks = Some(UpdateEksParams {
                            assume_role_arn: arn.to_string(),
                        });
                    }
                    (None, None) => {}
                }
            }
            ClusterProvider::Gke(s) => {
                req.credentials = non_empty(&s.credentials_json).map(str::to_string);
            }
            ClusterProvider::Aks(s) => {
                if let (Some(client_id), Some(secret)) =
                    (non_empty(&s.client_id), non_empty(&s.client_secret))
                {
                    req.credentials = Some(
                        json!({
                            "clientId": client_id,
                            "clientSecret": secret,
                            "tenantId": s.tenant_id,
                            "subscriptionId": s.subscription_id,
                        })
                        .to_string(),
                    );
                }
            }
        }

        Ok(req)
    }

    /// Refresh provider identifiers from a server read
    ///
    /// Credentials are not touched here; that is the drift detector's job.
    pub fn apply_observed(&mut self, cluster: &ExternalCluster) {
        match (&mut self.provider, cluster) {
            (ClusterProvider::Eks(s), ExternalCluster { eks: Some(eks), .. }) => {
                s.account_id = eks.account_id.clone();
                s.region = eks.region.clone();
                s.cluster_name = eks.cluster_name.clone();
            }
            (ClusterProvider::Gke(s), ExternalCluster { gke: Some(gke), .. }) => {
                s.project_id = gke.project_id.clone();
                s.location = gke.location.clone();
                s.cluster_name = gke.cluster_name.clone();
            }
            (ClusterProvider::Aks(s), ExternalCluster { aks: Some(aks), .. }) => {
                s.subscription_id = aks.subscription_id.clone();
                s.region = aks.region.clone();
                s.node_resource_group = aks.node_resource_group.clone();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
