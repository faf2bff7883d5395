//! External cluster lifecycle
//!
//! Registration pushes credentials and issues the agent token. Deletion is a
//! polling state machine: each tick reads `(cluster status, agent status,
//! credentials id)`, picks one [`DeleteAction`] with [`decide`], performs it,
//! and waits for the next tick until the cluster is archived.

use super::drift::detect_credentials_drift;
use super::token::create_cluster_token;
use super::{require_id, Context};
use crate::api::types::{DisconnectClusterRequest, ExternalCluster};
use crate::api::PlatformClient;
use crate::error::ProviderError;
use crate::resource::{ClusterRegistration, ProviderKind};
use crate::retry::{retry_context, retry_transient, RetryError};
use std::fmt;
use tracing::{info, warn};

/// Cluster status as reported by the Platform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterStatus {
    Creating,
    Ready,
    Warning,
    Failed,
    Deleting,
    Deleted,
    Archived,
}

impl ClusterStatus {
    pub const ALL: [ClusterStatus; 7] = [
        ClusterStatus::Creating,
        ClusterStatus::Ready,
        ClusterStatus::Warning,
        ClusterStatus::Failed,
        ClusterStatus::Deleting,
        ClusterStatus::Deleted,
        ClusterStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Creating => "creating",
            ClusterStatus::Ready => "ready",
            ClusterStatus::Warning => "warning",
            ClusterStatus::Failed => "failed",
            ClusterStatus::Deleting => "deleting",
            ClusterStatus::Deleted => "deleted",
            ClusterStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProviderError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ProviderError::StateMachine(format!("cluster status {:?}", s)))
    }
}

/// Agent status as reported by the Platform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentStatus {
    Connecting,
    Online,
    Disconnecting,
    Disconnected,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Connecting,
        AgentStatus::Online,
        AgentStatus::Disconnecting,
        AgentStatus::Disconnected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Connecting => "connecting",
            AgentStatus::Online => "online",
            AgentStatus::Disconnecting => "disconnecting",
            AgentStatus::Disconnected => "disconnected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProviderError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ProviderError::StateMachine(format!("agent status {:?}", s)))
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one delete tick sees
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub cluster_status: ClusterStatus,
    pub agent_status: AgentStatus,
    pub has_credentials: bool,
}

impl Observation {
    pub fn from_cluster(cluster: &ExternalCluster) -> Result<Self, ProviderError> {
        Ok(Observation {
            cluster_status: ClusterStatus::parse(&cluster.status)?,
            agent_status: AgentStatus::parse(&cluster.agent_status)?,
            has_credentials: cluster
                .credentials_id
                .as_deref()
                .is_some_and(|id| !id.is_empty()),
        })
    }
}

/// Action chosen for one delete tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteAction {
    /// Cluster is archived; clear the handle
    Done,
    /// Ask the Platform to archive the cluster, then wait
    TriggerDelete,
    /// Ask the agent to disconnect, then wait
    TriggerDisconnect {
        delete_nodes: bool,
        keep_kubernetes_resources: bool,
    },
    /// Server is already working; wait for the next tick
    Wait(String),
}

impl DeleteAction {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            DeleteAction::Done => "done",
            DeleteAction::TriggerDelete => "trigger_delete",
            DeleteAction::TriggerDisconnect { .. } => "trigger_disconnect",
            DeleteAction::Wait(_) => "wait",
        }
    }
}

pub const TRIGGERED_DELETE: &str = "triggered cluster deletion";
pub const TRIGGERED_DISCONNECT: &str = "triggered agent disconnection";

/// Pick the delete action for one observation
///
/// Rules are evaluated in order; the first match wins. An empty credentials
/// id makes disconnect a no-op, so it is checked before disconnecting.
pub fn decide(obs: &Observation, delete_nodes_on_disconnect: bool) -> DeleteAction {
    use AgentStatus as A;
    use ClusterStatus as C;

    if obs.cluster_status == C::Archived {
        return DeleteAction::Done;
    }
    // an agent that never came up looks the same as one that went away
    if matches!(obs.agent_status, A::Disconnected | A::Connecting) {
        return DeleteAction::TriggerDelete;
    }
    if !obs.has_credentials {
        return DeleteAction::TriggerDelete;
    }
    if obs.cluster_status == C::Failed {
        return DeleteAction::TriggerDelete;
    }
    if obs.agent_status == A::Disconnecting {
        return DeleteAction::Wait("agent is disconnecting".to_string());
    }
    if obs.cluster_status == C::Deleting {
        return DeleteAction::Wait("cluster is deleting".to_string());
    }
    if obs.has_credentials && obs.agent_status != A::Disconnected {
        return DeleteAction::TriggerDisconnect {
            delete_nodes: delete_nodes_on_disconnect,
            keep_kubernetes_resources: true,
        };
    }
    if obs.agent_status == A::Disconnected && obs.cluster_status != C::Deleted {
        return DeleteAction::TriggerDelete;
    }
    DeleteAction::Wait(format!(
        "retrying cluster status {} agent status {}",
        obs.cluster_status, obs.agent_status
    ))
}

/// One observe/decide/act step of the delete loop
///
/// `Ok` means the cluster is gone. Waits come back as retryable `Pending`.
async fn delete_tick(
    client: &PlatformClient,
    id: &str,
    delete_nodes_on_disconnect: bool,
) -> Result<(), RetryError> {
    let cluster = match client.get_cluster(id).await? {
        Some(cluster) => cluster,
        None => {
            info!(cluster_id = %id, "Cluster not found, treating as archived");
            return Ok(());
        }
    };

    let obs = Observation::from_cluster(&cluster).map_err(RetryError::NonRetryable)?;
    let action = decide(&obs, delete_nodes_on_disconnect);
    if let Some(metrics) = client.metrics() {
        metrics.record_delete_tick(action.label());
    }

    match action {
        DeleteAction::Done => Ok(()),
        DeleteAction::TriggerDelete => {
            info!(
                cluster_id = %id,
                cluster_status = %obs.cluster_status,
                agent_status = %obs.agent_status,
                "Deleting cluster"
            );
            client.delete_cluster(id).await?;
            Err(RetryError::Retryable(ProviderError::pending(TRIGGERED_DELETE)))
        }
        DeleteAction::TriggerDisconnect {
            delete_nodes,
            keep_kubernetes_resources,
        } => {
            info!(
                cluster_id = %id,
                delete_nodes = delete_nodes,
                "Disconnecting cluster agent"
            );
            let request = DisconnectClusterRequest {
                delete_provisioned_nodes: delete_nodes,
                keep_kubernetes_resources,
            };
            client.disconnect_cluster(id, &request).await?;
            Err(RetryError::Retryable(ProviderError::pending(TRIGGERED_DISCONNECT)))
        }
        DeleteAction::Wait(reason) => Err(RetryError::Retryable(ProviderError::pending(reason))),
    }
}

/// Drive the cluster to archived and clear the handle
///
/// A registration without an id has nothing to delete. For GKE the Platform
/// service account is disabled first on a best-effort basis.
pub async fn delete_cluster(
    ctx: &Context,
    reg: &mut ClusterRegistration,
) -> Result<(), ProviderError> {
    let Some(id) = reg.id.clone().filter(|id| !id.is_empty()) else {
        return Ok(());
    };

    if reg.kind() == ProviderKind::Gke {
        if let Err(e) = ctx.client.disable_gke_service_account(&id).await {
            warn!(cluster_id = %id, error = %e, "Failed to disable GKE service account");
        }
    }

    let delete_nodes = reg.delete_nodes_on_disconnect;
    let client = &ctx.client;
    let cluster_id = id.as_str();
    retry_context(
        ctx.config.delete_timeout,
        &ctx.config.polling_backoff(),
        "delete cluster",
        || delete_tick(client, cluster_id, delete_nodes),
    )
    .await?;

    info!(cluster_id = %id, "Cluster archived");
    reg.id = None;
    reg.credentials_id = None;
    reg.cluster_token = None;
    Ok(())
}

/// Register the cluster, push credentials and issue the agent token
///
/// The id is kept even when a later step fails, so the next run can resume
/// with an update instead of registering twice.
pub async fn register_cluster(
    ctx: &Context,
    reg: &mut ClusterRegistration,
) -> Result<(), ProviderError> {
    // fail on bad credentials before anything exists remotely
    reg.update_request()?;

    let cluster = ctx.client.register_cluster(&reg.register_request()).await?;
    if cluster.id.is_empty() {
        return Err(ProviderError::EmptyPayload);
    }
    info!(
        cluster_id = %cluster.id,
        provider = reg.kind().as_str(),
        name = %reg.cluster_name(),
        "Cluster registered"
    );
    reg.id = Some(cluster.id.clone());

    update_cluster(ctx, reg).await?;

    let token = create_cluster_token(&ctx.client, &cluster.id).await?;
    reg.cluster_token = Some(token);
    Ok(())
}

/// Push credentials and ssh key, storing the credentials id the Platform returns
pub async fn update_cluster(
    ctx: &Context,
    reg: &mut ClusterRegistration,
) -> Result<(), ProviderError> {
    let id = require_id(&reg.id, "cluster")?.to_string();
    let request = reg.update_request()?;

    let updated = retry_transient(
        ctx.config.update_timeout,
        &ctx.config.write_backoff,
        "update cluster",
        || ctx.client.update_cluster(&id, &request),
    )
    .await?;

    info!(
        cluster_id = %id,
        credentials_id = updated.credentials_id.as_deref().unwrap_or(""),
        "Cluster credentials updated"
    );
    reg.credentials_id = updated.credentials_id;
    Ok(())
}

/// Result of reading a registration back from the Platform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterRead {
    /// Cluster exists; `credentials_drift` is set when the sentinel was written
    Found { credentials_drift: bool },
    /// Cluster is archived or unknown; the handle was cleared
    Gone,
}

pub async fn read_cluster(
    ctx: &Context,
    reg: &mut ClusterRegistration,
) -> Result<ClusterRead, ProviderError> {
    let Some(id) = reg.id.clone().filter(|id| !id.is_empty()) else {
        return Ok(ClusterRead::Gone);
    };

    let cluster = match ctx.client.get_cluster(&id).await? {
        Some(cluster) if cluster.status != ClusterStatus::Archived.as_str() => cluster,
        _ => {
            warn!(cluster_id = %id, "Cluster not found, removing from state");
            reg.id = None;
            return Ok(ClusterRead::Gone);
        }
    };

    reg.apply_observed(&cluster);
    let credentials_drift = detect_credentials_drift(reg, &cluster);
    Ok(ClusterRead::Found { credentials_drift })
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
