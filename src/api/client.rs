//! Typed Platform REST client
//!
//! Every call goes through the status classifier, so callers only ever see
//! typed records or a [`ProviderError`]. No call retries on its own.

use super::status::{classify, decode_json, Outcome};
use super::transport::{ApiRequest, Transport};
use super::types::{
    CreateSsoConnectionRequest, DisconnectClusterRequest, EvictorAdvancedConfig,
    ExternalCluster, RegisterClusterRequest, SsoConnection, UpdateClusterRequest,
    UpdateSsoConnectionRequest,
};
use crate::error::ProviderError;
use crate::metrics::SharedMetrics;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

const EXPECTED_STATUS: u16 = 200;

fn cluster_path(id: &str) -> String {
    format!("/external-cluster/{}", id)
}

fn policies_path(cluster_id: &str) -> String {
    format!("/policies/{}", cluster_id)
}

fn evictor_path(cluster_id: &str) -> String {
    format!("/clusters/{}/evictor-advanced-config", cluster_id)
}

fn sso_path(id: &str) -> String {
    format!("/sso/connections/{}", id)
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ProviderError> {
    serde_json::to_value(value)
        .map_err(|e| ProviderError::validation(format!("encoding request body: {}", e)))
}

/// Client for the Platform API, shared read-only between resources
#[derive(Clone)]
pub struct PlatformClient {
    transport: Arc<dyn Transport>,
    metrics: Option<SharedMetrics>,
}

impl PlatformClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            metrics: None,
        }
    }

    /// Record request counts and durations into `metrics`
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn metrics(&self) -> Option<&SharedMetrics> {
        self.metrics.as_ref()
    }

    async fn call(
        &self,
        operation: &'static str,
        request: ApiRequest,
        expect_body: bool,
    ) -> Outcome {
        let started = Instant::now();
        let outcome = classify(
            EXPECTED_STATUS,
            self.transport.send(request).await,
            expect_body,
        );

        if let Some(metrics) = &self.metrics {
            let label = match &outcome {
                Outcome::Ok(_) | Outcome::NoBody => "ok",
                Outcome::NotFound => "not_found",
                Outcome::Retryable(_) => "retryable",
                Outcome::Fatal(_) => "fatal",
            };
            metrics.record_request(operation, label, started.elapsed().as_secs_f64());
        }

        outcome
    }

    pub async fn register_cluster(
        &self,
        request: &RegisterClusterRequest,
    ) -> Result<ExternalCluster, ProviderError> {
        let req = ApiRequest::post("/external-cluster", Some(to_body(request)?));
        let body = self
            .call("register_cluster", req, true)
            .await
            .body("cluster", &request.name)?;
        decode_json(&body)
    }

    /// `None` when the cluster is archived or unknown
    pub async fn get_cluster(&self, id: &str) -> Result<Option<ExternalCluster>, ProviderError> {
        let body = self
            .call("get_cluster", ApiRequest::get(cluster_path(id)), true)
            .await
            .optional_body()?;
        body.map(|b| decode_json(&b)).transpose()
    }

    pub async fn update_cluster(
        &self,
        id: &str,
        request: &UpdateClusterRequest,
    ) -> Result<ExternalCluster, ProviderError> {
        let req = ApiRequest::post(cluster_path(id), Some(to_body(request)?));
        let body = self.call("update_cluster", req, true).await.body("cluster", id)?;
        decode_json(&body)
    }

    pub async fn disconnect_cluster(
        &self,
        id: &str,
        request: &DisconnectClusterRequest,
    ) -> Result<(), ProviderError> {
        let req = ApiRequest::post(
            format!("{}/disconnect", cluster_path(id)),
            Some(to_body(request)?),
        );
        self.call("disconnect_cluster", req, false)
            .await
            .done("cluster", id, false)
    }

    pub async fn delete_cluster(&self, id: &str) -> Result<(), ProviderError> {
        self.call("delete_cluster", ApiRequest::delete(cluster_path(id)), false)
            .await
            .done("cluster", id, true)
    }

    /// Raw token response body; interpretation belongs to the token service
    pub async fn create_cluster_token(&self, id: &str) -> Result<Vec<u8>, ProviderError> {
        let req = ApiRequest::post(format!("{}/token", cluster_path(id)), None);
        self.call("create_cluster_token", req, true)
            .await
            .body("cluster", id)
    }

    pub async fn disable_gke_service_account(&self, id: &str) -> Result<(), ProviderError> {
        let req = ApiRequest::post(format!("{}/gke/disable-sa", cluster_path(id)), None);
        self.call("disable_gke_service_account", req, false)
            .await
            .done("cluster", id, false)
    }

    /// Raw policies document; a missing document is an error
    pub async fn get_policies(&self, cluster_id: &str) -> Result<Vec<u8>, ProviderError> {
        self.call("get_policies", ApiRequest::get(policies_path(cluster_id)), true)
            .await
            .body("policies for cluster", cluster_id)
    }

    pub async fn upsert_policies(
        &self,
        cluster_id: &str,
        document: Value,
    ) -> Result<(), ProviderError> {
        let req = ApiRequest::put(policies_path(cluster_id), document);
        self.call("upsert_policies", req, false)
            .await
            .done("policies for cluster", cluster_id, false)
    }

    pub async fn get_evictor_advanced_config(
        &self,
        cluster_id: &str,
    ) -> Result<EvictorAdvancedConfig, ProviderError> {
        let req = ApiRequest::get(evictor_path(cluster_id));
        let body = self
            .call("get_evictor_advanced_config", req, true)
            .await
            .body("evictor advanced config for cluster", cluster_id)?;
        decode_json(&body)
    }

    pub async fn upsert_evictor_advanced_config(
        &self,
        cluster_id: &str,
        config: &EvictorAdvancedConfig,
    ) -> Result<EvictorAdvancedConfig, ProviderError> {
        let req = ApiRequest::put(evictor_path(cluster_id), to_body(config)?);
        let body = self
            .call("upsert_evictor_advanced_config", req, true)
            .await
            .body("evictor advanced config for cluster", cluster_id)?;
        decode_json(&body)
    }

    pub async fn create_sso_connection(
        &self,
        request: &CreateSsoConnectionRequest,
    ) -> Result<SsoConnection, ProviderError> {
        let req = ApiRequest::post("/sso/connections", Some(to_body(request)?));
        let body = self
            .call("create_sso_connection", req, true)
            .await
            .body("sso connection", &request.name)?;
        decode_json(&body)
    }

    pub async fn get_sso_connection(
        &self,
        id: &str,
    ) -> Result<Option<SsoConnection>, ProviderError> {
        let body = self
            .call("get_sso_connection", ApiRequest::get(sso_path(id)), true)
            .await
            .optional_body()?;
        body.map(|b| decode_json(&b)).transpose()
    }

    pub async fn update_sso_connection(
        &self,
        id: &str,
        request: &UpdateSsoConnectionRequest,
    ) -> Result<SsoConnection, ProviderError> {
        let req = ApiRequest::post(sso_path(id), Some(to_body(request)?));
        let body = self
            .call("update_sso_connection", req, true)
            .await
            .body("sso connection", id)?;
        decode_json(&body)
    }

    pub async fn delete_sso_connection(&self, id: &str) -> Result<(), ProviderError> {
        self.call("delete_sso_connection", ApiRequest::delete(sso_path(id)), false)
            .await
            .done("sso connection", id, true)
    }
}
