//! SSO connections
//!
//! Every write is followed by status polling until the connection is active.
//! A failed connection is reported with the Platform's own message; any other
//! status is waited out until the deadline.

use super::{require_id, Context};
use crate::api::types::{SsoConnection, SsoStatus};
use crate::api::PlatformClient;
use crate::error::ProviderError;
use crate::resource::SsoConnectionSpec;
use crate::retry::{retry_context, retry_transient, RetryError};
use tracing::info;

const RESOURCE: &str = "sso connection";

fn settle(conn: SsoConnection) -> Result<SsoConnection, RetryError> {
    match conn.status {
        SsoStatus::Active => Ok(conn),
        SsoStatus::Failed => Err(RetryError::NonRetryable(ProviderError::ResourceFailed {
            resource: RESOURCE,
            message: conn
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "no reason given".to_string()),
            id: conn.id,
        })),
        status => Err(RetryError::Retryable(ProviderError::pending(format!(
            "sso connection {} is {:?}",
            conn.id, status
        )))),
    }
}

async fn poll_status(client: &PlatformClient, id: &str) -> Result<SsoConnection, RetryError> {
    match client.get_sso_connection(id).await? {
        Some(conn) => settle(conn),
        None => Err(RetryError::NonRetryable(ProviderError::NotFound {
            resource: RESOURCE,
            id: id.to_string(),
        })),
    }
}

/// Wait for `written` to become active, polling when it is not yet
async fn wait_until_active(
    ctx: &Context,
    written: SsoConnection,
) -> Result<SsoConnection, ProviderError> {
    let id = written.id.clone();
    match settle(written) {
        Ok(conn) => return Ok(conn),
        Err(RetryError::NonRetryable(e)) => return Err(e),
        Err(RetryError::Retryable(_)) => {}
    }

    let client = &ctx.client;
    let id = id.as_str();
    retry_context(
        ctx.config.sso_timeout,
        &ctx.config.polling_backoff(),
        "sso connection activation",
        || poll_status(client, id),
    )
    .await
}

pub async fn create_sso_connection(
    ctx: &Context,
    spec: &mut SsoConnectionSpec,
) -> Result<(), ProviderError> {
    let created = ctx.client.create_sso_connection(&spec.create_request()).await?;
    info!(
        sso_id = %created.id,
        name = %created.name,
        created_at = ?created.created_at,
        "SSO connection created"
    );
    spec.id = Some(created.id.clone());

    let active = wait_until_active(ctx, created).await?;
    spec.apply_observed(&active);
    Ok(())
}

/// Refresh `spec` from the Platform; `false` when the connection is gone
pub async fn read_sso_connection(
    ctx: &Context,
    spec: &mut SsoConnectionSpec,
) -> Result<bool, ProviderError> {
    let id = require_id(&spec.id, RESOURCE)?.to_string();
    match ctx.client.get_sso_connection(&id).await? {
        Some(conn) => {
            spec.apply_observed(&conn);
            Ok(true)
        }
        None => {
            info!(sso_id = %id, "SSO connection not found, removing from state");
            spec.id = None;
            Ok(false)
        }
    }
}

/// Send the fields that changed since `prior`; `false` when nothing did
pub async fn update_sso_connection(
    ctx: &Context,
    spec: &mut SsoConnectionSpec,
    prior: &SsoConnectionSpec,
) -> Result<bool, ProviderError> {
    let id = require_id(&spec.id, RESOURCE)?.to_string();
    let Some(request) = spec.update_request(prior) else {
        return Ok(false);
    };

    let updated = retry_transient(
        ctx.config.update_timeout,
        &ctx.config.write_backoff,
        "update sso connection",
        || ctx.client.update_sso_connection(&id, &request),
    )
    .await?;
    info!(sso_id = %id, updated_at = ?updated.updated_at, "SSO connection updated");

    let active = wait_until_active(ctx, updated).await?;
    spec.apply_observed(&active);
    Ok(true)
}

pub async fn delete_sso_connection(
    ctx: &Context,
    spec: &mut SsoConnectionSpec,
) -> Result<(), ProviderError> {
    let Some(id) = spec.id.clone().filter(|id| !id.is_empty()) else {
        return Ok(());
    };
    ctx.client.delete_sso_connection(&id).await?;
    info!(sso_id = %id, "SSO connection deleted");
    spec.id = None;
    Ok(())
}

#[cfg(test)]
#[path = "sso_test.rs"]
mod tests;
