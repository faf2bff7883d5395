//! Autoscaler policies merge engine
//!
//! The caller declares a partial policies document, either as raw JSON or as
//! a typed [`AutoscalerSettings`]. It is validated, merged onto the server's
//! current document with RFC 7396 semantics and written back whole. The
//! normalized merge result is what gets stored and compared on later reads.

use super::Context;
use crate::error::ProviderError;
use crate::resource::AutoscalerSettings;
use crate::retry::retry_transient;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Keys removed from the policies document in 5.0.0, by position
const REMOVED_KEYS: [(&[&str], &str); 3] = [
    (&[], "spotInstances"),
    (&["unschedulablePods"], "customInstancesEnabled"),
    (&["unschedulablePods"], "nodeConstraints"),
];

/// Message for a removed key; users search for this exact text
pub fn removed_key_message(key: &str) -> String {
    format!(
        "'{}' field was removed from policies JSON in 5.0.0. The configuration was migrated to default node template.",
        key
    )
}

/// Declared policy changes
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyChanges {
    /// Raw JSON document as written by the user
    Json(String),
    /// Typed record; every leaf is serialized
    Typed(AutoscalerSettings),
}

impl PolicyChanges {
    /// The patch as a JSON value, checked for syntax and removed keys
    pub fn to_patch(&self) -> Result<Value, ProviderError> {
        let patch = match self {
            PolicyChanges::Json(raw) => serde_json::from_str(raw).map_err(|e| {
                ProviderError::validation(format!("policies JSON is invalid: {}", e))
            })?,
            PolicyChanges::Typed(settings) => settings.to_policy_json(),
        };
        validate_policies(&patch)?;
        Ok(patch)
    }
}

/// Reject documents that still carry removed keys, one error per key
pub fn validate_policies(doc: &Value) -> Result<(), ProviderError> {
    let errors: Vec<String> = REMOVED_KEYS
        .iter()
        .filter(|(parent, key)| {
            parent
                .iter()
                .try_fold(doc, |node, segment| node.get(segment))
                .is_some_and(|node| node.get(key).is_some())
        })
        .map(|(_, key)| removed_key_message(key))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::Validation { errors })
    }
}

/// Apply `patch` onto `target` per RFC 7396
///
/// Objects merge recursively, `null` removes the key, anything else
/// (arrays included) replaces the target wholesale.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.as_str()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Byte-level merge of two JSON documents
pub fn json_merge_patch(current: &[u8], patch: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let mut doc: Value = serde_json::from_slice(current)
        .map_err(|e| ProviderError::Merge(format!("current document: {}", e)))?;
    let patch: Value = serde_json::from_slice(patch)
        .map_err(|e| ProviderError::Merge(format!("patch document: {}", e)))?;
    merge_patch(&mut doc, &patch);
    serde_json::to_vec(&doc).map_err(|e| ProviderError::Merge(e.to_string()))
}

/// Object keys sorted at every level
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with sorted keys; equal documents give equal bytes
pub fn normalize_value(value: &Value) -> String {
    canonical(value).to_string()
}

pub fn normalize_json(doc: &[u8]) -> Result<String, ProviderError> {
    let value: Value = serde_json::from_slice(doc)
        .map_err(|e| ProviderError::decode(format!("normalizing policies JSON: {}", e)))?;
    Ok(normalize_value(&value))
}

fn merged_document(current: &[u8], changes: &PolicyChanges) -> Result<Value, ProviderError> {
    let patch = changes.to_patch()?;
    let mut doc: Value = serde_json::from_slice(current)
        .map_err(|e| ProviderError::Merge(format!("current policies document: {}", e)))?;
    merge_patch(&mut doc, &patch);
    if !doc.is_object() {
        return Err(ProviderError::Merge(
            "merged policies document is not a JSON object".to_string(),
        ));
    }
    Ok(canonical(&doc))
}

/// Normalized result of merging `changes` onto `current`
///
/// JSON and typed changes describing the same document give byte-equal output.
pub fn changed_policies(current: &[u8], changes: &PolicyChanges) -> Result<String, ProviderError> {
    Ok(merged_document(current, changes)?.to_string())
}

/// Merge `changes` onto the cluster's policies and write the result back
///
/// Returns the normalized document that was written.
pub async fn upsert_autoscaler_policies(
    ctx: &Context,
    cluster_id: &str,
    changes: &PolicyChanges,
) -> Result<String, ProviderError> {
    let current = ctx.client.get_policies(cluster_id).await?;
    let merged = merged_document(&current, changes)?;

    retry_transient(
        ctx.config.update_timeout,
        &ctx.config.write_backoff,
        "upsert autoscaler policies",
        || ctx.client.upsert_policies(cluster_id, merged.clone()),
    )
    .await?;

    info!(cluster_id = %cluster_id, "Autoscaler policies updated");
    Ok(merged.to_string())
}

/// Recompute what the stored document should be given the server's current one
///
/// `None` when no changes are declared; nothing is read in that case.
pub async fn read_autoscaler_policies(
    ctx: &Context,
    cluster_id: &str,
    changes: Option<&PolicyChanges>,
) -> Result<Option<String>, ProviderError> {
    let Some(changes) = changes else {
        debug!(cluster_id = %cluster_id, "No autoscaler policy changes declared");
        return Ok(None);
    };
    let current = ctx.client.get_policies(cluster_id).await?;
    changed_policies(&current, changes).map(Some)
}

/// Whether the stored document differs from a freshly computed one
pub fn policies_drifted(stored: Option<&str>, fresh: Option<&str>) -> bool {
    match (stored, fresh) {
        (Some(stored), Some(fresh)) => match normalize_json(stored.as_bytes()) {
            Ok(stored) => stored != fresh,
            Err(_) => true,
        },
        (None, None) => false,
        _ => true,
    }
}

/// Plan: compare stored state with what the server would now produce
pub async fn plan_autoscaler_policies(
    ctx: &Context,
    cluster_id: &str,
    stored: Option<&str>,
    changes: Option<&PolicyChanges>,
) -> Result<bool, ProviderError> {
    let fresh = read_autoscaler_policies(ctx, cluster_id, changes).await?;
    let drifted = policies_drifted(stored, fresh.as_deref());
    if drifted {
        info!(cluster_id = %cluster_id, "Autoscaler policies drifted");
    }
    Ok(drifted)
}

/// Removing the autoscaler resource turns autoscaling off; the document stays
pub async fn disable_autoscaler(ctx: &Context, cluster_id: &str) -> Result<(), ProviderError> {
    let disable = PolicyChanges::Json(r#"{"enabled":false}"#.to_string());
    upsert_autoscaler_policies(ctx, cluster_id, &disable).await?;
    info!(cluster_id = %cluster_id, "Autoscaler disabled");
    Ok(())
}

#[cfg(test)]
#[path = "policies_test.rs"]
mod tests;
