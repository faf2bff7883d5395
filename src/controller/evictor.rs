//! Evictor advanced config
//!
//! Translates between the declaration-friendly rule form and the Platform's
//! typed form. Upserts replace the whole config; delete writes an empty one.

use super::Context;
use crate::api::types::{
    EvictionConfig, EvictionSettings, EvictorAdvancedConfig, LabelSelector,
    LabelSelectorRequirement, NodeSelector, PodSelector, SelectorOperator, SettingEnabled,
};
use crate::error::ProviderError;
use crate::resource::{EvictionRuleSpec, MatchExpressionSpec, NodeSelectorSpec, PodSelectorSpec};
use crate::retry::retry_transient;
use std::collections::BTreeMap;
use tracing::{info, warn};

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn setting(enabled: bool) -> Option<SettingEnabled> {
    enabled.then_some(SettingEnabled { enabled: true })
}

fn is_enabled(setting: &Option<SettingEnabled>) -> bool {
    setting.is_some_and(|s| s.enabled)
}

fn requirement(expr: &MatchExpressionSpec) -> Result<LabelSelectorRequirement, ProviderError> {
    let operator = SelectorOperator::parse(&expr.operator).ok_or_else(|| {
        ProviderError::validation(format!(
            "match expression on {:?}: operator {:?} must be one of In, NotIn, Exists, DoesNotExist",
            expr.key, expr.operator
        ))
    })?;
    Ok(LabelSelectorRequirement {
        key: expr.key.clone(),
        operator,
        values: (!expr.values.is_empty()).then(|| expr.values.clone()),
    })
}

/// Empty labels and expressions mean no selector at all
fn label_selector(
    labels: &BTreeMap<String, String>,
    expressions: &[MatchExpressionSpec],
) -> Result<Option<LabelSelector>, ProviderError> {
    if labels.is_empty() && expressions.is_empty() {
        return Ok(None);
    }
    let match_expressions = if expressions.is_empty() {
        None
    } else {
        Some(expressions.iter().map(requirement).collect::<Result<Vec<_>, _>>()?)
    };
    Ok(Some(LabelSelector {
        match_labels: (!labels.is_empty()).then(|| labels.clone()),
        match_expressions,
    }))
}

fn rule_to_server(rule: &EvictionRuleSpec) -> Result<EvictionConfig, ProviderError> {
    let pod_selector = rule
        .pod_selector
        .as_ref()
        .map(|pod| -> Result<PodSelector, ProviderError> {
            Ok(PodSelector {
                namespace: non_empty(&pod.namespace),
                kind: non_empty(&pod.kind),
                label_selector: label_selector(&pod.match_labels, &pod.match_expressions)?,
            })
        })
        .transpose()?;

    let node_selector = rule
        .node_selector
        .as_ref()
        .map(|node| -> Result<NodeSelector, ProviderError> {
            Ok(NodeSelector {
                node_selector: label_selector(&node.match_labels, &node.match_expressions)?,
            })
        })
        .transpose()?;

    Ok(EvictionConfig {
        pod_selector,
        node_selector,
        settings: EvictionSettings {
            aggressive: setting(rule.aggressive),
            disposable: setting(rule.disposable),
            removal_disabled: setting(rule.removal_disabled),
        },
    })
}

/// Declared rules to the Platform's form
pub fn to_server(rules: &[EvictionRuleSpec]) -> Result<EvictorAdvancedConfig, ProviderError> {
    let eviction_config = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            rule_to_server(rule)
                .map_err(|e| ProviderError::validation(format!("eviction rule {}: {}", i, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EvictorAdvancedConfig { eviction_config })
}

fn expressions_to_schema(selector: &LabelSelector) -> Vec<MatchExpressionSpec> {
    selector
        .match_expressions
        .iter()
        .flatten()
        .map(|req| MatchExpressionSpec {
            key: req.key.clone(),
            operator: req.operator.as_str().to_string(),
            values: req.values.clone().unwrap_or_default(),
        })
        .collect()
}

fn labels_to_schema(selector: &LabelSelector) -> BTreeMap<String, String> {
    selector.match_labels.clone().unwrap_or_default()
}

/// Platform form back to declared rules; absent settings read as `false`
pub fn to_schema(config: &EvictorAdvancedConfig) -> Vec<EvictionRuleSpec> {
    config
        .eviction_config
        .iter()
        .map(|rule| EvictionRuleSpec {
            pod_selector: rule.pod_selector.as_ref().map(|pod| {
                let selector = pod.label_selector.clone().unwrap_or_default();
                PodSelectorSpec {
                    namespace: pod.namespace.clone().unwrap_or_default(),
                    kind: pod.kind.clone().unwrap_or_default(),
                    match_labels: labels_to_schema(&selector),
                    match_expressions: expressions_to_schema(&selector),
                }
            }),
            node_selector: rule.node_selector.as_ref().map(|node| {
                let selector = node.node_selector.clone().unwrap_or_default();
                NodeSelectorSpec {
                    match_labels: labels_to_schema(&selector),
                    match_expressions: expressions_to_schema(&selector),
                }
            }),
            aggressive: is_enabled(&rule.settings.aggressive),
            disposable: is_enabled(&rule.settings.disposable),
            removal_disabled: is_enabled(&rule.settings.removal_disabled),
        })
        .collect()
}

/// Replace the cluster's evictor rules, returning what the Platform stored
pub async fn upsert_evictor_config(
    ctx: &Context,
    cluster_id: &str,
    rules: &[EvictionRuleSpec],
) -> Result<Vec<EvictionRuleSpec>, ProviderError> {
    let config = to_server(rules)?;
    let stored = retry_transient(
        ctx.config.update_timeout,
        &ctx.config.write_backoff,
        "upsert evictor advanced config",
        || ctx.client.upsert_evictor_advanced_config(cluster_id, &config),
    )
    .await?;

    info!(
        cluster_id = %cluster_id,
        rules = stored.eviction_config.len(),
        "Evictor advanced config updated"
    );
    Ok(to_schema(&stored))
}

pub async fn read_evictor_config(
    ctx: &Context,
    cluster_id: &str,
) -> Result<Vec<EvictionRuleSpec>, ProviderError> {
    let config = ctx.client.get_evictor_advanced_config(cluster_id).await?;
    Ok(to_schema(&config))
}

/// Remove every rule by writing an empty config
pub async fn delete_evictor_config(ctx: &Context, cluster_id: &str) -> Result<(), ProviderError> {
    let empty = EvictorAdvancedConfig::default();
    let stored = retry_transient(
        ctx.config.update_timeout,
        &ctx.config.write_backoff,
        "delete evictor advanced config",
        || ctx.client.upsert_evictor_advanced_config(cluster_id, &empty),
    )
    .await?;

    if !stored.eviction_config.is_empty() {
        warn!(
            cluster_id = %cluster_id,
            rules = stored.eviction_config.len(),
            "Platform kept evictor rules after clearing them"
        );
    }
    info!(cluster_id = %cluster_id, "Evictor advanced config cleared");
    Ok(())
}

#[cfg(test)]
#[path = "evictor_test.rs"]
mod tests;
