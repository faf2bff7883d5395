//! Typed autoscaler policy record
//!
//! Alternative to hand-written policies JSON. Every leaf field is always
//! serialized, zero values included, so a present block fully describes its
//! subtree. Absent blocks are left to the server document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoscalerSettings {
    pub enabled: bool,
    pub is_scoped_mode: bool,
    pub node_templates_partial_matching_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unschedulable_pods: Option<UnschedulablePods>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_limits: Option<ClusterLimits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_downscaler: Option<NodeDownscaler>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UnschedulablePods {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headroom: Option<Headroom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headroom_spot: Option<Headroom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_pinner: Option<PodPinner>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Headroom {
    pub enabled: bool,
    pub cpu_percentage: i32,
    pub memory_percentage: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PodPinner {
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterLimits {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuLimits>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuLimits {
    pub min_cores: i32,
    pub max_cores: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeDownscaler {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_nodes: Option<EmptyNodes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evictor: Option<EvictorSettings>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmptyNodes {
    pub enabled: bool,
    pub delay_seconds: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EvictorSettings {
    pub enabled: bool,
    pub dry_run: bool,
    pub aggressive_mode: bool,
    pub scoped_mode: bool,
    pub cycle_interval: String,
    pub node_grace_period_minutes: i32,
    pub pod_eviction_failure_back_off_interval: String,
    pub ignore_pod_disruption_budgets: bool,
}

impl AutoscalerSettings {
    /// Policies JSON equivalent of this record
    pub fn to_policy_json(&self) -> Value {
        // Plain data with string keys cannot fail to serialize
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_values_are_serialized() {
        let settings = AutoscalerSettings {
            unschedulable_pods: Some(UnschedulablePods {
                headroom: Some(Headroom::default()),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            settings.to_policy_json(),
            json!({
                "enabled": false,
                "isScopedMode": false,
                "nodeTemplatesPartialMatchingEnabled": false,
                "unschedulablePods": {
                    "enabled": false,
                    "headroom": {"enabled": false, "cpuPercentage": 0, "memoryPercentage": 0}
                }
            })
        );
    }

    #[test]
    fn absent_blocks_are_omitted() {
        let json = AutoscalerSettings {
            enabled: true,
            ..Default::default()
        }
        .to_policy_json();
        assert!(json.get("nodeDownscaler").is_none());
        assert!(json.get("clusterLimits").is_none());
    }
}
