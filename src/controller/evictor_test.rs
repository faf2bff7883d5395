#![allow(clippy::unwrap_used)] // Tests can use unwrap for brevity

use super::*;
use crate::api::mock::MockTransport;
use crate::api::RawResponse;
use serde_json::json;

const PATH: &str = "/clusters/c-1/evictor-advanced-config";

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn job_rule() -> EvictionRuleSpec {
    EvictionRuleSpec {
        pod_selector: Some(PodSelectorSpec {
            kind: "Job".into(),
            match_labels: labels(&[("key1", "value1")]),
            ..Default::default()
        }),
        aggressive: true,
        ..Default::default()
    }
}

#[test]
fn test_job_rule_translates_to_server_shape() {
    let config = to_server(&[job_rule()]).unwrap();
    assert_eq!(
        serde_json::to_value(&config).unwrap(),
        json!({
            "evictionConfig": [{
                "podSelector": {
                    "kind": "Job",
                    "labelSelector": {"matchLabels": {"key1": "value1"}}
                },
                "settings": {"aggressive": {"enabled": true}}
            }]
        })
    );
    assert_eq!(to_schema(&config), vec![job_rule()]);
}

#[test]
fn test_empty_values_are_dropped() {
    let rule = EvictionRuleSpec {
        pod_selector: Some(PodSelectorSpec {
            namespace: String::new(),
            kind: "Pod".into(),
            ..Default::default()
        }),
        node_selector: Some(NodeSelectorSpec::default()),
        ..Default::default()
    };
    let config = to_server(&[rule]).unwrap();
    let server = &config.eviction_config[0];

    let pod = server.pod_selector.as_ref().unwrap();
    assert!(pod.namespace.is_none());
    assert!(pod.label_selector.is_none());
    assert!(server.node_selector.as_ref().unwrap().node_selector.is_none());
    assert_eq!(server.settings, EvictionSettings::default());
}

#[test]
fn test_operator_is_validated() {
    let rule = EvictionRuleSpec {
        node_selector: Some(NodeSelectorSpec {
            match_expressions: vec![MatchExpressionSpec {
                key: "pool".into(),
                operator: "Matches".into(),
                values: vec!["spot".into()],
            }],
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = to_server(&[job_rule(), rule]).unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));
    let msg = err.to_string();
    assert!(msg.contains("eviction rule 1"));
    assert!(msg.contains("Matches"));
}

#[test]
fn test_schema_round_trip() {
    let rules = vec![
        job_rule(),
        EvictionRuleSpec {
            pod_selector: Some(PodSelectorSpec {
                namespace: "batch".into(),
                kind: String::new(),
                match_labels: BTreeMap::new(),
                match_expressions: vec![
                    MatchExpressionSpec {
                        key: "team".into(),
                        operator: "In".into(),
                        values: vec!["data".into(), "ml".into()],
                    },
                    MatchExpressionSpec {
                        key: "preemptible".into(),
                        operator: "DoesNotExist".into(),
                        values: vec![],
                    },
                ],
            }),
            node_selector: Some(NodeSelectorSpec {
                match_labels: labels(&[("pool", "spot"), ("arch", "arm64")]),
                match_expressions: vec![],
            }),
            disposable: true,
            removal_disabled: true,
            ..Default::default()
        },
        EvictionRuleSpec::default(),
    ];

    assert_eq!(to_schema(&to_server(&rules).unwrap()), rules);
}

#[test]
fn test_server_round_trip_and_missing_settings() {
    let server: EvictorAdvancedConfig = serde_json::from_value(json!({
        "evictionConfig": [
            {
                "nodeSelector": {
                    "nodeSelector": {
                        "matchExpressions": [{"key": "pool", "operator": "Exists"}]
                    }
                },
                "settings": {"removalDisabled": {"enabled": true}}
            },
            {"podSelector": {"namespace": "ns"}, "settings": {}}
        ]
    }))
    .unwrap();

    let schema = to_schema(&server);
    assert!(!schema[0].aggressive);
    assert!(schema[0].removal_disabled);
    assert!(schema[1].pod_selector.is_some());
    assert!(schema[1].node_selector.is_none());
    assert_eq!(to_server(&schema).unwrap(), server);
}

#[test]
fn test_disabled_server_setting_reads_false() {
    let server: EvictorAdvancedConfig = serde_json::from_value(json!({
        "evictionConfig": [{"settings": {"aggressive": {"enabled": false}}}]
    }))
    .unwrap();
    assert!(!to_schema(&server)[0].aggressive);
}

#[tokio::test]
async fn test_upsert_sends_full_config_and_reads_echo() {
    let echo = serde_json::to_value(to_server(&[job_rule()]).unwrap()).unwrap();
    let transport = MockTransport::with_routes(vec![
        ("PUT /clusters/c-1/evictor-advanced-config", RawResponse::new(503, "")),
        ("PUT /clusters/c-1/evictor-advanced-config", RawResponse::json(200, &echo)),
    ]);
    let ctx = Context::new_mock(transport.clone());

    let stored = upsert_evictor_config(&ctx, "c-1", &[job_rule()]).await.unwrap();

    assert_eq!(stored, vec![job_rule()]);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].path, PATH);
    assert_eq!(requests[1].body, Some(echo));
}

#[tokio::test]
async fn test_invalid_rules_are_never_sent() {
    let transport = MockTransport::with_routes(vec![]);
    let ctx = Context::new_mock(transport.clone());
    let bad = EvictionRuleSpec {
        pod_selector: Some(PodSelectorSpec {
            match_expressions: vec![MatchExpressionSpec {
                key: "k".into(),
                operator: "in".into(),
                values: vec![],
            }],
            ..Default::default()
        }),
        ..Default::default()
    };

    assert!(upsert_evictor_config(&ctx, "c-1", &[bad]).await.is_err());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_read_translates_server_rules() {
    let transport = MockTransport::with_routes(vec![(
        "GET /clusters/c-1/evictor-advanced-config",
        RawResponse::json(
            200,
            &json!({"evictionConfig": [{
                "podSelector": {
                    "kind": "Job",
                    "labelSelector": {"matchLabels": {"key1": "value1"}}
                },
                "settings": {"aggressive": {"enabled": true}}
            }]}),
        ),
    )]);
    let ctx = Context::new_mock(transport);

    assert_eq!(read_evictor_config(&ctx, "c-1").await.unwrap(), vec![job_rule()]);
}

#[tokio::test]
async fn test_delete_writes_empty_config() {
    let transport = MockTransport::with_routes(vec![(
        "PUT /clusters/c-1/evictor-advanced-config",
        RawResponse::json(200, &json!({"evictionConfig": []})),
    )]);
    let ctx = Context::new_mock(transport.clone());

    delete_evictor_config(&ctx, "c-1").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, reqwest::Method::PUT);
    assert_eq!(requests[0].body, Some(json!({})));
}
