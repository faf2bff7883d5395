#![allow(clippy::unwrap_used)] // Tests can use unwrap for brevity

use super::*;
use castai_provider::resource::{ClusterProvider, GkeSpec};
use clap::CommandFactory;
use serde_json::{json, Value};

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> PathBuf {
    file.path().to_path_buf()
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_parses_nested_subcommands() {
    let cli = Cli::try_parse_from([
        "castai-provider",
        "policies",
        "apply",
        "--cluster-id",
        "c-1",
        "--patch",
        "patch.json",
        "--print-metrics",
    ])
    .unwrap();

    assert!(cli.print_metrics);
    match cli.command {
        Commands::Policies {
            command: PoliciesCommand::Apply { cluster_id, patch },
        } => {
            assert_eq!(cluster_id, "c-1");
            assert_eq!(patch, PathBuf::from("patch.json"));
        }
        _ => panic!("expected policies apply"),
    }
}

#[tokio::test]
async fn test_policies_merge_runs_offline() {
    let current = temp_file(r#"{"enabled":true,"unschedulablePods":{"enabled":false}}"#);
    let patch = temp_file(r#"{"unschedulablePods":{"enabled":true},"isScopedMode":true}"#);

    let output = run(
        Commands::Policies {
            command: PoliciesCommand::Merge {
                current: path_of(&current),
                patch: path_of(&patch),
            },
        },
        ProviderConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        output,
        r#"{"enabled":true,"isScopedMode":true,"unschedulablePods":{"enabled":true}}"#
    );
}

#[tokio::test]
async fn test_policies_merge_reports_removed_keys() {
    let current = temp_file("{}");
    let patch = temp_file(r#"{"spotInstances":{"enabled":true}}"#);

    let err = run(
        Commands::Policies {
            command: PoliciesCommand::Merge {
                current: path_of(&current),
                patch: path_of(&patch),
            },
        },
        ProviderConfig::default(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("'spotInstances' field was removed"));
}

#[tokio::test]
async fn test_evictor_translation_round_trips_through_cli() {
    let rules = temp_file(
        r#"[{"pod_selector": [{"kind": "Job", "match_labels": {"key1": "value1"}}],
             "aggressive": true}]"#,
    );

    let server = run(
        Commands::Evictor {
            command: EvictorCommand::ToServer {
                rules: path_of(&rules),
            },
        },
        ProviderConfig::default(),
        None,
    )
    .await
    .unwrap();
    let server_json: Value = serde_json::from_str(&server).unwrap();
    assert_eq!(
        server_json["evictionConfig"][0]["settings"],
        json!({"aggressive": {"enabled": true}})
    );

    let config = temp_file(&server);
    let schema = run(
        Commands::Evictor {
            command: EvictorCommand::ToSchema {
                config: path_of(&config),
            },
        },
        ProviderConfig::default(),
        None,
    )
    .await
    .unwrap();
    let schema_json: Value = serde_json::from_str(&schema).unwrap();
    assert_eq!(schema_json[0]["pod_selector"]["kind"], "Job");
    assert_eq!(schema_json[0]["aggressive"], true);
}

#[tokio::test]
async fn test_remote_commands_require_a_token() {
    let err = run(
        Commands::Cluster {
            command: ClusterCommand::Token { id: "c-1".into() },
        },
        ProviderConfig::default(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("CASTAI_API_TOKEN"));
}

#[test]
fn test_save_state_replaces_file_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "stale").unwrap();

    let mut reg = ClusterRegistration::new(ClusterProvider::Gke(GkeSpec {
        project_id: "proj".into(),
        location: "europe-west1".into(),
        cluster_name: "prod".into(),
        credentials_json: None,
    }));
    reg.id = Some("c-1".into());
    reg.cluster_token = Some("agent-token".into());

    save_state(&path, &reg).unwrap();

    assert_eq!(load_state(&path).unwrap(), reg);
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}
