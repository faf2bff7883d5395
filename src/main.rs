use anyhow::Context as _;
use castai_provider::controller::cluster::{
    delete_cluster, read_cluster, register_cluster, ClusterRead,
};
use castai_provider::controller::evictor::{to_schema, to_server};
use castai_provider::controller::policies::{
    changed_policies, upsert_autoscaler_policies, PolicyChanges,
};
use castai_provider::controller::token::create_cluster_token;
use castai_provider::metrics::{create_metrics, SharedMetrics};
use castai_provider::resource::{ClusterRegistration, EvictionRuleSpec};
use castai_provider::{Context, ProviderConfig};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Parser)]
#[command(name = "castai-provider")]
#[command(version)]
#[command(about = "Manage CAST AI Platform resources from declared state", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print Prometheus metrics for the API calls made
    #[arg(long, global = true)]
    print_metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// External cluster registrations
    Cluster {
        #[command(subcommand)]
        command: ClusterCommand,
    },

    /// Autoscaler policies
    Policies {
        #[command(subcommand)]
        command: PoliciesCommand,
    },

    /// Evictor advanced config translation
    Evictor {
        #[command(subcommand)]
        command: EvictorCommand,
    },
}

#[derive(Subcommand)]
enum ClusterCommand {
    /// Register the cluster in a state file, push credentials and issue a token
    Register {
        /// Registration state (JSON), updated in place
        #[arg(long)]
        state: PathBuf,
    },

    /// Read the cluster back, refreshing the state file
    Read {
        #[arg(long)]
        state: PathBuf,
    },

    /// Disconnect and archive the cluster, clearing its id in the state file
    Delete {
        #[arg(long)]
        state: PathBuf,
    },

    /// Issue a new agent token
    Token {
        /// Cluster id
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum PoliciesCommand {
    /// Merge a patch onto a policies document and print the normalized result
    Merge {
        /// Current policies document (JSON)
        #[arg(long)]
        current: PathBuf,

        /// Patch document (JSON)
        #[arg(long)]
        patch: PathBuf,
    },

    /// Merge a patch onto the cluster's policies and write them back
    Apply {
        #[arg(long)]
        cluster_id: String,

        #[arg(long)]
        patch: PathBuf,
    },
}

#[derive(Subcommand)]
enum EvictorCommand {
    /// Translate declared rules (JSON list) to the Platform's config
    ToServer { rules: PathBuf },

    /// Translate a Platform config (JSON) to declared rules
    ToSchema { config: PathBuf },
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_state(path: &Path) -> anyhow::Result<ClusterRegistration> {
    serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("parsing state {}", path.display()))
}

/// Replace the state file atomically; it holds the cluster token
fn save_state(path: &Path, reg: &ClusterRegistration) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(reg)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary state file in {}", dir.display()))?;
    writeln!(tmp, "{}", json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("writing state {}", path.display()))?;
    Ok(())
}

fn remote_context(
    config: ProviderConfig,
    metrics: Option<SharedMetrics>,
) -> anyhow::Result<Context> {
    if config.api_token.is_empty() {
        anyhow::bail!("CASTAI_API_TOKEN must be set for commands that call the Platform");
    }
    let mut ctx = Context::from_config(config);
    if let Some(metrics) = metrics {
        ctx.client = ctx.client.clone().with_metrics(metrics);
    }
    Ok(ctx)
}

/// Run one command, returning what to print on stdout
async fn run(
    command: Commands,
    config: ProviderConfig,
    metrics: Option<SharedMetrics>,
) -> anyhow::Result<String> {
    match command {
        Commands::Policies {
            command: PoliciesCommand::Merge { current, patch },
        } => {
            let changes = PolicyChanges::Json(read_file(&patch)?);
            Ok(changed_policies(read_file(&current)?.as_bytes(), &changes)?)
        }

        Commands::Evictor {
            command: EvictorCommand::ToServer { rules },
        } => {
            let rules: Vec<EvictionRuleSpec> =
                serde_json::from_str(&read_file(&rules)?).context("parsing evictor rules")?;
            Ok(serde_json::to_string_pretty(&to_server(&rules)?)?)
        }

        Commands::Evictor {
            command: EvictorCommand::ToSchema { config: path },
        } => {
            let server =
                serde_json::from_str(&read_file(&path)?).context("parsing evictor config")?;
            Ok(serde_json::to_string_pretty(&to_schema(&server))?)
        }

        Commands::Policies {
            command: PoliciesCommand::Apply { cluster_id, patch },
        } => {
            let changes = PolicyChanges::Json(read_file(&patch)?);
            let ctx = remote_context(config, metrics)?;
            Ok(upsert_autoscaler_policies(&ctx, &cluster_id, &changes).await?)
        }

        Commands::Cluster { command } => {
            let ctx = remote_context(config, metrics)?;
            run_cluster(&ctx, command).await
        }
    }
}

async fn run_cluster(ctx: &Context, command: ClusterCommand) -> anyhow::Result<String> {
    match command {
        ClusterCommand::Register { state } => {
            let mut reg = load_state(&state)?;
            let result = register_cluster(ctx, &mut reg).await;
            // keep whatever the Platform assigned even when a later step failed
            save_state(&state, &reg)?;
            result?;
            Ok(format!("registered cluster {}", reg.id.unwrap_or_default()))
        }
        ClusterCommand::Read { state } => {
            let mut reg = load_state(&state)?;
            let read = read_cluster(ctx, &mut reg).await?;
            save_state(&state, &reg)?;
            let summary = match read {
                ClusterRead::Gone => "cluster is gone",
                ClusterRead::Found {
                    credentials_drift: true,
                } => "credentials drift detected",
                ClusterRead::Found {
                    credentials_drift: false,
                } => "cluster is up to date",
            };
            Ok(summary.to_string())
        }
        ClusterCommand::Delete { state } => {
            let mut reg = load_state(&state)?;
            delete_cluster(ctx, &mut reg).await?;
            save_state(&state, &reg)?;
            Ok("cluster archived".to_string())
        }
        ClusterCommand::Token { id } => Ok(create_cluster_token(&ctx.client, &id).await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ProviderConfig::from_env();
    info!(api_url = %config.api_url, "Using CAST AI Platform");

    let metrics = if cli.print_metrics {
        Some(create_metrics()?)
    } else {
        None
    };

    let output = run(cli.command, config, metrics.clone()).await?;
    println!("{}", output);

    if let Some(metrics) = metrics {
        print!("{}", metrics.encode()?);
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
