//! aetherd - Aether intent bus host
//!
//! Reads line-delimited JSON control messages on stdin, writes validated
//! envelopes to stdout, and runs the retention ritual on a schedule.

mod startup;
mod transport;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aether_core::{
    init_tracing, spawn_gate_worker, spawn_producer, spawn_retention_schedule, AetherConfig,
    AuditSink, CleanseReport, EnvelopeBus, GateWorkerStats, Gem, GemFilter, GemStore,
    IdentityStamper, IntentPipeline, IntentProcessor, IterProducer, Observation, ProcessorOutcome,
    RetentionRitual, Role, SurrealGemStore, TracingAuditSink, Vault,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn, Level};

use crate::startup::perform_startup_ritual;
use crate::transport::LineSubscriber;

#[derive(Parser)]
#[command(name = "aetherd")]
#[command(about = "Aether intent bus host", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "AETHER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the vault location
    #[arg(long, global = true, env = "AETHER_PERSIST_PATH")]
    persist_path: Option<PathBuf>,

    /// Override the retention age threshold in days
    #[arg(long, global = true, env = "AETHER_RETENTION_DAYS")]
    retention_days: Option<u32>,

    /// Override the minimum usage count that keeps a gem
    #[arg(long, global = true, env = "AETHER_MIN_USAGE")]
    min_usage: Option<u64>,

    /// Use a throwaway in-memory vault
    #[arg(long, global = true)]
    in_memory: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop until stdin closes or ctrl-c
    Serve {
        /// JSON-lines file of observations to replay through the gate
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Run one retention sweep and print its report
    Cleanse,

    /// List gems in the vault
    Inspect {
        /// Only gems the next sweep would release
        #[arg(long)]
        stale: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let config = resolve_config(&cli)?;
    let store = open_store(&config, cli.in_memory).await?;

    match cli.command {
        Commands::Serve { replay } => {
            let replay = match replay {
                Some(path) => load_observations(&path)?,
                None => Vec::new(),
            };
            let shutdown = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
                info!("interrupt received");
            };
            let input = BufReader::new(tokio::io::stdin());
            cmd_serve(&config, store, input, tokio::io::stdout(), replay, shutdown).await?;
        }
        Commands::Cleanse => {
            let report = cmd_cleanse(&config, store).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Inspect { stale } => {
            for gem in cmd_inspect(&config, store.as_ref(), stale).await? {
                println!("{}", serde_json::to_string(&gem)?);
            }
        }
    }

    Ok(())
}

/// File settings first, then flag/env overrides.
fn resolve_config(cli: &Cli) -> Result<AetherConfig> {
    let mut config = match &cli.config {
        Some(path) => AetherConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AetherConfig::default(),
    };
    if let Some(path) = &cli.persist_path {
        config.persist_path = path.clone();
    }
    if let Some(days) = cli.retention_days {
        config.retention_days = days;
    }
    if let Some(min_usage) = cli.min_usage {
        config.min_usage_threshold = min_usage;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn open_store(config: &AetherConfig, in_memory: bool) -> Result<Arc<dyn GemStore>> {
    let store = if in_memory {
        SurrealGemStore::in_memory().await?
    } else {
        SurrealGemStore::open(&config.persist_path).await?
    };
    Ok(Arc::new(store))
}

fn load_observations(path: &Path) -> Result<Vec<Observation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading observations {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid observation", path.display(), n + 1))
        })
        .collect()
}

/// What a serve session did before shutting down.
#[derive(Debug, Default)]
struct ServeSummary {
    lines: usize,
    gate: Option<GateWorkerStats>,
    sweeps: usize,
}

async fn cmd_serve<R, W, F>(
    config: &AetherConfig,
    store: Arc<dyn GemStore>,
    input: R,
    output: W,
    replay: Vec<Observation>,
    shutdown: F,
) -> Result<ServeSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    F: Future<Output = ()>,
{
    if !perform_startup_ritual(config, store.as_ref()).await {
        bail!("startup ritual failed, refusing to serve");
    }

    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let bus = Arc::new(EnvelopeBus::new(audit.clone()));
    bus.subscribe(Arc::new(LineSubscriber::new("stdout", output)));

    let pipeline = Arc::new(IntentPipeline::new(
        Vault::new(store.clone()),
        bus.clone(),
        Arc::new(IdentityStamper::new(Role::IntentCore)),
    ));
    let processor = IntentProcessor::new(pipeline.clone());

    let ritual = Arc::new(RetentionRitual::new(store, config.retention_policy(), audit));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let schedule = spawn_retention_schedule(ritual, config.ritual_interval(), shutdown_rx);

    let gate = if replay.is_empty() {
        None
    } else {
        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let worker = spawn_gate_worker(pipeline.clone(), config.default_topic.clone(), rx);
        spawn_producer(IterProducer::new("replay", replay), tx);
        Some(worker)
    };

    info!(topic = %config.default_topic, "listening for control messages");
    let mut summary = ServeSummary::default();
    let mut lines = input.lines();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            next = lines.next_line() => {
                let Some(line) = next.context("reading control input")? else {
                    info!("control input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                summary.lines += 1;
                match processor.handle_line(&line).await {
                    Ok(ProcessorOutcome::Ignored) => debug!("control message ignored"),
                    Ok(outcome) => debug!(?outcome, "control message handled"),
                    Err(e) => warn!(error = %e, "bad control message"),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    if let Some(worker) = gate {
        summary.gate = Some(worker.await.context("gate worker panicked")?);
    }
    if shutdown_tx.send(true).is_err() {
        debug!("retention schedule already stopped");
    }
    summary.sweeps = schedule.await.context("retention schedule panicked")?;
    bus.metrics().flush();

    info!(
        lines = summary.lines,
        sweeps = summary.sweeps,
        dead_letters = bus.dead_letters().len(),
        "aetherd stopped"
    );
    Ok(summary)
}

async fn cmd_cleanse(config: &AetherConfig, store: Arc<dyn GemStore>) -> Result<CleanseReport> {
    let ritual = RetentionRitual::new(store, config.retention_policy(), Arc::new(TracingAuditSink));
    Ok(ritual.cleanse_entropy().await?)
}

async fn cmd_inspect(config: &AetherConfig, store: &dyn GemStore, stale: bool) -> Result<Vec<Gem>> {
    let filter = if stale {
        config.retention_policy().stale_filter(chrono::Utc::now())
    } else {
        GemFilter::all()
    };
    let mut gems = store.scan(&filter).await?;
    gems.sort_by(|a, b| a.last_synced.cmp(&b.last_synced));
    Ok(gems)
}
