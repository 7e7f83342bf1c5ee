use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use handoff_core::app::{HandlerRegistry, QueueCounts, Worker, WorkerConfig};
use handoff_core::impls::{RedisEventSink, RedisQueueStore};
use handoff_core::ports::{QueueStore, TaskHandler};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::handlers::SimulatedWork;
use crate::logging;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "handoff")]
#[command(about = "handoff - reliable Redis list worker", long_about = None)]
pub struct Cli {
    /// Redis URL (overrides HANDOFF_REDIS_URL)
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Queue to claim tasks from
    #[arg(long, global = true)]
    pub input_queue: Option<String>,

    /// Queue holding tasks while they are processed
    #[arg(long, global = true)]
    pub claimed_queue: Option<String>,

    /// Queue receiving finished tasks
    #[arg(long, global = true)]
    pub output_queue: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the worker loop (default)
    Run {
        /// Seconds of simulated work per task
        #[arg(long)]
        work_secs: Option<u64>,

        /// Move leftovers from the claimed queue back to input before starting
        #[arg(long)]
        recover: bool,
    },

    /// Push tasks onto the input queue
    Push {
        /// Tasks in nature/process/product form
        #[arg(required = true)]
        tasks: Vec<String>,
    },

    /// Show queue lengths
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move every task in the claimed queue back to input
    Recover,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.redis_url {
            settings.redis_url = url.clone();
        }
        if let Some(queue) = &self.input_queue {
            settings.input_queue = queue.clone();
        }
        if let Some(queue) = &self.claimed_queue {
            settings.claimed_queue = Some(queue.clone());
        }
        if let Some(queue) = &self.output_queue {
            settings.output_queue = queue.clone();
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    cli.apply(&mut settings);
    logging::init(&settings.log_level, &settings.log_format);

    match cli.command {
        None => run_worker(settings).await,
        Some(Commands::Run { work_secs, recover }) => {
            if let Some(secs) = work_secs {
                settings.work_secs = secs;
            }
            settings.recover_on_start |= recover;
            run_worker(settings).await
        }
        Some(Commands::Push { tasks }) => push(settings, tasks).await,
        Some(Commands::Status { json }) => status(settings, json).await,
        Some(Commands::Recover) => recover(settings).await,
    }
}

async fn connect(settings: &Settings) -> Result<Arc<RedisQueueStore>> {
    let store = RedisQueueStore::connect(&settings.redis_url)
        .await
        .with_context(|| format!("failed to connect to {}", settings.redis_url))?;
    Ok(Arc::new(store))
}

/// natures が指定されていればその nature だけ、なければ全タスクをデモ handler で処理する
fn build_handlers(settings: &Settings) -> Result<HandlerRegistry> {
    let work: Arc<dyn TaskHandler> =
        Arc::new(SimulatedWork::new(Duration::from_secs(settings.work_secs)));
    let natures = settings.natures();
    if natures.is_empty() {
        return Ok(HandlerRegistry::new().with_fallback(work));
    }
    let mut registry = HandlerRegistry::new();
    for nature in natures {
        registry.register(nature, work.clone())?;
    }
    Ok(registry)
}

async fn build_worker(settings: &Settings, config: WorkerConfig) -> Result<Worker> {
    let store = connect(settings).await?;
    let handlers = build_handlers(settings)?;
    if handlers.is_empty() {
        info!("accepting every nature");
    } else {
        info!(natures = ?handlers.natures(), "accepting registered natures only");
    }
    let mut worker = Worker::new(config, store, Arc::new(handlers))?;
    if let Some(channel) = &settings.listener_channel {
        let sink = RedisEventSink::connect(&settings.redis_url, channel.as_str())
            .await
            .with_context(|| format!("failed to open event channel {channel}"))?;
        info!(channel = %sink.channel(), "publishing worker events");
        worker = worker.with_events(Arc::new(sink));
    }
    Ok(worker)
}

async fn run_worker(settings: Settings) -> Result<()> {
    let config = settings.worker_config()?;
    let worker = build_worker(&settings, config).await?;
    info!(
        worker = %worker.id(),
        redis = %settings.redis_url,
        input = %worker.config().input_queue,
        claimed = %worker.config().claimed_queue,
        output = %worker.config().output_queue,
        "starting worker"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("shutdown requested, finishing current task (Ctrl-C again to abort)");
        let _ = shutdown_tx.send(true);
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    worker.run(shutdown_rx).await?;
    Ok(())
}

async fn push(settings: Settings, tasks: Vec<String>) -> Result<()> {
    let store = connect(&settings).await?;
    for task in &tasks {
        store.push(&settings.input_queue, task).await?;
        info!(task = %task, queue = %settings.input_queue, "pushed");
    }
    println!("pushed {} task(s) to {}", tasks.len(), settings.input_queue);
    Ok(())
}

async fn status(settings: Settings, json: bool) -> Result<()> {
    let config = settings.worker_config()?;
    let store = connect(&settings).await?;
    let counts = QueueCounts::read(store.as_ref(), &config).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }
    println!("{:<10} {:>8}  {}", "input", counts.input, config.input_queue);
    println!("{:<10} {:>8}  {}", "claimed", counts.claimed, config.claimed_queue);
    println!("{:<10} {:>8}  {}", "output", counts.output, config.output_queue);
    if let (Some(n), Some(queue)) = (counts.dead_letter, &config.dead_letter_queue) {
        println!("{:<10} {:>8}  {}", "dead", n, queue);
    }
    if let (Some(n), Some(queue)) = (counts.failed, &config.failed_queue) {
        println!("{:<10} {:>8}  {}", "failed", n, queue);
    }
    Ok(())
}

async fn recover(settings: Settings) -> Result<()> {
    let config = settings.worker_config()?;
    let worker = build_worker(&settings, config).await?;
    let moved = worker.recover_claimed().await?;
    println!(
        "moved {moved} task(s) from {} back to {}",
        worker.config().claimed_queue,
        worker.config().input_queue
    );
    Ok(())
}
