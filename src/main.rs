use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chart_harvest_server::collectors::{ChartHttpClient, TurntableCollector};
use chart_harvest_server::collectors::turntable::TURNTABLE_CHART_URL;
use chart_harvest_server::config::{self, AppConfig, FileConfig};
use chart_harvest_server::harvest::{source_url, CollectorRegistry, HarvestPipeline};
use chart_harvest_server::rate_limiter::{TokenBucketLimiter, DEFAULT_CLEANUP_INTERVAL};
use chart_harvest_server::server::{
    metrics, run_server, RequestsLoggingLevel, ServerConfig, ServerState,
};
use chart_harvest_server::snapshot_store::{SnapshotStore, SqliteSnapshotStore};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite snapshot database. Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Requests per minute allowed to each client on the API routes.
    #[clap(long, default_value_t = 60)]
    pub rate_limit_per_minute: u32,

    /// Requests a client may burst above its steady rate.
    #[clap(long, default_value_t = 10)]
    pub rate_limit_burst: u32,

    /// Timeout in seconds for each upstream request.
    #[clap(long, default_value_t = 15)]
    pub request_timeout_sec: u64,

    /// Seconds a harvest waits for its slowest collector.
    #[clap(long, default_value_t = 30)]
    pub harvest_deadline_sec: u64,

    /// Entries per platform when a request does not name a limit.
    #[clap(long, default_value_t = 20)]
    pub default_limit: usize,

    /// Upper bound for the limit a request may ask for.
    #[clap(long, default_value_t = 100)]
    pub max_limit: usize,

    /// Interval in hours between scheduled harvests. Set to 0 to disable.
    #[clap(long, default_value_t = 0)]
    pub harvest_interval_hours: u64,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            rate_limit_per_minute: args.rate_limit_per_minute,
            rate_limit_burst: args.rate_limit_burst,
            request_timeout_sec: args.request_timeout_sec,
            harvest_deadline_sec: args.harvest_deadline_sec,
            default_limit: args.default_limit,
            max_limit: args.max_limit,
            harvest_interval_hours: args.harvest_interval_hours,
        }
    }
}

fn spawn_scheduled_harvest(
    pipeline: Arc<HarvestPipeline>,
    store: Arc<dyn SnapshotStore>,
    interval_hours: u64,
    limit: usize,
) {
    info!("Scheduled harvest enabled: every {} hours", interval_hours);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_hours * 60 * 60));

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let snapshots = pipeline.collect_all(limit).await;
            match store.save(&snapshots) {
                Ok(summary) => {
                    metrics::record_snapshots_stored(summary.platforms);
                    info!(
                        "Scheduled harvest stored {} platforms, {} tracks",
                        summary.platforms, summary.tracks
                    );
                }
                Err(e) => {
                    error!("Scheduled harvest failed to store snapshots: {:#}", e);
                }
            }
        }
    });
}

fn spawn_rate_limiter_cleanup(limiter: Arc<TokenBucketLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(DEFAULT_CLEANUP_INTERVAL);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.cleanup(DEFAULT_CLEANUP_INTERVAL);
            if removed > 0 {
                info!("Dropped {} idle rate limit buckets", removed);
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&config::CliConfig::from(&cli_args), file_config)?;

    metrics::init_metrics();

    info!("Opening snapshot database at {:?}", app_config.db_path);
    let store = SqliteSnapshotStore::new(&app_config.db_path)?;
    let store: Arc<dyn SnapshotStore> = Arc::new(store);

    let http = ChartHttpClient::new(&app_config.user_agent, app_config.request_timeout)?;
    let registry = CollectorRegistry::default_platforms(&http, &app_config.sources);
    info!("Registered {} platforms", registry.len());
    let pipeline = Arc::new(HarvestPipeline::new(
        Arc::new(registry),
        app_config.harvest_deadline,
    ));

    let chart_source = Arc::new(TurntableCollector::new(
        http,
        source_url(&app_config.sources, "turntable", TURNTABLE_CHART_URL),
    ));

    let rate_limiter = Arc::new(TokenBucketLimiter::with_config(app_config.rate_limit));
    spawn_rate_limiter_cleanup(rate_limiter.clone());

    if app_config.harvest_interval_hours > 0 {
        spawn_scheduled_harvest(
            pipeline.clone(),
            store.clone(),
            app_config.harvest_interval_hours,
            app_config.default_limit,
        );
    }

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        default_limit: app_config.default_limit,
        max_limit: app_config.max_limit,
        impact: app_config.impact.clone(),
        ..ServerConfig::default()
    };
    let state = ServerState::new(server_config, pipeline, store, chart_source, rate_limiter);

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    tokio::select! {
        result = run_server(state) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
