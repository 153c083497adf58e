use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tresser::models::{AppConfig, CacheKind, DEFAULT_CONFIG_YAML};
use tresser::server;
use tresser::services::{filter_file, spawn_sweeper, FilterParams, ProgressLog};

#[derive(Parser)]
#[command(name = "tresser")]
#[command(about = "Darkest-neighbour image filter with an HTTP job server")]
struct Cli {
    /// Path to config.yaml (defaults to $CONFIG_FILE)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter an image file and write the result as PNG
    Run {
        /// Input PNG or JPEG
        input: PathBuf,

        /// Output PNG path
        output: PathBuf,

        /// Neighbourhood half-width (1..=100)
        #[arg(short, long)]
        radius: Option<usize>,

        /// Extra darkening of the HSV value channel (0.0..=1.0)
        #[arg(short, long)]
        darken: Option<f64>,

        /// Time budget per scan step in milliseconds
        #[arg(long)]
        budget_ms: Option<u64>,

        /// Column cache layout
        #[arg(long, value_enum)]
        cache: Option<CacheKind>,
    },
    /// Start the HTTP server
    Serve,
    /// Write a default config.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,

        /// Where to write the file
        #[arg(long, default_value = "config.yaml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from));

    match cli.command {
        Commands::Run {
            input,
            output,
            radius,
            darken,
            budget_ms,
            cache,
        } => {
            init_tracing("tresser=info", false);
            let mut config = AppConfig::load(config_path.as_deref());
            if let Some(radius) = radius {
                config.filter.radius = radius;
            }
            if let Some(darken) = darken {
                config.filter.darken_amount = darken;
            }
            if let Some(budget_ms) = budget_ms {
                config.filter.step_budget_ms = budget_ms;
            }
            if let Some(cache) = cache {
                config.filter.cache = cache;
            }
            run_filter_command(&input, &output, &FilterParams::from_config(&config.filter))
        }
        Commands::Serve => {
            init_tracing("tresser=debug,tower_http=debug", true);
            run_server(AppConfig::load(config_path.as_deref())).await
        }
        Commands::Init { force, path } => run_init_command(&path, force),
    }
}

fn init_tracing(default_filter: &str, with_time: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);
    if with_time {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }
}

/// Filter a file directly (no server needed)
fn run_filter_command(input: &Path, output: &Path, params: &FilterParams) -> anyhow::Result<()> {
    params.validate()?;

    let mut progress = ProgressLog::new();
    let report = filter_file(input, output, params, |p| {
        progress.observe(p);
    })?;

    tracing::info!(
        output = %output.display(),
        width = report.width,
        height = report.height,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Wrote filtered image"
    );
    Ok(())
}

/// Write the default configuration file
fn run_init_command(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_YAML)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Run the HTTP server
async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let bind_addr = config.server.resolve_bind_addr();
    let state = server::create_app_state(&config);
    let sweep_period = config
        .server
        .job_ttl()
        .clamp(Duration::from_secs(1), Duration::from_secs(60));
    spawn_sweeper(state.jobs.clone(), sweep_period);

    // Static file serving (production only)
    let app = match config.server.static_dir.as_deref() {
        Some(dir) => {
            tracing::info!(dir, "Serving static files under /static");
            server::build_router(state).nest_service("/static", ServeDir::new(dir))
        }
        None => server::build_router(state),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        radius = config.filter.radius,
        darken_amount = config.filter.darken_amount,
        max_jobs = config.server.max_jobs,
        job_ttl_secs = config.server.job_ttl_secs,
        "Tresser server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
