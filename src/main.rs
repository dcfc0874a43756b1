use call_analyzer::config::{config_search_paths, ConfigOverrides};
use call_analyzer::logging::Journal;
use call_analyzer::{build_router, AnalyzerConfig, AppState, SharedJournal};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "call-analyzer",
    about = "Sales call transcript analyzer — one endpoint, any LLM provider",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Provider preset name (overrides config)
    #[arg(long)]
    provider: Option<String>,

    /// Model name (overrides config and preset)
    #[arg(long)]
    model: Option<String>,

    /// Mirror the analysis journal to this JSONL file (overrides config)
    #[arg(long)]
    journal_file: Option<PathBuf>,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "call_analyzer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let mut config = AnalyzerConfig::find_and_load(cli.config.as_deref())?;
    config.apply_overrides(ConfigOverrides {
        port: cli.port,
        provider: cli.provider,
        model: cli.model,
        journal_file: cli.journal_file,
    });

    let provider = config.resolve_provider()?;

    let api_key = match provider.resolve_api_key() {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("{}. Analysis requests will fail until it is set.", e);
            None
        }
    };

    let journal = match config.journal.file {
        Some(ref path) => Journal::with_file(config.journal.capacity, path)?,
        None => Journal::in_memory(config.journal.capacity),
    };

    info!("call-analyzer v{}", env!("CARGO_PKG_VERSION"));
    info!("  Provider:  {} ({})", provider.name, provider.kind);
    info!("  Model:     {}", provider.model);
    info!("  Endpoint:  {}", provider.endpoint_url());
    info!("  Port:      {}", config.port);
    info!("  Retries:   {}", config.transport.max_retries);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.transport.request_timeout_secs,
        ))
        .build()?;

    let state = Arc::new(AppState {
        provider,
        api_key,
        transport: config.transport.clone(),
        client,
        journal: SharedJournal::new(journal),
    });

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);
    info!("  POST http://localhost:{}/api/analyze", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
