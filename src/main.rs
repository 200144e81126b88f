use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_journal::{create_router, AppState, Config};

#[derive(Parser)]
#[command(name = "voice-journal")]
#[command(about = "Voice journaling companion service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/voice-journal")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let bind = args.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = args.port.unwrap_or(cfg.service.http.port);

    info!("Voice Journal v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Completion model: {} ({})", cfg.completion.model, cfg.completion.endpoint);
    match &cfg.webhook.url {
        Some(url) => info!("Webhook: {}", url),
        None => info!("Webhook: disabled"),
    }

    let state = AppState::from_config(&cfg)?;
    let app = create_router(state);

    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
