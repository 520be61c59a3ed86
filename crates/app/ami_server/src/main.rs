//! AMI backend server binary.
//!
//! Serves the assistant chat route and the WebSocket message relay.

use ami_api::config::ApiConfig;
use ami_core::assistant::AiReplyService;
use ami_core::config::{AssistantConfig, DEFAULT_ENDPOINT};
use ami_core::relay::hub::DEFAULT_CAPACITY;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "ami_server", about = "AMI chat backend", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "AMI_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Origin allowed to call the REST routes from a browser.
    #[arg(long, env = "AMI_ALLOWED_ORIGIN", default_value = "http://localhost:5173")]
    allowed_origin: String,

    /// Completion provider API key. Without it the assistant answers with
    /// a "not configured" notice.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Chat completions endpoint.
    #[arg(long, env = "OPENAI_API_URL", default_value = DEFAULT_ENDPOINT)]
    openai_url: String,

    /// Per-topic buffer for relayed messages.
    #[arg(long, env = "AMI_CHANNEL_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    channel_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
                tracing_subscriber::EnvFilter::try_new("info,ami_api=debug,ami_core=debug")
            })?,
        )
        .init();

    let args = Args::parse();

    let assistant_config = AssistantConfig {
        api_key: args.openai_api_key,
        endpoint: args.openai_url,
        ..AssistantConfig::default()
    };
    if !assistant_config.is_configured() {
        warn!("OPENAI_API_KEY is not set; assistant replies will be the configuration notice");
    }
    info!(
        endpoint = %assistant_config.endpoint,
        model = %assistant_config.model,
        "assistant configured"
    );
    let assistant = AiReplyService::new(assistant_config)?;

    let config = ApiConfig {
        bind_addr: args.bind,
        allowed_origin: args.allowed_origin,
        channel_capacity: args.channel_capacity,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        allowed_origin = %config.allowed_origin,
        "AMI server listening"
    );

    let app = ami_api::router(ami_api::AppState::new(config, assistant));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("AMI server stopped");
    Ok(())
}
