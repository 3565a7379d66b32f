//! Plan-Review Agent - Entry Point

use plan_review_agent::{AzureChatClient, Config, Server};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Plan-Review Agent v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: plan-review-agent");
        println!();
        println!("Environment variables:");
        println!("  AZURE_OPENAI_ENDPOINT    Azure OpenAI resource endpoint");
        println!("  AZURE_OPENAI_DEPLOYMENT  Deployment name");
        println!("  AZURE_OPENAI_VERSION     API version (default: 2024-02-01)");
        println!("  AZURE_OPENAI_KEY         API key");
        println!("  AZURE_OPENAI_MODEL       Model name (default: gpt-4)");
        println!("  MODEL_TIMEOUT_SECS       Model call timeout (default: none)");
        println!("  AGENT_BIND_ADDR          Bind address (default: 127.0.0.1)");
        println!("  AGENT_PORT               Port (default: 8000)");
        println!("  AGENT_CORS_ORIGIN        Allowed origin (default: http://localhost:3000)");
        println!("  AGENT_PLAN_FALLBACK      default | strict (default: default)");
        println!("  AGENT_LOG_REQUESTS       Trace HTTP requests (default: true)");
        println!("  LOG_FORMAT               json for JSON logs");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let json_logs = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("Plan-Review Agent v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let model = AzureChatClient::from_config(&config)?;
    if !model.is_available() {
        warn!("Azure OpenAI not fully configured - /workflow requests will fail");
    }

    let server = Server::new(config, Arc::new(model));
    server.run().await
}
