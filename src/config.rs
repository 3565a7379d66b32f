//! Configuration management

use crate::agent::planner::PlanFallback;
use anyhow::Result;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tracing::warn;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Azure OpenAI resource endpoint, e.g. `https://<name>.openai.azure.com`
    pub azure_endpoint: Option<String>,

    /// Azure OpenAI deployment name
    pub azure_deployment: Option<String>,

    /// Azure OpenAI API version
    pub azure_api_version: String,

    /// Azure OpenAI API key
    pub azure_api_key: Option<String>,

    /// Model name sent with each request
    pub model: String,

    /// HTTP client timeout for model calls (None = wait indefinitely)
    pub model_timeout_secs: Option<u64>,

    /// Bind address
    pub bind_addr: IpAddr,

    /// Port number
    pub port: u16,

    /// The single origin allowed by CORS
    pub cors_origin: String,

    /// What the planner does with an unparseable plan
    pub plan_fallback: PlanFallback,

    /// Enable request logging
    pub log_requests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_version: "2024-02-01".to_string(),
            azure_api_key: None,
            model: "gpt-4".to_string(),
            model_timeout_secs: None,
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
            plan_fallback: PlanFallback::Default,
            log_requests: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.azure_endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok();
        config.azure_deployment = std::env::var("AZURE_OPENAI_DEPLOYMENT").ok();
        config.azure_api_key = std::env::var("AZURE_OPENAI_KEY").ok();

        if let Ok(version) = std::env::var("AZURE_OPENAI_VERSION") {
            config.azure_api_version = version;
        }

        if let Ok(model) = std::env::var("AZURE_OPENAI_MODEL") {
            config.model = model;
        }

        if let Ok(origin) = std::env::var("AGENT_CORS_ORIGIN") {
            config.cors_origin = origin;
        }

        config.model_timeout_secs = parse_var("MODEL_TIMEOUT_SECS");

        if let Some(addr) = parse_var("AGENT_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(port) = parse_var("AGENT_PORT") {
            config.port = port;
        }

        if let Some(policy) = parse_var("AGENT_PLAN_FALLBACK") {
            config.plan_fallback = policy;
        }

        if let Ok(val) = std::env::var("AGENT_LOG_REQUESTS") {
            config.log_requests = val == "true" || val == "1";
        }

        Ok(config)
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Read and parse an env var, keeping the default on bad input
fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}
