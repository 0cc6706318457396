/// digit-lens router
///
/// Single front door for both recognition backends. Reads `model_type` from
/// each request, forwards the image to the matching backend and answers
/// with one unified response shape.
///
/// Run with:
///   cargo run --bin digit-router --release
/// Then open http://127.0.0.1:5300
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use tiny_http::Server;
use tracing::info;

use digit_lens::config::{RetryPolicy, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
use digit_lens::routing::{Aggregator, Backends, HttpTransport};
use digit_lens::script::Script;
use digit_lens::web::router::dispatch;

#[derive(Parser, Debug)]
#[command(name = "digit-router")]
#[command(version, about = "Routes digit recognition requests to the per-script backends", long_about = None)]
struct Args {
    /// Listen address
    #[arg(long, env = "DIGIT_ROUTER_BIND", default_value = "0.0.0.0:5300")]
    bind: SocketAddr,

    /// Prediction endpoint of the decimal backend
    #[arg(long, env = "DIGIT_ROUTER_DECIMAL_URL", default_value = "http://decimal:5100/api/predict")]
    decimal_url: String,

    /// Prediction endpoint of the devanagari backend
    #[arg(long, env = "DIGIT_ROUTER_DEVANAGARI_URL", default_value = "http://devanagari:5200/api/predict")]
    devanagari_url: String,

    /// Whole-request timeout for backend calls, in seconds
    #[arg(long, env = "DIGIT_ROUTER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Attempts per backend call; only connection failures are retried
    #[arg(long, env = "DIGIT_ROUTER_RETRY_ATTEMPTS", default_value_t = 1)]
    retry_attempts: u32,

    /// Linear backoff step between attempts, in milliseconds
    #[arg(long, env = "DIGIT_ROUTER_RETRY_BACKOFF_MS", default_value_t = 200)]
    retry_backoff_ms: u64,

    /// Largest accepted request body in bytes
    #[arg(long, env = "DIGIT_ROUTER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

impl Args {
    fn config(self) -> RouterConfig {
        RouterConfig {
            bind: self.bind,
            decimal_endpoint: self.decimal_url,
            devanagari_endpoint: self.devanagari_url,
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.retry_attempts,
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().config();
    config.validate()?;

    let backends = Backends::from_config(&config);
    for script in Script::ALL {
        let backend = backends.get(script);
        info!(script = %backend.script, endpoint = %backend.endpoint, "backend registered");
    }
    let transport = Arc::new(HttpTransport::new(config.timeout));
    let aggregator = Arc::new(Aggregator::new(backends, transport, config.retry.clone()));

    let server = Server::http(config.bind).map_err(|e| anyhow!("cannot bind {}: {}", config.bind, e))?;
    info!(addr = %config.bind, "router listening");

    let max_upload_bytes = config.max_upload_bytes;
    for request in server.incoming_requests() {
        let aggregator = Arc::clone(&aggregator);
        std::thread::spawn(move || dispatch(request, &aggregator, max_upload_bytes));
    }
    Ok(())
}
