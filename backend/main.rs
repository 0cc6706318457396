/// digit-lens recognition backend
///
/// Hosts one recognizer for one numeral script behind a synchronous
/// tiny_http server. Each request is handled on its own thread.
///
/// Run with:
///   cargo run --bin digit-backend --release -- --script decimal --model models/decimal.json
/// Then open http://127.0.0.1:5100
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tiny_http::Server;
use tracing::info;

use digit_lens::classifier::NetworkClassifier;
use digit_lens::config::{BackendConfig, RegionFailurePolicy, DEFAULT_MAX_UPLOAD_BYTES};
use digit_lens::network::Network;
use digit_lens::script::Script;
use digit_lens::web::backend::{dispatch, BackendApp};

#[derive(Parser, Debug)]
#[command(name = "digit-backend")]
#[command(version, about = "Single-script multi-digit recognition service", long_about = None)]
struct Args {
    /// Numeral script this instance recognizes (decimal or devanagari)
    #[arg(long, env = "DIGIT_BACKEND_SCRIPT")]
    script: Script,

    /// Listen address (default 0.0.0.0 on the script's port)
    #[arg(long, env = "DIGIT_BACKEND_BIND")]
    bind: Option<SocketAddr>,

    /// Model JSON, or the architecture file when --weights is given
    #[arg(long, env = "DIGIT_BACKEND_MODEL")]
    model: PathBuf,

    /// Separate weights JSON for the architecture in --model
    #[arg(long, env = "DIGIT_BACKEND_WEIGHTS")]
    weights: Option<PathBuf>,

    /// Neighbourhood size of the adaptive threshold (odd)
    #[arg(long, env = "DIGIT_BACKEND_BLOCK_SIZE", default_value_t = 11)]
    block_size: u32,

    /// Darkness below the local mean that counts as ink
    #[arg(long, env = "DIGIT_BACKEND_OFFSET", default_value_t = 2)]
    offset: u8,

    /// Drop regions whose bounding box covers fewer pixels than this
    #[arg(long, env = "DIGIT_BACKEND_MIN_REGION_AREA", default_value_t = 0)]
    min_region_area: u64,

    /// What to do when one region cannot be classified
    #[arg(long, env = "DIGIT_BACKEND_ON_REGION_FAILURE", value_enum, default_value_t = RegionFailurePolicy::Sentinel)]
    on_region_failure: RegionFailurePolicy,

    /// Largest accepted request body in bytes
    #[arg(long, env = "DIGIT_BACKEND_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

impl Args {
    fn config(&self) -> BackendConfig {
        let mut config = BackendConfig::new(self.script);
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        config.recognizer.segmentation.block_size = self.block_size;
        config.recognizer.segmentation.offset = self.offset;
        config.recognizer.segmentation.min_region_area = self.min_region_area;
        config.recognizer.on_region_failure = self.on_region_failure;
        config.max_upload_bytes = self.max_upload_bytes;
        config
    }

    fn load_network(&self) -> Result<Network> {
        let network = match &self.weights {
            Some(weights) => Network::load_pair(&self.model, weights),
            None => Network::load_json(&self.model),
        };
        network.with_context(|| format!("loading {} model", self.script))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.config();

    let network = args.load_network()?;
    let classifier = NetworkClassifier::new(network, config.script.tensor_shape())
        .context("model does not fit the script's input tensor")?;
    if let Some(description) = classifier.description() {
        info!(model = description, "model loaded");
    }

    let app = Arc::new(BackendApp::new(&config, Arc::new(classifier))?);
    let server = Server::http(config.bind).map_err(|e| anyhow!("cannot bind {}: {}", config.bind, e))?;
    info!(script = %config.script, addr = %config.bind, "recognition backend listening");

    for request in server.incoming_requests() {
        let app = Arc::clone(&app);
        std::thread::spawn(move || dispatch(request, &app));
    }
    Ok(())
}
