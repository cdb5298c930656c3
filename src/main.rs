use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use tracing::info;

use vertex_proxy::config::loader::load_config;
use vertex_proxy::credentials::manager::TokenManager;
use vertex_proxy::credentials::source::MetadataCredentialSource;
use vertex_proxy::observability::service_resources_metrics::collect_process_metrics;
use vertex_proxy::server::server::{start, AppState};
use vertex_proxy::utils::logging::{self, LogLevel};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "vertex-proxy.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = load_config(&args.config)?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Create request client
    // -------------------------------

    // no global timeout: streamed inference responses stay open for minutes
    let client = Client::builder().build()?;

    // -------------------------------
    // 3. Credential cache
    // -------------------------------

    let source = MetadataCredentialSource::new(service_config.credentials.clone());
    let token_manager = TokenManager::new(client.clone(), source);

    // -------------------------------
    // 4. Start http server with proxy and health routes
    // -------------------------------

    let state = AppState::new(client, token_manager, &service_config.upstream).await;
    let http_server = start(&service_config.settings, state);

    // -------------------------------
    // 5. Start scraping system resources consumption metrics
    // -------------------------------

    let service_metrics = collect_process_metrics(service_config.settings.metrics.is_enabled);

    info!("Service starting...");
    tokio::try_join!(http_server, service_metrics)?;

    Ok(())
}
