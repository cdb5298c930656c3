use anyhow::Result;
use axum::routing::get;
use axum::Router;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::config::types::UpstreamConfig;
use crate::credentials::manager::TokenManager;
use crate::gateway::handler::{health, proxy};
use crate::gateway::upstream::UpstreamTarget;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub token_manager: Arc<TokenManager>,
    pub upstream: UpstreamTarget,
    pub client: Client,
    pub metrics_state: MetricsState,
}

impl AppState {
    pub async fn new(
        client: Client,
        token_manager: TokenManager,
        upstream_config: &UpstreamConfig,
    ) -> Self {
        let metrics = get_metrics().await;
        Self {
            token_manager: Arc::new(token_manager),
            upstream: UpstreamTarget::new(upstream_config),
            client,
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

/// One Axum router: health probe, optional metrics exposition, and the
/// catch-all proxy route for the supported methods.
pub fn build_router(state: AppState, settings_config: &SettingsConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .route(
            "/{*path}",
            get(proxy).post(proxy).put(proxy).delete(proxy),
        )
        .with_state(state)
}

pub async fn start(settings_config: &SettingsConfig, state: AppState) -> Result<()> {
    let app = build_router(state, settings_config);

    let bind_addr = &settings_config.server.host;
    let port = &settings_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
    info!("address: {}, port: {}", bind_addr, port);
    get_metrics().await.up.set(1);
    axum::serve(listener, app).await?;

    Ok(())
}
