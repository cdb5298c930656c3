// tests/common/mod.rs
pub use axum::{body::Body, Router};
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use reqwest::Client;
use std::net::SocketAddr;

use crate::config::settings::{MetricsConfig, ServerConfig, SettingsConfig};
use crate::config::types::{CredentialsConfig, UpstreamConfig};
use crate::credentials::manager::TokenManager;
use crate::credentials::source::MetadataCredentialSource;
use crate::server::server::{build_router, AppState};
use crate::utils::constants::CLOUD_PLATFORM_SCOPE;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Credentials config pointing at a test metadata endpoint.
pub fn test_credentials_config(metadata_url: &str) -> CredentialsConfig {
    CredentialsConfig {
        metadata_url: metadata_url.to_string(),
        scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
    }
}

pub fn test_upstream_config(api_host: &str) -> UpstreamConfig {
    UpstreamConfig {
        project: "1234".to_string(),
        region: "us-central1".to_string(),
        api_host: Some(api_host.to_string()),
    }
}

pub fn test_settings_config() -> SettingsConfig {
    SettingsConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: "0".to_string(),
        },
        metrics: MetricsConfig::default(),
        logging: None,
    }
}

/// Upstream path the proxy produces for the test project/region.
pub fn upstream_path(suffix: &str) -> String {
    format!("/v1beta1/projects/1234/locations/us-central1/endpoints/openapi/{suffix}")
}

pub fn test_token_manager(metadata_url: &str) -> TokenManager {
    let source = MetadataCredentialSource::new(test_credentials_config(metadata_url));
    TokenManager::new(Client::new(), source)
}

/// Full proxy app wired to a test metadata endpoint and upstream host.
pub async fn spawn_proxy_app(metadata_url: &str, api_host: &str) -> (JoinHandle<()>, SocketAddr) {
    let client = Client::new();
    let source = MetadataCredentialSource::new(test_credentials_config(metadata_url));
    let token_manager = TokenManager::new(client.clone(), source);
    let state = AppState::new(client, token_manager, &test_upstream_config(api_host)).await;
    let router = build_router(state, &test_settings_config());
    spawn_axum(router).await
}
