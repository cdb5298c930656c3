use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{CLOUD_PLATFORM_SCOPE, METADATA_TOKEN_URL};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// ================================
/// Upstream endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// GCP project the inference endpoints live in.
    pub project: String,
    /// Region of the endpoints, also the default API host prefix.
    pub region: String,
    /// Overrides `https://{region}-aiplatform.googleapis.com`.
    /// Intended for test servers and private service connect hosts.
    pub api_host: Option<String>,
}

/// ================================
/// Credential acquisition
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            scopes: default_scopes(),
        }
    }
}

fn default_metadata_url() -> String {
    METADATA_TOKEN_URL.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![CLOUD_PLATFORM_SCOPE.to_string()]
}
