use crate::config::types::UpstreamConfig;

/// Fixed Vertex AI endpoint target.
///
/// Project, region and host are configuration values; only the inbound path
/// suffix varies per request.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    project: String,
    region: String,
    api_host: String,
}

impl UpstreamTarget {
    pub fn new(cfg: &UpstreamConfig) -> Self {
        let api_host = cfg
            .api_host
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", cfg.region));
        Self {
            project: cfg.project.clone(),
            region: cfg.region.clone(),
            api_host: api_host.trim_end_matches('/').to_string(),
        }
    }

    /// Substitute the captured path suffix into the endpoint template.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/v1beta1/projects/{}/locations/{}/endpoints/openapi/{}",
            self.api_host,
            self.project,
            self.region,
            path.trim_start_matches('/')
        )
    }
}
