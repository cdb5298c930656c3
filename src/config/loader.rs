use crate::config::types::ServiceConfig;
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

/// Load and validate config from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig> {
    let raw = fs::read_to_string(path)?;
    let config: ServiceConfig = serde_yaml::from_str(&raw)?;

    if config.upstream.project.trim().is_empty() {
        bail!("upstream.project must not be empty");
    }
    if config.upstream.region.trim().is_empty() {
        bail!("upstream.region must not be empty");
    }
    if let Some(host) = &config.upstream.api_host {
        if !host.starts_with("http://") && !host.starts_with("https://") {
            bail!("upstream.api_host must be an absolute http(s) URL, got '{}'", host);
        }
    }
    if config.credentials.scopes.is_empty() {
        bail!("credentials.scopes must contain at least one scope");
    }

    Ok(config)
}
