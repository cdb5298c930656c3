use anyhow::Result;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::credentials::source::{FetchCredential, MetadataCredentialSource};
use crate::helpers::time::now_i64;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::TOKEN_REFRESH_INTERVAL_SECS;

/// Cached credential plus the time it was last (re)acquired.
#[derive(Debug, Clone)]
struct CredentialState {
    token: String,
    last_refresh_unix: i64,
}

/// Process-wide bearer credential cache.
///
/// Empty until the first acquisition, then refreshed whenever the fixed
/// interval has elapsed. The refresh runs while the write lock is held, so
/// at most one refresh is in flight; tasks queued behind it re-check
/// freshness after acquiring the lock and reuse the refreshed token.
#[derive(Debug, Clone)]
pub struct TokenManager {
    client: Client,
    source: MetadataCredentialSource,
    state: Arc<RwLock<Option<CredentialState>>>,
    refresh_interval_secs: i64,
}

impl TokenManager {
    pub fn new(client: Client, source: MetadataCredentialSource) -> Self {
        Self {
            client,
            source,
            state: Arc::new(RwLock::new(None)),
            refresh_interval_secs: TOKEN_REFRESH_INTERVAL_SECS,
        }
    }

    /// Return the cached token, acquiring or refreshing it first if needed.
    ///
    /// Callable concurrently from any number of request tasks. A provider
    /// failure propagates to the caller and leaves the prior state intact.
    pub async fn acquire_token(&self) -> Result<String> {
        if let Some(state) = self.state.read().await.as_ref() {
            if !self.is_stale(state) {
                return Ok(state.token.clone());
            }
        }

        let mut guard = self.state.write().await;
        // another task may have refreshed while this one waited on the lock
        if let Some(state) = guard.as_ref() {
            if !self.is_stale(state) {
                return Ok(state.token.clone());
            }
        }

        let metrics = get_metrics().await;
        metrics.token_refreshes.inc();
        let credential = match self.source.fetch_credential(&self.client).await {
            Ok(credential) => credential,
            Err(e) => {
                metrics.token_refresh_failures.inc();
                error!("credential refresh failed: {e}");
                return Err(e);
            }
        };

        info!(
            expires_in_secs = credential.expires_in_secs,
            "credential refreshed"
        );
        let token = credential.token.clone();
        *guard = Some(CredentialState {
            token: credential.token,
            last_refresh_unix: now_i64(),
        });
        Ok(token)
    }

    fn is_stale(&self, state: &CredentialState) -> bool {
        now_i64() - state.last_refresh_unix > self.refresh_interval_secs
    }

    /// Test hook: age the stored credential so the next acquisition refreshes.
    #[cfg(test)]
    pub(crate) async fn rewind_last_refresh(&self, secs: i64) {
        if let Some(state) = self.state.write().await.as_mut() {
            state.last_refresh_unix -= secs;
        }
    }
}
