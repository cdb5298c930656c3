/// Credential source
///
/// Defines the identity-provider contract and the metadata-server
/// implementation used for application-default credentials.
use anyhow::{anyhow, Error, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::config::types::CredentialsConfig;
use crate::utils::constants::{METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE};

pub trait FetchCredential {
    fn fetch_credential(
        &self,
        client: &Client,
    ) -> impl std::future::Future<Output = Result<Credential, Error>> + Send;
}

/// Opaque bearer credential as issued by the identity provider.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Fetches access tokens for the default service account from the GCE
/// metadata service.
#[derive(Debug, Clone)]
pub struct MetadataCredentialSource {
    cfg: CredentialsConfig,
}

impl MetadataCredentialSource {
    pub fn new(cfg: CredentialsConfig) -> Self {
        Self { cfg }
    }
}

impl FetchCredential for MetadataCredentialSource {
    async fn fetch_credential(&self, client: &Client) -> Result<Credential, Error> {
        let response = client
            .get(&self.cfg.metadata_url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .query(&[("scopes", self.cfg.scopes.join(","))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("metadata token request failed: {}", response.status()));
        }

        let payload: MetadataTokenResponse = response.json().await?;
        if payload.access_token.is_empty() {
            return Err(anyhow!("metadata token response contained an empty access_token"));
        }

        Ok(Credential {
            token: payload.access_token,
            expires_in_secs: payload.expires_in,
        })
    }
}
