//! Shared constants and invariants

/// Cached tokens are reacquired after this interval regardless of observed
/// expiry. Kept safely under the 60-minute lifetime the metadata service
/// issues for access tokens.
pub const TOKEN_REFRESH_INTERVAL_SECS: i64 = 55 * 60;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
pub const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
pub const METADATA_FLAVOR_VALUE: &str = "Google";

pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";
