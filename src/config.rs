//! Connection settings and API constants

use std::time::Duration;

use crate::client::{ClientError, ClientResult};

/// Root of the public AnnoMarket.com API.
pub const DEFAULT_BASE_URL: &str = "https://api.annomarket.com/";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Collection root for annotation jobs, relative to the base URL.
pub const JOBS_ROOT: &str = "job";

/// Collection root for data bundles, relative to the base URL.
pub const BUNDLES_ROOT: &str = "data/bundle";

/// Collection root for shop items, relative to the base URL.
pub const SHOP_ROOT: &str = "shop/item";

/// Root for online processing endpoints, relative to the base URL.
pub const ONLINE_ROOT: &str = "online-processing/item/";

/// Delay between polls when watching a job's execution log.
pub const LOG_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Delay between polls while a Common Crawl search is running.
pub const COMMON_CRAWL_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Settings needed to construct a [`RestClient`](crate::client::RestClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that relative resource URLs resolve against
    pub base_url: String,
    /// API key ID, sent as the basic-auth user name
    pub api_key_id: String,
    /// API key password, sent as the basic-auth password
    pub api_password: String,
    /// Per-request timeout for API calls; file transfers apply it to
    /// connecting and to each read instead
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config for the public API with the given credentials
    pub fn new(api_key_id: impl Into<String>, api_password: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_id: api_key_id.into(),
            api_password: api_password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that credentials are present
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key_id.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "API key ID is required".to_string(),
            ));
        }
        if self.api_password.is_empty() {
            return Err(ClientError::InvalidArgument(
                "API password is required".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidArgument(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
