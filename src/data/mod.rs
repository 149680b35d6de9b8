//! Data bundles: reusable uploaded datasets
//!
//! A bundle's `closed` and `downloadable` flags decide what can be done with
//! it. Open bundles accept uploads, closed downloadable bundles expose their
//! files, and closed bundles that are not downloadable can only feed jobs.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::client::transfer::file_name_from_url;
use crate::client::{ClientError, ClientResult, Remote, Resource, RestClient};
use crate::config::BUNDLES_ROOT;
use crate::job::InputType;

/// What a bundle's flags allow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleAccess {
    /// Still accepting uploads
    OpenForUploads,
    /// Closed, with files available for download
    Downloadable,
    /// Closed, usable only as job input
    InputOnly,
}

impl BundleAccess {
    /// Classify a `closed` / `downloadable` pair
    ///
    /// An open bundle is open for uploads whatever its `downloadable` flag.
    pub fn from_flags(closed: bool, downloadable: bool) -> Self {
        match (closed, downloadable) {
            (false, _) => BundleAccess::OpenForUploads,
            (true, true) => BundleAccess::Downloadable,
            (true, false) => BundleAccess::InputOnly,
        }
    }
}

/// Entry in the bundle listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBundleSummary {
    /// Numeric ID
    pub id: u64,
    /// Bundle name
    #[serde(default)]
    pub name: String,
    /// Detail URL
    pub url: String,
    /// Whether files may be fetched directly
    #[serde(default)]
    pub downloadable: bool,
    /// Whether uploads are finished
    #[serde(default)]
    pub closed: bool,
}

impl DataBundleSummary {
    /// What this bundle's flags allow
    pub fn access(&self) -> BundleAccess {
        BundleAccess::from_flags(self.closed, self.downloadable)
    }
}

impl Remote<DataBundleSummary> {
    /// Fetch the full bundle, keeping this summary's URL
    pub async fn details(&self) -> ClientResult<Remote<DataBundle>> {
        let mut record: DataBundle = self.client().get(&self.url).await?;
        record.url = self.url.clone();
        Ok(Remote::new(Arc::clone(self.client()), record))
    }
}

/// A file stored in a bundle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BundleEntry {
    /// Stable detail URL
    pub url: String,
}

impl BundleEntry {
    /// File name for saving this entry locally
    pub fn file_name(&self) -> Option<String> {
        file_name_from_url(&self.url)
    }
}

impl Remote<BundleEntry> {
    /// Ask the server for a fresh time-limited download URL
    pub async fn url_to_download(&self) -> ClientResult<Url> {
        self.client().get_redirect(&self.url).await
    }
}

/// Full details of a data bundle
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBundle {
    /// Detail URL
    #[serde(default)]
    pub url: String,
    /// Numeric ID
    pub id: u64,
    /// Bundle name
    #[serde(default)]
    pub name: String,
    /// Creation date as rendered by the server
    #[serde(default)]
    pub date_created: Option<String>,
    /// Total stored bytes
    #[serde(default)]
    pub total_size: u64,
    /// Storage charge per month
    #[serde(default)]
    pub monthly_price: Decimal,
    /// Type of the uploaded data
    #[serde(rename = "type", default)]
    pub bundle_type: Option<InputType>,
    /// Encoding override for documents
    #[serde(default)]
    pub encoding: Option<String>,
    /// MIME type forced on every entry
    #[serde(default)]
    pub mime_type_override: Option<String>,
    /// File extension filters
    #[serde(default)]
    pub file_extensions: Option<String>,
    /// MIME type filters
    #[serde(default)]
    pub mime_type_filters: Option<String>,
    /// Whether uploads are finished
    #[serde(default)]
    pub closed: bool,
    /// Whether files may be fetched directly
    #[serde(default)]
    pub downloadable: bool,
    /// Stored files; only listed for downloadable bundles
    #[serde(default)]
    pub files: Vec<BundleEntry>,
}

impl DataBundle {
    /// What this bundle's flags allow
    pub fn access(&self) -> BundleAccess {
        BundleAccess::from_flags(self.closed, self.downloadable)
    }
}

impl Resource for DataBundle {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }
}

impl Remote<DataBundle> {
    /// Files of a closed, downloadable bundle, bound to the client
    ///
    /// # Errors
    /// `InvalidArgument` if the bundle is still open or not downloadable.
    pub fn download_entries(&self) -> ClientResult<Vec<Remote<BundleEntry>>> {
        match self.access() {
            BundleAccess::Downloadable => Ok(self.client().bind_all(self.files.clone())),
            BundleAccess::OpenForUploads => Err(ClientError::InvalidArgument(format!(
                "bundle {} is still open for uploads",
                self.id
            ))),
            BundleAccess::InputOnly => Err(ClientError::InvalidArgument(format!(
                "bundle {} is not directly downloadable",
                self.id
            ))),
        }
    }
}

/// Entry point for data bundle queries
#[derive(Debug, Clone)]
pub struct DataManager {
    client: Arc<RestClient>,
}

impl DataManager {
    /// Create a manager sharing the given client
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List the caller's bundles
    pub async fn list_bundles(&self) -> ClientResult<Vec<Remote<DataBundleSummary>>> {
        self.client.fetch_all(BUNDLES_ROOT).await
    }

    /// Fetch a bundle by numeric ID
    pub async fn get_bundle(&self, id: u64) -> ClientResult<Remote<DataBundle>> {
        self.get_bundle_by_url(&format!("{BUNDLES_ROOT}/{id}")).await
    }

    /// Fetch a bundle by detail URL
    pub async fn get_bundle_by_url(&self, url: &str) -> ClientResult<Remote<DataBundle>> {
        debug!("Fetching bundle {}", url);
        let mut record: DataBundle = self.client.get(url).await?;
        if record.url.is_empty() {
            record.url = self.client.resolve(url)?.to_string();
        }
        Ok(Remote::new(Arc::clone(&self.client), record))
    }
}
