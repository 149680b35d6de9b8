//! Job input specifications
//!
//! A job reads its documents from one or more inputs. Every input is exactly
//! one of: a reference to an existing data bundle, a Common Crawl search, or a
//! directly specified archive. The server enforces that exclusivity, and
//! [`InputDetails`] exposes it as the [`InputSource`] sum type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::client::{ClientResult, Remote, Resource};
use crate::data::DataBundle;

/// Kind of data an input provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    /// ZIP archive of documents
    Zip,
    /// TAR archive (optionally compressed) of documents
    Tar,
    /// Internet Archive ARC file
    Arc,
    /// Web archive WARC file
    Warc,
    /// Individual records from ARC files
    ArcRecords,
    /// Individual records from WARC files
    WarcRecords,
    /// Twitter search API results
    TwitterSearch,
    /// Twitter streaming API capture
    TwitterStream,
    /// DataSift stream capture
    DatasiftStream,
}

impl InputType {
    /// Every input type, in wire order
    pub const ALL: [InputType; 9] = [
        InputType::Zip,
        InputType::Tar,
        InputType::Arc,
        InputType::Warc,
        InputType::ArcRecords,
        InputType::WarcRecords,
        InputType::TwitterSearch,
        InputType::TwitterStream,
        InputType::DatasiftStream,
    ];

    /// ARC and WARC uploads take MIME type filters rather than file extensions
    pub fn is_arc(&self) -> bool {
        matches!(self, InputType::Arc | InputType::Warc)
    }

    /// Name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Zip => "ZIP",
            InputType::Tar => "TAR",
            InputType::Arc => "ARC",
            InputType::Warc => "WARC",
            InputType::ArcRecords => "ARC_RECORDS",
            InputType::WarcRecords => "WARC_RECORDS",
            InputType::TwitterSearch => "TWITTER_SEARCH",
            InputType::TwitterStream => "TWITTER_STREAM",
            InputType::DatasiftStream => "DATASIFT_STREAM",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = InputType::ALL.iter().map(InputType::as_str).collect();
                format!("Unrecognised input type: {s}. Valid options: {}", names.join(", "))
            })
    }
}

/// Amazon S3 access credentials
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    /// Access key ID
    pub access_key: String,
    /// Secret key
    pub secret_key: String,
}

impl AwsCredentials {
    /// Pair an access key with its secret
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// Entry in a job's input listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSummary {
    /// Detail URL
    pub url: String,
    /// Input type, absent for bundle inputs
    #[serde(rename = "type", default)]
    pub input_type: Option<InputType>,
    /// Where the data lives, for direct inputs
    #[serde(default)]
    pub location: Option<String>,
    /// Detail URL of the source bundle, for bundle inputs
    #[serde(default)]
    pub source_bundle: Option<String>,
}

impl Remote<InputSummary> {
    /// Fetch the full input details
    pub async fn details(&self) -> ClientResult<Remote<InputDetails>> {
        let mut details: Remote<InputDetails> = self.client().fetch(&self.url).await?;
        if details.url.is_empty() {
            let mut record = details.into_record();
            record.url = self.url.clone();
            details = Remote::new(Arc::clone(self.client()), record);
        }
        Ok(details)
    }

    /// Fetch the bundle this input reads from, if it is a bundle input
    pub async fn source_bundle(&self) -> ClientResult<Option<Remote<DataBundle>>> {
        match &self.source_bundle {
            Some(url) => self.client().fetch(url).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Parameters of a Common Crawl search input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonCrawlSearch {
    /// `http` or `https`; both when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Host name pattern, validated by the server
    pub hostname: String,
    /// URL path prefix pattern; every path when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

impl CommonCrawlSearch {
    /// Search for every page under a host name pattern
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            protocol: None,
            hostname: hostname.into(),
            path_prefix: None,
        }
    }
}

/// State of a Common Crawl search as reported by the server
///
/// `items` never decreases between refreshes, and `complete` turns true once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonCrawlDetails {
    /// Requested protocol
    #[serde(default)]
    pub protocol: Option<String>,
    /// Requested host name pattern
    #[serde(default)]
    pub hostname: String,
    /// Requested path prefix
    #[serde(default)]
    pub path_prefix: Option<String>,
    /// Matching crawl entries found so far
    #[serde(default)]
    pub items: u64,
    /// Whether the search has finished
    #[serde(default)]
    pub complete: bool,
}

/// Settings of a directly specified input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectInput {
    /// Where the data lives
    pub location: Option<String>,
    /// S3 access key used to read `location`
    pub access_key: Option<String>,
    /// Character encoding for documents
    pub encoding: Option<String>,
    /// MIME type forced on every entry
    pub mime_type_override: Option<String>,
    /// Comma-separated extensions accepted from ZIP/TAR archives
    pub file_extensions: Option<String>,
    /// Space-separated MIME types accepted from ARC/WARC files
    pub mime_types: Option<String>,
}

/// Where an input's documents come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// An existing data bundle, by detail URL
    Bundle(String),
    /// A server-side search over Common Crawl
    CommonCrawl(CommonCrawlDetails),
    /// An archive specified directly
    Direct(DirectInput),
}

/// Full details of a job input
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawInputDetails")]
pub struct InputDetails {
    /// Detail URL
    pub url: String,
    /// Input type, absent for bundle inputs
    pub input_type: Option<InputType>,
    /// Time-limited upload URL, present only right after creating an upload input
    pub put_url: Option<String>,
    /// Data source
    pub source: InputSource,
}

impl InputDetails {
    /// Common Crawl search state, for Common Crawl inputs
    pub fn common_crawl(&self) -> Option<&CommonCrawlDetails> {
        match &self.source {
            InputSource::CommonCrawl(details) => Some(details),
            _ => None,
        }
    }
}

impl Resource for InputDetails {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }
}

impl Remote<InputDetails> {
    /// Delete the input; cancels a running Common Crawl search
    pub async fn delete(self) -> ClientResult<()> {
        self.client().delete(&self.url).await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInputDetails {
    #[serde(default)]
    url: String,
    #[serde(rename = "type", default)]
    input_type: Option<InputType>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    source_bundle: Option<String>,
    #[serde(default)]
    put_url: Option<String>,
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    mime_type_override: Option<String>,
    #[serde(default)]
    file_extensions: Option<String>,
    #[serde(default)]
    mime_types: Option<String>,
    #[serde(default)]
    common_crawl: Option<CommonCrawlDetails>,
}

impl From<RawInputDetails> for InputDetails {
    fn from(raw: RawInputDetails) -> Self {
        let source = if let Some(bundle) = raw.source_bundle {
            InputSource::Bundle(bundle)
        } else if let Some(search) = raw.common_crawl {
            InputSource::CommonCrawl(search)
        } else {
            InputSource::Direct(DirectInput {
                location: raw.location,
                access_key: raw.access_key,
                encoding: raw.encoding,
                mime_type_override: raw.mime_type_override,
                file_extensions: raw.file_extensions,
                mime_types: raw.mime_types,
            })
        };
        Self {
            url: raw.url,
            input_type: raw.input_type,
            put_url: raw.put_url,
            source,
        }
    }
}

/// Optional settings for a new archive input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    /// Character encoding for documents
    pub encoding: Option<String>,
    /// MIME type forced on every entry
    pub mime_type_override: Option<String>,
    /// Comma-separated extensions to accept (ZIP/TAR only)
    pub file_extensions: Option<String>,
    /// Space-separated MIME types to accept (ARC/WARC only)
    pub mime_types: Option<String>,
}

/// Sparse configuration update sent to a newly created input
///
/// Unset fields are left out of the body so the server keeps its values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureInputRequest {
    /// Input type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    /// Character encoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Forced MIME type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type_override: Option<String>,
    /// Extension filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extensions: Option<String>,
    /// MIME type filter, sent as `mimeTypeFilters`
    #[serde(rename = "mimeTypeFilters", skip_serializing_if = "Option::is_none")]
    pub mime_types: Option<String>,
}

impl ConfigureInputRequest {
    /// Configuration for ZIP/TAR-style archives; MIME type filters are ignored
    pub fn archive(input_type: InputType, options: &InputOptions) -> Self {
        Self {
            input_type: Some(input_type),
            encoding: options.encoding.clone(),
            mime_type_override: options.mime_type_override.clone(),
            file_extensions: options.file_extensions.clone(),
            mime_types: None,
        }
    }

    /// Configuration for ARC/WARC files; file extension filters are ignored
    pub fn arc(input_type: InputType, options: &InputOptions) -> Self {
        Self {
            input_type: Some(input_type),
            encoding: options.encoding.clone(),
            mime_type_override: options.mime_type_override.clone(),
            file_extensions: None,
            mime_types: options.mime_types.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadInputRequest {
    pub(crate) file_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct S3InputRequest {
    pub(crate) s3_location: String,
    #[serde(flatten)]
    pub(crate) credentials: Option<AwsCredentials>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BundleInputRequest {
    pub(crate) bundle_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommonCrawlInputRequest {
    pub(crate) common_crawl: CommonCrawlSearch,
}
