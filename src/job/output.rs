//! Job output specifications

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::client::{ClientError, ClientResult, Remote, Resource};

/// Destination format of a job output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputType {
    /// Push annotated documents into a Mímir index
    Mimir,
    /// GATE XML document files
    GateXml,
    /// GATE documents as Fast Infoset
    Finf,
    /// Original markup with annotations inlined as XML tags
    InlineXml,
    /// JSON documents in the Twitter-style entity format
    Json,
}

impl OutputType {
    /// Every output type, in wire order
    pub const ALL: [OutputType; 5] = [
        OutputType::Mimir,
        OutputType::GateXml,
        OutputType::Finf,
        OutputType::InlineXml,
        OutputType::Json,
    ];

    /// Name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Mimir => "MIMIR",
            OutputType::GateXml => "GATE_XML",
            OutputType::Finf => "FINF",
            OutputType::InlineXml => "INLINE_XML",
            OutputType::Json => "JSON",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = OutputType::ALL.iter().map(OutputType::as_str).collect();
                format!("Unrecognised output type: {s}. Valid options: {}", names.join(", "))
            })
    }
}

/// Per-type settings of an output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    /// Results are indexed into Mímir
    Mimir {
        /// Index URL
        index_url: String,
        /// User name for the index, if it needs authentication
        username: Option<String>,
    },
    /// Results are written as files
    File {
        /// Extension given to each output file
        file_extension: Option<String>,
        /// Comma-separated `set:type` selectors of annotations to include
        annotation_selectors: Option<String>,
    },
}

/// One output of a job
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawOutput")]
pub struct Output {
    /// Detail URL
    pub url: String,
    /// Output type
    pub output_type: OutputType,
    /// Type-specific settings
    pub spec: OutputSpec,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOutput {
    #[serde(default)]
    url: String,
    #[serde(rename = "type")]
    output_type: OutputType,
    #[serde(default)]
    index_url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    file_extension: Option<String>,
    #[serde(default)]
    annotation_selectors: Option<String>,
}

impl From<RawOutput> for Output {
    fn from(raw: RawOutput) -> Self {
        let spec = match raw.output_type {
            OutputType::Mimir => OutputSpec::Mimir {
                index_url: raw.index_url.unwrap_or_default(),
                username: raw.username,
            },
            _ => OutputSpec::File {
                file_extension: raw.file_extension,
                annotation_selectors: raw.annotation_selectors,
            },
        };
        Self {
            url: raw.url,
            output_type: raw.output_type,
            spec,
        }
    }
}

impl Resource for Output {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }
}

impl Remote<Output> {
    /// Remove the output from its job
    pub async fn delete(self) -> ClientResult<()> {
        self.client().delete(&self.url).await
    }
}

/// User name and password for a protected Mímir index
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct MimirCredentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl MimirCredentials {
    /// Pair a user name with its password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for MimirCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MimirCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Body for creating an output
///
/// `username` and `password` travel together: both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutputRequest {
    #[serde(rename = "type")]
    output_type: OutputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_url: Option<String>,
    #[serde(flatten)]
    credentials: Option<MimirCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation_selectors: Option<String>,
}

impl AddOutputRequest {
    /// Request for a Mímir output
    pub fn mimir(index_url: &str, credentials: Option<MimirCredentials>) -> Self {
        Self {
            output_type: OutputType::Mimir,
            index_url: Some(index_url.to_string()),
            credentials,
            file_extension: None,
            annotation_selectors: None,
        }
    }

    /// Request for a file output
    ///
    /// # Errors
    /// `InvalidArgument` when `output_type` is [`OutputType::Mimir`].
    pub fn file(
        output_type: OutputType,
        file_extension: &str,
        annotation_selectors: Option<&str>,
    ) -> ClientResult<Self> {
        if output_type == OutputType::Mimir {
            return Err(ClientError::InvalidArgument(
                "MIMIR outputs need an index URL, use add_mimir_output".to_string(),
            ));
        }
        Ok(Self {
            output_type,
            index_url: None,
            credentials: None,
            file_extension: Some(file_extension.to_string()),
            annotation_selectors: annotation_selectors.map(str::to_string),
        })
    }
}
