//! Synchronous online annotation of single documents
//!
//! Online endpoints annotate one document per request and answer with the
//! annotated document, either as GATE JSON (decoded into
//! [`AnnotatedDocument`]) or as raw bytes in the requested [`ResponseFormat`].

use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::client::{ClientError, ClientResult, RestClient};

/// Serialization of an online response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// GATE JSON, the only format decoded into [`AnnotatedDocument`]
    Json,
    /// GATE XML
    GateXml,
}

impl ResponseFormat {
    /// Value of the `Accept` header selecting this format
    pub fn accept_header(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/gate+json",
            ResponseFormat::GateXml => "application/gate+xml",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "JSON" => Ok(ResponseFormat::Json),
            "GATE_XML" | "XML" => Ok(ResponseFormat::GateXml),
            _ => Err(format!("Invalid response format: {s}. Valid options: JSON, GATE_XML")),
        }
    }
}

/// Document MIME types the online endpoints understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedMimeType {
    /// `text/plain`
    Plaintext,
    /// `text/html`
    Html,
    /// `application/xml`
    XmlApplication,
    /// `text/xml`
    XmlText,
    /// `text/x-pubmed`
    Pubmed,
    /// `text/x-cochrane`
    Cochrane,
    /// `text/x-mediawiki`
    Mediawiki,
    /// `text/x-json-twitter`
    TwitterJson,
}

impl SupportedMimeType {
    /// Every supported type
    pub const ALL: [SupportedMimeType; 8] = [
        SupportedMimeType::Plaintext,
        SupportedMimeType::Html,
        SupportedMimeType::XmlApplication,
        SupportedMimeType::XmlText,
        SupportedMimeType::Pubmed,
        SupportedMimeType::Cochrane,
        SupportedMimeType::Mediawiki,
        SupportedMimeType::TwitterJson,
    ];

    /// The MIME type string
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedMimeType::Plaintext => "text/plain",
            SupportedMimeType::Html => "text/html",
            SupportedMimeType::XmlApplication => "application/xml",
            SupportedMimeType::XmlText => "text/xml",
            SupportedMimeType::Pubmed => "text/x-pubmed",
            SupportedMimeType::Cochrane => "text/x-cochrane",
            SupportedMimeType::Mediawiki => "text/x-mediawiki",
            SupportedMimeType::TwitterJson => "text/x-json-twitter",
        }
    }
}

impl fmt::Display for SupportedMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedMimeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SupportedMimeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unsupported MIME type: {s}"))
    }
}

impl Serialize for SupportedMimeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Selects annotations by set and type, rendered as `set:type`
///
/// An empty set means the default set; an empty type means every type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AnnotationSelector {
    /// Annotation set name
    pub annotation_set: String,
    /// Annotation type
    pub annotation_type: String,
}

impl AnnotationSelector {
    /// Every annotation from the default set
    pub fn all_from_default_set() -> Self {
        Self::default()
    }

    /// Every annotation from the named set
    pub fn all_from_set(annotation_set: impl Into<String>) -> Self {
        Self {
            annotation_set: annotation_set.into(),
            annotation_type: String::new(),
        }
    }

    /// One annotation type from the default set
    pub fn type_from_default_set(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_set: String::new(),
            annotation_type: annotation_type.into(),
        }
    }
}

impl fmt::Display for AnnotationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.annotation_set, self.annotation_type)
    }
}

impl FromStr for AnnotationSelector {
    type Err = String;

    /// Parse `set:type`; text without a colon is a type from the default set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((set, annotation_type)) => Ok(Self {
                annotation_set: set.to_string(),
                annotation_type: annotation_type.to_string(),
            }),
            None => Ok(Self::type_from_default_set(s)),
        }
    }
}

impl Serialize for AnnotationSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A request for the online endpoints, by inline text or by URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_url: Option<String>,
    mime_type: SupportedMimeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation_selectors: Option<Vec<AnnotationSelector>>,
}

impl OnlineServiceRequest {
    /// Annotate inline document text
    pub fn for_text(
        document: impl Into<String>,
        mime_type: SupportedMimeType,
        annotation_selectors: Option<Vec<AnnotationSelector>>,
    ) -> Self {
        Self {
            document: Some(document.into()),
            document_url: None,
            mime_type,
            annotation_selectors,
        }
    }

    /// Annotate a document the server fetches from a URL
    pub fn for_url(
        document_url: &url::Url,
        mime_type: SupportedMimeType,
        annotation_selectors: Option<Vec<AnnotationSelector>>,
    ) -> Self {
        Self {
            document: None,
            document_url: Some(document_url.to_string()),
            mime_type,
            annotation_selectors,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateTextRequest<'a> {
    document: &'a str,
    mime_type: SupportedMimeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation_selectors: Option<&'a str>,
}

/// One annotation over a span of the document text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAnnotation")]
pub struct Annotation {
    /// Offset of the first character
    pub start_offset: u64,
    /// Offset just past the last character
    pub end_offset: u64,
    /// Every other property of the annotation
    pub features: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawAnnotation {
    indices: Vec<u64>,
    #[serde(flatten)]
    features: Map<String, Value>,
}

impl TryFrom<RawAnnotation> for Annotation {
    type Error = String;

    fn try_from(raw: RawAnnotation) -> Result<Self, Self::Error> {
        match raw.indices[..] {
            [start_offset, end_offset, ..] => Ok(Self {
                start_offset,
                end_offset,
                features: raw.features,
            }),
            _ => Err(format!(
                "annotation indices need a start and an end, got {} value(s)",
                raw.indices.len()
            )),
        }
    }
}

/// A document annotated by an online endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotatedDocument {
    /// Document text that annotation offsets refer to
    #[serde(default)]
    pub text: String,
    /// Annotations grouped by type
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<Annotation>>,
    /// Every other top-level property, in server order
    #[serde(flatten)]
    pub other_features: Map<String, Value>,
}

/// Client for the online annotation endpoints
///
/// `endpoint` arguments are either a full endpoint URL or a path relative to
/// the client's base URL (such as `online-processing/item/2`).
#[derive(Debug, Clone)]
pub struct OnlineApi {
    client: Arc<RestClient>,
}

impl OnlineApi {
    /// Create an online API view sharing the given client
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// Annotate document text and decode the GATE JSON answer
    pub async fn annotate_document(
        &self,
        endpoint: &str,
        text: &str,
        mime_type: SupportedMimeType,
        annotation_selectors: Option<&str>,
    ) -> ClientResult<AnnotatedDocument> {
        let bytes = self
            .annotate_document_as_stream(
                endpoint,
                text,
                mime_type,
                annotation_selectors,
                ResponseFormat::Json,
            )
            .await?;
        decode_document(&bytes)
    }

    /// Annotate document text and return the raw answer
    pub async fn annotate_document_as_stream(
        &self,
        endpoint: &str,
        text: &str,
        mime_type: SupportedMimeType,
        annotation_selectors: Option<&str>,
        format: ResponseFormat,
    ) -> ClientResult<Bytes> {
        let request = AnnotateTextRequest {
            document: text,
            mime_type,
            annotation_selectors,
        };
        debug!("Annotating {} characters via {}", text.len(), endpoint);
        self.client
            .request_for_stream(Method::POST, endpoint, Some(&request), format.accept_header())
            .await
    }

    /// Annotate the UTF-8 contents of a local file
    pub async fn annotate_file_contents(
        &self,
        endpoint: &str,
        file: &Path,
        mime_type: SupportedMimeType,
        annotation_selectors: Option<&str>,
    ) -> ClientResult<AnnotatedDocument> {
        let text = tokio::fs::read_to_string(file).await.map_err(|e| {
            ClientError::InvalidArgument(format!("cannot read {}: {e}", file.display()))
        })?;
        self.annotate_document(endpoint, &text, mime_type, annotation_selectors)
            .await
    }

    /// Annotate a document the server fetches from a URL
    pub async fn annotate_document_from_url(
        &self,
        endpoint: &str,
        document_url: &url::Url,
        mime_type: SupportedMimeType,
    ) -> ClientResult<AnnotatedDocument> {
        let request = OnlineServiceRequest::for_url(document_url, mime_type, None);
        self.process_request(endpoint, &request).await
    }

    /// Send a prepared request and decode the GATE JSON answer
    pub async fn process_request(
        &self,
        endpoint: &str,
        request: &OnlineServiceRequest,
    ) -> ClientResult<AnnotatedDocument> {
        let bytes = self
            .process_request_for_stream(endpoint, request, ResponseFormat::Json)
            .await?;
        decode_document(&bytes)
    }

    /// Send a prepared request and return the raw answer
    pub async fn process_request_for_stream(
        &self,
        endpoint: &str,
        request: &OnlineServiceRequest,
        format: ResponseFormat,
    ) -> ClientResult<Bytes> {
        self.client
            .request_for_stream(Method::POST, endpoint, Some(request), format.accept_header())
            .await
    }
}

fn decode_document(bytes: &[u8]) -> ClientResult<AnnotatedDocument> {
    serde_json::from_slice(bytes)
        .map_err(|e| ClientError::ParseError(format!("Failed to decode annotated document: {e}")))
}
