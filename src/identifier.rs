//! Strict parsing of resource identifiers given on the command line
//!
//! Numeric IDs must be plain base-10 digits. Anything that is not a valid ID
//! is rejected locally and never sent to the server.

use std::fmt;
use url::Url;

/// Parse a numeric resource ID
///
/// Only ASCII digits are accepted: no sign, no whitespace, no radix prefix,
/// and the value must fit in a `u64`.
///
/// # Examples
///
/// ```
/// use annomarket::identifier::parse_id;
///
/// assert_eq!(parse_id("42").unwrap(), 42);
/// assert!(parse_id("-1").is_err());
/// assert!(parse_id("0x2a").is_err());
/// ```
pub fn parse_id(s: &str) -> Result<u64, IdentifierError> {
    if s.is_empty() {
        return Err(IdentifierError::InvalidId(
            "ID cannot be empty".to_string(),
        ));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentifierError::InvalidId(format!(
            "'{s}' is not a valid base-10 number"
        )));
    }
    s.parse::<u64>()
        .map_err(|_| IdentifierError::InvalidId(format!("'{s}' is too large")))
}

/// A resource named either by numeric ID or by detail URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// Numeric ID, resolved against a collection root
    Id(u64),
    /// Absolute http(s) detail URL
    Url(String),
}

impl ResourceRef {
    /// Parse an "ID or URL" argument
    ///
    /// Input made of digits only is an ID; otherwise it must be an absolute
    /// http or https URL.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return parse_id(s).map(Self::Id);
        }

        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Url(url.to_string())),
            _ => Err(IdentifierError::InvalidReference(format!(
                "'{s}' must be a valid numeric ID or an http(s) URL"
            ))),
        }
    }

    /// Detail URL for this reference, given the collection root
    pub fn to_url(&self, collection: &str) -> String {
        match self {
            Self::Id(id) => format!("{}/{id}", collection.trim_end_matches('/')),
            Self::Url(url) => url.clone(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

impl std::str::FromStr for ResourceRef {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur during identifier parsing
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// Malformed numeric ID
    #[error("invalid ID: {0}")]
    InvalidId(String),

    /// Neither a numeric ID nor a URL
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}
