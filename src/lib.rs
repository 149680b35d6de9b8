//! # AnnoMarket Client Library
//!
//! Typed access to the AnnoMarket.com REST API: annotation jobs and their
//! inputs, outputs and results, data bundles, the pipeline shop, and the
//! synchronous online annotation endpoints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use annomarket::client::RestClient;
//! use annomarket::config::ClientConfig;
//! use annomarket::job::{JobManager, JobState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RestClient::shared(&ClientConfig::new("key-id", "password"))?;
//! let jobs = JobManager::new(client);
//!
//! for summary in jobs.list_jobs(&[JobState::Ready]).await? {
//!     let mut job = summary.details().await?;
//!     job.start().await?;
//!     println!("{} is now {}", job.name, job.state);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - Authenticated transport, JSON codec, error decoding and
//!   the [`Remote`](client::Remote) resource handle
//! - [`config`] - Connection settings and endpoint roots
//! - [`identifier`] - Strict parsing of numeric IDs and "ID or URL" arguments
//! - [`job`] - Jobs, inputs, outputs, execution logs and results
//! - [`data`] - Data bundles
//! - [`shop`] - Shop items and job reservation
//! - [`online`] - Online annotation of single documents
//! - [`shutdown`] - Ctrl+C coordination for polling loops and downloads
//! - [`logging`] - Tracing subscriber setup for the binary
//! - [`cli`] - The `annomarket` command-line tool
//!
//! Every record fetched from the server is a possibly stale copy. Calling
//! `refresh` replaces all of its fields from a fresh response.

#![warn(missing_docs)]
#![warn(clippy::all)]

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;

/// CLI command implementations
pub mod cli;

/// REST transport and resource handles
pub mod client;

/// Connection settings and constants
pub mod config;

/// Data bundle management
pub mod data;

/// Identifier parsing and validation
pub mod identifier;

/// Annotation jobs
pub mod job;

/// Log output setup
pub mod logging;

/// Online annotation API
pub mod online;

/// Shop items
pub mod shop;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use client::{ClientError, ClientResult, Remote, RestClient};
pub use config::ClientConfig;

/// Price schedule of a job or shop item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prices {
    /// Charge per hour of processing time
    #[serde(default)]
    pub per_hour: Decimal,
    /// Charge per gigabyte of data processed
    #[serde(default)]
    pub per_gigabyte: Decimal,
}

impl Prices {
    /// Whether running costs nothing
    pub fn is_free(&self) -> bool {
        self.per_hour.is_zero() && self.per_gigabyte.is_zero()
    }
}

impl fmt::Display for Prices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            return write!(f, "Free");
        }
        write!(
            f,
            "£{:.2} per hour + £{:.2} per GB",
            self.per_hour, self.per_gigabyte
        )
    }
}
