//! Input commands: listing, uploads, bundles and Common Crawl searches

use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

use crate::config::COMMON_CRAWL_POLL_INTERVAL;
use crate::identifier::parse_id;
use crate::job::{
    CommonCrawlSearch, InputDetails, InputOptions, InputSource, InputType, JobManager,
};

use super::jobs::parse_http_url;
use super::{CliError, Context};

/// Arguments naming an input by detail URL
#[derive(Args, Debug)]
pub struct InputUrlArgs {
    /// Input detail URL
    #[arg(value_parser = parse_http_url)]
    pub url: Url,
}

/// upload-inputs arguments
#[derive(Args, Debug)]
pub struct UploadInputsArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,

    /// Type of the input files (ZIP, TAR, ARC, WARC, TWITTER_SEARCH, ...)
    #[arg(long = "type")]
    pub input_type: InputType,

    /// Character encoding for documents (default: from the ARC entry, else UTF-8)
    #[arg(long)]
    pub encoding: Option<String>,

    /// MIME type of every archive entry (default: guessed per entry)
    #[arg(long)]
    pub mime_type_override: Option<String>,

    /// ZIP/TAR only: comma-separated extensions of entries to keep
    #[arg(long)]
    pub file_extensions: Option<String>,

    /// ARC/WARC only: space-separated MIME types of entries to keep
    #[arg(long)]
    pub mime_types: Option<String>,

    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl UploadInputsArgs {
    /// Upload and configure each file in turn
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        if let Some(missing) = self.files.iter().find(|f| !f.is_file()) {
            return Err(CliError::InvalidArgument(format!(
                "{} is not a readable file",
                missing.display()
            )));
        }

        let options = InputOptions {
            encoding: self.encoding.clone(),
            mime_type_override: self.mime_type_override.clone(),
            file_extensions: self.file_extensions.clone(),
            mime_types: self.mime_types.clone(),
        };
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;

        for file in &self.files {
            println!("Processing {}", file.display());
            let input = if self.input_type.is_arc() {
                job.add_arc_input(file, self.input_type, &options).await?
            } else {
                job.add_archive_input(file, self.input_type, &options).await?
            };
            println!("  Created {}", input.url);
        }
        println!("Done");
        Ok(())
    }
}

/// input-from-bundle arguments
#[derive(Args, Debug)]
pub struct InputFromBundleArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,
    /// Numeric bundle ID
    #[arg(value_parser = parse_id)]
    pub bundle_id: u64,
}

impl InputFromBundleArgs {
    /// Add the bundle as an input of the job
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;
        let input = job.add_bundle_input(self.bundle_id).await?;
        println!("Created {}", input.url);
        Ok(())
    }
}

/// common-crawl arguments
#[derive(Args, Debug)]
pub struct CommonCrawlArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,

    /// Host name pattern; at most one "*", placed right before the first "."
    #[arg(long)]
    pub hostname: String,

    /// "http" or "https" (default: both)
    #[arg(long)]
    pub protocol: Option<String>,

    /// Path prefix pattern, may contain "*" (default: every path)
    #[arg(long)]
    pub path_prefix: Option<String>,

    /// Return as soon as the search starts instead of waiting for it
    #[arg(long = "async")]
    pub no_wait: bool,
}

impl CommonCrawlArgs {
    /// Start the search and, unless `--async`, follow it to completion
    ///
    /// Ctrl+C while waiting deletes the input, cancelling the search.
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        if self.hostname.trim().is_empty() {
            return Err(CliError::InvalidArgument("Hostname is required".to_string()));
        }
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;
        let search = CommonCrawlSearch {
            protocol: self.protocol.clone(),
            hostname: self.hostname.clone(),
            path_prefix: self.path_prefix.clone(),
        };
        let mut input = job.add_common_crawl_input(search).await?;
        println!("Created input {}", input.url);
        if self.no_wait {
            return Ok(());
        }

        println!("Starting search...");
        let mut items_so_far = 0;
        loop {
            let Some(state) = input.common_crawl() else {
                return Err(CliError::InvalidArgument(format!(
                    "{} is not a Common Crawl input",
                    input.url
                )));
            };
            if state.complete {
                println!();
                println!("Search complete: {} item(s) found.", state.items);
                return Ok(());
            }
            if state.items < items_so_far {
                warn!("Item count went down from {} to {}", items_so_far, state.items);
            }
            if state.items / 1000 > items_so_far / 1000 {
                print!("{}", state.items);
            }
            items_so_far = state.items;

            if !ctx.shutdown.sleep(COMMON_CRAWL_POLL_INTERVAL).await {
                eprintln!("Search interrupted");
                let url = input.url.clone();
                input.delete().await?;
                info!("Deleted input {}", url);
                return Err(CliError::Interrupted(format!("search {url} cancelled")));
            }
            input.refresh().await?;
            print!(".");
            std::io::stdout().flush()?;
        }
    }
}

/// list-inputs
pub async fn list_inputs(ctx: &Context, job_id: u64) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    let inputs = mgr.get_job(job_id).await?.list_inputs().await?;
    if inputs.is_empty() {
        println!("No inputs found");
        return Ok(());
    }
    println!("{} input(s) found", inputs.len());
    for input in inputs {
        println!();
        println!("  Detail URL: {}", input.url);
        if let Some(input_type) = input.input_type {
            println!("        Type: {input_type}");
        }
        if let Some(location) = &input.location {
            println!("    Location: {location}");
        }
        if let Some(bundle) = &input.source_bundle {
            println!("Source bundle: {bundle}");
        }
    }
    Ok(())
}

/// input-details
pub async fn input_details(ctx: &Context, url: &Url) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    let input = mgr.get_input_details(url.as_str()).await?;
    render_input(&input);
    Ok(())
}

fn render_input(input: &InputDetails) {
    println!("        Detail URL: {}", input.url);
    if let Some(input_type) = input.input_type {
        println!("              Type: {input_type}");
    }
    match &input.source {
        InputSource::Bundle(bundle) => println!("     Source bundle: {bundle}"),
        InputSource::CommonCrawl(search) => {
            println!("Common Crawl host: {}", search.hostname);
            if let Some(protocol) = &search.protocol {
                println!("          Protocol: {protocol}");
            }
            if let Some(prefix) = &search.path_prefix {
                println!("       Path prefix: {prefix}");
            }
            let status = if search.complete { "complete" } else { "in progress" };
            println!("      Items found: {} ({status})", search.items);
        }
        InputSource::Direct(direct) => {
            let fields = [
                ("Location", &direct.location),
                ("Encoding", &direct.encoding),
                ("MIME type override", &direct.mime_type_override),
                ("File extensions", &direct.file_extensions),
                ("MIME type filters", &direct.mime_types),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    println!("{label:>18}: {value}");
                }
            }
        }
    }
}

/// delete-input
pub async fn delete_input(ctx: &Context, url: &Url) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    mgr.get_input_details(url.as_str()).await?.delete().await?;
    println!("Input deleted successfully");
    Ok(())
}
