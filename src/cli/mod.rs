//! Command-line interface: one subcommand per REST operation

use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::client::RestClient;
use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::job::JobAction;
use crate::shutdown::SharedShutdown;

pub mod data;
pub mod error;
pub mod format;
pub mod inputs;
pub mod jobs;
pub mod online;
pub mod outputs;
pub mod shop;

pub use error::CliError;

/// Parse a positive timeout in seconds
fn parse_timeout(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("timeout must be at least 1 second".to_string());
    }
    Ok(value)
}

/// Command-line client for the AnnoMarket.com REST API
#[derive(Parser, Debug)]
#[command(name = "annomarket", version, about)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API key ID
    #[arg(long, global = true, env = "ANNOMARKET_API_KEY_ID")]
    pub api_key_id: Option<String>,

    /// API key password
    #[arg(long, global = true, env = "ANNOMARKET_API_PASSWORD", hide_env_values = true)]
    pub api_password: Option<String>,

    /// Base URL of the API
    #[arg(long, global = true, env = "ANNOMARKET_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = parse_timeout)]
    pub timeout_secs: u64,

    /// Allow operations that charge the account (reserving paid items)
    #[arg(long, global = true, env = "ANNOMARKET_PAYMENT_ALLOWED", default_value_t = false)]
    pub allow_payment: bool,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List jobs, optionally only those in the given states
    ListJobs(jobs::ListJobsArgs),
    /// Show the details of a job
    JobDetails(jobs::JobArgs),
    /// Rename a job
    RenameJob(jobs::RenameJobArgs),
    /// Delete a job
    DeleteJob(jobs::JobArgs),
    /// Start a READY job
    StartJob(jobs::JobArgs),
    /// Stop a RUNNING job
    StopJob(jobs::JobArgs),
    /// Resume a SUSPENDED job
    ResumeJob(jobs::JobArgs),
    /// Reset a COMPLETED job so it can run again
    ResetJob(jobs::JobArgs),
    /// Print a job's execution log
    ExecutionLog(jobs::ExecutionLogArgs),
    /// List a job's result files
    ListResults(jobs::JobArgs),
    /// Download one result or bundle file by URL
    Download(jobs::DownloadArgs),
    /// Download every result file of a job
    DownloadAllResults(jobs::DownloadAllResultsArgs),

    /// List a job's inputs
    ListInputs(jobs::JobArgs),
    /// Show the details of an input
    InputDetails(inputs::InputUrlArgs),
    /// Delete an input
    DeleteInput(inputs::InputUrlArgs),
    /// Upload local files as job inputs
    UploadInputs(inputs::UploadInputsArgs),
    /// Use a data bundle as a job input
    InputFromBundle(inputs::InputFromBundleArgs),
    /// Add a Common Crawl search as a job input
    CommonCrawl(inputs::CommonCrawlArgs),

    /// List a job's outputs
    ListOutputs(jobs::JobArgs),
    /// Add an output that indexes results into Mímir
    AddMimirOutput(outputs::AddMimirOutputArgs),
    /// Add a file-based output
    AddFileOutput(outputs::AddFileOutputArgs),
    /// Delete an output
    DeleteOutput(outputs::OutputUrlArgs),

    /// List data bundles
    ListBundles,
    /// Show the details of a data bundle
    BundleDetails(data::BundleDetailsArgs),
    /// Download every file of a data bundle
    DownloadBundle(data::BundleArgs),

    /// List shop items, optionally filtered by keywords
    ListItems(shop::ListItemsArgs),
    /// Show the details of a shop item
    ItemDetails(shop::ItemArgs),
    /// Reserve a job from a shop item
    ReserveJob(shop::ReserveJobArgs),

    /// Annotate one document with an online endpoint
    Annotate(online::AnnotateArgs),
}

/// Everything a command needs at run time
#[derive(Debug, Clone)]
pub struct Context {
    /// Shared authenticated client
    pub client: Arc<RestClient>,
    /// Whether paid operations may proceed
    pub payment_allowed: bool,
    /// Ctrl+C coordination for polling loops
    pub shutdown: SharedShutdown,
}

impl Cli {
    /// Connection settings from the global arguments
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        let api_key_id = self.api_key_id.clone().ok_or_else(|| {
            CliError::ConfigurationError(
                "API key ID required (--api-key-id or ANNOMARKET_API_KEY_ID)".to_string(),
            )
        })?;
        let api_password = self.api_password.clone().ok_or_else(|| {
            CliError::ConfigurationError(
                "API password required (--api-password or ANNOMARKET_API_PASSWORD)".to_string(),
            )
        })?;
        Ok(ClientConfig::new(api_key_id, api_password)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }

    /// Build the client and run the selected command
    pub async fn run(self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = self.client_config()?;
        let ctx = Context {
            client: RestClient::shared(&config)?,
            payment_allowed: self.allow_payment,
            shutdown,
        };
        self.command.execute(&ctx).await
    }
}

impl Commands {
    /// Dispatch to the command implementation
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        match self {
            Commands::ListJobs(args) => args.execute(ctx).await,
            Commands::JobDetails(args) => jobs::job_details(ctx, args.job_id).await,
            Commands::RenameJob(args) => args.execute(ctx).await,
            Commands::DeleteJob(args) => jobs::delete_job(ctx, args.job_id).await,
            Commands::StartJob(args) => jobs::control_job(ctx, args.job_id, JobAction::Start).await,
            Commands::StopJob(args) => jobs::control_job(ctx, args.job_id, JobAction::Stop).await,
            Commands::ResumeJob(args) => jobs::control_job(ctx, args.job_id, JobAction::Resume).await,
            Commands::ResetJob(args) => jobs::control_job(ctx, args.job_id, JobAction::Reset).await,
            Commands::ExecutionLog(args) => args.execute(ctx).await,
            Commands::ListResults(args) => jobs::list_results(ctx, args.job_id).await,
            Commands::Download(args) => args.execute(ctx).await,
            Commands::DownloadAllResults(args) => args.execute(ctx).await,
            Commands::ListInputs(args) => inputs::list_inputs(ctx, args.job_id).await,
            Commands::InputDetails(args) => inputs::input_details(ctx, &args.url).await,
            Commands::DeleteInput(args) => inputs::delete_input(ctx, &args.url).await,
            Commands::UploadInputs(args) => args.execute(ctx).await,
            Commands::InputFromBundle(args) => args.execute(ctx).await,
            Commands::CommonCrawl(args) => args.execute(ctx).await,
            Commands::ListOutputs(args) => outputs::list_outputs(ctx, args.job_id).await,
            Commands::AddMimirOutput(args) => args.execute(ctx).await,
            Commands::AddFileOutput(args) => args.execute(ctx).await,
            Commands::DeleteOutput(args) => outputs::delete_output(ctx, &args.url).await,
            Commands::ListBundles => data::list_bundles(ctx).await,
            Commands::BundleDetails(args) => args.execute(ctx).await,
            Commands::DownloadBundle(args) => data::download_bundle(ctx, args).await,
            Commands::ListItems(args) => args.execute(ctx).await,
            Commands::ItemDetails(args) => shop::item_details(ctx, args.item_id).await,
            Commands::ReserveJob(args) => args.execute(ctx).await,
            Commands::Annotate(args) => args.execute(ctx).await,
        }
    }
}
