//! Job commands: listing, details, control, execution log and results

use chrono::Utc;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

use crate::client::RestClient;
use crate::config::LOG_POLL_INTERVAL;
use crate::identifier::parse_id;
use crate::job::{Job, JobAction, JobManager, JobState};

use super::format::{
    download_progress_bar, format_bytes, format_ms, format_percent, format_prices,
    print_log_messages, truncate,
};
use super::{CliError, Context};

/// Arguments naming a single job
#[derive(Args, Debug)]
pub struct JobArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,
}

/// list-jobs arguments
#[derive(Args, Debug)]
pub struct ListJobsArgs {
    /// Only list jobs in these states (READY, RUNNING, SUSPENDED, COMPLETED)
    pub states: Vec<JobState>,
}

impl ListJobsArgs {
    /// Print one line per matching job
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let mgr = JobManager::new(ctx.client.clone());
        let jobs = mgr.list_jobs(&self.states).await?;
        if jobs.is_empty() {
            println!("No jobs found");
            return Ok(());
        }

        println!("    ID  Name                                      State");
        println!("----------------------------------------------------------");
        for summary in jobs {
            let (id, name, state) = match (summary.id, &summary.name, summary.state) {
                (Some(id), Some(name), Some(state)) => (id, name.clone(), state),
                _ => {
                    let job = summary.details().await?;
                    (job.id, job.name.clone(), job.state)
                }
            };
            println!("{:>6}  {:<40}  {}", id, truncate(&name, 40), state);
        }
        Ok(())
    }
}

/// rename-job arguments
#[derive(Args, Debug)]
pub struct RenameJobArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,
    /// New name
    pub name: String,
}

impl RenameJobArgs {
    /// Rename the job and print the name the server stored
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let mgr = JobManager::new(ctx.client.clone());
        let mut job = mgr.get_job(self.job_id).await?;
        job.rename(&self.name).await?;
        println!("Job {} renamed to \"{}\"", job.id, job.name);
        Ok(())
    }
}

/// execution-log arguments
#[derive(Args, Debug)]
pub struct ExecutionLogArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,
    /// Keep polling for new messages until Ctrl+C
    #[arg(long)]
    pub watch: bool,
}

impl ExecutionLogArgs {
    /// Print the log, then optionally poll for new messages
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;

        let mut last_poll = Utc::now();
        print_log_messages(&job.execution_log(None, None).await?);

        if self.watch {
            info!("Watching execution log of job {} (Ctrl+C to stop)", job.id);
            while ctx.shutdown.sleep(LOG_POLL_INTERVAL).await {
                let now = Utc::now();
                let messages = job.execution_log(Some(last_poll), None).await?;
                last_poll = now;
                print_log_messages(&messages);
            }
        }
        Ok(())
    }
}

/// download arguments
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Stable URL of a job result or bundle file
    #[arg(value_parser = parse_http_url)]
    pub url: Url,
    /// Directory to save into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl DownloadArgs {
    /// Resolve a fresh download URL and save the file
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let result = JobManager::new(ctx.client.clone()).result(self.url.as_str());
        let file_name = result.file_name().ok_or_else(|| {
            CliError::InvalidArgument(format!("{} does not name a file", self.url))
        })?;
        println!("{file_name}");
        let target = result.url_to_download().await?;
        download_file(&ctx.client, &target, &self.output_dir.join(&file_name), &file_name).await
    }
}

/// download-all-results arguments
#[derive(Args, Debug)]
pub struct DownloadAllResultsArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,
    /// Directory to save into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl DownloadAllResultsArgs {
    /// Save every result file of the job
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;
        let results = job.results().await?;
        let total = results.len();
        for (i, result) in results.iter().enumerate() {
            let Some(file_name) = result.file_name() else {
                warn!("Skipping result without a file name: {}", result.url);
                continue;
            };
            println!("{} (file {} of {})", file_name, i + 1, total);
            let target = result.url_to_download().await?;
            download_file(&ctx.client, &target, &self.output_dir.join(&file_name), &file_name)
                .await?;
        }
        Ok(())
    }
}

/// Accept only absolute http(s) URLs
pub fn parse_http_url(s: &str) -> Result<Url, String> {
    match Url::parse(s) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        Ok(url) => Err(format!("unsupported URL scheme '{}'", url.scheme())),
        Err(e) => Err(format!("'{s}' is not a valid URL: {e}")),
    }
}

/// Stream a time-limited URL into `dest` with a progress bar
pub(crate) async fn download_file(
    client: &RestClient,
    target: &Url,
    dest: &Path,
    label: &str,
) -> Result<(), CliError> {
    let pb = download_progress_bar(label);
    let result = client.download_to_file(target, dest, Some(&pb)).await;
    pb.finish_and_clear();
    let written = result?;
    info!("Saved {} ({})", dest.display(), format_bytes(written));
    Ok(())
}

/// job-details
pub async fn job_details(ctx: &Context, job_id: u64) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    let job = mgr.get_job(job_id).await?;
    render_job(&job);
    Ok(())
}

fn render_job(job: &Job) {
    println!("             ID: {}", job.id);
    println!("           Name: {}", job.name);
    println!("          State: {}", job.state);
    println!("          Price: {}", format_prices(job.price.as_ref()));
    println!("   Date created: {}", job.date_created.as_deref().unwrap_or("-"));
    if job.state == JobState::Completed {
        println!(" Date completed: {}", job.date_completed.as_deref().unwrap_or("-"));
        println!("    Expiry date: {}", job.results_available_until.as_deref().unwrap_or("-"));
    }
    if job.time_used > 0 {
        println!(
            "Processing time: {} (charged {} so far)",
            format_ms(job.time_used),
            format_ms(job.time_charged)
        );
    }
    if job.bytes_used > 0 {
        println!(
            " Data processed: {} (charged {} so far)",
            format_bytes(job.bytes_used),
            format_bytes(job.bytes_charged)
        );
    }
    if job.progress > 0.0 {
        println!("   Job progress: {}", format_percent(job.progress));
    }
}

/// delete-job
pub async fn delete_job(ctx: &Context, job_id: u64) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    mgr.get_job(job_id).await?.delete().await?;
    println!("Job {job_id} deleted");
    Ok(())
}

/// start-job, stop-job, resume-job and reset-job
pub async fn control_job(ctx: &Context, job_id: u64, action: JobAction) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    let mut job = mgr.get_job(job_id).await?;
    job.control(action).await?;
    println!("Job {} is now {}", job.id, job.state);
    Ok(())
}

/// list-results
pub async fn list_results(ctx: &Context, job_id: u64) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    let results = mgr.get_job(job_id).await?.results().await?;
    if results.is_empty() {
        return Err(CliError::NotFound("No results found".to_string()));
    }
    for result in results {
        println!("{}", result.url);
    }
    Ok(())
}
