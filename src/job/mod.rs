//! Annotation jobs: listing, configuration, control and results

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::client::transfer::file_name_from_url;
use crate::client::{ClientError, ClientResult, Remote, Resource, RestClient};
use crate::config::JOBS_ROOT;
use crate::Prices;

pub mod input;
pub mod output;

pub use input::{
    AwsCredentials, CommonCrawlDetails, CommonCrawlSearch, ConfigureInputRequest, DirectInput,
    InputDetails, InputOptions, InputSource, InputSummary, InputType,
};
pub use output::{AddOutputRequest, MimirCredentials, Output, OutputSpec, OutputType};

/// Lifecycle state of a job
///
/// `start` is only valid from `Ready`, `stop` from `Running`, `resume` from
/// `Suspended` and `reset` from `Completed`. The server rejects anything else;
/// the client does not check locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Configured and ready to start
    #[serde(rename = "READY")]
    Ready,
    /// Currently executing
    #[serde(rename = "RUNNING")]
    Running,
    /// Paused by the server for lack of funds
    #[serde(rename = "SUSPENDED")]
    Suspended,
    /// Finished; results may be downloaded
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Ready => "READY",
            JobState::Running => "RUNNING",
            JobState::Suspended => "SUSPENDED",
            JobState::Completed => "COMPLETED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READY" => Ok(JobState::Ready),
            "RUNNING" => Ok(JobState::Running),
            "SUSPENDED" => Ok(JobState::Suspended),
            "COMPLETED" => Ok(JobState::Completed),
            _ => Err(format!(
                "Invalid job state: {s}. Valid options: READY, RUNNING, SUSPENDED, COMPLETED"
            )),
        }
    }
}

/// Control actions accepted by a job's `/control` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    /// READY -> RUNNING
    Start,
    /// RUNNING -> READY or SUSPENDED
    Stop,
    /// SUSPENDED -> RUNNING
    Resume,
    /// COMPLETED -> READY
    Reset,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobAction::Start => "start",
            JobAction::Stop => "stop",
            JobAction::Resume => "resume",
            JobAction::Reset => "reset",
        };
        write!(f, "{s}")
    }
}

/// Entry in a job listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    /// Detail URL
    pub url: String,
    /// Numeric ID, if the listing includes it
    #[serde(default)]
    pub id: Option<u64>,
    /// Job name, if the listing includes it
    #[serde(default)]
    pub name: Option<String>,
    /// Lifecycle state, if the listing includes it
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Full details of an annotation job
///
/// Fields mirror the server's copy at the time of the last fetch. Use the
/// methods on [`Remote<Job>`] to change the job; editing fields locally has
/// no effect on the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Detail URL
    #[serde(default)]
    pub url: String,
    /// Numeric ID
    pub id: u64,
    /// Job name
    #[serde(default)]
    pub name: String,
    /// Internal unique identifier
    #[serde(default)]
    pub uuid: Option<String>,
    /// Lifecycle state
    pub state: JobState,
    /// Prices charged when running this job
    #[serde(default)]
    pub price: Option<Prices>,
    /// Creation date as rendered by the server
    #[serde(default)]
    pub date_created: Option<String>,
    /// Completion date, absent until the job has run
    #[serde(default)]
    pub date_completed: Option<String>,
    /// When stored results expire, absent until the job has run
    #[serde(default)]
    pub results_available_until: Option<String>,
    /// Processing time used so far, in milliseconds
    #[serde(default)]
    pub time_used: u64,
    /// Processing time charged so far, in milliseconds
    ///
    /// Never less than `time_used`; the server rounds charges up to whole
    /// hours.
    #[serde(default)]
    pub time_charged: u64,
    /// Bytes of data processed so far
    #[serde(default)]
    pub bytes_used: u64,
    /// Bytes of data processing charged so far
    #[serde(default)]
    pub bytes_charged: u64,
    /// Fraction of tasks completed in `[0, 1)`, negative while unknown
    #[serde(default = "unknown_progress")]
    pub progress: f64,
    /// Properties not modelled above
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

fn unknown_progress() -> f64 {
    -1.0
}

impl Job {
    /// Whether the server has determined the number of sub-tasks yet
    pub fn progress_known(&self) -> bool {
        self.progress >= 0.0
    }

    fn sub_url(&self, path: &str) -> String {
        format!("{}/{path}", self.url.trim_end_matches('/'))
    }
}

impl Resource for Job {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }
}

/// One execution log entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogMessage {
    /// Time of the event
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    /// Log text
    pub message: String,
}

/// A result file produced by a completed job
///
/// The URL is a stable reference; bytes are fetched from the time-limited
/// URL returned by [`Remote::<JobResult>::url_to_download`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct JobResult {
    /// Stable detail URL
    pub url: String,
}

impl JobResult {
    /// File name for saving this result locally
    pub fn file_name(&self) -> Option<String> {
        file_name_from_url(&self.url)
    }
}

impl Remote<JobResult> {
    /// Ask the server for a fresh time-limited download URL
    pub async fn url_to_download(&self) -> ClientResult<Url> {
        self.client().get_redirect(&self.url).await
    }
}

#[derive(Serialize)]
struct RenameRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ControlRequest {
    action: JobAction,
}

/// Body for the `/outputDirectory` endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDirectoryRequest {
    /// `s3://bucket/prefix/` target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_location: Option<String>,
    /// Credentials for the target bucket
    #[serde(flatten)]
    pub credentials: Option<AwsCredentials>,
    /// Revert to the default AnnoMarket-managed location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_location: Option<bool>,
}

impl Remote<Job> {
    /// Change the job's name and adopt the server's updated copy
    pub async fn rename(&mut self, name: &str) -> ClientResult<()> {
        info!("Renaming job {} to {:?}", self.id, name);
        self.post_for_update(&RenameRequest { name }).await
    }

    /// Send output files to a bucket not owned by AnnoMarket
    pub async fn output_to_s3(
        &self,
        location: &str,
        credentials: AwsCredentials,
    ) -> ClientResult<()> {
        let request = OutputDirectoryRequest {
            s3_location: Some(location.to_string()),
            credentials: Some(credentials),
            default_location: None,
        };
        self.client()
            .post_and_discard(&self.sub_url("outputDirectory"), &request)
            .await
    }

    /// Store output files in the default AnnoMarket-managed location
    pub async fn output_to_default(&self) -> ClientResult<()> {
        let request = OutputDirectoryRequest {
            default_location: Some(true),
            ..Default::default()
        };
        self.client()
            .post_and_discard(&self.sub_url("outputDirectory"), &request)
            .await
    }

    /// List the job's input specifications
    pub async fn list_inputs(&self) -> ClientResult<Vec<Remote<InputSummary>>> {
        self.client().fetch_all(&self.sub_url("input")).await
    }

    /// List the job's output specifications
    pub async fn list_outputs(&self) -> ClientResult<Vec<Remote<Output>>> {
        self.client().fetch_all(&self.sub_url("output")).await
    }

    /// Add an output that pushes results into a Mímir index
    ///
    /// Without credentials neither `username` nor `password` is sent.
    pub async fn add_mimir_output(
        &self,
        index_url: &str,
        credentials: Option<MimirCredentials>,
    ) -> ClientResult<Remote<Output>> {
        let request = AddOutputRequest::mimir(index_url, credentials);
        self.client().create(&self.sub_url("output"), &request).await
    }

    /// Add a file-based output
    pub async fn add_file_output(
        &self,
        output_type: OutputType,
        file_extension: &str,
        annotation_selectors: Option<&str>,
    ) -> ClientResult<Remote<Output>> {
        let request = AddOutputRequest::file(output_type, file_extension, annotation_selectors)?;
        self.client().create(&self.sub_url("output"), &request).await
    }

    /// Start execution (READY -> RUNNING)
    pub async fn start(&mut self) -> ClientResult<()> {
        self.control(JobAction::Start).await
    }

    /// Stop execution (RUNNING -> READY or SUSPENDED)
    pub async fn stop(&mut self) -> ClientResult<()> {
        self.control(JobAction::Stop).await
    }

    /// Resume after suspension (SUSPENDED -> RUNNING)
    pub async fn resume(&mut self) -> ClientResult<()> {
        self.control(JobAction::Resume).await
    }

    /// Reset a finished job so it can run again (COMPLETED -> READY)
    pub async fn reset(&mut self) -> ClientResult<()> {
        self.control(JobAction::Reset).await
    }

    /// Send a control action, then refresh so progress fields are current
    pub async fn control(&mut self, action: JobAction) -> ClientResult<()> {
        info!("Sending '{}' to job {}", action, self.id);
        self.client()
            .post_and_discard(&self.sub_url("control"), &ControlRequest { action })
            .await?;
        self.refresh().await
    }

    /// Fetch execution log messages, most recent first
    ///
    /// Either bound of the time window may be omitted.
    pub async fn execution_log(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ClientResult<Vec<LogMessage>> {
        let url = log_url(self.client().resolve(&self.sub_url("log"))?, from, to);
        self.client().get(url.as_str()).await
    }

    /// List the result files of a completed job
    pub async fn results(&self) -> ClientResult<Vec<Remote<JobResult>>> {
        self.client().fetch_all(&self.sub_url("results")).await
    }

    /// Upload a local archive (ZIP, TAR, Twitter or DataSift JSON) as input
    ///
    /// ARC and WARC files must go through [`Self::add_arc_input`].
    pub async fn add_archive_input(
        &self,
        file: &Path,
        input_type: InputType,
        options: &InputOptions,
    ) -> ClientResult<Remote<InputDetails>> {
        if input_type.is_arc() {
            return Err(ClientError::InvalidArgument(
                "For ARC and WARC files use add_arc_input".to_string(),
            ));
        }
        let configuration = ConfigureInputRequest::archive(input_type, options);
        self.add_upload_input(file, configuration).await
    }

    /// Upload a local ARC or WARC file as input
    pub async fn add_arc_input(
        &self,
        file: &Path,
        input_type: InputType,
        options: &InputOptions,
    ) -> ClientResult<Remote<InputDetails>> {
        if !input_type.is_arc() {
            return Err(ClientError::InvalidArgument(format!(
                "add_arc_input requires ARC or WARC, got {input_type}"
            )));
        }
        let configuration = ConfigureInputRequest::arc(input_type, options);
        self.add_upload_input(file, configuration).await
    }

    /// Point at an archive stored in Amazon S3
    pub async fn add_archive_input_from_s3(
        &self,
        s3_location: &str,
        credentials: Option<AwsCredentials>,
        input_type: InputType,
        options: &InputOptions,
    ) -> ClientResult<Remote<InputDetails>> {
        let configuration = if input_type.is_arc() {
            ConfigureInputRequest::arc(input_type, options)
        } else {
            ConfigureInputRequest::archive(input_type, options)
        };
        let request = input::S3InputRequest {
            s3_location: s3_location.to_string(),
            credentials,
        };
        let created: InputDetails = self.client().post(&self.sub_url("input"), &request).await?;
        self.client().create(&created.url, &configuration).await
    }

    /// Use an existing data bundle as input
    pub async fn add_bundle_input(&self, bundle_id: u64) -> ClientResult<Remote<InputDetails>> {
        let request = input::BundleInputRequest { bundle_id };
        self.client().create(&self.sub_url("input"), &request).await
    }

    /// Start a Common Crawl search as input
    ///
    /// Returns as soon as the search is created; call `refresh` on the
    /// returned input to follow its progress.
    pub async fn add_common_crawl_input(
        &self,
        search: CommonCrawlSearch,
    ) -> ClientResult<Remote<InputDetails>> {
        if search.hostname.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "For common crawl inputs, hostname is required".to_string(),
            ));
        }
        let request = input::CommonCrawlInputRequest {
            common_crawl: search,
        };
        self.client().create(&self.sub_url("input"), &request).await
    }

    /// Delete the job and any results held in the default location
    pub async fn delete(self) -> ClientResult<()> {
        info!("Deleting job {}", self.id);
        self.client().delete(&self.url).await
    }

    /// Create an upload input, PUT the file to its time-limited URL, then
    /// configure it
    async fn add_upload_input(
        &self,
        file: &Path,
        configuration: ConfigureInputRequest,
    ) -> ClientResult<Remote<InputDetails>> {
        let metadata = tokio::fs::metadata(file).await.map_err(|e| {
            ClientError::InvalidArgument(format!("cannot read {}: {e}", file.display()))
        })?;
        if !metadata.is_file() {
            return Err(ClientError::InvalidArgument(format!(
                "{} is not a file",
                file.display()
            )));
        }
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::InvalidArgument(format!("{} has no file name", file.display()))
            })?;

        let created: InputDetails = self
            .client()
            .post(&self.sub_url("input"), &input::UploadInputRequest { file_name })
            .await?;
        let put_url = created.put_url.as_deref().ok_or_else(|| {
            ClientError::ParseError(format!("input {} has no upload URL", created.url))
        })?;
        let put_url = Url::parse(put_url)
            .map_err(|e| ClientError::ParseError(format!("invalid upload URL: {e}")))?;

        let sent = self.client().put_file(&put_url, file).await?;
        debug!("Uploaded {} bytes for input {}", sent, created.url);

        self.client().create(&created.url, &configuration).await
    }
}

impl Remote<JobSummary> {
    /// Fetch the full job
    pub async fn details(&self) -> ClientResult<Remote<Job>> {
        let mut job: Remote<Job> = self.client().fetch(&self.url).await?;
        if job.url.is_empty() {
            job = Remote::new(Arc::clone(self.client()), Job {
                url: self.url.clone(),
                ..job.into_record()
            });
        }
        Ok(job)
    }
}

fn log_url(mut url: Url, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Url {
    {
        let mut query = url.query_pairs_mut();
        if let Some(from) = from {
            query.append_pair("from", &from.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        if let Some(to) = to {
            query.append_pair("to", &to.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}

/// Entry point for job queries
#[derive(Debug, Clone)]
pub struct JobManager {
    client: Arc<RestClient>,
}

impl JobManager {
    /// Create a manager sharing the given client
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List jobs, optionally restricted to the given states
    ///
    /// An empty `states` slice lists jobs in every state. No match is an
    /// empty list, not an error.
    pub async fn list_jobs(&self, states: &[JobState]) -> ClientResult<Vec<Remote<JobSummary>>> {
        let mut url = self.client.resolve(JOBS_ROOT)?;
        if !states.is_empty() {
            let mut query = url.query_pairs_mut();
            for state in states {
                query.append_pair("state", &state.to_string());
            }
        }
        self.client.fetch_all(url.as_str()).await
    }

    /// Fetch a job by numeric ID
    pub async fn get_job(&self, id: u64) -> ClientResult<Remote<Job>> {
        self.get_job_by_url(&format!("{JOBS_ROOT}/{id}")).await
    }

    /// Fetch a job by detail URL
    pub async fn get_job_by_url(&self, url: &str) -> ClientResult<Remote<Job>> {
        let mut job: Remote<Job> = self.client.fetch(url).await?;
        if job.url.is_empty() {
            let resolved = self.client.resolve(url)?.to_string();
            job = Remote::new(Arc::clone(&self.client), Job {
                url: resolved,
                ..job.into_record()
            });
        }
        Ok(job)
    }

    /// Fetch an input specification by detail URL
    pub async fn get_input_details(&self, url: &str) -> ClientResult<Remote<InputDetails>> {
        self.client.fetch(url).await
    }

    /// Fetch an output specification by detail URL
    pub async fn get_output_details(&self, url: &str) -> ClientResult<Remote<Output>> {
        self.client.fetch(url).await
    }

    /// Bind a result URL (for example one printed by `list-results`)
    pub fn result(&self, url: &str) -> Remote<JobResult> {
        Remote::new(Arc::clone(&self.client), JobResult { url: url.to_string() })
    }
}
