//! Output commands

use clap::Args;
use url::Url;

use crate::identifier::parse_id;
use crate::job::{JobManager, MimirCredentials, OutputSpec, OutputType};

use super::jobs::parse_http_url;
use super::{CliError, Context};

/// Arguments naming an output by detail URL
#[derive(Args, Debug)]
pub struct OutputUrlArgs {
    /// Output detail URL
    #[arg(value_parser = parse_http_url)]
    pub url: Url,
}

/// add-mimir-output arguments
#[derive(Args, Debug)]
pub struct AddMimirOutputArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,

    /// URL of the Mímir index
    #[arg(value_parser = parse_http_url)]
    pub index_url: Url,

    /// User name for the index
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    /// Password for the index
    #[arg(long, requires = "username")]
    pub password: Option<String>,
}

impl AddMimirOutputArgs {
    /// Add the output and print its detail URL
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(MimirCredentials::new(username, password)),
            _ => None,
        };
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;
        let output = job.add_mimir_output(self.index_url.as_str(), credentials).await?;
        println!("Created {}", output.url);
        Ok(())
    }
}

/// add-file-output arguments
#[derive(Args, Debug)]
pub struct AddFileOutputArgs {
    /// Numeric job ID
    #[arg(value_parser = parse_id)]
    pub job_id: u64,

    /// Output format (GATE_XML, FINF, INLINE_XML, JSON)
    #[arg(long = "type")]
    pub output_type: OutputType,

    /// Extension for each output file, e.g. ".xml"
    #[arg(long)]
    pub file_extension: String,

    /// Comma-separated "set:type" selectors of annotations to include
    #[arg(long)]
    pub annotation_selectors: Option<String>,
}

impl AddFileOutputArgs {
    /// Add the output and print its detail URL
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        if self.output_type == OutputType::Mimir {
            return Err(CliError::InvalidArgument(
                "use add-mimir-output for MIMIR outputs".to_string(),
            ));
        }
        let mgr = JobManager::new(ctx.client.clone());
        let job = mgr.get_job(self.job_id).await?;
        let output = job
            .add_file_output(
                self.output_type,
                &self.file_extension,
                self.annotation_selectors.as_deref(),
            )
            .await?;
        println!("Created {}", output.url);
        Ok(())
    }
}

/// list-outputs
pub async fn list_outputs(ctx: &Context, job_id: u64) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    let outputs = mgr.get_job(job_id).await?.list_outputs().await?;
    if outputs.is_empty() {
        println!("No outputs found");
        return Ok(());
    }
    println!("{} output(s) found", outputs.len());
    for output in outputs {
        println!();
        println!("          Detail URL: {}", output.url);
        println!("                Type: {}", output.output_type);
        match &output.spec {
            OutputSpec::Mimir { index_url, username } => {
                println!("           Index URL: {index_url}");
                if let Some(username) = username {
                    println!("            Username: {username}");
                }
            }
            OutputSpec::File {
                file_extension,
                annotation_selectors,
            } => {
                println!("      File extension: {}", file_extension.as_deref().unwrap_or("-"));
                println!(
                    "Annotation selectors: {}",
                    annotation_selectors.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

/// delete-output
pub async fn delete_output(ctx: &Context, url: &Url) -> Result<(), CliError> {
    let mgr = JobManager::new(ctx.client.clone());
    mgr.get_output_details(url.as_str()).await?.delete().await?;
    println!("Output deleted successfully");
    Ok(())
}
