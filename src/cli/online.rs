//! Online annotation command

use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use url::Url;

use crate::config::ONLINE_ROOT;
use crate::identifier::ResourceRef;
use crate::online::{
    AnnotatedDocument, OnlineApi, OnlineServiceRequest, ResponseFormat, SupportedMimeType,
};

use super::jobs::parse_http_url;
use super::{CliError, Context};

/// annotate arguments
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Online item ID or endpoint URL
    #[arg(long)]
    pub endpoint: ResourceRef,

    /// Document text
    #[arg(long, group = "document")]
    pub text: Option<String>,

    /// UTF-8 file holding the document
    #[arg(long, group = "document")]
    pub file: Option<PathBuf>,

    /// URL the server should fetch the document from
    #[arg(long, group = "document", value_parser = parse_http_url)]
    pub url: Option<Url>,

    /// MIME type of the document
    #[arg(long, default_value = "text/plain")]
    pub mime_type: SupportedMimeType,

    /// Comma-separated "set:type" annotation selectors
    #[arg(long)]
    pub selectors: Option<String>,

    /// Print the raw response in this format (JSON or GATE_XML) instead of a summary
    #[arg(long)]
    pub format: Option<ResponseFormat>,
}

impl AnnotateArgs {
    /// Annotate the document and print the result
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let api = OnlineApi::new(ctx.client.clone());
        let endpoint = self.endpoint.to_url(ONLINE_ROOT);
        let text = match (&self.text, &self.file) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(file)) => Some(tokio::fs::read_to_string(file).await?),
            (None, None) => None,
        };

        if let Some(format) = self.format {
            let bytes = match (&text, &self.url) {
                (Some(text), _) => {
                    api.annotate_document_as_stream(
                        &endpoint,
                        text,
                        self.mime_type,
                        self.selectors.as_deref(),
                        format,
                    )
                    .await?
                }
                (None, Some(url)) => {
                    let request = OnlineServiceRequest::for_url(url, self.mime_type, None);
                    api.process_request_for_stream(&endpoint, &request, format).await?
                }
                (None, None) => return Err(missing_document()),
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
            return Ok(());
        }

        let document = match (&text, &self.url) {
            (Some(text), _) => {
                api.annotate_document(&endpoint, text, self.mime_type, self.selectors.as_deref())
                    .await?
            }
            (None, Some(url)) => {
                api.annotate_document_from_url(&endpoint, url, self.mime_type)
                    .await?
            }
            (None, None) => return Err(missing_document()),
        };
        render_document(&document);
        Ok(())
    }
}

fn missing_document() -> CliError {
    CliError::InvalidArgument("one of --text, --file or --url is required".to_string())
}

fn render_document(document: &AnnotatedDocument) {
    for (annotation_type, annotations) in &document.entities {
        for annotation in annotations {
            let start = annotation.start_offset as usize;
            let end = annotation.end_offset as usize;
            let covered = covered_text(&document.text, start, end);
            println!("{annotation_type} [{start}, {end}) {covered:?}");
        }
    }
    if document.entities.is_empty() {
        println!("No annotations found");
    }
}

/// Text between two annotation offsets, counted in UTF-16 code units
fn covered_text(text: &str, start: usize, end: usize) -> String {
    let units: Vec<u16> = text
        .encode_utf16()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect();
    String::from_utf16_lossy(&units)
}
