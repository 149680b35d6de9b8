//! Argument parsing for the annomarket command line

use annomarket::cli::{Cli, Commands};
use annomarket::identifier::ResourceRef;
use annomarket::job::{InputType, JobState, OutputType};
use annomarket::online::{ResponseFormat, SupportedMimeType};
use clap::Parser;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let mut argv = vec!["annomarket", "--api-key-id", "key", "--api-password", "secret"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv)
}

#[test]
fn test_list_jobs_states() {
    let cli = parse(&["list-jobs", "READY", "COMPLETED"]).unwrap();
    match cli.command {
        Commands::ListJobs(args) => {
            assert_eq!(args.states, vec![JobState::Ready, JobState::Completed]);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_list_jobs_rejects_unknown_state() {
    assert!(parse(&["list-jobs", "FINISHED"]).is_err());
}

#[test]
fn test_job_id_must_be_plain_digits() {
    assert!(parse(&["job-details", "12"]).is_ok());
    assert!(parse(&["job-details", "12a"]).is_err());
    assert!(parse(&["start-job", "-3"]).is_err());
}

#[test]
fn test_upload_inputs_arguments() {
    let cli = parse(&[
        "upload-inputs",
        "7",
        "--type",
        "WARC",
        "--mime-types",
        "text/html",
        "a.warc",
        "b.warc",
    ])
    .unwrap();
    match cli.command {
        Commands::UploadInputs(args) => {
            assert_eq!(args.job_id, 7);
            assert_eq!(args.input_type, InputType::Warc);
            assert_eq!(args.mime_types.as_deref(), Some("text/html"));
            assert_eq!(args.files.len(), 2);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_upload_inputs_needs_files() {
    assert!(parse(&["upload-inputs", "7", "--type", "ZIP"]).is_err());
}

#[test]
fn test_mimir_credentials_come_in_pairs() {
    assert!(parse(&["add-mimir-output", "7", "http://mimir/idx"]).is_ok());
    assert!(parse(&[
        "add-mimir-output",
        "7",
        "http://mimir/idx",
        "--username",
        "u",
        "--password",
        "p"
    ])
    .is_ok());
    assert!(parse(&["add-mimir-output", "7", "http://mimir/idx", "--username", "u"]).is_err());
    assert!(parse(&["add-mimir-output", "7", "http://mimir/idx", "--password", "p"]).is_err());
}

#[test]
fn test_add_file_output_type() {
    let cli = parse(&["add-file-output", "7", "--type", "GATE_XML", "--file-extension", ".xml"])
        .unwrap();
    match cli.command {
        Commands::AddFileOutput(args) => assert_eq!(args.output_type, OutputType::GateXml),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_bundle_by_id_or_url() {
    let cli = parse(&["download-bundle", "3"]).unwrap();
    match cli.command {
        Commands::DownloadBundle(args) => assert_eq!(args.bundle, ResourceRef::Id(3)),
        other => panic!("unexpected command {other:?}"),
    }

    let cli = parse(&["bundle-details", "https://api.annomarket.com/data/bundle/3"]).unwrap();
    match cli.command {
        Commands::BundleDetails(args) => assert!(matches!(args.bundle, ResourceRef::Url(_))),
        other => panic!("unexpected command {other:?}"),
    }

    assert!(parse(&["download-bundle", "bundle-3"]).is_err());
}

#[test]
fn test_annotate_document_sources_are_exclusive() {
    let cli = parse(&[
        "annotate",
        "--endpoint",
        "2",
        "--text",
        "Hello",
        "--mime-type",
        "text/html",
        "--format",
        "gate_xml",
    ])
    .unwrap();
    match cli.command {
        Commands::Annotate(args) => {
            assert_eq!(args.mime_type, SupportedMimeType::Html);
            assert_eq!(args.format, Some(ResponseFormat::GateXml));
        }
        other => panic!("unexpected command {other:?}"),
    }

    assert!(parse(&[
        "annotate",
        "--endpoint",
        "2",
        "--text",
        "Hello",
        "--url",
        "https://example.com/"
    ])
    .is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "annomarket",
        "list-items",
        "--allow-payment",
        "--timeout-secs",
        "5",
    ])
    .unwrap();
    assert!(cli.allow_payment);
    assert_eq!(cli.timeout_secs, 5);
}
