//! Contract tests for job input endpoints

use annomarket::job::{
    AwsCredentials, CommonCrawlSearch, InputOptions, InputSource, InputType, JobManager,
};
use annomarket::ClientError;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{client, job_body};

async fn mount_job(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/job/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body(server, 12, "j", "READY")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_zip_upload_creates_uploads_and_configures() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let input_url = format!("{}/job/12/input/7", server.uri());

    Mock::given(method("POST"))
        .and(path("/job/12/input"))
        .and(body_json(json!({"fileName": "docs.zip"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": input_url,
            "putUrl": format!("{}/upload/abc", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/job/12/input/7"))
        .and(body_json(json!({"type": "ZIP", "fileExtensions": ".txt,.html"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": input_url,
            "type": "ZIP",
            "location": "s3://annomarket/uploads/docs.zip",
            "fileExtensions": ".txt,.html"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("docs.zip");
    std::fs::File::create(&file)
        .unwrap()
        .write_all(b"PK\x03\x04 not really a zip")
        .unwrap();

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let options = InputOptions {
        file_extensions: Some(".txt,.html".to_string()),
        mime_types: Some("text/html".to_string()),
        ..Default::default()
    };
    let input = job
        .add_archive_input(&file, InputType::Zip, &options)
        .await
        .unwrap();

    assert_ne!(input.url, job.url);
    assert_eq!(input.input_type, Some(InputType::Zip));
    match &input.source {
        InputSource::Direct(direct) => {
            assert_eq!(direct.location.as_deref(), Some("s3://annomarket/uploads/docs.zip"));
            assert_eq!(direct.mime_types, None);
        }
        other => panic!("expected a direct input, got {other:?}"),
    }
}

#[tokio::test]
async fn test_arc_upload_sends_mime_type_filters() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let input_url = format!("{}/job/12/input/8", server.uri());

    Mock::given(method("POST"))
        .and(path("/job/12/input"))
        .and(body_json(json!({"fileName": "crawl.arc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": input_url,
            "putUrl": format!("{}/upload/arc", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/arc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/job/12/input/8"))
        .and(body_json(json!({"type": "ARC", "mimeTypeFilters": "text/html"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": input_url,
            "type": "ARC",
            "location": "s3://annomarket/uploads/crawl.arc",
            "mimeTypes": "text/html"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("crawl.arc");
    std::fs::write(&file, b"filedesc://crawl.arc").unwrap();

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let options = InputOptions {
        file_extensions: Some(".html".to_string()),
        mime_types: Some("text/html".to_string()),
        ..Default::default()
    };
    let input = job.add_arc_input(&file, InputType::Arc, &options).await.unwrap();

    assert_eq!(input.input_type, Some(InputType::Arc));
    match &input.source {
        InputSource::Direct(direct) => {
            assert_eq!(direct.mime_types.as_deref(), Some("text/html"));
            assert_eq!(direct.file_extensions, None);
        }
        other => panic!("expected a direct input, got {other:?}"),
    }
}

#[tokio::test]
async fn test_archive_input_rejects_arc_types_locally() {
    let server = MockServer::start().await;
    mount_job(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("crawl.warc");
    std::fs::write(&file, b"WARC/1.0").unwrap();

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let err = job
        .add_archive_input(&file, InputType::Warc, &InputOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    let err = job
        .add_arc_input(&file, InputType::Tar, &InputOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_upload_of_missing_file_sends_nothing() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    Mock::given(method("POST"))
        .and(path("/job/12/input"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = job
        .add_archive_input(&dir.path().join("absent.zip"), InputType::Zip, &InputOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_s3_input_sends_credentials_together() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let input_url = format!("{}/job/12/input/8", server.uri());
    Mock::given(method("POST"))
        .and(path("/job/12/input"))
        .and(body_json(json!({
            "s3Location": "s3://bucket/docs.tar.gz",
            "accessKey": "AKIA",
            "secretKey": "shh"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": input_url})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/job/12/input/8"))
        .and(body_json(json!({"type": "TAR", "encoding": "UTF-8"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": input_url,
            "type": "TAR",
            "location": "s3://bucket/docs.tar.gz",
            "accessKey": "AKIA",
            "encoding": "UTF-8"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let options = InputOptions {
        encoding: Some("UTF-8".to_string()),
        ..Default::default()
    };
    let input = job
        .add_archive_input_from_s3(
            "s3://bucket/docs.tar.gz",
            Some(AwsCredentials::new("AKIA", "shh")),
            InputType::Tar,
            &options,
        )
        .await
        .unwrap();
    assert_eq!(input.input_type, Some(InputType::Tar));
}

#[tokio::test]
async fn test_bundle_input() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let bundle_url = format!("{}/data/bundle/3", server.uri());
    Mock::given(method("POST"))
        .and(path("/job/12/input"))
        .and(body_json(json!({"bundleId": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/job/12/input/9", server.uri()),
            "sourceBundle": bundle_url
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let input = job.add_bundle_input(3).await.unwrap();
    assert_eq!(input.source, InputSource::Bundle(bundle_url));
    assert_eq!(input.input_type, None);
}

#[tokio::test]
async fn test_common_crawl_items_never_decrease() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let input_url = format!("{}/job/12/input/10", server.uri());
    let state = |items: u64, complete: bool| {
        json!({
            "url": input_url,
            "commonCrawl": {"hostname": "*.example.com", "items": items, "complete": complete}
        })
    };

    Mock::given(method("POST"))
        .and(path("/job/12/input"))
        .and(body_json(json!({"commonCrawl": {"hostname": "*.example.com"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(state(0, false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/12/input/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state(120, false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/12/input/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(state(450, true)))
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let mut input = job
        .add_common_crawl_input(CommonCrawlSearch::new("*.example.com"))
        .await
        .unwrap();

    let mut seen = vec![input.common_crawl().unwrap().items];
    while !input.common_crawl().unwrap().complete {
        input.refresh().await.unwrap();
        seen.push(input.common_crawl().unwrap().items);
    }

    assert_eq!(seen, vec![0, 120, 450]);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_common_crawl_requires_hostname() {
    let server = MockServer::start().await;
    mount_job(&server).await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let err = job
        .add_common_crawl_input(CommonCrawlSearch::new("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_list_inputs_and_delete() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let input_url = format!("{}/job/12/input/7", server.uri());
    Mock::given(method("GET"))
        .and(path("/job/12/input"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"url": input_url, "type": "ZIP", "location": "s3://annomarket/docs.zip"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/12/input/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": input_url,
            "type": "ZIP",
            "location": "s3://annomarket/docs.zip"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/job/12/input/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let inputs = job.list_inputs().await.unwrap();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].input_type, Some(InputType::Zip));

    let details = inputs[0].details().await.unwrap();
    assert_eq!(details.url, input_url);
    details.delete().await.unwrap();
}
