//! Contract tests for job output endpoints

use annomarket::job::{JobManager, MimirCredentials, OutputSpec, OutputType};
use annomarket::ClientError;
use serde_json::json;
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
async fn test_mimir_output_without_credentials() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    Mock::given(method("POST"))
        .and(path("/job/12/output"))
        .and(body_json(json!({"type": "MIMIR", "indexUrl": "http://mimir.example.com/idx"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/job/12/output/1", server.uri()),
            "type": "MIMIR",
            "indexUrl": "http://mimir.example.com/idx"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let output = job
        .add_mimir_output("http://mimir.example.com/idx", None)
        .await
        .unwrap();

    assert_eq!(output.output_type, OutputType::Mimir);
    assert_eq!(
        output.spec,
        OutputSpec::Mimir {
            index_url: "http://mimir.example.com/idx".to_string(),
            username: None,
        }
    );
}

#[tokio::test]
async fn test_mimir_output_with_credentials() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    Mock::given(method("POST"))
        .and(path("/job/12/output"))
        .and(body_json(json!({
            "type": "MIMIR",
            "indexUrl": "http://mimir.example.com/idx",
            "username": "indexer",
            "password": "pw"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/job/12/output/2", server.uri()),
            "type": "MIMIR",
            "indexUrl": "http://mimir.example.com/idx",
            "username": "indexer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let output = job
        .add_mimir_output(
            "http://mimir.example.com/idx",
            Some(MimirCredentials::new("indexer", "pw")),
        )
        .await
        .unwrap();

    match &output.spec {
        OutputSpec::Mimir { username, .. } => assert_eq!(username.as_deref(), Some("indexer")),
        other => panic!("expected a Mimir output, got {other:?}"),
    }
}

#[tokio::test]
async fn test_file_output_and_listing() {
    let server = MockServer::start().await;
    mount_job(&server).await;
    let output = json!({
        "url": format!("{}/job/12/output/3", server.uri()),
        "type": "GATE_XML",
        "fileExtension": ".xml",
        "annotationSelectors": ":Person, :Location"
    });
    Mock::given(method("POST"))
        .and(path("/job/12/output"))
        .and(body_json(json!({
            "type": "GATE_XML",
            "fileExtension": ".xml",
            "annotationSelectors": ":Person, :Location"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(output.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/12/output"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([output])))
        .mount(&server)
        .await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let created = job
        .add_file_output(OutputType::GateXml, ".xml", Some(":Person, :Location"))
        .await
        .unwrap();
    let listed = job.list_outputs().await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].url, created.url);
    assert_eq!(
        listed[0].spec,
        OutputSpec::File {
            file_extension: Some(".xml".to_string()),
            annotation_selectors: Some(":Person, :Location".to_string()),
        }
    );
}

#[tokio::test]
async fn test_file_output_rejects_mimir_type() {
    let server = MockServer::start().await;
    mount_job(&server).await;

    let job = JobManager::new(client(&server)).get_job(12).await.unwrap();
    let err = job
        .add_file_output(OutputType::Mimir, ".xml", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_delete_output() {
    let server = MockServer::start().await;
    let output_url = format!("{}/job/12/output/3", server.uri());
    Mock::given(method("GET"))
        .and(path("/job/12/output/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": output_url,
            "type": "JSON",
            "fileExtension": ".json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/job/12/output/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = JobManager::new(client(&server))
        .get_output_details(&output_url)
        .await
        .unwrap();
    assert_eq!(output.output_type, OutputType::Json);
    output.delete().await.unwrap();
}
