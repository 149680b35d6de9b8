//! Contract tests for data bundle endpoints

use annomarket::data::{BundleAccess, DataManager};
use annomarket::job::InputType;
use annomarket::ClientError;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::client;

#[tokio::test]
async fn test_list_bundles_classifies_access() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/bundle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "open", "url": format!("{}/data/bundle/1", server.uri()), "closed": false, "downloadable": true},
            {"id": 2, "name": "files", "url": format!("{}/data/bundle/2", server.uri()), "closed": true, "downloadable": true},
            {"id": 3, "name": "input only", "url": format!("{}/data/bundle/3", server.uri()), "closed": true, "downloadable": false}
        ])))
        .mount(&server)
        .await;

    let bundles = DataManager::new(client(&server)).list_bundles().await.unwrap();
    let access: Vec<BundleAccess> = bundles.iter().map(|b| b.access()).collect();
    assert_eq!(
        access,
        vec![
            BundleAccess::OpenForUploads,
            BundleAccess::Downloadable,
            BundleAccess::InputOnly
        ]
    );
}

#[tokio::test]
async fn test_bundle_details_and_entry_download() {
    let server = MockServer::start().await;
    let entry_url = format!("{}/data/bundle/2/file/part-1.tar.gz", server.uri());
    Mock::given(method("GET"))
        .and(path("/data/bundle/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "name": "files",
            "dateCreated": "2014-03-03",
            "totalSize": 1048576,
            "monthlyPrice": 0.25,
            "type": "TAR",
            "fileExtensions": ".txt",
            "closed": true,
            "downloadable": true,
            "files": [entry_url]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/bundle/2/file/part-1.tar.gz"))
        .respond_with(
            ResponseTemplate::new(303)
                .insert_header("Location", format!("{}/signed/part-1.tar.gz", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/signed/part-1.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bundle bytes".to_vec()))
        .mount(&server)
        .await;

    let client = client(&server);
    let bundle = DataManager::new(client.clone()).get_bundle(2).await.unwrap();
    assert_eq!(bundle.url, format!("{}/data/bundle/2", server.uri()));
    assert_eq!(bundle.bundle_type, Some(InputType::Tar));
    assert_eq!(bundle.monthly_price, Decimal::from_str("0.25").unwrap());

    let entries = bundle.download_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name().as_deref(), Some("part-1.tar.gz"));

    let target = entries[0].url_to_download().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("part-1.tar.gz");
    let written = client.download_to_file(&target, &dest, None).await.unwrap();

    assert_eq!(written, 12);
    assert_eq!(std::fs::read(&dest).unwrap(), b"bundle bytes");
    assert!(!dir.path().join("part-1.tar.gz.part").exists());
}

#[tokio::test]
async fn test_input_only_bundle_has_no_download_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/bundle/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "input only",
            "closed": true,
            "downloadable": false
        })))
        .mount(&server)
        .await;

    let bundle = DataManager::new(client(&server)).get_bundle(3).await.unwrap();
    assert_eq!(bundle.access(), BundleAccess::InputOnly);
    assert!(matches!(
        bundle.download_entries(),
        Err(ClientError::InvalidArgument(_))
    ));
}
