//! End-to-end pipeline tests against a mock catalog

use super::*;
use crate::catalog::{CatalogClient, ClientConfig};
use crate::downloader::DownloadConfig;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const TOKEN: &str = "pipeline-token";

fn request(globs: &[&str]) -> InRequest {
    InRequest {
        source: Source {
            api_token: TOKEN.to_string(),
            product_slug: "my-product".to_string(),
            endpoint: None,
        },
        params: Params {
            globs: globs.iter().map(|g| g.to_string()).collect(),
        },
        version: Some(Version {
            product_version: "1.2.3".to_string(),
        }),
    }
}

fn pipeline_for(server: &MockServer) -> Pipeline<CatalogClient> {
    let catalog = CatalogClient::new(ClientConfig::new(TOKEN).with_base_url(server.uri())).unwrap();
    let downloader = Downloader::new(DownloadConfig::default().with_retries(1, Duration::from_millis(10))).unwrap();
    Pipeline::new(catalog, downloader)
}

const FILES: [&str; 5] = ["app-1.2.3.ova", "app-1.2.3.zip", "notes.txt", "tools-1.2.3.ova", "checksums.sha256"];

/// Mount a catalog for "my-product" 1.2.3 with five product files
async fn mount_catalog(server: &MockServer) {
    mount_catalog_with(server, &FILES).await;
}

async fn mount_catalog_with(server: &MockServer, files: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/products/my-product/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "releases": [
                {
                    "id": 7,
                    "version": "1.2.3",
                    "release_type": "Minor Release",
                    "release_date": "2016-03-01",
                    "description": "Bug fixes",
                    "eula": {"slug": "pivotal_software_eula"},
                    "_links": {"product_files": {"href": format!("{}/products/my-product/releases/7/product_files", server.uri())}}
                }
            ]
        })))
        .mount(server)
        .await;

    let product_files: Vec<serde_json::Value> = files
        .iter()
        .enumerate()
        .map(|(id, name)| {
            serde_json::json!({
                "id": id,
                "name": name,
                "aws_object_key": format!("product_files/my-product/{}", name),
                "_links": {"download": {"href": format!("{}/downloads/{}", server.uri(), name)}}
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/products/my-product/releases/7/product_files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "product_files": product_files
        })))
        .mount(server)
        .await;

    for name in files {
        Mock::given(method("GET"))
            .and(path(format!("/downloads/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("contents of {}", name).into_bytes()))
            .mount(server)
            .await;
    }
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut entries: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    entries
}

#[tokio::test]
async fn test_fetches_matching_files() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = tempdir().unwrap();
    let response = pipeline_for(&server)
        .run(&request(&["*.ova"]), dir.path())
        .await
        .unwrap();

    assert_eq!(dir_entries(dir.path()), vec!["app-1.2.3.ova", "tools-1.2.3.ova", "version"]);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("app-1.2.3.ova")).unwrap(),
        "contents of app-1.2.3.ova"
    );
    assert_eq!(std::fs::read_to_string(dir.path().join("version")).unwrap(), "1.2.3");

    assert_eq!(response.version.product_version, "1.2.3");
    let metadata: Vec<(&str, &str)> = response
        .metadata
        .iter()
        .map(|m| (m.name.as_str(), m.value.as_str()))
        .collect();
    assert_eq!(
        metadata,
        vec![
            ("release_type", "Minor Release"),
            ("release_date", "2016-03-01"),
            ("description", "Bug fixes"),
            ("eula_slug", "pivotal_software_eula"),
        ]
    );
}

#[tokio::test]
async fn test_no_globs_fetches_everything() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = tempdir().unwrap();
    pipeline_for(&server).run(&request(&[]), dir.path()).await.unwrap();

    assert_eq!(dir_entries(dir.path()).len(), FILES.len() + 1);
}

#[tokio::test]
async fn test_unmatched_glob_downloads_nothing() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = tempdir().unwrap();
    let err = pipeline_for(&server)
        .run(&request(&["*.ova", "*.pdf"]), dir.path())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoMatchForPattern);
    assert_eq!(err.stage(), "filter product files");
    assert!(dir_entries(dir.path()).is_empty());
}

#[tokio::test]
async fn test_unknown_version() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let mut request = request(&[]);
    request.version = Some(Version {
        product_version: "9.9.9".to_string(),
    });

    let dir = tempdir().unwrap();
    let err = pipeline_for(&server).run(&request, dir.path()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ReleaseNotFound);
    assert_eq!(err.stage(), "get release");
    assert!(dir_entries(dir.path()).is_empty());
}

#[tokio::test]
async fn test_failed_download_leaves_no_version_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/downloads/app-1.2.3.zip"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_catalog(&server).await;

    let dir = tempdir().unwrap();
    let err = pipeline_for(&server)
        .run(&request(&["*.zip", "*.ova"]), dir.path())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.stage(), "download files");
    assert!(dir_entries(dir.path()).is_empty());
}

#[tokio::test]
async fn test_product_file_named_like_marker_is_rejected() {
    let server = MockServer::start().await;
    mount_catalog_with(&server, &["app-1.2.3.zip", VERSION_FILE]).await;

    let dir = tempdir().unwrap();
    let err = pipeline_for(&server).run(&request(&[]), dir.path()).await.unwrap_err();

    assert!(matches!(err, PipelineError::ReservedFileName { ref name } if name == "version"));
    assert_eq!(err.kind(), ErrorKind::ProductFilesUnavailable);
    assert_eq!(err.stage(), "filter product files");
    assert!(dir_entries(dir.path()).is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/downloads/")));
}

#[tokio::test]
async fn test_marker_name_outside_globs_is_ignored() {
    let server = MockServer::start().await;
    mount_catalog_with(&server, &["app-1.2.3.zip", VERSION_FILE]).await;

    let dir = tempdir().unwrap();
    pipeline_for(&server).run(&request(&["*.zip"]), dir.path()).await.unwrap();

    assert_eq!(dir_entries(dir.path()), vec!["app-1.2.3.zip", "version"]);
    assert_eq!(std::fs::read_to_string(dir.path().join("version")).unwrap(), "1.2.3");
}

#[tokio::test]
async fn test_missing_token_is_configuration_error() {
    let server = MockServer::start().await;

    let mut request = request(&[]);
    request.source.api_token.clear();

    let dir = tempdir().unwrap();
    let err = pipeline_for(&server).run(&request, dir.path()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.stage(), "validate input");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_validate_requires_version() {
    let mut request = request(&[]);
    assert_eq!(validate(&request).unwrap(), "1.2.3");

    request.version = None;
    assert!(matches!(validate(&request), Err(PipelineError::Configuration { .. })));

    request.version = Some(Version {
        product_version: String::new(),
    });
    assert!(validate(&request).is_err());

    let mut request = self::request(&[]);
    request.source.product_slug.clear();
    assert!(validate(&request).is_err());
}

#[test]
fn test_parse_request() {
    let request = parse_request(
        r#"{"source": {"api_token": "t", "product_slug": "p", "endpoint": "https://catalog.internal/api/v2"},
            "params": {"globs": ["*.ova"]},
            "version": {"product_version": "1.2.3"}}"#,
    )
    .unwrap();
    assert_eq!(request.params.globs, vec!["*.ova"]);
    assert_eq!(request.source.endpoint.as_deref(), Some("https://catalog.internal/api/v2"));

    let err = parse_request("{not json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
