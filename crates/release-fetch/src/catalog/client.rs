//! HTTP client for the release catalog API
//!
//! This module handles the catalog endpoints used to resolve a release:
//! - Release lookup by product slug and exact version
//! - Product file listing through the release's `product_files` link
//!
//! Every request carries the API token and the tool's user agent. Responses
//! are classified by status; retry policy is left to callers.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::CatalogError;
use super::models::{ProductFile, ProductFilesResponse, Release, ReleasesResponse};
use super::Catalog;

/// Catalog API used when the input does not override the endpoint
pub const DEFAULT_API_URL: &str = "https://network.pivotal.io/api/v2";

/// User agent sent with every catalog and download request
pub const DEFAULT_USER_AGENT: &str = concat!("release-fetch/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`CatalogClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Catalog API client
#[derive(Clone)]
pub struct CatalogClient {
    api_url: Url,
    base_url: String,
    token: String,
    client: Client,
}

impl CatalogClient {
    pub fn new(config: ClientConfig) -> Result<Self, CatalogError> {
        let invalid = |source| CatalogError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        };
        let api_url = Url::parse(&config.base_url).map_err(invalid)?;
        if api_url.cannot_be_a_base() {
            return Err(invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|source| CatalogError::Http {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            api_url,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Slugs are caller input, so each one is encoded as a single path segment
    fn releases_url(&self, product_slug: &str) -> String {
        let mut url = self.api_url.clone();
        // new() rejects URLs without a path to extend
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["products", product_slug, "releases"]);
        }
        url.into()
    }

    /// Create an authenticated request with proper headers
    fn create_authenticated_request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
    }

    /// Execute a GET and decode the JSON body, classifying failures by status
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        debug!("Catalog request: GET {}", url);
        let response = self
            .create_authenticated_request(url)
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| CatalogError::Http {
            url: url.to_string(),
            source,
        })?;
        debug!("Catalog response: {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(CatalogError::from_status(url.to_string(), status, body));
        }

        serde_json::from_str(&body).map_err(|source| CatalogError::Decode {
            url: url.to_string(),
            body,
            source,
        })
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn get_release(&self, product_slug: &str, version: &str) -> Result<Release, CatalogError> {
        let url = self.releases_url(product_slug);
        let response: ReleasesResponse = self.get_json(&url).await?;

        debug!(
            "Catalog lists {} releases for '{}'",
            response.releases.len(),
            product_slug
        );

        response
            .releases
            .into_iter()
            .find(|release| release.version == version)
            .ok_or_else(|| CatalogError::ReleaseMissing {
                product_slug: product_slug.to_string(),
                version: version.to_string(),
            })
    }

    async fn list_product_files(&self, release: &Release) -> Result<Vec<ProductFile>, CatalogError> {
        let link = release
            .links
            .product_files
            .as_ref()
            .ok_or_else(|| CatalogError::MissingLink {
                version: release.version.clone(),
                rel: "product_files",
            })?;

        let response: ProductFilesResponse = self.get_json(&link.href).await?;
        debug!("Release {} has {} product files", release.version, response.product_files.len());
        Ok(response.product_files)
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "test-api-token";
    const USER_AGENT: &str = "release-fetch-test/1.0";

    fn client_for(server: &MockServer) -> CatalogClient {
        let config = ClientConfig::new(TOKEN)
            .with_base_url(server.uri())
            .with_user_agent(USER_AGENT);
        CatalogClient::new(config).unwrap()
    }

    fn releases_body(server: &MockServer) -> serde_json::Value {
        serde_json::json!({
            "releases": [
                {
                    "id": 10,
                    "version": "1.2.3",
                    "release_type": "Major Release",
                    "release_date": "2016-01-01",
                    "description": "First GA",
                    "eula": {"slug": "standard_eula"},
                    "_links": {"product_files": {"href": format!("{}/files/10", server.uri())}}
                },
                {
                    "id": 11,
                    "version": "1.2.3-rc1",
                    "release_type": "Developer Release",
                    "release_date": "2015-12-01",
                    "description": "Candidate",
                    "eula": {"slug": "beta_eula"}
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_get_release_exact_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/my-product/releases"))
            .and(header("Authorization", "Token test-api-token"))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases_body(&server)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let release = client.get_release("my-product", "1.2.3").await.unwrap();

        assert_eq!(release.id, 10);
        assert_eq!(release.release_type, "Major Release");
        assert_eq!(release.eula.slug, "standard_eula");
    }

    #[tokio::test]
    async fn test_get_release_no_partial_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/my-product/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases_body(&server)))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_release("my-product", "1.2").await.unwrap_err();

        match err {
            CatalogError::ReleaseMissing { product_slug, version } => {
                assert_eq!(product_slug, "my-product");
                assert_eq!(version, "1.2");
            }
            other => panic!("Expected ReleaseMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_release_status_classification() {
        let cases = [
            (404, "not-found"),
            (401, "unauthorized"),
            (403, "unauthorized"),
            (500, "transport"),
        ];

        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/products/my-product/releases"))
                .respond_with(ResponseTemplate::new(status).set_body_string("catalog says no"))
                .mount(&server)
                .await;

            let err = client_for(&server).get_release("my-product", "1.2.3").await.unwrap_err();
            let kind = match &err {
                CatalogError::NotFound { .. } => "not-found",
                CatalogError::Unauthorized { .. } => "unauthorized",
                CatalogError::Transport { .. } => "transport",
                other => panic!("Unexpected error {:?}", other),
            };
            assert_eq!(kind, expected, "status {}", status);
            assert_eq!(err.status(), Some(StatusCode::from_u16(status).unwrap()));
            assert!(err.to_string().contains("catalog says no"));
        }
    }

    #[tokio::test]
    async fn test_get_release_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/my-product/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_release("my-product", "1.2.3").await.unwrap_err();
        match err {
            CatalogError::Decode { body, .. } => assert!(body.contains("maintenance")),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_product_files_follows_link() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/my-product/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases_body(&server)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/10"))
            .and(header("Authorization", "Token test-api-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "product_files": [
                    {"id": 2, "name": "B", "aws_object_key": "pf/b.zip"},
                    {"id": 1, "name": "A", "aws_object_key": "pf/a.zip"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let release = client.get_release("my-product", "1.2.3").await.unwrap();
        let files = client.list_product_files(&release).await.unwrap();

        let ids: Vec<u64> = files.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 1], "catalog order must be preserved");
    }

    #[tokio::test]
    async fn test_list_product_files_without_link() {
        let server = MockServer::start().await;

        let release: Release =
            serde_json::from_value(serde_json::json!({"id": 11, "version": "1.2.3-rc1"})).unwrap();

        let err = client_for(&server).list_product_files(&release).await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingLink { rel: "product_files", .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig::new(TOKEN).with_base_url("not a url");
        assert!(matches!(
            CatalogClient::new(config),
            Err(CatalogError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_base_url_without_path_rejected() {
        let config = ClientConfig::new(TOKEN).with_base_url("mailto:catalog@example.com");
        assert!(matches!(
            CatalogClient::new(config),
            Err(CatalogError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_releases_url_keeps_base_path() {
        let config = ClientConfig::new(TOKEN).with_base_url("https://catalog.internal/api/v2/");
        let client = CatalogClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://catalog.internal/api/v2");
        assert_eq!(
            client.releases_url("my-product"),
            "https://catalog.internal/api/v2/products/my-product/releases"
        );
    }

    #[tokio::test]
    async fn test_slug_is_encoded_as_one_segment() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/a%2Fb%3Fc%23d/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases_body(&server)))
            .expect(1)
            .mount(&server)
            .await;

        let release = client_for(&server).get_release("a/b?c#d", "1.2.3").await.unwrap();
        assert_eq!(release.id, 10);
    }
}
