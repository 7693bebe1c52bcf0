//! JSON envelopes exchanged with the pipeline on stdin and stdout

use serde::{Deserialize, Serialize};

use crate::catalog::{ClientConfig, Release};

/// Where to fetch from and with which credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub product_slug: String,
    /// Overrides the catalog API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Source {
    /// Catalog connection settings for this source, honouring an endpoint override
    pub fn client_config<S: Into<String>>(&self, user_agent: S) -> ClientConfig {
        let config = ClientConfig::new(self.api_token.clone()).with_user_agent(user_agent);
        match self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            Some(endpoint) => config.with_base_url(endpoint),
            None => config,
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("api_token", &"<hidden>")
            .field("product_slug", &self.product_slug)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// File name patterns; empty selects every file
    #[serde(default)]
    pub globs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub product_version: String,
}

/// Input read from stdin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InRequest {
    pub source: Source,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub version: Option<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub value: String,
}

impl Metadata {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Output written to stdout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InResponse {
    pub version: Version,
    pub metadata: Vec<Metadata>,
}

impl InResponse {
    pub(crate) fn for_release(release: &Release) -> Self {
        Self {
            version: Version {
                product_version: release.version.clone(),
            },
            metadata: vec![
                Metadata::new("release_type", &release.release_type),
                Metadata::new("release_date", &release.release_date),
                Metadata::new("description", &release.description),
                Metadata::new("eula_slug", &release.eula.slug),
            ],
        }
    }
}
