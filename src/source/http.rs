//! HTTP package source (flat container layout behind a service index)

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use semver::Version;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::source::types::PackageDependencyInfo;
use crate::source::{ArchiveStream, PackageSource, SourceRepository};
use crate::version::semver::parse_version;

const USER_AGENT: &str = concat!("restore-engine/", env!("CARGO_PKG_VERSION"));

/// Resource type in the service index that points at the flat container
const PACKAGE_BASE_ADDRESS_TYPE: &str = "PackageBaseAddress/3.0.0";

/// Response from the service index
#[derive(Debug, Deserialize)]
struct ServiceIndexResponse {
    #[serde(default)]
    resources: Vec<ServiceIndexResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceIndexResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: String,
}

/// Response from the package version listing
#[derive(Debug, Deserialize)]
struct VersionsResponse {
    versions: Vec<String>,
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// A remote package source identified by its service index URL
///
/// Creating the [`PackageSource`] downloads the service index to discover where
/// package content is served from.
pub struct HttpSourceRepository {
    index_url: String,
    timeout: Duration,
}

impl HttpSourceRepository {
    pub fn new(index_url: &str, timeout: Duration) -> Self {
        Self {
            index_url: index_url.to_string(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl SourceRepository for HttpSourceRepository {
    fn is_http(&self) -> bool {
        true
    }

    async fn create_source(&self) -> Result<Arc<dyn PackageSource>, SourceError> {
        info!("Reading service index {}", self.index_url);

        let client = build_client(self.timeout)?;
        let response = client.get(&self.index_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Service index returned status {}: {}", status, self.index_url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let index: ServiceIndexResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse service index: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        let base_address = index
            .resources
            .into_iter()
            .find(|r| r.resource_type == PACKAGE_BASE_ADDRESS_TYPE)
            .map(|r| r.id)
            .ok_or_else(|| {
                SourceError::InvalidResponse(format!(
                    "Service index has no {} resource",
                    PACKAGE_BASE_ADDRESS_TYPE
                ))
            })?;

        debug!("Package base address: {}", base_address);
        Ok(Arc::new(HttpPackageSource::with_client(client, &base_address)))
    }
}

/// Package source reading from a flat container base address
pub struct HttpPackageSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPackageSource {
    /// Creates a new HttpPackageSource for a flat container base address
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::with_client(build_client(timeout)?, base_url))
    }

    fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.to_ascii_lowercase())
    }

    fn version_url(&self, name: &str, version: &Version) -> String {
        format!(
            "{}/{}",
            self.package_url(name),
            version.to_string().to_ascii_lowercase()
        )
    }

    /// Sends a GET request, mapping 404 to `None`
    async fn get(&self, url: &str) -> Result<Option<reqwest::Response>, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Not found: {}", url);
            return Ok(None);
        }

        if !status.is_success() {
            warn!("Package source returned status {}: {}", status, url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(Some(response))
    }
}

#[async_trait::async_trait]
impl PackageSource for HttpPackageSource {
    async fn list_versions(&self, name: &str) -> Result<Option<Vec<Version>>, SourceError> {
        let url = format!("{}/index.json", self.package_url(name));

        let Some(response) = self.get(&url).await? else {
            return Ok(None);
        };

        let listing: VersionsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse version listing for {}: {}", name, e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        let versions = listing
            .versions
            .iter()
            .filter_map(|v| {
                let parsed = parse_version(v);
                if parsed.is_none() {
                    debug!("Skipping unparseable version {} of {}", v, name);
                }
                parsed
            })
            .collect();

        Ok(Some(versions))
    }

    async fn get_dependency_info(
        &self,
        name: &str,
        version: &Version,
    ) -> Result<Option<PackageDependencyInfo>, SourceError> {
        let url = format!(
            "{}/{}.deps.json",
            self.version_url(name, version),
            name.to_ascii_lowercase()
        );

        let Some(response) = self.get(&url).await? else {
            return Ok(None);
        };

        let info = response.json().await.map_err(|e| {
            warn!("Failed to parse dependency info for {} {}: {}", name, version, e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        Ok(Some(info))
    }

    async fn open_archive(
        &self,
        name: &str,
        version: &Version,
    ) -> Result<Option<ArchiveStream>, SourceError> {
        let lower_name = name.to_ascii_lowercase();
        let url = format!(
            "{}/{}.{}.nupkg",
            self.version_url(name, version),
            lower_name,
            version.to_string().to_ascii_lowercase()
        );

        let Some(response) = self.get(&url).await? else {
            return Ok(None);
        };

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(SourceError::from))
            .boxed();

        Ok(Some(stream))
    }
}
