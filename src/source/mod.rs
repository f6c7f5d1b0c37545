//! Package source abstraction for fetching versions, dependency info, and archives
//!
//! A [`SourceRepository`] describes where a source lives; building the actual
//! [`PackageSource`] may involve network I/O (e.g. reading a service index), so
//! consumers create it lazily and only once.

pub mod http;
pub mod types;

use std::sync::Arc;

use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;
use semver::Version;

use crate::error::SourceError;
use crate::source::types::PackageDependencyInfo;

/// Raw archive bytes, delivered in chunks
pub type ArchiveStream = BoxStream<'static, Result<Vec<u8>, SourceError>>;

/// Trait for reading package data from a package source
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageSource: Send + Sync {
    /// Fetches all published versions of a package
    ///
    /// # Returns
    /// * `Ok(Some(versions))` - Published versions in no particular order
    /// * `Ok(None)` - The package is unknown to this source
    /// * `Err(SourceError)` - If the fetch fails
    async fn list_versions(&self, name: &str) -> Result<Option<Vec<Version>>, SourceError>;

    /// Fetches the declared dependency and framework-reference groups of a package version
    ///
    /// Returns `Ok(None)` when the source has no dependency data for the version.
    async fn get_dependency_info(
        &self,
        name: &str,
        version: &Version,
    ) -> Result<Option<PackageDependencyInfo>, SourceError>;

    /// Opens a stream over the raw archive bytes of a package version
    ///
    /// Returns `Ok(None)` when the source has no archive for the version.
    async fn open_archive(
        &self,
        name: &str,
        version: &Version,
    ) -> Result<Option<ArchiveStream>, SourceError>;
}

/// Location of a package source that can build a [`PackageSource`] on demand
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait SourceRepository: Send + Sync {
    /// Returns true if the source is reached over HTTP
    fn is_http(&self) -> bool;

    /// Builds the package source; may perform I/O
    async fn create_source(&self) -> Result<Arc<dyn PackageSource>, SourceError>;
}
