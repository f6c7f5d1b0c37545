//! Dependency provider backed by a remote package source

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SourceError;
use crate::framework::NuGetFramework;
use crate::library::{LibraryDependency, LibraryIdentity, LibraryRange, LibraryType};
use crate::provider::{DependencyProvider, select_dependencies, with_cancellation, write_archive};
use crate::source::{PackageSource, SourceRepository};
use crate::version::matcher::find_best_match;

/// Resolves libraries against one remote package source
///
/// The package source is created on first use. Concurrent first callers share a
/// single initialization; a failed initialization is not cached, so the next call
/// tries again.
pub struct RemoteDependencyProvider {
    repository: Arc<dyn SourceRepository>,
    source: OnceCell<Arc<dyn PackageSource>>,
}

impl RemoteDependencyProvider {
    pub fn new(repository: Arc<dyn SourceRepository>) -> Self {
        Self {
            repository,
            source: OnceCell::new(),
        }
    }

    async fn source(&self) -> Result<&Arc<dyn PackageSource>, SourceError> {
        self.source
            .get_or_try_init(|| async {
                debug!("Initializing package source");
                self.repository.create_source().await
            })
            .await
    }
}

#[async_trait::async_trait]
impl DependencyProvider for RemoteDependencyProvider {
    fn is_http(&self) -> bool {
        self.repository.is_http()
    }

    async fn find_library(
        &self,
        range: &LibraryRange,
        _framework: &NuGetFramework,
        cancel: &CancellationToken,
    ) -> Result<Option<LibraryIdentity>, SourceError> {
        // A package source only serves packages
        if !range.type_constraint.allows(LibraryType::Package) {
            return Ok(None);
        }

        with_cancellation(cancel, async {
            let source = self.source().await?;

            let Some(versions) = source.list_versions(&range.name).await? else {
                debug!("Package {} not found", range.name);
                return Ok(None);
            };

            let version_range = range.version_range.clone().unwrap_or_default();
            let identity = find_best_match(&versions, &version_range)
                .map(|version| LibraryIdentity::package(&range.name, version));

            match &identity {
                Some(identity) => debug!("Resolved {} to {}", range, identity.version),
                None => debug!("No version of {} satisfies {}", range.name, version_range),
            }

            Ok(identity)
        })
        .await
    }

    async fn get_dependencies(
        &self,
        identity: &LibraryIdentity,
        framework: &NuGetFramework,
        cancel: &CancellationToken,
    ) -> Result<Vec<LibraryDependency>, SourceError> {
        with_cancellation(cancel, async {
            let source = self.source().await?;

            let Some(info) = source
                .get_dependency_info(&identity.name, &identity.version)
                .await?
            else {
                debug!("No dependency info for {}", identity);
                return Ok(Vec::new());
            };

            Ok(select_dependencies(identity, &info, framework))
        })
        .await
    }

    async fn copy_package_bytes(
        &self,
        identity: &LibraryIdentity,
        destination: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<(), SourceError> {
        with_cancellation(cancel, async {
            let source = self.source().await?;

            let stream = source
                .open_archive(&identity.name, &identity.version)
                .await?
                .ok_or_else(|| SourceError::ArchiveNotFound(identity.to_string()))?;

            write_archive(stream, destination).await
        })
        .await
    }
}
