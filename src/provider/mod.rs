//! Dependency providers used by the graph walk to discover nodes
//!
//! Two variants implement the same contract:
//! - [`remote::RemoteDependencyProvider`]: a remote package source
//! - [`local::LocalDependencyProvider`]: the local package repository

pub mod local;
pub mod remote;

use std::future::Future;

use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::SourceError;
use crate::framework::{NuGetFramework, get_nearest};
use crate::library::{LibraryDependency, LibraryDependencyTarget, LibraryIdentity, LibraryRange};
use crate::source::ArchiveStream;
use crate::source::types::PackageDependencyInfo;
use crate::version::range::VersionRange;

/// Resolves library references and dependency sets against one package location
#[async_trait::async_trait]
pub trait DependencyProvider: Send + Sync {
    /// Returns true if the provider talks to an HTTP source
    fn is_http(&self) -> bool;

    /// Resolve a library reference to the best matching identity
    ///
    /// # Returns
    /// * `Ok(Some(identity))` - The best version satisfying the range
    /// * `Ok(None)` - The library is unknown or no version satisfies the range
    /// * `Err(SourceError)` - Transport failure or cancellation
    async fn find_library(
        &self,
        range: &LibraryRange,
        framework: &NuGetFramework,
        cancel: &CancellationToken,
    ) -> Result<Option<LibraryIdentity>, SourceError>;

    /// Get the dependencies a library declares for the target framework
    ///
    /// Returns an empty list when the library has no dependency data.
    async fn get_dependencies(
        &self,
        identity: &LibraryIdentity,
        framework: &NuGetFramework,
        cancel: &CancellationToken,
    ) -> Result<Vec<LibraryDependency>, SourceError>;

    /// Stream the raw archive bytes of a resolved library into `destination`
    async fn copy_package_bytes(
        &self,
        identity: &LibraryIdentity,
        destination: &mut (dyn AsyncWrite + Unpin + Send),
        cancel: &CancellationToken,
    ) -> Result<(), SourceError>;
}

/// Run an operation until it completes or the token is cancelled
pub async fn with_cancellation<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SourceError::Cancelled),
        result = operation => result,
    }
}

/// Write every chunk of an archive stream into `destination`
pub(crate) async fn write_archive(
    mut stream: ArchiveStream,
    destination: &mut (dyn AsyncWrite + Unpin + Send),
) -> Result<(), SourceError> {
    while let Some(chunk) = stream.next().await {
        destination.write_all(&chunk?).await?;
    }
    destination.flush().await?;
    Ok(())
}

pub(crate) fn parse_group_framework(name: &str) -> Option<NuGetFramework> {
    if name.trim().is_empty() {
        return Some(NuGetFramework::any());
    }
    name.parse()
        .inspect_err(|e| warn!("Skipping group with unsupported framework: {}", e))
        .ok()
}

/// Select the dependencies a package declares for `framework`
///
/// Package dependencies come from the nearest compatible dependency group. Framework
/// reference groups are only consulted for desktop frameworks: whether a reference
/// assembly of one framework family is available on another cannot be decided here,
/// so they are skipped for every other family.
pub fn select_dependencies(
    identity: &LibraryIdentity,
    info: &PackageDependencyInfo,
    framework: &NuGetFramework,
) -> Vec<LibraryDependency> {
    let dependency_groups: Vec<_> = info
        .dependency_groups
        .iter()
        .filter_map(|group| parse_group_framework(&group.target_framework).map(|f| (f, group)))
        .collect();

    let mut dependencies: Vec<LibraryDependency> =
        get_nearest(framework, &dependency_groups, |(f, _)| f)
            .map(|(_, group)| {
                group
                    .dependencies
                    .iter()
                    .map(|dependency| {
                        let version_range = dependency.range.as_deref().and_then(|range| {
                            range
                                .parse::<VersionRange>()
                                .inspect_err(|e| {
                                    warn!(
                                        "{} declares dependency {} with {}; accepting any version",
                                        identity, dependency.id, e
                                    )
                                })
                                .ok()
                        });
                        LibraryDependency::new(LibraryRange::new(&dependency.id, version_range))
                    })
                    .collect()
            })
            .unwrap_or_default();

    if framework.is_desktop() {
        let reference_groups: Vec<_> = info
            .framework_assembly_groups
            .iter()
            .filter_map(|group| parse_group_framework(&group.target_framework).map(|f| (f, group)))
            .collect();

        if let Some((_, group)) = get_nearest(framework, &reference_groups, |(f, _)| f) {
            dependencies.extend(group.assemblies.iter().map(|assembly| {
                LibraryDependency::new(
                    LibraryRange::new(assembly, None)
                        .with_type_constraint(LibraryDependencyTarget::Reference),
                )
            }));
        }
    }

    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::types::{DependencyGroup, FrameworkAssemblyGroup, PackageDependency};
    use semver::Version;

    fn identity() -> LibraryIdentity {
        LibraryIdentity::package("Foo", Version::new(1, 0, 0))
    }

    fn info() -> PackageDependencyInfo {
        PackageDependencyInfo {
            dependency_groups: vec![
                DependencyGroup {
                    target_framework: "net40".to_string(),
                    dependencies: vec![PackageDependency {
                        id: "Legacy".to_string(),
                        range: Some("1.0".to_string()),
                    }],
                },
                DependencyGroup {
                    target_framework: "net45".to_string(),
                    dependencies: vec![PackageDependency {
                        id: "Bar".to_string(),
                        range: Some("[2.0, 3.0)".to_string()),
                    }],
                },
                DependencyGroup {
                    target_framework: "netstandard1.0".to_string(),
                    dependencies: vec![PackageDependency {
                        id: "System.Runtime".to_string(),
                        range: None,
                    }],
                },
            ],
            framework_assembly_groups: vec![FrameworkAssemblyGroup {
                target_framework: "net45".to_string(),
                assemblies: vec!["System.Xml".to_string()],
            }],
        }
    }

    fn names(dependencies: &[LibraryDependency]) -> Vec<&str> {
        dependencies.iter().map(|d| d.name()).collect()
    }

    #[test]
    fn select_dependencies_uses_nearest_group_and_references_on_desktop() {
        let framework: NuGetFramework = "net46".parse().unwrap();

        let dependencies = select_dependencies(&identity(), &info(), &framework);

        assert_eq!(names(&dependencies), vec!["Bar", "System.Xml"]);
        assert_eq!(
            dependencies[0].library_range.version_range,
            Some("[2.0, 3.0)".parse().unwrap())
        );
        assert_eq!(
            dependencies[0].library_range.type_constraint,
            LibraryDependencyTarget::All
        );
        assert_eq!(
            dependencies[1].library_range.type_constraint,
            LibraryDependencyTarget::Reference
        );
    }

    #[test]
    fn select_dependencies_skips_framework_references_for_non_desktop_targets() {
        let mut info = info();
        info.framework_assembly_groups.push(FrameworkAssemblyGroup {
            target_framework: "netstandard1.0".to_string(),
            assemblies: vec!["System.Net".to_string()],
        });
        let framework: NuGetFramework = "netcoreapp1.0".parse().unwrap();

        let dependencies = select_dependencies(&identity(), &info, &framework);

        assert_eq!(names(&dependencies), vec!["System.Runtime"]);
        assert!(
            dependencies
                .iter()
                .all(|d| d.library_range.type_constraint != LibraryDependencyTarget::Reference)
        );
    }

    #[test]
    fn select_dependencies_returns_empty_without_compatible_group() {
        let framework: NuGetFramework = "net35".parse().unwrap();

        let dependencies = select_dependencies(&identity(), &info(), &framework);

        assert!(dependencies.is_empty());
    }

    #[test]
    fn select_dependencies_treats_empty_framework_as_any() {
        let info = PackageDependencyInfo {
            dependency_groups: vec![DependencyGroup {
                target_framework: String::new(),
                dependencies: vec![PackageDependency {
                    id: "Common".to_string(),
                    range: Some("not a range".to_string()),
                }],
            }],
            framework_assembly_groups: vec![],
        };
        let framework: NuGetFramework = "uap10.0".parse().unwrap();

        let dependencies = select_dependencies(&identity(), &info, &framework);

        assert_eq!(names(&dependencies), vec!["Common"]);
        assert_eq!(dependencies[0].library_range.version_range, None);
    }

    #[tokio::test]
    async fn with_cancellation_returns_cancelled_for_cancelled_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), SourceError> =
            with_cancellation(&cancel, futures::future::pending()).await;

        assert!(matches!(result, Err(SourceError::Cancelled)));
    }

    #[tokio::test]
    async fn with_cancellation_returns_operation_result() {
        let cancel = CancellationToken::new();

        let result = with_cancellation(&cancel, async { Ok::<_, SourceError>(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }
}
