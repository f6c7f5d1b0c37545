//! Dependency provider backed by the local package repository

use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SourceError;
use crate::framework::NuGetFramework;
use crate::library::{LibraryDependency, LibraryIdentity, LibraryRange, LibraryType};
use crate::provider::{DependencyProvider, select_dependencies, with_cancellation};
use crate::repository::{LocalPackageRepository, parse_dependency_info};
use crate::version::matcher::find_best_match;

/// Resolves libraries against packages already installed on disk
pub struct LocalDependencyProvider {
    repository: LocalPackageRepository,
}

impl LocalDependencyProvider {
    pub fn new(repository: LocalPackageRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &LocalPackageRepository {
        &self.repository
    }
}

#[async_trait::async_trait]
impl DependencyProvider for LocalDependencyProvider {
    fn is_http(&self) -> bool {
        false
    }

    async fn find_library(
        &self,
        range: &LibraryRange,
        _framework: &NuGetFramework,
        cancel: &CancellationToken,
    ) -> Result<Option<LibraryIdentity>, SourceError> {
        if !range.type_constraint.allows(LibraryType::Package) {
            return Ok(None);
        }

        with_cancellation(cancel, async {
            let repository = self.repository.clone();
            let name = range.name.clone();
            let versions = tokio::task::spawn_blocking(move || repository.find_versions(&name))
                .await
                .map_err(std::io::Error::other)??;

            let version_range = range.version_range.clone().unwrap_or_default();
            let identity = find_best_match(&versions, &version_range)
                .map(|version| LibraryIdentity::package(&range.name, version));

            match &identity {
                Some(identity) => debug!("Resolved {} to local {}", range, identity.version),
                None => debug!("No local version of {} satisfies {}", range.name, version_range),
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
            let Some(package) = self
                .repository
                .find_package(&identity.name, &identity.version)
            else {
                debug!("{} is not installed", identity);
                return Ok(Vec::new());
            };

            let bytes = match tokio::fs::read(&package.manifest_path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{} has no dependency manifest", identity);
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e.into()),
            };

            let info = parse_dependency_info(&bytes)?;
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
            let package = self
                .repository
                .find_package(&identity.name, &identity.version)
                .ok_or_else(|| SourceError::ArchiveNotFound(identity.to_string()))?;

            let mut file = tokio::fs::File::open(&package.archive_path).await?;
            let copied = tokio::io::copy(&mut file, destination).await?;
            debug!("Copied {} bytes of {}", copied, identity);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryDependencyTarget;
    use crate::version::range::VersionRange;
    use semver::Version;
    use std::path::Path;
    use tempfile::TempDir;

    fn install(root: &Path, name: &str, version: &str, manifest: Option<&str>) {
        let directory = root.join(name.to_ascii_lowercase()).join(version);
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(
            directory.join(format!("{}.{}.nupkg", name.to_ascii_lowercase(), version)),
            format!("archive of {} {}", name, version),
        )
        .unwrap();
        if let Some(manifest) = manifest {
            std::fs::write(
                directory.join(format!("{}.deps.json", name.to_ascii_lowercase())),
                manifest,
            )
            .unwrap();
        }
    }

    fn provider(root: &Path) -> LocalDependencyProvider {
        LocalDependencyProvider::new(LocalPackageRepository::new(root))
    }

    fn range(name: &str, range: &str) -> LibraryRange {
        LibraryRange::new(name, Some(range.parse::<VersionRange>().unwrap()))
    }

    fn net45() -> NuGetFramework {
        "net45".parse().unwrap()
    }

    #[tokio::test]
    async fn find_library_picks_highest_installed_version_in_range() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path(), "Foo", "1.0.0", None);
        install(temp_dir.path(), "Foo", "1.5.0", None);
        install(temp_dir.path(), "Foo", "2.0.0", None);

        let identity = provider(temp_dir.path())
            .find_library(&range("foo", "[1.0, 2.0)"), &net45(), &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(identity.version, Version::new(1, 5, 0));
        assert_eq!(identity.kind, LibraryType::Package);
    }

    #[tokio::test]
    async fn find_library_returns_none_for_unknown_package_or_reference() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path(), "System.Xml", "4.0.0", None);
        let provider = provider(temp_dir.path());
        let cancel = CancellationToken::new();

        let unknown = provider
            .find_library(&range("Missing", "1.0"), &net45(), &cancel)
            .await
            .unwrap();
        let reference = provider
            .find_library(
                &LibraryRange::new("System.Xml", None)
                    .with_type_constraint(LibraryDependencyTarget::Reference),
                &net45(),
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(unknown, None);
        assert_eq!(reference, None);
    }

    #[tokio::test]
    async fn get_dependencies_reads_manifest() {
        let temp_dir = TempDir::new().unwrap();
        install(
            temp_dir.path(),
            "Foo",
            "1.0.0",
            Some(
                r#"{
                    "dependencyGroups": [
                        {"targetFramework": "net40", "dependencies": [{"id": "Bar", "range": "1.0"}]},
                        {"targetFramework": "netstandard1.3", "dependencies": [{"id": "Baz"}]}
                    ],
                    "frameworkAssemblyGroups": [
                        {"targetFramework": "net45", "assemblies": ["System.Xml"]}
                    ]
                }"#,
            ),
        );

        let dependencies = provider(temp_dir.path())
            .get_dependencies(
                &LibraryIdentity::package("Foo", Version::new(1, 0, 0)),
                &net45(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let names: Vec<&str> = dependencies.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Bar", "System.Xml"]);
    }

    #[tokio::test]
    async fn get_dependencies_is_empty_without_manifest() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path(), "Foo", "1.0.0", None);

        let dependencies = provider(temp_dir.path())
            .get_dependencies(
                &LibraryIdentity::package("Foo", Version::new(1, 0, 0)),
                &net45(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(dependencies.is_empty());
    }

    #[tokio::test]
    async fn get_dependencies_rejects_malformed_manifest() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path(), "Foo", "1.0.0", Some("{ invalid"));

        let result = provider(temp_dir.path())
            .get_dependencies(
                &LibraryIdentity::package("Foo", Version::new(1, 0, 0)),
                &net45(),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[tokio::test]
    async fn copy_package_bytes_copies_archive() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path(), "Foo", "1.0.0", None);
        let mut destination = Vec::new();

        provider(temp_dir.path())
            .copy_package_bytes(
                &LibraryIdentity::package("Foo", Version::new(1, 0, 0)),
                &mut destination,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(destination, b"archive of Foo 1.0.0");
    }

    #[tokio::test]
    async fn copy_package_bytes_reports_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let mut destination = Vec::new();

        let result = provider(temp_dir.path())
            .copy_package_bytes(
                &LibraryIdentity::package("Foo", Version::new(1, 0, 0)),
                &mut destination,
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(SourceError::ArchiveNotFound(_))));
    }

    #[tokio::test]
    async fn cancelled_token_wins_over_local_io() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path(), "Foo", "1.0.0", None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = provider(temp_dir.path())
            .find_library(&range("Foo", "1.0"), &net45(), &cancel)
            .await;

        assert!(matches!(result, Err(SourceError::Cancelled)));
    }

    #[test]
    fn local_provider_is_not_http() {
        assert!(!provider(Path::new("/nonexistent")).is_http());
    }
}
