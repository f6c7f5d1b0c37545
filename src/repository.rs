//! Local package repository
//!
//! Packages are stored as `{root}/{id-lower}/{version}/{id-lower}.{version}.nupkg`,
//! optionally alongside a `{id-lower}.deps.json` dependency manifest.

use std::io;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::debug;

use crate::library::LibraryIdentity;
use crate::source::types::PackageDependencyInfo;
use crate::version::semver::parse_version;

/// A package present in the local repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackageInfo {
    pub identity: LibraryIdentity,
    pub directory: PathBuf,
    pub archive_path: PathBuf,
    pub manifest_path: PathBuf,
}

impl LocalPackageInfo {
    /// Read the dependency manifest stored next to the archive
    ///
    /// Returns `Ok(None)` when the package was installed without one.
    pub fn read_dependency_info(&self) -> io::Result<Option<PackageDependencyInfo>> {
        match std::fs::read(&self.manifest_path) {
            Ok(bytes) => parse_dependency_info(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn parse_dependency_info(bytes: &[u8]) -> io::Result<PackageDependencyInfo> {
    serde_json::from_slice(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[derive(Debug, Clone)]
pub struct LocalPackageRepository {
    root: PathBuf,
}

impl LocalPackageRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn id_directory(&self, name: &str) -> PathBuf {
        self.root.join(name.to_ascii_lowercase())
    }

    /// Directory a package version is (or would be) installed into
    pub fn package_directory(&self, name: &str, version: &Version) -> PathBuf {
        self.id_directory(name)
            .join(version.to_string().to_ascii_lowercase())
    }

    /// Enumerate locally installed versions of a package, lowest first
    pub fn find_versions(&self, name: &str) -> io::Result<Vec<Version>> {
        let directory = self.id_directory(name);
        let entries = match std::fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            match file_name.to_str().and_then(parse_version) {
                Some(version) => versions.push(version),
                None => debug!("Skipping non-version directory {:?}", entry.path()),
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Locate an installed package by name and version
    ///
    /// Returns None when the package archive is not present.
    pub fn find_package(&self, name: &str, version: &Version) -> Option<LocalPackageInfo> {
        let directory = self.package_directory(name, version);
        let lower_name = name.to_ascii_lowercase();
        let archive_path = directory.join(format!(
            "{}.{}.nupkg",
            lower_name,
            version.to_string().to_ascii_lowercase()
        ));

        if !archive_path.is_file() {
            debug!("Package {} {} not found at {:?}", name, version, archive_path);
            return None;
        }

        Some(LocalPackageInfo {
            identity: LibraryIdentity::package(name, version.clone()),
            manifest_path: directory.join(format!("{}.deps.json", lower_name)),
            archive_path,
            directory,
        })
    }
}
