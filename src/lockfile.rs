//! Lock file written by a previous restore
//!
//! Only the parts needed to skip recomputation are modelled: the file list of each
//! library and the per-target asset classification of each library.

use std::path::Path;

use indexmap::IndexMap;
use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::compat::types::{PackageFileListing, TargetLibraryAssets};
use crate::error::LockFileError;
use crate::framework::NuGetFramework;
use crate::graph::{GraphItem, RestoreTargetGraph};
use crate::library::{LibraryDependency, LibraryIdentity, LibraryRange, LibraryType};
use crate::version::range::VersionRange;
use crate::version::semver::parse_version;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LockFile {
    pub version: u32,
    /// Keyed by `{framework}` or `{framework}/{runtime}`, then by `{name}/{version}`
    pub targets: IndexMap<String, IndexMap<String, LockFileTargetLibrary>>,
    /// Keyed by `{name}/{version}`
    pub libraries: IndexMap<String, LockFileLibrary>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LockFileTargetLibrary {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Dependency name to version range
    pub dependencies: IndexMap<String, String>,
    pub framework_assemblies: Vec<String>,
    /// Asset path to per-asset properties
    pub compile: IndexMap<String, serde_json::Value>,
    pub runtime: IndexMap<String, serde_json::Value>,
}

impl LockFileTargetLibrary {
    pub fn assets(&self) -> TargetLibraryAssets {
        TargetLibraryAssets {
            framework_assemblies: self.framework_assemblies.iter().cloned().collect(),
            compile_time_assemblies: self.compile.keys().cloned().collect(),
            runtime_assemblies: self.runtime.keys().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LockFileLibrary {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub files: Vec<String>,
}

/// Split a `{name}/{version}` key
fn parse_library_key(key: &str) -> Option<(&str, Version)> {
    let (name, version) = key.rsplit_once('/')?;
    Some((name, parse_version(version)?))
}

fn key_matches(key: &str, identity: &LibraryIdentity) -> bool {
    parse_library_key(key).is_some_and(|(name, version)| {
        identity.name_matches(name) && identity.version_matches(&version)
    })
}

/// Split a `{framework}/{runtime}` target key
fn parse_target_key(key: &str) -> Option<(NuGetFramework, Option<&str>)> {
    let (framework, runtime) = match key.split_once('/') {
        Some((framework, runtime)) => (framework, Some(runtime)),
        None => (key, None),
    };
    let framework = framework
        .parse()
        .inspect_err(|e| debug!("Ignoring lock file target {}: {}", key, e))
        .ok()?;
    Some((framework, runtime.filter(|rid| !rid.is_empty())))
}

impl LockFile {
    pub fn parse(content: &str) -> Result<Self, LockFileError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, LockFileError> {
        debug!("Loading lock file {}", path.display());
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Find the target section for a framework and optional runtime
    pub fn get_target(
        &self,
        framework: &NuGetFramework,
        runtime_identifier: Option<&str>,
    ) -> Option<&IndexMap<String, LockFileTargetLibrary>> {
        self.targets
            .iter()
            .find(|(key, _)| {
                parse_target_key(key).is_some_and(|(f, rid)| {
                    &f == framework
                        && match (rid, runtime_identifier) {
                            (None, None) => true,
                            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                            _ => false,
                        }
                })
            })
            .map(|(_, libraries)| libraries)
    }

    pub fn get_target_library(
        &self,
        framework: &NuGetFramework,
        runtime_identifier: Option<&str>,
        identity: &LibraryIdentity,
    ) -> Option<&LockFileTargetLibrary> {
        self.get_target(framework, runtime_identifier)?
            .iter()
            .find(|(key, _)| key_matches(key, identity))
            .map(|(_, library)| library)
    }

    pub fn get_library(&self, identity: &LibraryIdentity) -> Option<&LockFileLibrary> {
        self.libraries
            .iter()
            .find(|(key, _)| key_matches(key, identity))
            .map(|(_, library)| library)
    }

    /// Cached asset classification of a library for a target
    pub fn target_assets(
        &self,
        framework: &NuGetFramework,
        runtime_identifier: Option<&str>,
        identity: &LibraryIdentity,
    ) -> Option<TargetLibraryAssets> {
        self.get_target_library(framework, runtime_identifier, identity)
            .map(LockFileTargetLibrary::assets)
    }

    /// Cached file listing of a library
    pub fn file_listing(&self, identity: &LibraryIdentity) -> Option<PackageFileListing> {
        self.get_library(identity)
            .map(|library| library.files.iter().map(String::as_str).collect())
    }

    /// Rebuild the flattened graph recorded for a target
    ///
    /// Only package libraries become graph nodes. Returns None if the lock file has no
    /// such target.
    pub fn target_graph(
        &self,
        framework: &NuGetFramework,
        runtime_identifier: Option<&str>,
    ) -> Option<RestoreTargetGraph> {
        let libraries = self.get_target(framework, runtime_identifier)?;

        let flattened = libraries
            .iter()
            .filter(|(_, library)| {
                library
                    .kind
                    .as_deref()
                    .and_then(|kind| kind.parse::<LibraryType>().ok())
                    .unwrap_or(LibraryType::Package)
                    == LibraryType::Package
            })
            .filter_map(|(key, library)| {
                let Some((name, version)) = parse_library_key(key) else {
                    warn!("Ignoring malformed lock file library key {}", key);
                    return None;
                };
                let dependencies = library
                    .dependencies
                    .iter()
                    .map(|(name, range)| {
                        LibraryDependency::new(LibraryRange::new(
                            name,
                            range.parse::<VersionRange>().ok(),
                        ))
                    })
                    .collect();
                Some(
                    GraphItem::new(LibraryIdentity::package(name, version))
                        .with_dependencies(dependencies),
                )
            })
            .collect();

        Some(RestoreTargetGraph::new(
            framework.clone(),
            runtime_identifier.map(String::from),
            flattened,
        ))
    }
}
