//! Compatibility check of a flattened restore graph

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, error};

use crate::compat::resolver::CompatibilityDataResolver;
use crate::compat::types::CompatibilityData;
use crate::error::CompatError;
use crate::framework::NuGetFramework;
use crate::graph::RestoreTargetGraph;
use crate::library::LibraryIdentity;

const NATIVE_IMAGE_SUFFIX: &str = ".ni";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityIssue {
    /// The package has managed assets, but none for the target
    Incompatible {
        package: LibraryIdentity,
        framework: NuGetFramework,
        runtime_identifier: Option<String>,
    },
    /// A compile-time reference assembly has no run-time implementation in the graph
    ReferenceAssemblyNotImplemented {
        assembly_name: String,
        package: LibraryIdentity,
        framework: NuGetFramework,
        runtime_identifier: Option<String>,
    },
}

impl fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityIssue::Incompatible {
                package,
                framework,
                runtime_identifier,
            } => match runtime_identifier {
                Some(rid) => write!(f, "{} is not compatible with {} ({}).", package, framework, rid),
                None => write!(f, "{} is not compatible with {}.", package, framework),
            },
            CompatibilityIssue::ReferenceAssemblyNotImplemented {
                assembly_name,
                package,
                framework,
                runtime_identifier,
            } => write!(
                f,
                "{} provides a compile-time reference assembly for {} on {}, but there is no run-time assembly compatible with {}.",
                package,
                assembly_name,
                framework,
                runtime_identifier.as_deref().unwrap_or("any runtime")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityCheckResult {
    pub graph: RestoreTargetGraph,
    pub issues: Vec<CompatibilityIssue>,
}

impl CompatibilityCheckResult {
    pub fn success(&self) -> bool {
        self.issues.is_empty()
    }
}

/// File name of an assembly path without its extension, or None for non-`.dll` files
fn dll_base_name(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (base, extension) = file_name.rsplit_once('.')?;
    extension.eq_ignore_ascii_case("dll").then_some(base)
}

fn strip_native_image_suffix(base: &str) -> &str {
    let split = base.len().saturating_sub(NATIVE_IMAGE_SUFFIX.len());
    match base.get(split..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(NATIVE_IMAGE_SUFFIX) => &base[..split],
        _ => base,
    }
}

fn is_package_compatible(data: &CompatibilityData) -> bool {
    !data.assets.is_empty()
        || !(data.files.any_starts_with("ref/") || data.files.any_starts_with("lib/"))
}

/// Reference assemblies waiting for a run-time implementation, per check
#[derive(Default)]
struct ReferenceTracker {
    /// Lower-cased base name to the assembly name and the package that introduced it
    compile: IndexMap<String, (String, LibraryIdentity)>,
    /// Lower-cased base names with a run-time implementation
    runtime: HashSet<String>,
}

impl ReferenceTracker {
    fn track(&mut self, identity: &LibraryIdentity, data: &CompatibilityData) {
        for path in &data.assets.compile_time_assemblies {
            let Some(base) = dll_base_name(path) else {
                continue;
            };
            let key = base.to_ascii_lowercase();
            if !self.runtime.contains(&key) && !self.compile.contains_key(&key) {
                self.compile.insert(key, (base.to_string(), identity.clone()));
            }
        }

        for path in &data.assets.runtime_assemblies {
            let Some(base) = dll_base_name(path) else {
                continue;
            };
            let key = strip_native_image_suffix(base).to_ascii_lowercase();
            self.compile.shift_remove(&key);
            self.runtime.insert(key);
        }
    }
}

/// Verifies that every package of a graph is usable on the graph's target
pub struct CompatibilityChecker<'a> {
    resolver: CompatibilityDataResolver<'a>,
}

impl<'a> CompatibilityChecker<'a> {
    pub fn new(resolver: CompatibilityDataResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Check every node of `graph`
    ///
    /// Issues are collected, not raised; every node is evaluated. Nodes without
    /// compatibility data are skipped.
    pub fn check(&self, graph: &RestoreTargetGraph) -> Result<CompatibilityCheckResult, CompatError> {
        let mut issues = Vec::new();
        let mut tracker = ReferenceTracker::default();

        for node in &graph.flattened {
            debug!(
                "Checking compatibility of {} {} for {}",
                node.identity.name, node.identity.version, graph.name
            );

            let Some(data) = self.resolver.resolve(graph, &node.identity)? else {
                debug!("No compatibility data for {}; skipping", node.identity);
                continue;
            };

            if !is_package_compatible(&data) {
                let issue = CompatibilityIssue::Incompatible {
                    package: node.identity.clone(),
                    framework: graph.framework.clone(),
                    runtime_identifier: graph.runtime_identifier.clone(),
                };
                error!("{}", issue);
                issues.push(issue);
            }

            if graph.is_runtime_specific() {
                tracker.track(&node.identity, &data);
            }
        }

        if graph.is_runtime_specific() {
            for (assembly_name, package) in tracker.compile.into_values() {
                let issue = CompatibilityIssue::ReferenceAssemblyNotImplemented {
                    assembly_name,
                    package,
                    framework: graph.framework.clone(),
                    runtime_identifier: graph.runtime_identifier.clone(),
                };
                error!("{}", issue);
                issues.push(issue);
            }
        }

        Ok(CompatibilityCheckResult {
            graph: graph.clone(),
            issues,
        })
    }
}
