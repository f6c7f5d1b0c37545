//! Dependency information documents served by package sources

use serde::Deserialize;

/// Declared dependencies of one package version, grouped by target framework
///
/// The same document shape is served by remote sources and stored next to
/// locally installed packages.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageDependencyInfo {
    pub dependency_groups: Vec<DependencyGroup>,
    pub framework_assembly_groups: Vec<FrameworkAssemblyGroup>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencyGroup {
    /// Framework the group applies to; empty means `any`
    pub target_framework: String,
    pub dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageDependency {
    pub id: String,
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameworkAssemblyGroup {
    /// Framework the group applies to; empty means `any`
    pub target_framework: String,
    pub assemblies: Vec<String>,
}
