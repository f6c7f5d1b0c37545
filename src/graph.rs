//! Restore target graphs

use crate::framework::NuGetFramework;
use crate::library::{LibraryDependency, LibraryIdentity};

/// A resolved node of a flattened graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphItem {
    pub identity: LibraryIdentity,
    pub dependencies: Vec<LibraryDependency>,
}

impl GraphItem {
    pub fn new(identity: LibraryIdentity) -> Self {
        Self {
            identity,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<LibraryDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// The fully resolved dependency graph for one (framework, runtime) target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTargetGraph {
    pub framework: NuGetFramework,
    pub runtime_identifier: Option<String>,
    /// Display name, e.g. `net45` or `net45 (win7-x64)`
    pub name: String,
    /// Resolved nodes without duplicates, in resolution order
    pub flattened: Vec<GraphItem>,
}

impl RestoreTargetGraph {
    pub fn new(
        framework: NuGetFramework,
        runtime_identifier: Option<String>,
        flattened: Vec<GraphItem>,
    ) -> Self {
        let runtime_identifier = runtime_identifier.filter(|rid| !rid.is_empty());
        let name = match &runtime_identifier {
            Some(rid) => format!("{} ({})", framework, rid),
            None => framework.to_string(),
        };
        Self {
            framework,
            runtime_identifier,
            name,
            flattened,
        }
    }

    /// Returns true if the graph targets a concrete runtime
    pub fn is_runtime_specific(&self) -> bool {
        self.runtime_identifier.is_some()
    }
}
