//! Library identities, ranges, and dependency edges

use std::fmt;
use std::hash::{Hash, Hasher};

use semver::Version;

use crate::version::range::VersionRange;

/// Kind of library a graph node resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryType {
    /// A package from a package source
    Package,
    /// A framework reference assembly supplied by the target framework
    Reference,
    /// A project in the same build
    Project,
}

impl LibraryType {
    /// Returns the lock file representation of the library type
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryType::Package => "package",
            LibraryType::Reference => "reference",
            LibraryType::Project => "project",
        }
    }
}

impl std::str::FromStr for LibraryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "package" => Ok(LibraryType::Package),
            "reference" => Ok(LibraryType::Reference),
            "project" => Ok(LibraryType::Project),
            _ => Err(()),
        }
    }
}

/// Which library kinds may satisfy a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LibraryDependencyTarget {
    #[default]
    All,
    Package,
    Reference,
    Project,
}

impl LibraryDependencyTarget {
    pub fn allows(&self, kind: LibraryType) -> bool {
        match self {
            LibraryDependencyTarget::All => true,
            LibraryDependencyTarget::Package => kind == LibraryType::Package,
            LibraryDependencyTarget::Reference => kind == LibraryType::Reference,
            LibraryDependencyTarget::Project => kind == LibraryType::Project,
        }
    }
}

/// A resolved library
///
/// Two identities are equal when their names match ignoring case and their
/// versions match exactly. Build metadata and kind are not part of identity.
#[derive(Debug, Clone)]
pub struct LibraryIdentity {
    pub name: String,
    pub version: Version,
    pub kind: LibraryType,
}

impl LibraryIdentity {
    pub fn new(name: impl Into<String>, version: Version, kind: LibraryType) -> Self {
        Self {
            name: name.into(),
            version,
            kind,
        }
    }

    pub fn package(name: impl Into<String>, version: Version) -> Self {
        Self::new(name, version, LibraryType::Package)
    }

    /// Returns true if `name` refers to this library, ignoring case
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Returns true if `version` is this library's version, ignoring build metadata
    pub fn version_matches(&self, version: &Version) -> bool {
        let (a, b) = (&self.version, version);
        a.major == b.major && a.minor == b.minor && a.patch == b.patch && a.pre == b.pre
    }
}

impl PartialEq for LibraryIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name_matches(&other.name) && self.version_matches(&other.version)
    }
}

impl Eq for LibraryIdentity {}

impl Hash for LibraryIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        let v = &self.version;
        (v.major, v.minor, v.patch, &v.pre).hash(state);
    }
}

impl fmt::Display for LibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A reference to a library by name and acceptable versions, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryRange {
    pub name: String,
    /// None accepts any release version
    pub version_range: Option<VersionRange>,
    pub type_constraint: LibraryDependencyTarget,
}

impl LibraryRange {
    pub fn new(name: impl Into<String>, version_range: Option<VersionRange>) -> Self {
        Self {
            name: name.into(),
            version_range,
            type_constraint: LibraryDependencyTarget::All,
        }
    }

    pub fn with_type_constraint(mut self, type_constraint: LibraryDependencyTarget) -> Self {
        self.type_constraint = type_constraint;
        self
    }
}

impl fmt::Display for LibraryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_range {
            Some(range) => write!(f, "{} {}", self.name, range),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A dependency edge in the graph before resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryDependency {
    pub library_range: LibraryRange,
}

impl LibraryDependency {
    pub fn new(library_range: LibraryRange) -> Self {
        Self { library_range }
    }

    pub fn name(&self) -> &str {
        &self.library_range.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn identity_equality_ignores_name_case() {
        let a = LibraryIdentity::package("Newtonsoft.Json", Version::new(9, 0, 1));
        let b = LibraryIdentity::package("newtonsoft.json", Version::new(9, 0, 1));

        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn identity_equality_requires_exact_version() {
        let a = LibraryIdentity::package("Foo", Version::new(1, 0, 0));
        let b = LibraryIdentity::package("Foo", Version::new(1, 0, 1));

        assert_ne!(a, b);
    }

    #[test]
    fn identity_equality_ignores_kind() {
        let package = LibraryIdentity::new("Foo", Version::new(1, 0, 0), LibraryType::Package);
        let reference = LibraryIdentity::new("foo", Version::new(1, 0, 0), LibraryType::Reference);

        assert_eq!(package, reference);

        let set: HashSet<_> = [package, reference].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn identity_equality_ignores_build_metadata() {
        let plain = LibraryIdentity::package("Foo", Version::parse("1.0.0").unwrap());
        let built = LibraryIdentity::package("Foo", Version::parse("1.0.0+sha.abc").unwrap());
        let prerelease = LibraryIdentity::package("Foo", Version::parse("1.0.0-beta").unwrap());

        assert_eq!(plain, built);
        assert_ne!(plain, prerelease);

        let set: HashSet<_> = [plain, built].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    #[case(LibraryDependencyTarget::All, LibraryType::Reference, true)]
    #[case(LibraryDependencyTarget::Package, LibraryType::Package, true)]
    #[case(LibraryDependencyTarget::Package, LibraryType::Reference, false)]
    #[case(LibraryDependencyTarget::Reference, LibraryType::Reference, true)]
    #[case(LibraryDependencyTarget::Reference, LibraryType::Project, false)]
    fn type_constraint_allows_expected_kinds(
        #[case] constraint: LibraryDependencyTarget,
        #[case] kind: LibraryType,
        #[case] expected: bool,
    ) {
        assert_eq!(constraint.allows(kind), expected);
    }

    #[test]
    fn library_range_display_includes_range() {
        let range = LibraryRange::new("Foo", Some("[1.0, 2.0)".parse().unwrap()));
        assert_eq!(range.to_string(), "Foo [1.0.0, 2.0.0)");
        assert_eq!(LibraryRange::new("Bar", None).to_string(), "Bar");
    }
}
