//! Per-package data consumed by the compatibility check

use indexmap::IndexSet;

/// Relative file paths inside a package archive, separators normalized to `/`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFileListing {
    files: IndexSet<String>,
}

impl PackageFileListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Returns true if any file path starts with `prefix`, ignoring case
    pub fn any_starts_with(&self, prefix: &str) -> bool {
        self.files.iter().any(|file| {
            file.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
    }
}

impl<S: Into<String>> FromIterator<S> for PackageFileListing {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|file| file.into().replace('\\', "/"))
                .collect(),
        }
    }
}

/// Asset classification of one package for one (framework, runtime) target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetLibraryAssets {
    /// Assemblies the target framework itself supplies (System.Xml)
    pub framework_assemblies: IndexSet<String>,
    /// Reference assemblies used at compile time (ref/net45/Foo.dll)
    pub compile_time_assemblies: IndexSet<String>,
    /// Assemblies loaded at run time (lib/net45/Foo.dll, runtimes/win/lib/net45/Foo.dll)
    pub runtime_assemblies: IndexSet<String>,
}

impl TargetLibraryAssets {
    /// Returns true if the package contributes no assets of any kind for the target
    pub fn is_empty(&self) -> bool {
        self.framework_assemblies.is_empty()
            && self.compile_time_assemblies.is_empty()
            && self.runtime_assemblies.is_empty()
    }
}

/// Everything the compatibility check needs to know about one package for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityData {
    pub files: PackageFileListing,
    pub assets: TargetLibraryAssets,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["lib/net45/Foo.dll"], "lib/", true)]
    #[case(&["LIB/net45/Foo.dll"], "lib/", true)]
    #[case(&["content/readme.txt"], "lib/", false)]
    #[case(&["library.txt"], "lib/", false)]
    #[case(&["li"], "lib/", false)]
    #[case(&[], "ref/", false)]
    fn any_starts_with_returns_expected(
        #[case] files: &[&str],
        #[case] prefix: &str,
        #[case] expected: bool,
    ) {
        let listing: PackageFileListing = files.iter().copied().collect();
        assert_eq!(listing.any_starts_with(prefix), expected);
    }

    #[test]
    fn from_iter_normalizes_separators_and_deduplicates() {
        let listing: PackageFileListing = ["lib\\net45\\Foo.dll", "lib/net45/Foo.dll", "Foo.nuspec"]
            .into_iter()
            .collect();

        assert_eq!(
            listing.iter().collect::<Vec<_>>(),
            vec!["lib/net45/Foo.dll", "Foo.nuspec"]
        );
    }

    #[test]
    fn assets_is_empty_only_without_any_asset() {
        let mut assets = TargetLibraryAssets::default();
        assert!(assets.is_empty());

        assets.framework_assemblies.insert("System.Xml".to_string());
        assert!(!assets.is_empty());
    }
}
