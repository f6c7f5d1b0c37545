//! Asset classification of package contents for a target

#[cfg(test)]
use mockall::automock;
use indexmap::IndexSet;
use tracing::debug;

use crate::compat::types::{PackageFileListing, TargetLibraryAssets};
use crate::error::CompatError;
use crate::framework::{FrameworkIdentifier, NuGetFramework, get_nearest};
use crate::graph::RestoreTargetGraph;
use crate::provider::parse_group_framework;
use crate::repository::LocalPackageInfo;

/// Marks a framework folder as supported without shipping an assembly
const EMPTY_FOLDER_PLACEHOLDER: &str = "_._";

const ASSEMBLY_EXTENSIONS: &[&str] = &["dll", "exe", "winmd"];

/// Decides which files of a package belong to which asset group for a target
#[cfg_attr(test, automock)]
pub trait AssetClassifier: Send + Sync {
    fn classify(
        &self,
        package: &LocalPackageInfo,
        files: &PackageFileListing,
        graph: &RestoreTargetGraph,
    ) -> Result<TargetLibraryAssets, CompatError>;
}

/// Classifies assets by the conventional folder layout
///
/// - compile: `ref/{tfm}/` of the nearest framework, else `lib/{tfm}/`
/// - runtime: `runtimes/{rid}/lib/{tfm}/` for the graph's runtime (walking a simple
///   runtime fallback chain), else `lib/{tfm}/`
/// - framework assemblies: nearest framework assembly group of the package manifest
///
/// Files directly under `lib/` belong to the oldest desktop framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionAssetClassifier;

/// Files of one `{prefix}/{tfm}/` folder
struct FrameworkFolder<'a> {
    framework: NuGetFramework,
    files: Vec<&'a str>,
}

fn is_assembly(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name == EMPTY_FOLDER_PLACEHOLDER {
        return true;
    }
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ASSEMBLY_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Group assembly files under `prefix` by their framework folder
fn framework_folders<'a>(files: &'a PackageFileListing, prefix: &str) -> Vec<FrameworkFolder<'a>> {
    let mut folders: Vec<FrameworkFolder<'a>> = Vec::new();

    for path in files.iter() {
        let Some(rest) = path
            .get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| &path[prefix.len()..])
        else {
            continue;
        };

        let framework = match rest.split_once('/') {
            Some((folder, file)) if !file.contains('/') => match folder.parse() {
                Ok(framework) => framework,
                Err(e) => {
                    debug!("Skipping {}: {}", path, e);
                    continue;
                }
            },
            Some(_) => continue,
            None => NuGetFramework::new(
                FrameworkIdentifier::NetFramework,
                semver::Version::new(0, 0, 0),
            ),
        };

        if !is_assembly(path) {
            continue;
        }

        match folders.iter_mut().find(|f| f.framework == framework) {
            Some(folder) => folder.files.push(path),
            None => folders.push(FrameworkFolder {
                framework,
                files: vec![path],
            }),
        }
    }

    folders
}

fn nearest_files(
    target: &NuGetFramework,
    files: &PackageFileListing,
    prefix: &str,
) -> Option<IndexSet<String>> {
    let folders = framework_folders(files, prefix);
    get_nearest(target, &folders, |folder| &folder.framework)
        .map(|folder| folder.files.iter().map(|f| f.to_string()).collect())
}

/// Runtime identifier that matches every runtime
const ANY_RUNTIME: &str = "any";

/// Runtime identifiers to try for `rid`, most specific first
///
/// `win7-x64` tries `win7-x64`, `win7`, `win-x64`, `win`, `any`;
/// `ubuntu.16.04-x64` tries `ubuntu.16.04-x64`, `ubuntu.16.04`, `ubuntu-x64`,
/// `ubuntu`, `any`.
pub fn runtime_fallbacks(rid: &str) -> Vec<String> {
    let mut chain = vec![rid.to_string()];

    let (base, arch) = match rid.split_once('-') {
        Some((base, arch)) => (base, Some(arch)),
        None => (rid, None),
    };
    let family: String = base.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let family_arch = match arch {
        Some(arch) if !family.is_empty() => format!("{}-{}", family, arch),
        _ => String::new(),
    };

    for candidate in [base.to_string(), family_arch, family, ANY_RUNTIME.to_string()] {
        if !candidate.is_empty() && !chain.contains(&candidate) {
            chain.push(candidate);
        }
    }
    chain
}

impl AssetClassifier for ConventionAssetClassifier {
    fn classify(
        &self,
        package: &LocalPackageInfo,
        files: &PackageFileListing,
        graph: &RestoreTargetGraph,
    ) -> Result<TargetLibraryAssets, CompatError> {
        let framework = &graph.framework;
        let lib = nearest_files(framework, files, "lib/");

        let compile_time_assemblies = nearest_files(framework, files, "ref/")
            .or_else(|| lib.clone())
            .unwrap_or_default();

        let runtime_specific = graph.runtime_identifier.as_deref().and_then(|rid| {
            runtime_fallbacks(rid).iter().find_map(|candidate| {
                nearest_files(framework, files, &format!("runtimes/{}/lib/", candidate))
            })
        });
        let runtime_assemblies = runtime_specific.or(lib).unwrap_or_default();

        let framework_assemblies: IndexSet<String> = package
            .read_dependency_info()?
            .and_then(|info| {
                let groups: Vec<_> = info
                    .framework_assembly_groups
                    .into_iter()
                    .filter_map(|group| {
                        parse_group_framework(&group.target_framework)
                            .map(|f| (f, group.assemblies))
                    })
                    .collect();
                get_nearest(framework, groups, |(f, _)| f)
                    .map(|(_, assemblies)| assemblies.into_iter().collect())
            })
            .unwrap_or_default();

        debug!(
            "Classified {} for {}: {} compile, {} runtime, {} framework assemblies",
            package.identity,
            graph.name,
            compile_time_assemblies.len(),
            runtime_assemblies.len(),
            framework_assemblies.len()
        );

        Ok(TargetLibraryAssets {
            framework_assemblies,
            compile_time_assemblies,
            runtime_assemblies,
        })
    }
}
