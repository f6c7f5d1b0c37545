//! Compatibility data lookup for one package and one target

use tracing::debug;

use crate::archive::list_files;
use crate::compat::assets::AssetClassifier;
use crate::compat::types::CompatibilityData;
use crate::error::CompatError;
use crate::graph::RestoreTargetGraph;
use crate::library::LibraryIdentity;
use crate::lockfile::LockFile;
use crate::repository::LocalPackageRepository;

/// Combines lock file data with the local package repository
///
/// Data recorded in the lock file is used as is. Whatever is missing is computed
/// from the installed package, so a lock file that covers one target but not
/// another only costs the work for the missing half.
pub struct CompatibilityDataResolver<'a> {
    lock_file: &'a LockFile,
    repository: &'a LocalPackageRepository,
    classifier: &'a dyn AssetClassifier,
}

impl<'a> CompatibilityDataResolver<'a> {
    pub fn new(
        lock_file: &'a LockFile,
        repository: &'a LocalPackageRepository,
        classifier: &'a dyn AssetClassifier,
    ) -> Self {
        Self {
            lock_file,
            repository,
            classifier,
        }
    }

    /// Get the file listing and target assets of `identity` for `graph`
    ///
    /// # Returns
    /// * `Ok(Some(data))` - Data from the lock file, the installed package, or both
    /// * `Ok(None)` - Something is missing from the lock file and the package is not installed
    /// * `Err(CompatError)` - The installed package could not be read
    pub fn resolve(
        &self,
        graph: &RestoreTargetGraph,
        identity: &LibraryIdentity,
    ) -> Result<Option<CompatibilityData>, CompatError> {
        let runtime_identifier = graph.runtime_identifier.as_deref();
        let cached_assets =
            self.lock_file
                .target_assets(&graph.framework, runtime_identifier, identity);
        let cached_files = self.lock_file.file_listing(identity);

        if let (Some(assets), Some(files)) = (&cached_assets, &cached_files) {
            return Ok(Some(CompatibilityData {
                files: files.clone(),
                assets: assets.clone(),
            }));
        }

        let Some(package) = self
            .repository
            .find_package(&identity.name, &identity.version)
        else {
            debug!("{} is not installed; no compatibility data", identity);
            return Ok(None);
        };

        let files = match cached_files {
            Some(files) => files,
            None => {
                debug!("Listing files of {} from {:?}", identity, package.archive_path);
                list_files(&package.archive_path)?
            }
        };

        let assets = match cached_assets {
            Some(assets) => assets,
            None => {
                debug!("Classifying assets of {} for {}", identity, graph.name);
                self.classifier.classify(&package, &files, graph)?
            }
        };

        Ok(Some(CompatibilityData { files, assets }))
    }
}
