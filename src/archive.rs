//! Package archive inspection

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::compat::types::PackageFileListing;
use crate::error::ArchiveError;

/// List the files inside a package archive
///
/// Entry names are normalized to forward slashes; directory entries are skipped.
pub fn list_files(archive_path: &Path) -> Result<PackageFileListing, ArchiveError> {
    let file = File::open(archive_path)?;
    let archive = ZipArchive::new(BufReader::new(file))?;

    let files: PackageFileListing = archive
        .file_names()
        .filter(|name| !name.ends_with('/') && !name.ends_with('\\'))
        .map(|name| name.replace('\\', "/"))
        .collect();

    debug!(
        "Listed {} files in {}",
        files.len(),
        archive_path.display()
    );
    Ok(files)
}
