//! Local package repository test utilities

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use restore_engine::lockfile::LockFile;
use restore_engine::repository::LocalPackageRepository;

/// Builds a package archive and its dependency manifest
pub struct PackageBuilder {
    name: String,
    version: String,
    files: Vec<String>,
    manifest: Option<serde_json::Value>,
}

impl PackageBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            files: Vec::new(),
            manifest: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn with_files(mut self, files: &[&str]) -> Self {
        self.files.extend(files.iter().map(|f| f.to_string()));
        self
    }

    pub fn with_manifest(mut self, manifest: serde_json::Value) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Zip archive bytes containing every file
    pub fn archive_bytes(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for file in &self.files {
            writer
                .start_file(file.as_str(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(file.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub fn manifest_json(&self) -> Option<String> {
        self.manifest.as_ref().map(|m| m.to_string())
    }

    fn install(&self, root: &Path) {
        let lower_name = self.name.to_ascii_lowercase();
        let directory = root.join(&lower_name).join(&self.version);
        std::fs::create_dir_all(&directory).unwrap();

        let mut archive =
            File::create(directory.join(format!("{}.{}.nupkg", lower_name, self.version))).unwrap();
        archive.write_all(&self.archive_bytes()).unwrap();

        if let Some(manifest) = self.manifest_json() {
            std::fs::write(directory.join(format!("{}.deps.json", lower_name)), manifest).unwrap();
        }
    }
}

/// A local package repository in a temporary directory
pub struct TestRepository {
    // Held to keep the directory alive
    _temp_dir: TempDir,
    pub repository: LocalPackageRepository,
}

impl TestRepository {
    pub fn new(packages: &[PackageBuilder]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        for package in packages {
            package.install(temp_dir.path());
        }
        Self {
            repository: LocalPackageRepository::new(temp_dir.path()),
            _temp_dir: temp_dir,
        }
    }
}

pub fn lock_file(value: serde_json::Value) -> LockFile {
    serde_json::from_value(value).unwrap()
}
