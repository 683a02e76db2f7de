use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions recognised as route table manifests
const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// File scanner for collecting route table manifests.
///
/// The `FileScanner` recursively walks through a directory to find all manifest files
/// (`.yaml`, `.yml` and `.json`). It skips the `target` directory and hidden directories
/// (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use swagger_from_routes::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./routes"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} manifests", result.manifest_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Discovered manifest files, in a stable order
    pub manifest_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| MANIFEST_EXTENSIONS.contains(&ext))
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory or single manifest file.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all manifest files.
    ///
    /// A root path that is itself a file is returned as the only manifest. If any directories
    /// or files cannot be accessed, warnings are logged and added to the result, but scanning
    /// continues.
    pub fn scan(&self) -> Result<ScanResult> {
        if self.root_path.is_file() {
            return Ok(ScanResult {
                manifest_files: vec![self.root_path.clone()],
                warnings: Vec::new(),
            });
        }

        let mut manifest_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && is_manifest(path) {
                        manifest_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            manifest_files,
            warnings,
        })
    }
}
