//! Locating and listing version files.
//!
//! # Design
//! A `VersionStore` is a directory of definition files. Resolving a version
//! name is a pure path join; existence is only checked when loading.

use std::path::{Path, PathBuf};

use crate::definition::Definition;
use crate::error::ApiError;

/// Environment variable naming the versions directory.
pub const VERSIONS_PATH_ENV: &str = "CAPPY_VERSIONS_PATH";

/// Directory used when `CAPPY_VERSIONS_PATH` is unset.
pub const DEFAULT_VERSIONS_DIR: &str = "versions";

/// File extensions recognized as definition files.
pub const VERSION_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStore {
    root: PathBuf,
}

impl VersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `$CAPPY_VERSIONS_PATH`, or `./versions`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(VERSIONS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VERSIONS_DIR));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for_version(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Names of the definition files in the store, sorted.
    pub fn list_versions(&self) -> Result<Vec<String>, ApiError> {
        let io_err = |source: std::io::Error| ApiError::Io {
            path: self.root.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() || !has_version_extension(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, filename: &str) -> Result<Definition, ApiError> {
        Definition::load(self.path_for_version(filename))
    }
}

fn has_version_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VERSION_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
