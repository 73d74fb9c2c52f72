//! Task bundle manifests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A discovered task bundle: a name and the filesystem path its manifest
/// was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// The bundle's declared name.
    pub name: String,
    /// Directory the manifest file (`bundle.json`) was read from.
    pub path: PathBuf,
}

impl BundleManifest {
    /// Read a manifest from a `bundle.json` file. `dir` is the directory
    /// the manifest lives in, recorded as [`BundleManifest::path`].
    pub(crate) fn read(manifest_file: &Path) -> Result<Self, crate::DiscoveryError> {
        let contents = std::fs::read_to_string(manifest_file)
            .map_err(|e| crate::DiscoveryError::Io { path: manifest_file.to_path_buf(), source: e })?;

        #[derive(Deserialize)]
        struct Raw {
            name: String,
        }
        let raw: Raw = serde_json::from_str(&contents)
            .map_err(|e| crate::DiscoveryError::Malformed { path: manifest_file.to_path_buf(), source: e })?;

        let dir = manifest_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| manifest_file.to_path_buf());

        Ok(BundleManifest { name: raw.name, path: dir })
    }
}
