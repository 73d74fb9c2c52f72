#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **eventflow-discovery** – Task bundle discovery for Eventflow.
//!
//! Mirrors entry-point-group plugin discovery in the surrounding
//! framework: additional task-definition packages ("bundles") are found
//! by walking search directories for a `bundle.json` manifest, plus one
//! extra directory named by the `EVENTFLOW_TASKS_DIRECTORY` environment
//! variable. Results are deduplicated and cached process-wide behind an
//! explicit `init`/`reset` lifecycle rather than an implicit global.

mod manifest;

pub use manifest::BundleManifest;

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

/// The environment variable naming one extra bundle search directory.
pub const TASKS_DIRECTORY_ENV_VAR: &str = "EVENTFLOW_TASKS_DIRECTORY";

const MANIFEST_FILE_NAME: &str = "bundle.json";

/// Errors raised while discovering or reading a bundle manifest.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The manifest file could not be read.
    #[error("failed to read bundle manifest {path}: {source}")]
    Io {
        /// The manifest file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The manifest file was not valid JSON, or missing a required field.
    #[error("malformed bundle manifest {path}: {source}")]
    Malformed {
        /// The manifest file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

fn is_hidden_or_build_dir(name: &str) -> bool {
    name.starts_with('.') || name == "target" || name == "__pycache__"
}

/// Recursively walk `dir` for `bundle.json` manifest files, skipping
/// dotfile and build-artifact directories.
///
/// Mirrors `discover_package_modules`'s recursive-but-prune-hidden
/// traversal, adapted from a module-path builder to a manifest collector.
pub fn discover_bundles_in(dir: &Path) -> Vec<BundleManifest> {
    let mut found = Vec::new();
    walk(dir, &mut found);
    found
}

fn walk(dir: &Path, found: &mut Vec<BundleManifest>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.as_ref().is_ok_and(std::fs::FileType::is_dir) {
            let base = entry.file_name();
            let base = base.to_string_lossy();
            if is_hidden_or_build_dir(&base) {
                continue;
            }
            walk(&path, found);
        } else if path.file_name().and_then(|n| n.to_str()) == Some(MANIFEST_FILE_NAME) {
            match manifest::BundleManifest::read(&path) {
                Ok(manifest) => found.push(manifest),
                Err(err) => warn!(%err, "skipping unreadable bundle manifest"),
            }
        }
    }
}

/// Discover bundles across every directory in `search_dirs`, plus the
/// directory named by [`TASKS_DIRECTORY_ENV_VAR`] if set, deduplicated by
/// `(name, path)` keeping the first occurrence.
///
/// Mirrors `find_firex_task_bundles` + `prune_duplicate_module_entry_points`.
pub fn discover_bundles(search_dirs: &[PathBuf]) -> Vec<BundleManifest> {
    let mut all = Vec::new();
    for dir in search_dirs {
        all.extend(discover_bundles_in(dir));
    }

    if let Ok(extra) = std::env::var(TASKS_DIRECTORY_ENV_VAR) {
        let extra_dir = PathBuf::from(extra);
        if extra_dir.is_dir() {
            all.extend(discover_bundles_in(&extra_dir));
        }
    }

    dedup_by_name_and_path(all)
}

fn dedup_by_name_and_path(manifests: Vec<BundleManifest>) -> Vec<BundleManifest> {
    let mut seen = std::collections::HashSet::new();
    manifests
        .into_iter()
        .filter(|m| seen.insert((m.name.clone(), m.path.clone())))
        .collect()
}

static BUNDLE_CACHE: Lazy<RwLock<Option<Vec<BundleManifest>>>> = Lazy::new(|| RwLock::new(None));

/// Return the process-wide cached bundle list, discovering it from
/// `search_dirs` on first call. Subsequent calls ignore `search_dirs` and
/// return the cached value until [`reset`] is called.
pub fn init(search_dirs: &[PathBuf]) -> Vec<BundleManifest> {
    let mut guard = BUNDLE_CACHE.write().expect("bundle cache lock poisoned");
    if let Some(cached) = &*guard {
        return cached.clone();
    }
    let discovered = discover_bundles(search_dirs);
    debug!(count = discovered.len(), "discovered task bundles");
    *guard = Some(discovered.clone());
    discovered
}

/// Clear the process-wide bundle cache so the next [`init`] call
/// re-walks the filesystem.
pub fn reset() {
    let mut guard = BUNDLE_CACHE.write().expect("bundle cache lock poisoned");
    *guard = None;
}
