//! Seeds the store from a directory of JSON manifests.
//!
//! Every `*.json` file holds either one object or an array of objects. Files
//! are applied in name order; objects that already exist are left untouched,
//! so restarting against the same directory is harmless.

use std::path::{Path, PathBuf};

use cloudctl_store::{DynStore, StoreError};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapStats {
    pub files: usize,
    pub created: usize,
    pub existing: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to apply {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

pub async fn load_manifests(dir: &Path, store: &DynStore) -> Result<BootstrapStats, BootstrapError> {
    let files = manifest_files(dir).await?;
    let mut stats = BootstrapStats {
        files: files.len(),
        ..Default::default()
    };

    for path in files {
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| BootstrapError::Io {
                path: path.clone(),
                source,
            })?;
        let document: Value =
            serde_json::from_slice(&raw).map_err(|source| BootstrapError::Parse {
                path: path.clone(),
                source,
            })?;

        let objects = match document {
            Value::Array(items) => items,
            single => vec![single],
        };

        for object in objects {
            match store.create(&object).await {
                Ok(stored) => {
                    debug!(key = %stored.key, "bootstrapped object");
                    stats.created += 1;
                }
                Err(e) if e.is_already_exists() => stats.existing += 1,
                Err(source) => {
                    return Err(BootstrapError::Store { path, source });
                }
            }
        }
    }

    info!(
        dir = %dir.display(),
        files = stats.files,
        created = stats.created,
        existing = stats.existing,
        "bootstrap complete"
    );
    Ok(stats)
}

async fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>, BootstrapError> {
    let io_err = |source| BootstrapError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
