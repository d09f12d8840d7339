//! Loading of the catalog manifest and dataset files.
//!
//! This is the only part of the crate that touches the file system. It runs once at startup;
//! everything it produces is immutable afterwards.

use std::path::{Path, PathBuf};

use tracing::{event, Level};
use validator::Validate;

use crate::catalog::{Catalog, CatalogManifest, ManifestEntry};
use crate::error::LoadError;
use crate::types::Dataset;

/// Dataset loader trait.
///
/// Seam between the catalog and wherever dataset records come from.
pub trait DatasetLoader {
    /// Load the dataset described by a manifest entry.
    fn load(&self, entry: &ManifestEntry) -> Result<Dataset, LoadError>;
}

/// Loads datasets from JSON files in a data directory.
#[derive(Clone, Debug)]
pub struct JsonFileLoader {
    data_dir: PathBuf,
}

impl JsonFileLoader {
    /// Return a new loader reading files relative to `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl DatasetLoader for JsonFileLoader {
    #[tracing::instrument(level = "DEBUG", skip(self), fields(id = %entry.id))]
    fn load(&self, entry: &ManifestEntry) -> Result<Dataset, LoadError> {
        let path = self.data_dir.join(&entry.filename);
        let bytes = read(&path)?;
        parse_dataset(&path, &bytes)
    }
}

/// Parse a dataset from a JSON array of records.
///
/// # Arguments
///
/// * `path`: Path the data was read from, used in errors
/// * `bytes`: JSON data
pub fn parse_dataset(path: &Path, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let dataset: Dataset = serde_json::from_slice(bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if dataset.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(dataset)
}

/// Read and validate a catalog manifest.
pub fn load_manifest(path: &Path) -> Result<CatalogManifest, LoadError> {
    let bytes = read(path)?;
    let manifest: CatalogManifest =
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    manifest.validate()?;
    Ok(manifest)
}

/// Load the catalog described by the manifest at `manifest_path`.
///
/// Dataset files are resolved relative to `data_dir`, or to the directory containing the
/// manifest if no data directory is given. Only a missing or invalid manifest is an error;
/// individual datasets that fail to load are registered as unavailable.
pub fn load_catalog(manifest_path: &Path, data_dir: Option<&Path>) -> Result<Catalog, LoadError> {
    let manifest = load_manifest(manifest_path)?;
    let data_dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    event!(
        Level::INFO,
        manifest = %manifest_path.display(),
        data_dir = %data_dir.display(),
        datasets = manifest.datasets.len(),
        "loading catalog"
    );
    Ok(Catalog::load(&manifest, &JsonFileLoader::new(data_dir)))
}

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
