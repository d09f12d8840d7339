//! Dataset catalog
//!
//! The catalog is the registry of named datasets. It is built once at startup from a
//! [CatalogManifest] and a [DatasetLoader](crate::loader::DatasetLoader), then shared read-only
//! behind an `Arc` for the rest of the process lifetime.

use std::path::PathBuf;
use std::sync::Arc;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{event, Level};
use validator::{Validate, ValidationError};

use crate::error::{DatasetError, LoadError};
use crate::loader::DatasetLoader;
use crate::types::{Dataset, Year};

/// A dataset as listed in the catalog manifest.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Unique dataset identifier
    #[validate(length(min = 1, message = "dataset id must not be empty"))]
    pub id: String,
    /// Display name
    pub name: String,
    /// Free text description
    #[serde(default)]
    pub description: String,
    /// Data file, relative to the data directory
    #[validate(length(min = 1, message = "dataset filename must not be empty"))]
    pub filename: String,
}

/// The catalog manifest file.
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_unique_ids"))]
pub struct CatalogManifest {
    #[validate]
    #[validate(length(min = 1, message = "catalog must list at least one dataset"))]
    pub datasets: Vec<ManifestEntry>,
}

/// Validate that no two manifest entries share an id
fn validate_unique_ids(manifest: &CatalogManifest) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for entry in &manifest.datasets {
        if !seen.insert(entry.id.as_str()) {
            let mut error = ValidationError::new("Dataset ids must be unique");
            error.add_param("id".into(), &entry.id);
            return Err(error);
        }
    }
    Ok(())
}

/// Public description of a loaded dataset.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub filename: String,
    /// Inclusive bounds of the dataset's years
    pub years: [Year; 2],
    /// Attribute universe of the dataset
    pub energy_types: Vec<String>,
}

/// A loaded dataset together with its descriptor.
#[derive(Debug)]
struct Loaded {
    descriptor: DatasetDescriptor,
    dataset: Arc<Dataset>,
}

/// A registered dataset, which may have failed to load.
#[derive(Debug)]
pub struct CatalogEntry {
    manifest: ManifestEntry,
    state: Result<Loaded, Arc<LoadError>>,
}

impl CatalogEntry {
    fn new(manifest: ManifestEntry, dataset: Result<Dataset, LoadError>) -> Self {
        let state = dataset.and_then(|dataset| {
            let Some((min, max)) = dataset.year_bounds() else {
                return Err(LoadError::Empty {
                    path: PathBuf::from(&manifest.filename),
                });
            };
            let descriptor = DatasetDescriptor {
                id: manifest.id.clone(),
                name: manifest.name.clone(),
                description: manifest.description.clone(),
                filename: manifest.filename.clone(),
                years: [min, max],
                energy_types: dataset.attributes().to_vec(),
            };
            Ok(Loaded {
                descriptor,
                dataset: Arc::new(dataset),
            })
        });
        Self {
            manifest,
            state: state.map_err(Arc::new),
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn manifest(&self) -> &ManifestEntry {
        &self.manifest
    }

    /// Returns the descriptor, or `None` if the dataset failed to load.
    pub fn descriptor(&self) -> Option<&DatasetDescriptor> {
        self.state.as_ref().ok().map(|loaded| &loaded.descriptor)
    }

    /// Returns the loaded dataset.
    pub fn dataset(&self) -> Result<Arc<Dataset>, DatasetError> {
        self.loaded().map(|loaded| Arc::clone(&loaded.dataset))
    }

    fn loaded(&self) -> Result<&Loaded, DatasetError> {
        self.state
            .as_ref()
            .map_err(|source| DatasetError::LoadFailure {
                id: self.manifest.id.clone(),
                source: Arc::clone(source),
            })
    }
}

/// Registry of datasets, in manifest order.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Return a new empty Catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog by loading every dataset listed in `manifest`.
    ///
    /// Each dataset is loaded exactly once. Datasets that fail to load remain registered so that
    /// requests for them report a load failure rather than an unknown id.
    ///
    /// # Arguments
    ///
    /// * `manifest`: Validated catalog manifest
    /// * `loader`: Loader used to read each dataset
    pub fn load(manifest: &CatalogManifest, loader: &impl DatasetLoader) -> Self {
        let mut catalog = Self::new();
        for entry in &manifest.datasets {
            let dataset = loader.load(entry);
            match &dataset {
                Ok(dataset) => event!(
                    Level::INFO,
                    id = entry.id.as_str(),
                    records = dataset.len(),
                    attributes = dataset.attributes().len(),
                    "loaded dataset"
                ),
                Err(error) => event!(
                    Level::ERROR,
                    id = entry.id.as_str(),
                    "failed to load dataset: {}",
                    error
                ),
            }
            catalog.register(entry.clone(), dataset);
        }
        catalog
    }

    /// Register a dataset, replacing any existing entry with the same id.
    pub fn register(&mut self, manifest: ManifestEntry, dataset: Result<Dataset, LoadError>) {
        let entry = CatalogEntry::new(manifest, dataset);
        match self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Look up a registered dataset by id.
    pub fn lookup(&self, id: &str) -> Result<&CatalogEntry, DatasetError> {
        self.entries
            .iter()
            .find(|entry| entry.id() == id)
            .ok_or_else(|| DatasetError::NotFound { id: id.to_string() })
    }

    /// Look up the descriptor of a loaded dataset.
    pub fn descriptor(&self, id: &str) -> Result<&DatasetDescriptor, DatasetError> {
        self.lookup(id)?.loaded().map(|loaded| &loaded.descriptor)
    }

    /// Returns the loaded dataset for `id`.
    pub fn dataset(&self, id: &str) -> Result<Arc<Dataset>, DatasetError> {
        self.lookup(id)?.dataset()
    }

    /// Descriptors of every loaded dataset, in manifest order.
    ///
    /// Datasets that failed to load are not listed.
    pub fn list_all(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.entries.iter().filter_map(CatalogEntry::descriptor)
    }

    /// Number of registered datasets, including those that failed to load.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    struct FakeLoader;

    impl DatasetLoader for FakeLoader {
        fn load(&self, entry: &ManifestEntry) -> Result<Dataset, LoadError> {
            match entry.id.as_str() {
                "broken" => Err(LoadError::Empty {
                    path: PathBuf::from(&entry.filename),
                }),
                _ => Ok(test_utils::get_test_dataset()),
            }
        }
    }

    fn manifest(ids: &[&str]) -> CatalogManifest {
        CatalogManifest {
            datasets: ids
                .iter()
                .map(|id| test_utils::get_test_manifest_entry(id))
                .collect(),
        }
    }

    #[test]
    fn load_from_manifest() {
        let catalog = Catalog::load(&manifest(&["b", "broken", "a"]), &FakeLoader);
        assert_eq!(3, catalog.len());
        let ids = catalog.list_all().map(|d| d.id.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["b", "a"], ids);
    }

    #[test]
    fn descriptor_matches_dataset() {
        let catalog = test_utils::get_test_catalog();
        let descriptor = catalog.descriptor("long").unwrap();
        assert_eq!([2023, 2050], descriptor.years);
        assert_eq!(vec!["solar", "wind", "hydro"], descriptor.energy_types);
        assert_eq!("Dataset long", descriptor.name);
        assert_eq!("long.json", descriptor.filename);
    }

    #[test]
    fn lookup_unknown() {
        let catalog = test_utils::get_test_catalog();
        assert!(matches!(
            catalog.lookup("nope"),
            Err(DatasetError::NotFound { id }) if id == "nope"
        ));
        assert!(matches!(
            catalog.dataset("nope"),
            Err(DatasetError::NotFound { .. })
        ));
    }

    #[test]
    fn broken_entry() {
        let catalog = test_utils::get_test_catalog();
        let entry = catalog.lookup("broken").unwrap();
        assert!(entry.descriptor().is_none());
        assert!(matches!(
            catalog.dataset("broken"),
            Err(DatasetError::LoadFailure { id, .. }) if id == "broken"
        ));
        assert!(matches!(
            catalog.descriptor("broken"),
            Err(DatasetError::LoadFailure { .. })
        ));
        assert!(catalog.list_all().all(|d| d.id != "broken"));
    }

    #[test]
    fn register_empty_dataset() {
        let mut catalog = Catalog::new();
        catalog.register(test_utils::get_test_manifest_entry("e"), Ok(Dataset::default()));
        assert!(matches!(
            catalog.dataset("e"),
            Err(DatasetError::LoadFailure { .. })
        ));
    }

    #[test]
    fn register_replaces() {
        let mut catalog = test_utils::get_test_catalog();
        catalog.register(
            test_utils::get_test_manifest_entry("broken"),
            Ok(test_utils::get_test_dataset()),
        );
        assert_eq!(3, catalog.len());
        assert_eq!(3, catalog.dataset("broken").unwrap().len());
    }

    #[test]
    fn datasets_are_shared() {
        let catalog = test_utils::get_test_catalog();
        let a = catalog.dataset("small").unwrap();
        let b = catalog.dataset("small").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn manifest_valid() {
        manifest(&["a", "b"]).validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "Dataset ids must be unique")]
    fn manifest_duplicate_ids() {
        manifest(&["a", "b", "a"]).validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "catalog must list at least one dataset")]
    fn manifest_empty() {
        manifest(&[]).validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "dataset id must not be empty")]
    fn manifest_empty_id() {
        manifest(&[""]).validate().unwrap();
    }

    #[test]
    fn manifest_json() {
        let json = r#"{"datasets": [{"id": "a", "name": "A", "filename": "a.json"}]}"#;
        let manifest: CatalogManifest = serde_json::from_str(json).unwrap();
        assert_eq!("", manifest.datasets[0].description);
        manifest.validate().unwrap();
    }

    #[test]
    fn manifest_unknown_field() {
        let json = r#"{"datasets": [], "extra": 1}"#;
        let err = serde_json::from_str::<CatalogManifest>(json).unwrap_err();
        assert!(err.to_string().contains("unknown field `extra`"), "{err}");
    }
}
