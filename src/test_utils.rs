use crate::app_state::{AppState, SharedAppState};
use crate::catalog::{Catalog, ManifestEntry};
use crate::cli::CommandLineArgs;
use crate::error::LoadError;
use crate::query::QueryService;
use crate::types::{Dataset, Record};

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// The three year solar/wind dataset used throughout the tests.
///
/// 2024 has an absent wind value.
pub(crate) fn get_test_dataset() -> Dataset {
    Dataset::new(vec![
        Record::new(2023)
            .with_value("solar", Some(10.0))
            .with_value("wind", Some(5.0)),
        Record::new(2024)
            .with_value("solar", Some(12.0))
            .with_value("wind", None),
        Record::new(2025)
            .with_value("solar", Some(9.0))
            .with_value("wind", Some(7.0)),
    ])
    .unwrap()
}

/// A dataset with one record per year in `[start, end]` and three attributes. Every fifth hydro
/// value is absent.
pub(crate) fn get_test_dataset_range(start: u32, end: u32) -> Dataset {
    let records = (start..=end)
        .map(|year| {
            let i = f64::from(year - start);
            let hydro = if (year - start) % 5 == 0 {
                None
            } else {
                Some(100.0 - i)
            };
            Record::new(year)
                .with_value("solar", Some(1.5 * i))
                .with_value("wind", Some(20.0 + i))
                .with_value("hydro", hydro)
        })
        .collect();
    Dataset::new(records).unwrap()
}

/// A manifest entry for a dataset.
pub(crate) fn get_test_manifest_entry(id: &str) -> ManifestEntry {
    ManifestEntry {
        id: id.to_string(),
        name: format!("Dataset {id}"),
        description: format!("Test dataset {id}"),
        filename: format!("{id}.json"),
    }
}

/// A catalog with:
///
/// * `small`: [get_test_dataset]
/// * `long`: [get_test_dataset_range] over 2023 to 2050
/// * `broken`: an entry that failed to load
pub(crate) fn get_test_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.register(get_test_manifest_entry("small"), Ok(get_test_dataset()));
    catalog.register(
        get_test_manifest_entry("long"),
        Ok(get_test_dataset_range(2023, 2050)),
    );
    catalog.register(
        get_test_manifest_entry("broken"),
        Err(LoadError::Empty {
            path: PathBuf::from("broken.json"),
        }),
    );
    catalog
}

/// Path to the test fixtures directory.
pub(crate) fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

/// Application state serving [get_test_catalog] with default arguments.
pub(crate) fn get_test_state() -> SharedAppState {
    let args = CommandLineArgs::parse_from(["energy-compare"]);
    let query_service = QueryService::new(Arc::new(get_test_catalog()));
    Arc::new(AppState::new(&args, query_service))
}
