//! Dataset catalog
//!
//! - Datasets are immutable once registered; replacing one means remove + add
//! - Queries run against a `CatalogSnapshot`, so a concurrent add or remove
//!   never changes the records a running query sees
//! - With a data directory, every mutation is on disk before it is visible
//! - A removal commits when the map file is rewritten; a dataset file that
//!   cannot be deleted afterwards is an orphan, swept on the next open

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::dataset::{Dataset, DatasetInfo, DatasetKind, Record, RecordStore};
use crate::executor::{CatalogLookup, ExecutorResult, QueryExecutor, QueryOutput};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, ObservationScope};

use super::errors::{CatalogError, CatalogResult};
use super::persist::DatasetFiles;

/// Returns true if `id` may name a dataset.
///
/// Query keys split on the underscore, and ids double as file names.
pub fn is_valid_dataset_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id
            .chars()
            .any(|c| c == '_' || c == '/' || c == '\\' || c.is_whitespace())
}

fn log_orphan(id: &str) {
    log_event_with_fields(Event::DatasetFileOrphaned, &[("id", id)]);
}

/// Registry of datasets by id
pub struct Catalog {
    datasets: RwLock<HashMap<String, Arc<Dataset>>>,
    files: Option<DatasetFiles>,
    metrics: Arc<MetricsRegistry>,
}

impl Catalog {
    /// A catalog that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            datasets: RwLock::new(HashMap::new()),
            files: None,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Opens a catalog persisted under `data_dir`, restoring every dataset
    /// listed in its map file.
    ///
    /// Corruption aborts the open; nothing is partially restored.
    pub fn open(data_dir: &Path) -> CatalogResult<Self> {
        let dir = data_dir.display().to_string();
        let scope = ObservationScope::with_fields("CATALOG_RESTORE", &[("data_dir", dir.as_str())]);

        let result = Self::restore(data_dir);
        match &result {
            Ok(catalog) => {
                let count = catalog.len().to_string();
                scope.complete_with_fields(&[("datasets", count.as_str())]);
                log_event_with_fields(Event::CatalogLoaded, &[("datasets", count.as_str())]);
            }
            Err(err) if err.is_fatal() => scope.fail_fatal(err.message()),
            Err(err) => scope.fail(err.message()),
        }
        result
    }

    fn restore(data_dir: &Path) -> CatalogResult<Self> {
        let files = DatasetFiles::open(data_dir)?;
        let infos = files.read_map()?;
        let mut datasets = HashMap::new();
        for info in &infos {
            let dataset = files.read_dataset(info)?;
            datasets.insert(info.id.clone(), Arc::new(dataset));
        }
        for id in files.sweep_orphans(&infos)? {
            log_orphan(&id);
        }
        Ok(Self {
            datasets: RwLock::new(datasets),
            files: Some(files),
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    /// Counters for queries and catalog mutations
    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.files.as_ref().map(|f| f.data_dir())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Dataset>>> {
        self.datasets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Dataset>>> {
        self.datasets.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Registers a dataset and returns the ids now registered, sorted
    pub fn add_dataset(
        &self,
        id: &str,
        kind: DatasetKind,
        records: Vec<Record>,
    ) -> CatalogResult<Vec<String>> {
        if !is_valid_dataset_id(id) {
            return Err(CatalogError::invalid_dataset_id(id));
        }
        if records.is_empty() {
            return Err(CatalogError::empty_dataset(id));
        }

        let mut datasets = self.write();
        if datasets.contains_key(id) {
            return Err(CatalogError::dataset_exists(id));
        }

        let store = RecordStore::new(kind, records).map_err(|e| CatalogError::from_dataset(id, e))?;
        let dataset = Dataset::new(id, store);

        if let Some(files) = &self.files {
            files.write_dataset(&dataset)?;
            let mut entries: Vec<DatasetInfo> = datasets.values().map(|d| d.info()).collect();
            entries.push(dataset.info());
            entries.sort_by(|a, b| a.id.cmp(&b.id));
            files.write_map(entries)?;
        }

        let rows = dataset.store().len().to_string();
        datasets.insert(id.to_string(), Arc::new(dataset));
        self.metrics.increment_datasets_added();
        log_event_with_fields(
            Event::DatasetAdded,
            &[("id", id), ("kind", kind.as_str()), ("rows", rows.as_str())],
        );

        let mut ids: Vec<String> = datasets.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Removes a dataset, in memory and on disk, returning its id
    pub fn remove_dataset(&self, id: &str) -> CatalogResult<String> {
        if !is_valid_dataset_id(id) {
            return Err(CatalogError::invalid_dataset_id(id));
        }

        let mut datasets = self.write();
        if !datasets.contains_key(id) {
            return Err(CatalogError::dataset_not_found(id));
        }

        if let Some(files) = &self.files {
            let mut entries: Vec<DatasetInfo> = datasets
                .values()
                .filter(|d| d.id() != id)
                .map(|d| d.info())
                .collect();
            entries.sort_by(|a, b| a.id.cmp(&b.id));
            files.write_map(entries)?;
            if files.remove_dataset(id).is_err() {
                log_orphan(id);
            }
        }

        datasets.remove(id);
        self.metrics.increment_datasets_removed();
        log_event_with_fields(Event::DatasetRemoved, &[("id", id)]);
        Ok(id.to_string())
    }

    /// Registered datasets sorted by id
    pub fn list_datasets(&self) -> Vec<DatasetInfo> {
        let mut infos: Vec<DatasetInfo> = self.read().values().map(|d| d.info()).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// A point-in-time view for query execution
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            datasets: self.read().clone(),
        }
    }

    /// Runs a query against the current snapshot
    pub fn query(&self, raw: &Value) -> ExecutorResult<QueryOutput> {
        let snapshot = self.snapshot();
        QueryExecutor::new(&snapshot)
            .with_metrics(&self.metrics)
            .execute(raw)
    }
}

/// Immutable view of the catalog at one point in time
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    datasets: HashMap<String, Arc<Dataset>>,
}

impl CatalogSnapshot {
    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.get(id).map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl CatalogLookup for CatalogSnapshot {
    fn kind_of(&self, id: &str) -> Option<DatasetKind> {
        self.get(id).map(|d| d.kind())
    }

    fn store(&self, id: &str) -> Option<&RecordStore> {
        self.get(id).map(|d| d.store())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogErrorCode;
    use crate::dataset::Section;
    use serde_json::json;
    use tempfile::TempDir;

    fn section(uuid: &str, dept: &str, avg: f64) -> Record {
        Record::Section(Section {
            dept: dept.into(),
            id: "310".into(),
            instructor: "".into(),
            title: "software eng".into(),
            avg,
            pass: 10,
            fail: 1,
            audit: 0,
            uuid: uuid.into(),
            year: 2016,
        })
    }

    fn sections() -> Vec<Record> {
        vec![section("1", "cpsc", 80.5), section("2", "cpsc", 71.0), section("3", "math", 90.0)]
    }

    #[test]
    fn test_dataset_id_rules() {
        assert!(is_valid_dataset_id("courses"));
        assert!(is_valid_dataset_id("rooms-2024"));
        assert!(!is_valid_dataset_id(""));
        assert!(!is_valid_dataset_id("   "));
        assert!(!is_valid_dataset_id("my_courses"));
        assert!(!is_valid_dataset_id("../etc"));
        assert!(!is_valid_dataset_id(".."));
    }

    #[test]
    fn test_add_and_list() {
        let catalog = Catalog::in_memory();
        assert_eq!(
            catalog.add_dataset("courses", DatasetKind::Sections, sections()).unwrap(),
            vec!["courses"]
        );
        let ids = catalog
            .add_dataset("archive", DatasetKind::Sections, sections())
            .unwrap();
        assert_eq!(ids, vec!["archive", "courses"]);

        let listed = catalog.list_datasets();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "archive");
        assert_eq!(listed[1].num_rows, 3);
        assert_eq!(catalog.metrics().snapshot().datasets_added, 2);
    }

    #[test]
    fn test_add_rejections() {
        let catalog = Catalog::in_memory();
        catalog
            .add_dataset("courses", DatasetKind::Sections, sections())
            .unwrap();

        let err = catalog
            .add_dataset("courses", DatasetKind::Sections, sections())
            .unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusDatasetExists);

        let err = catalog
            .add_dataset("bad_id", DatasetKind::Sections, sections())
            .unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusInvalidDatasetId);

        let err = catalog
            .add_dataset("empty", DatasetKind::Sections, vec![])
            .unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusEmptyDataset);

        let err = catalog
            .add_dataset("dupes", DatasetKind::Sections, vec![section("1", "a", 1.0), section("1", "b", 2.0)])
            .unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusDuplicatePrimaryKey);

        let err = catalog
            .add_dataset("rooms", DatasetKind::Rooms, sections())
            .unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusKindMismatch);

        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_remove() {
        let catalog = Catalog::in_memory();
        catalog
            .add_dataset("courses", DatasetKind::Sections, sections())
            .unwrap();

        assert_eq!(
            catalog.remove_dataset("nope").unwrap_err().code(),
            CatalogErrorCode::CampusDatasetNotFound
        );
        assert_eq!(
            catalog.remove_dataset("a_b").unwrap_err().code(),
            CatalogErrorCode::CampusInvalidDatasetId
        );
        assert_eq!(catalog.remove_dataset("courses").unwrap(), "courses");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_snapshot_isolated_from_removal() {
        let catalog = Catalog::in_memory();
        catalog
            .add_dataset("courses", DatasetKind::Sections, sections())
            .unwrap();
        let snapshot = catalog.snapshot();
        catalog.remove_dataset("courses").unwrap();

        assert_eq!(snapshot.kind_of("courses"), Some(DatasetKind::Sections));
        assert_eq!(snapshot.store("courses").map(|s| s.len()), Some(3));
        assert!(catalog.snapshot().is_empty());
    }

    #[test]
    fn test_query_through_catalog() {
        let catalog = Catalog::in_memory();
        catalog
            .add_dataset("courses", DatasetKind::Sections, sections())
            .unwrap();
        let output = catalog
            .query(&json!({
                "WHERE": {"IS": {"courses_dept": "cp*"}},
                "OPTIONS": {"COLUMNS": ["courses_uuid"], "ORDER": "courses_uuid"}
            }))
            .unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(catalog.metrics().snapshot().queries_executed, 1);
    }

    #[test]
    fn test_persisted_across_open() {
        let temp = TempDir::new().unwrap();
        {
            let catalog = Catalog::open(temp.path()).unwrap();
            catalog
                .add_dataset("courses", DatasetKind::Sections, sections())
                .unwrap();
            catalog
                .add_dataset("old", DatasetKind::Sections, sections())
                .unwrap();
            catalog.remove_dataset("old").unwrap();
        }

        let reopened = Catalog::open(temp.path()).unwrap();
        assert_eq!(reopened.list_datasets().len(), 1);
        assert!(reopened.contains("courses"));
        assert!(!temp.path().join("datasets/old.json").exists());
    }

    #[test]
    fn test_remove_commits_when_file_cannot_be_deleted() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::open(temp.path()).unwrap();
        catalog
            .add_dataset("courses", DatasetKind::Sections, sections())
            .unwrap();

        let data_file = temp.path().join("datasets/courses.json");
        std::fs::remove_file(&data_file).unwrap();
        std::fs::create_dir(&data_file).unwrap();
        std::fs::write(data_file.join("pinned"), "x").unwrap();

        assert_eq!(catalog.remove_dataset("courses").unwrap(), "courses");
        assert!(!catalog.contains("courses"));
        assert_eq!(catalog.metrics().snapshot().datasets_removed, 1);
        let err = catalog
            .query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_uuid"]}}))
            .unwrap_err();
        assert_eq!(err.code(), crate::executor::ExecutorErrorCode::CampusQueryRejected);
        drop(catalog);

        let reopened = Catalog::open(temp.path()).unwrap();
        assert!(reopened.is_empty());
        assert!(data_file.exists());
    }

    #[test]
    fn test_open_sweeps_orphaned_files() {
        let temp = TempDir::new().unwrap();
        {
            let catalog = Catalog::open(temp.path()).unwrap();
            catalog
                .add_dataset("courses", DatasetKind::Sections, sections())
                .unwrap();
        }
        let orphan = temp.path().join("datasets/gone.json");
        std::fs::write(&orphan, "[]").unwrap();

        let reopened = Catalog::open(temp.path()).unwrap();
        assert!(reopened.contains("courses"));
        assert!(!orphan.exists());
    }
}
