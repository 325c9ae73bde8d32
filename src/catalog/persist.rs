//! On-disk layout for persisted datasets
//!
//! ```text
//! <data_dir>/
//!   catalog.json            map file: { updated_at, datasets: [DatasetInfo] }
//!   datasets/<id>.json      envelope { id, kind, written_at, checksum, rows }
//! ```
//!
//! `checksum` is CRC32 (IEEE) over the serialized `rows` value. Every file
//! is written to a `.tmp` sibling, fsynced, then renamed over the target.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::{records_from_json, Dataset, DatasetInfo, DatasetKind, RecordStore};

use super::errors::{CatalogError, CatalogResult};

const MAP_FILE: &str = "catalog.json";
const DATASETS_DIR: &str = "datasets";

/// CRC32 over `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[derive(Debug, Serialize, Deserialize)]
struct DatasetEnvelope {
    id: String,
    kind: DatasetKind,
    /// RFC 3339 write time; not covered by the checksum
    written_at: String,
    checksum: u32,
    rows: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogMap {
    updated_at: String,
    datasets: Vec<DatasetInfo>,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Reads and writes the catalog's data directory
#[derive(Debug, Clone)]
pub struct DatasetFiles {
    data_dir: PathBuf,
}

impl DatasetFiles {
    /// Creates the directory layout if missing
    pub fn open(data_dir: &Path) -> CatalogResult<Self> {
        let datasets_dir = data_dir.join(DATASETS_DIR);
        fs::create_dir_all(&datasets_dir)
            .map_err(|e| CatalogError::io_at_path(&datasets_dir, e))?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn map_path(&self) -> PathBuf {
        self.data_dir.join(MAP_FILE)
    }

    fn dataset_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(DATASETS_DIR).join(format!("{}.json", id))
    }

    /// Entries of the map file; an absent map file means an empty catalog
    pub fn read_map(&self) -> CatalogResult<Vec<DatasetInfo>> {
        let path = self.map_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read(&path).map_err(|e| CatalogError::io_at_path(&path, e))?;
        let map: CatalogMap = serde_json::from_slice(&content).map_err(|e| {
            CatalogError::data_corruption(format!("Unreadable map file {}: {}", path.display(), e))
        })?;
        Ok(map.datasets)
    }

    pub fn write_map(&self, datasets: Vec<DatasetInfo>) -> CatalogResult<()> {
        let map = CatalogMap {
            updated_at: now_rfc3339(),
            datasets,
        };
        let bytes = serde_json::to_vec_pretty(&map).map_err(|e| {
            CatalogError::data_corruption(format!("Failed to serialize map file: {}", e))
        })?;
        write_atomic(&self.map_path(), &bytes)
    }

    pub fn write_dataset(&self, dataset: &Dataset) -> CatalogResult<()> {
        let rows = serde_json::to_value(dataset.store().records()).map_err(|e| {
            CatalogError::data_corruption(format!(
                "Failed to serialize dataset '{}': {}",
                dataset.id(),
                e
            ))
        })?;
        let checksum = compute_checksum(rows.to_string().as_bytes());
        let envelope = DatasetEnvelope {
            id: dataset.id().to_string(),
            kind: dataset.kind(),
            written_at: now_rfc3339(),
            checksum,
            rows,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|e| {
            CatalogError::data_corruption(format!(
                "Failed to serialize dataset '{}': {}",
                dataset.id(),
                e
            ))
        })?;
        write_atomic(&self.dataset_path(dataset.id()), &bytes)
    }

    /// Loads the dataset described by a map entry.
    ///
    /// Any disagreement between the envelope and the map entry, or between
    /// the rows and their checksum, is corruption.
    pub fn read_dataset(&self, info: &DatasetInfo) -> CatalogResult<Dataset> {
        let path = self.dataset_path(&info.id);
        let content = fs::read(&path).map_err(|e| CatalogError::io_at_path(&path, e))?;
        let envelope: DatasetEnvelope = serde_json::from_slice(&content).map_err(|e| {
            CatalogError::data_corruption(format!("Unreadable dataset file {}: {}", path.display(), e))
        })?;

        if envelope.id != info.id || envelope.kind != info.kind {
            return Err(CatalogError::data_corruption(format!(
                "Dataset file {} does not match catalog entry '{}'",
                path.display(),
                info.id
            )));
        }

        let actual = compute_checksum(envelope.rows.to_string().as_bytes());
        if actual != envelope.checksum {
            return Err(CatalogError::checksum_mismatch(&info.id, envelope.checksum, actual));
        }

        let records = records_from_json(envelope.kind, envelope.rows)
            .map_err(|e| CatalogError::data_corruption(e.message().to_string()))?;
        if records.len() != info.num_rows {
            return Err(CatalogError::data_corruption(format!(
                "Dataset '{}' holds {} rows, catalog lists {}",
                info.id,
                records.len(),
                info.num_rows
            )));
        }
        let store = RecordStore::new(envelope.kind, records)
            .map_err(|e| CatalogError::data_corruption(e.message().to_string()))?;
        Ok(Dataset::new(envelope.id, store))
    }

    /// Deletes dataset files whose id is not in `known`.
    ///
    /// Returns the ids that could not be deleted.
    pub fn sweep_orphans(&self, known: &[DatasetInfo]) -> CatalogResult<Vec<String>> {
        let dir = self.data_dir.join(DATASETS_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| CatalogError::io_at_path(&dir, e))?;

        let mut stuck = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CatalogError::io_at_path(&dir, e))?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if known.iter().any(|info| info.id == id) {
                continue;
            }
            if self.remove_dataset(id).is_err() {
                stuck.push(id.to_string());
            }
        }
        stuck.sort();
        Ok(stuck)
    }

    pub fn remove_dataset(&self, id: &str) -> CatalogResult<()> {
        let path = self.dataset_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::io_at_path(&path, e)),
        }
    }
}

/// Writes `bytes` to `<path>.tmp`, fsyncs, then renames onto `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> CatalogResult<()> {
    let temp_path = path.with_extension("json.tmp");

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| CatalogError::io_at_path(&temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| CatalogError::io_at_path(&temp_path, e))?;
    file.sync_all()
        .map_err(|e| CatalogError::io_at_path(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        CatalogError::storage_io(format!("Failed to commit {}", path.display()), e)
    })?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogErrorCode;
    use crate::dataset::{Record, Room};
    use tempfile::TempDir;

    fn rooms_dataset() -> Dataset {
        let room = |number: &str, seats: i64| {
            Record::Room(Room {
                fullname: "Hugh Dempster Pavilion".into(),
                shortname: "DMP".into(),
                number: number.into(),
                name: format!("DMP_{}", number),
                address: "6245 Agronomy Road V6T 1Z4".into(),
                lat: 49.26125,
                lon: -123.24807,
                seats,
                room_type: "Tiered Large Group".into(),
                furniture: "Classroom-Fixed Tablets".into(),
                href: "".into(),
            })
        };
        let store =
            RecordStore::new(DatasetKind::Rooms, vec![room("110", 120), room("310", 160)]).unwrap();
        Dataset::new("rooms", store)
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut data = b"[{\"rooms_seats\":120}]".to_vec();
        let original = compute_checksum(&data);
        data[3] ^= 0x01;
        assert_ne!(original, compute_checksum(&data));
    }

    #[test]
    fn test_dataset_roundtrip() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        let dataset = rooms_dataset();

        files.write_dataset(&dataset).unwrap();
        files.write_map(vec![dataset.info()]).unwrap();

        let map = files.read_map().unwrap();
        assert_eq!(map, vec![dataset.info()]);
        let loaded = files.read_dataset(&map[0]).unwrap();
        assert_eq!(loaded.store().records(), dataset.store().records());
        assert!(!temp.path().join("datasets/rooms.json.tmp").exists());
    }

    #[test]
    fn test_missing_map_is_empty() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        assert!(files.read_map().unwrap().is_empty());
    }

    #[test]
    fn test_tampered_rows_fail_checksum() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        let dataset = rooms_dataset();
        files.write_dataset(&dataset).unwrap();

        let path = temp.path().join("datasets/rooms.json");
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("160", "161")).unwrap();

        let err = files.read_dataset(&dataset.info()).unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusDataCorruption);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_mismatched_entry_is_corruption() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        let dataset = rooms_dataset();
        files.write_dataset(&dataset).unwrap();

        let mut info = dataset.info();
        info.num_rows = 5;
        let err = files.read_dataset(&info).unwrap_err();
        assert_eq!(err.code(), CatalogErrorCode::CampusDataCorruption);
    }

    #[test]
    fn test_sweep_orphans_keeps_listed_datasets() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        let dataset = rooms_dataset();
        files.write_dataset(&dataset).unwrap();
        fs::write(temp.path().join("datasets/stale.json"), "[]").unwrap();
        fs::write(temp.path().join("datasets/stale.json.tmp"), "[]").unwrap();

        let stuck = files.sweep_orphans(&[dataset.info()]).unwrap();
        assert!(stuck.is_empty());
        assert!(temp.path().join("datasets/rooms.json").exists());
        assert!(!temp.path().join("datasets/stale.json").exists());
        assert!(temp.path().join("datasets/stale.json.tmp").exists());
    }

    #[test]
    fn test_sweep_reports_undeletable_files() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        let blocked = temp.path().join("datasets/blocked.json");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        assert_eq!(files.sweep_orphans(&[]).unwrap(), vec!["blocked".to_string()]);
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let temp = TempDir::new().unwrap();
        let files = DatasetFiles::open(temp.path()).unwrap();
        files.remove_dataset("ghost").unwrap();
    }
}
