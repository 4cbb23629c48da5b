//! Score book persistence.
//!
//! The score book is a single pretty-printed JSON file. Writes go to a
//! temp file first and are renamed over the real file, so a crash mid-write
//! leaves the previous book intact.

use marrow_common::{SchemaVersion, StoreError, StoreResult};
use marrow_gameplay::ScoreBook;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// JSON-backed score book store.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    path: PathBuf,
}

impl ScoreStore {
    /// Creates a store for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the book lives in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the book. A missing file yields an empty book.
    pub fn load(&self) -> StoreResult<ScoreBook> {
        if !self.path.exists() {
            info!("No score book at {}, starting fresh", self.path.display());
            return Ok(ScoreBook::new());
        }

        let file = File::open(&self.path)?;
        let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Check the header before decoding the body so a newer layout is
        // reported as a version problem rather than a parse error.
        let version: SchemaVersion = value
            .get("version")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?
            .ok_or_else(|| StoreError::Serialization("missing version header".to_string()))?;

        if !SchemaVersion::SCORE_BOOK.can_read(&version) {
            return Err(StoreError::VersionMismatch {
                expected: SchemaVersion::SCORE_BOOK.to_string(),
                actual: version.to_string(),
            });
        }

        let book: ScoreBook =
            serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!("Loaded {} grower records from {}", book.len(), self.path.display());
        Ok(book)
    }

    /// Save the book atomically.
    pub fn save(&self, book: &ScoreBook) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        if let Err(e) = Self::write_json(&temp_path, book) {
            error!("Failed to write score book: {e}");
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            error!("Failed to replace score book: {e}");
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!("Saved score book to {}", self.path.display());
        Ok(())
    }

    fn write_json(path: &Path, book: &ScoreBook) -> StoreResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, book)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "scores.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marrow_common::GrowerId;
    use marrow_gameplay::{HarvestLedger, ScoreKind, SeedKind};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ScoreStore {
        ScoreStore::new(dir.path().join("marrow").join("scores.json"))
    }

    #[test]
    fn test_missing_file_loads_empty_book() {
        let dir = TempDir::new().expect("temp dir");
        let book = store_in(&dir).load().expect("load");
        assert!(book.is_empty());
        assert_eq!(book.version, SchemaVersion::SCORE_BOOK);
    }

    #[test]
    fn test_save_then_load_keeps_records() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let grower = GrowerId::new("Wednesday").expect("name");

        let mut book = ScoreBook::new();
        let record = book.record_mut(&grower, 3);
        record.record_score(ScoreKind::Potency, 61);
        record.record_score(ScoreKind::Yield, 140);
        record.award_seeds(SeedKind::Rotjaw, 2);

        store.save(&book).expect("save");
        let loaded = store.load().expect("load");

        assert_eq!(loaded, book);
        let record = loaded.get(&grower).expect("record");
        assert_eq!(record.best_potency(), Some(61));
        assert_eq!(record.seeds_of(SeedKind::Rotjaw), 2);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        store.save(&ScoreBook::new()).expect("save");

        let temp = store.temp_path();
        assert!(store.path().exists());
        assert!(!temp.exists());
    }

    #[test]
    fn test_newer_major_version_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let mut book = ScoreBook::new();
        book.version = SchemaVersion::new(2, 0, 0);
        store.save(&book).expect("save");

        match store.load() {
            Err(StoreError::VersionMismatch { expected, actual }) => {
                assert_eq!(expected, SchemaVersion::SCORE_BOOK.to_string());
                assert_eq!(actual, "2.0.0");
            },
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        fs::create_dir_all(dir.path().join("marrow")).expect("dir");
        fs::write(store.path(), "not json").expect("write");

        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
    }
}
