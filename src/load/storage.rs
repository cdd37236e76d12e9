//! Parquet snapshots of fetched and processed batches, with age-based archival.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/raw/<source>_<YYYYmmdd_HHMMSS>.parquet
//! <base>/processed/<name>.parquet
//! <base>/archive/
//! ```

use crate::load::error::StorageError;
use crate::reporting::Reporter;
use crate::types::observation_batch::ObservationBatch;
use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const PARQUET_EXTENSION: &str = "parquet";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// File counts per storage area and the combined size of all snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageStats {
    pub raw_files: usize,
    pub processed_files: usize,
    pub archive_files: usize,
    /// Rounded to two decimals.
    pub total_size_mb: f64,
}

#[derive(Debug, Clone)]
pub struct DataStorage {
    base_path: PathBuf,
    raw_path: PathBuf,
    processed_path: PathBuf,
    archive_path: PathBuf,
}

impl DataStorage {
    /// Opens storage rooted at `base_path`, creating the three areas if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        let storage = Self {
            raw_path: base_path.join("raw"),
            processed_path: base_path.join("processed"),
            archive_path: base_path.join("archive"),
            base_path,
        };
        for dir in [&storage.raw_path, &storage.processed_path, &storage.archive_path] {
            fs::create_dir_all(dir).map_err(|e| StorageError::DirCreation(dir.clone(), e))?;
        }
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Writes a timestamped snapshot of freshly fetched data.
    pub fn save_raw(
        &self,
        batch: &ObservationBatch,
        source: &str,
        reporter: &dyn Reporter,
    ) -> Result<PathBuf, StorageError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .raw_path
            .join(format!("{}_{}.{}", source, timestamp, PARQUET_EXTENSION));
        write_parquet(batch, &path)?;
        reporter.info(&format!("Saved raw data to {}", path.display()));
        Ok(path)
    }

    /// Writes (or overwrites) the processed snapshot called `name`.
    pub fn save_processed(
        &self,
        batch: &ObservationBatch,
        name: &str,
        reporter: &dyn Reporter,
    ) -> Result<PathBuf, StorageError> {
        let path = self
            .processed_path
            .join(format!("{}.{}", name, PARQUET_EXTENSION));
        write_parquet(batch, &path)?;
        reporter.info(&format!("Saved processed data to {}", path.display()));
        Ok(path)
    }

    /// Loads the most recently modified processed file whose name starts with `name`.
    pub fn load_latest(
        &self,
        name: &str,
        reporter: &dyn Reporter,
    ) -> Result<Option<ObservationBatch>, StorageError> {
        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for path in parquet_files(&self.processed_path)? {
            let matches = path
                .file_name()
                .and_then(|file_name| file_name.to_str())
                .is_some_and(|file_name| file_name.starts_with(name));
            if !matches {
                continue;
            }
            let modified = modified_time(&path)?;
            if latest.as_ref().map_or(true, |(newest, _)| modified > *newest) {
                latest = Some((modified, path));
            }
        }

        let Some((_, path)) = latest else {
            reporter.warn(&format!("No files found matching {}*.{}", name, PARQUET_EXTENSION));
            return Ok(None);
        };

        reporter.info(&format!("Loading {}", path.display()));
        let file = File::open(&path).map_err(|e| StorageError::ParquetOpen(path.clone(), e))?;
        let frame = ParquetReader::new(file)
            .finish()
            .map_err(|e| StorageError::ParquetRead(path.clone(), e))?;
        Ok(Some(ObservationBatch::new(frame)))
    }

    /// Moves raw and processed files last modified more than `days` days ago into the
    /// archive. Returns how many files were moved.
    pub fn archive_old(&self, days: u64, reporter: &dyn Reporter) -> Result<usize, StorageError> {
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut archived = 0;
        for dir in [&self.raw_path, &self.processed_path] {
            for path in parquet_files(dir)? {
                if modified_time(&path)? >= cutoff {
                    continue;
                }
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                let destination = self.archive_path.join(file_name);
                fs::rename(&path, &destination).map_err(|source| StorageError::Archive {
                    from: path.clone(),
                    source,
                })?;
                archived += 1;
                reporter.info(&format!("Archived {}", file_name.to_string_lossy()));
            }
        }
        Ok(archived)
    }

    pub fn storage_stats(&self) -> Result<StorageStats, StorageError> {
        let raw = parquet_files(&self.raw_path)?;
        let processed = parquet_files(&self.processed_path)?;
        let archive = parquet_files(&self.archive_path)?;

        let mut total_bytes = 0u64;
        for path in raw.iter().chain(&processed).chain(&archive) {
            total_bytes += fs::metadata(path)
                .map_err(|e| StorageError::Metadata(path.clone(), e))?
                .len();
        }
        let total_size_mb = (total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;

        Ok(StorageStats {
            raw_files: raw.len(),
            processed_files: processed.len(),
            archive_files: archive.len(),
            total_size_mb,
        })
    }
}

fn write_parquet(batch: &ObservationBatch, path: &Path) -> Result<(), StorageError> {
    let mut frame = batch.frame.clone();
    let file = File::create(path).map_err(|e| StorageError::ParquetWriteIo(path.to_path_buf(), e))?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(&mut frame)
        .map_err(|e| StorageError::ParquetWritePolars(path.to_path_buf(), e))?;
    Ok(())
}

fn parquet_files(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::DirRead(dir.to_path_buf(), e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| StorageError::DirRead(dir.to_path_buf(), e))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == PARQUET_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn modified_time(path: &Path) -> Result<SystemTime, StorageError> {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| StorageError::Metadata(path.to_path_buf(), e))
}
