use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create storage directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to list storage directory '{0}'")]
    DirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read metadata for '{0}'")]
    Metadata(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing parquet file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to open parquet file '{0}'")]
    ParquetOpen(PathBuf, #[source] std::io::Error),

    #[error("Failed to read parquet file '{0}'")]
    ParquetRead(PathBuf, #[source] PolarsError),

    #[error("Failed to move '{from}' into the archive")]
    Archive {
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
