use crate::alerts::transport::TransportError;
use crate::extract::error::FetchError;
use crate::load::error::StorageError;
use crate::settings::ConfigError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed processing DataFrame")]
    DataFrame(#[from] PolarsError),

    #[error("No data fetched from API")]
    NoData,

    #[error("Data validation failed: {}", .0.join("; "))]
    InvalidData(Vec<String>),
}
