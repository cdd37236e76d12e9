//! Contains the `ObservationBatch` structure, the tabular record model shared by every
//! stage of the pipeline.
//!
//! A batch is one run's full set of weather observation rows for a single location,
//! held in a Polars [`DataFrame`]. Column names are a fixed contract between the fetch
//! collaborator, the transform stage and the alert engine; they are exposed as the
//! constants in this module.

use polars::prelude::*;
use std::fmt;

/// Formatted time-of-day of an hourly observation (e.g. `"02:00 PM"`).
pub const TIME: &str = "time";
/// Calendar date of the observation.
pub const DATE: &str = "date";
/// Air temperature at 2m, degrees Celsius.
pub const TEMPERATURE: &str = "temperature";
/// Precipitation, millimetres.
pub const PRECIPITATION: &str = "precipitation";
/// UV index.
pub const UV_INDEX: &str = "uv_index";
/// UV index under clear-sky conditions (hourly data only).
pub const UV_INDEX_CLEAR_SKY: &str = "uv_index_clear_sky";
/// Name of the monitored place, constant across the batch.
pub const LOCATION: &str = "location";

/// Daily maximum temperature.
pub const TEMP_MAX: &str = "temp_max";
/// Daily minimum temperature.
pub const TEMP_MIN: &str = "temp_min";
/// Mean of `temp_max` and `temp_min`.
pub const TEMP_AVG: &str = "temp_avg";
/// Daily maximum wind speed at 10m.
pub const WIND_SPEED_MAX: &str = "wind_speed_max";

/// Derived temperature bucket, see [`crate::TemperatureCategory`].
pub const TEMP_CATEGORY: &str = "temp_category";
/// Derived precipitation bucket, see [`crate::PrecipitationCategory`].
pub const PRECIP_CATEGORY: &str = "precip_category";
/// Derived UV bucket, see [`crate::UvCategory`].
pub const UV_CATEGORY: &str = "uv_category";

/// A batch of time-stamped weather observations for one location.
///
/// The wrapper owns its frame; transform stages consume a batch and return a new one,
/// and from validation onwards the batch is only ever borrowed.
///
/// # Examples
///
/// ```
/// use polars::prelude::*;
/// use weather_alerts::ObservationBatch;
///
/// let frame = df!(
///     "time" => ["01:00 AM", "02:00 AM"],
///     "temperature" => [12.5, 13.0],
/// ).unwrap();
/// let batch = ObservationBatch::new(frame);
///
/// assert_eq!(batch.height(), 2);
/// assert!(batch.has_column("temperature"));
/// assert_eq!(batch.time_key(), Some("time"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObservationBatch {
    /// The underlying Polars frame.
    pub frame: DataFrame,
}

impl ObservationBatch {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// A batch with no rows and no columns.
    pub fn empty() -> Self {
        Self::new(DataFrame::empty())
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// `true` when the batch has no rows, regardless of its columns.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// The column that identifies a row in time: `time` for hourly data, `date` for daily data.
    pub fn time_key(&self) -> Option<&'static str> {
        if self.has_column(TIME) {
            Some(TIME)
        } else if self.has_column(DATE) {
            Some(DATE)
        } else {
            None
        }
    }

    /// Returns the named column cast to `f64`, or `None` when the column is absent or
    /// does not hold numbers (text, dates and categories are never parsed).
    pub fn float_values(&self, name: &str) -> PolarsResult<Option<Float64Chunked>> {
        match self.frame.column(name) {
            Ok(column) if is_numeric(column.dtype()) => {
                let cast = column.cast(&DataType::Float64)?;
                Ok(Some(cast.f64()?.clone()))
            }
            _ => Ok(None),
        }
    }

    /// Serializes the whole batch as CSV with a header row.
    pub fn to_csv(&self) -> PolarsResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut frame = self.frame.clone();
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .finish(&mut frame)?;
        Ok(buffer)
    }

    /// Compares two batches cell by cell, treating nulls as equal.
    pub fn same_contents(&self, other: &ObservationBatch) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}

/// Float, integer or all-null columns.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_float() || dtype.is_integer() || dtype.is_null()
}

impl From<DataFrame> for ObservationBatch {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

impl fmt::Display for ObservationBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame)
    }
}
