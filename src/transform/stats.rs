use crate::types::observation_batch::{
    ObservationBatch, DATE, PRECIPITATION, TEMPERATURE, TEMP_AVG, TEMP_MAX, TEMP_MIN,
    WIND_SPEED_MAX,
};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

/// Summary figures logged after a batch passes validation.
///
/// Every field is optional because hourly and daily batches carry different columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyStats {
    pub record_count: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub temp_max_overall: Option<f64>,
    pub temp_min_overall: Option<f64>,
    pub temp_avg_mean: Option<f64>,
    pub precipitation_total: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub temperature_max: Option<f64>,
}

/// Aggregates a batch. Returns `None` for an empty batch.
pub fn compute_daily_stats(batch: &ObservationBatch) -> PolarsResult<Option<DailyStats>> {
    if batch.is_empty() {
        return Ok(None);
    }

    let (date_min, date_max) = date_bounds(batch)?;
    Ok(Some(DailyStats {
        record_count: batch.height(),
        date_min,
        date_max,
        temp_max_overall: batch.float_values(TEMP_MAX)?.and_then(|v| v.max()),
        temp_min_overall: batch.float_values(TEMP_MIN)?.and_then(|v| v.min()),
        temp_avg_mean: batch.float_values(TEMP_AVG)?.and_then(|v| v.mean()),
        precipitation_total: batch.float_values(PRECIPITATION)?.and_then(|v| v.sum()),
        wind_speed_max: batch.float_values(WIND_SPEED_MAX)?.and_then(|v| v.max()),
        temperature_max: batch.float_values(TEMPERATURE)?.and_then(|v| v.max()),
    }))
}

fn date_bounds(batch: &ObservationBatch) -> PolarsResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let Ok(column) = batch.frame.column(DATE) else {
        return Ok((None, None));
    };
    if column.dtype() != &DataType::Date {
        return Ok((None, None));
    }
    let dates: Vec<NaiveDate> = column.date()?.as_date_iter().flatten().collect();
    Ok((dates.iter().min().copied(), dates.iter().max().copied()))
}
