//! Deserialization of Open-Meteo forecast responses and their conversion into an
//! [`ObservationBatch`].

use crate::extract::error::FetchError;
use crate::types::frequency::Frequency;
use crate::types::observation_batch::{
    ObservationBatch, DATE, LOCATION, PRECIPITATION, TEMPERATURE, TEMP_AVG, TEMP_MAX, TEMP_MIN,
    TIME, UV_INDEX, UV_INDEX_CLEAR_SKY, WIND_SPEED_MAX,
};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const API_DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_OF_DAY_FORMAT: &str = "%I:%M %p";

/// Raw forecast payload as returned by `/v1/forecast`.
///
/// Only the sections that were requested are present; everything else defaults to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
    #[serde(default)]
    pub daily: Option<DailySeries>,
}

/// Parallel hourly arrays. A variable missing from the payload deserializes as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<Option<String>>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index_clear_sky: Vec<Option<f64>>,
}

/// Parallel daily arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<Option<String>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
}

/// Turns a forecast response into a tabular batch for `location_name`.
///
/// Hourly rows get `today` as their `date` and the hour formatted as `"%I:%M %p"` in
/// `time`. Daily rows get a `temp_avg` column, the mean of max and min. A response
/// without the requested section yields an empty batch; a variable absent from an
/// otherwise populated section becomes an all-null column.
pub fn parse_weather_response(
    response: &ForecastResponse,
    location_name: &str,
    frequency: Frequency,
    today: NaiveDate,
) -> Result<ObservationBatch, FetchError> {
    match frequency {
        Frequency::Hourly => match &response.hourly {
            Some(series) if !series.time.is_empty() => {
                hourly_frame(series, location_name, today).map(ObservationBatch::new)
            }
            _ => Ok(ObservationBatch::empty()),
        },
        Frequency::Daily => match &response.daily {
            Some(series) if !series.time.is_empty() => {
                daily_frame(series, location_name).map(ObservationBatch::new)
            }
            _ => Ok(ObservationBatch::empty()),
        },
    }
}

fn hourly_frame(
    series: &HourlySeries,
    location_name: &str,
    today: NaiveDate,
) -> Result<DataFrame, FetchError> {
    let rows = series.time.len();
    let times = series
        .time
        .iter()
        .map(|value| value.as_deref().map(format_time_of_day).transpose())
        .collect::<Result<Vec<Option<String>>, FetchError>>()?;

    let frame = DataFrame::new(vec![
        Column::new(DATE.into(), vec![today; rows]),
        Column::new(TIME.into(), times),
        Column::new(TEMPERATURE.into(), padded(&series.temperature_2m, rows)),
        Column::new(PRECIPITATION.into(), padded(&series.precipitation, rows)),
        Column::new(UV_INDEX.into(), padded(&series.uv_index, rows)),
        Column::new(
            UV_INDEX_CLEAR_SKY.into(),
            padded(&series.uv_index_clear_sky, rows),
        ),
        Column::new(LOCATION.into(), vec![location_name; rows]),
    ])?;
    Ok(frame)
}

fn daily_frame(series: &DailySeries, location_name: &str) -> Result<DataFrame, FetchError> {
    let rows = series.time.len();
    let dates = series
        .time
        .iter()
        .map(|value| value.as_deref().map(parse_date).transpose())
        .collect::<Result<Vec<Option<NaiveDate>>, FetchError>>()?;

    let temp_max = padded(&series.temperature_2m_max, rows);
    let temp_min = padded(&series.temperature_2m_min, rows);
    let temp_avg: Vec<Option<f64>> = temp_max
        .iter()
        .zip(temp_min.iter())
        .map(|(max, min)| match (max, min) {
            (Some(max), Some(min)) => Some((max + min) / 2.0),
            _ => None,
        })
        .collect();

    let frame = DataFrame::new(vec![
        Column::new(DATE.into(), dates),
        Column::new(TEMP_MAX.into(), temp_max),
        Column::new(TEMP_MIN.into(), temp_min),
        Column::new(PRECIPITATION.into(), padded(&series.precipitation_sum, rows)),
        Column::new(WIND_SPEED_MAX.into(), padded(&series.wind_speed_10m_max, rows)),
        Column::new(LOCATION.into(), vec![location_name; rows]),
        Column::new(TEMP_AVG.into(), temp_avg),
    ])?;
    Ok(frame)
}

/// A variable the API did not return at all becomes a column of nulls. Arrays of a
/// different non-zero length are left alone so the frame constructor rejects them.
fn padded(values: &[Option<f64>], rows: usize) -> Vec<Option<f64>> {
    if values.is_empty() {
        vec![None; rows]
    } else {
        values.to_vec()
    }
}

fn format_time_of_day(value: &str) -> Result<String, FetchError> {
    NaiveDateTime::parse_from_str(value, API_DATETIME_FORMAT)
        .map(|datetime| datetime.format(TIME_OF_DAY_FORMAT).to_string())
        .map_err(|source| FetchError::Timestamp {
            value: value.to_string(),
            source,
        })
}

fn parse_date(value: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(value, API_DATE_FORMAT).map_err(|source| FetchError::Timestamp {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 18).unwrap()
    }

    fn daily_response() -> Result<ForecastResponse, serde_json::Error> {
        serde_json::from_str(
            r#"{
                "latitude": 48.86,
                "longitude": 2.35,
                "daily": {
                    "time": ["2026-02-18", "2026-02-19", "2026-02-20"],
                    "temperature_2m_max": [12.5, 15.0, 10.0],
                    "temperature_2m_min": [5.0, 7.5, 2.0],
                    "precipitation_sum": [0.0, 5.2, 12.5],
                    "wind_speed_10m_max": [25.0, 45.0, 80.0]
                }
            }"#,
        )
    }

    fn hourly_response() -> Result<ForecastResponse, serde_json::Error> {
        serde_json::from_str(
            r#"{
                "hourly": {
                    "time": ["2026-02-18T00:00", "2026-02-18T13:00", null],
                    "temperature_2m": [4.1, 11.8, 9.0],
                    "precipitation": [0.0, 0.3, null],
                    "uv_index": [0.0, 2.45, 0.0]
                }
            }"#,
        )
    }

    #[test]
    fn test_parse_daily_columns() -> Result<(), Box<dyn std::error::Error>> {
        let batch = parse_weather_response(&daily_response()?, "Paris", Frequency::Daily, today())?;

        assert_eq!(batch.height(), 3);
        for column in [DATE, TEMP_MAX, TEMP_MIN, PRECIPITATION, WIND_SPEED_MAX, LOCATION, TEMP_AVG] {
            assert!(batch.has_column(column), "missing column {column}");
        }
        Ok(())
    }

    #[test]
    fn test_parse_daily_average_temperature() -> Result<(), Box<dyn std::error::Error>> {
        let batch = parse_weather_response(&daily_response()?, "Paris", Frequency::Daily, today())?;
        let avg = batch.float_values(TEMP_AVG)?.ok_or("temp_avg missing")?;
        assert_eq!(avg.get(0), Some((12.5 + 5.0) / 2.0));
        Ok(())
    }

    #[test]
    fn test_parse_location_preserved() -> Result<(), Box<dyn std::error::Error>> {
        let batch = parse_weather_response(&daily_response()?, "Lyon", Frequency::Daily, today())?;
        let locations = batch.frame.column(LOCATION)?.str()?;
        assert_eq!(locations.get(0), Some("Lyon"));
        Ok(())
    }

    #[test]
    fn test_parse_empty_response() -> Result<(), FetchError> {
        let empty = ForecastResponse::default();
        assert!(parse_weather_response(&empty, "Paris", Frequency::Daily, today())?.is_empty());
        assert!(parse_weather_response(&empty, "Paris", Frequency::Hourly, today())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_missing_requested_section() -> Result<(), Box<dyn std::error::Error>> {
        let response = hourly_response()?;
        let batch = parse_weather_response(&response, "Paris", Frequency::Daily, today())?;
        assert!(batch.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_hourly_formats_time_and_pads_missing_variable(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let batch = parse_weather_response(&hourly_response()?, "Paris", Frequency::Hourly, today())?;

        assert_eq!(batch.height(), 3);
        let times: Vec<Option<&str>> = batch.frame.column(TIME)?.str()?.into_iter().collect();
        assert_eq!(times, vec![Some("12:00 AM"), Some("01:00 PM"), None]);

        let clear_sky = batch
            .float_values(UV_INDEX_CLEAR_SKY)?
            .ok_or("uv_index_clear_sky missing")?;
        assert_eq!(clear_sky.null_count(), 3);

        let dates: Vec<Option<NaiveDate>> =
            batch.frame.column(DATE)?.date()?.as_date_iter().collect();
        assert!(dates.iter().all(|date| *date == Some(today())));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() -> Result<(), serde_json::Error> {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"hourly": {"time": ["yesterday"], "temperature_2m": [1.0]}}"#,
        )?;
        let result = parse_weather_response(&response, "Paris", Frequency::Hourly, today());
        assert!(matches!(result, Err(FetchError::Timestamp { .. })));
        Ok(())
    }
}
