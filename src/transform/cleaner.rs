//! Cleaning and enrichment of freshly fetched observation batches.

use crate::reporting::Reporter;
use crate::types::category::{PrecipitationCategory, TemperatureCategory, UvCategory};
use crate::types::observation_batch::{
    ObservationBatch, LOCATION, PRECIPITATION, PRECIP_CATEGORY, TEMPERATURE, TEMP_CATEGORY,
    UV_CATEGORY, UV_INDEX,
};
use polars::prelude::*;

const ARRIVAL_INDEX: &str = "__arrival_index";

/// Removes unusable rows and fills gaps in a batch.
///
/// Rows with a null time key or a null `temperature` are dropped (absent columns are not
/// filtered on), remaining numeric nulls become zero, and duplicates on
/// (time key, `location`) are removed keeping the first arrival. Row order is preserved.
///
/// Cleaning an already clean batch returns it unchanged.
pub fn clean(batch: ObservationBatch, reporter: &dyn Reporter) -> PolarsResult<ObservationBatch> {
    if batch.is_empty() {
        return Ok(batch);
    }
    let initial_rows = batch.height();

    let mut required = Vec::new();
    if let Some(time_key) = batch.time_key() {
        required.push(time_key);
    }
    if batch.has_column(TEMPERATURE) {
        required.push(TEMPERATURE);
    }

    let mut dedup_keys = Vec::new();
    if let Some(time_key) = batch.time_key() {
        dedup_keys.push(time_key);
        if batch.has_column(LOCATION) {
            dedup_keys.push(LOCATION);
        }
    }

    let zero_fills: Vec<Expr> = batch
        .frame
        .get_columns()
        .iter()
        .filter_map(|column| {
            let dtype = column.dtype();
            if dtype.is_float() {
                Some(col(column.name().clone()).fill_null(lit(0.0)))
            } else if dtype.is_integer() {
                Some(col(column.name().clone()).fill_null(lit(0)))
            } else {
                None
            }
        })
        .collect();

    let mut lazy = batch.frame.lazy().with_row_index(ARRIVAL_INDEX, None);
    if let Some(predicate) = required
        .iter()
        .map(|name| col(*name).is_not_null())
        .reduce(|acc, next| acc.and(next))
    {
        lazy = lazy.filter(predicate);
    }
    if !zero_fills.is_empty() {
        lazy = lazy.with_columns(zero_fills);
    }
    if !dedup_keys.is_empty() {
        lazy = lazy.unique_stable(
            Some(dedup_keys.iter().map(|name| (*name).into()).collect()),
            UniqueKeepStrategy::First,
        );
    }

    let frame = lazy
        .sort([ARRIVAL_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ARRIVAL_INDEX)?;

    let cleaned = ObservationBatch::new(frame);
    if cleaned.height() != initial_rows {
        reporter.info(&format!(
            "Cleaned data: {} -> {} rows",
            initial_rows,
            cleaned.height()
        ));
    }
    Ok(cleaned)
}

/// Adds the derived category columns.
///
/// Each category is derived only when its source column is present; the ladders are
/// evaluated top-down and the first matching bucket wins.
///
/// | column | source | buckets |
/// |---|---|---|
/// | `temp_category` | `temperature` | `> 30` Hot, `< 10` Cold, else Moderate |
/// | `precip_category` | `precipitation` | `> 10` Rainy, `> 0` Light_rain, else Dry |
/// | `uv_category` | `uv_index` | `>= 11` Extreme, `>= 8` Very High, `>= 6` High, `>= 3` Moderate, else Low |
pub fn enrich(batch: ObservationBatch) -> PolarsResult<ObservationBatch> {
    if batch.is_empty() {
        return Ok(batch);
    }

    let mut derived = Vec::new();
    if batch.has_column(TEMPERATURE) {
        derived.push(temperature_category());
    }
    if batch.has_column(PRECIPITATION) {
        derived.push(precipitation_category());
    }
    if batch.has_column(UV_INDEX) {
        derived.push(uv_category());
    }
    if derived.is_empty() {
        return Ok(batch);
    }

    let frame = batch.frame.lazy().with_columns(derived).collect()?;
    Ok(ObservationBatch::new(frame))
}

fn temperature_category() -> Expr {
    let temperature = col(TEMPERATURE);
    when(temperature.clone().gt(lit(30.0)))
        .then(lit(TemperatureCategory::Hot.as_str()))
        .when(temperature.lt(lit(10.0)))
        .then(lit(TemperatureCategory::Cold.as_str()))
        .otherwise(lit(TemperatureCategory::Moderate.as_str()))
        .alias(TEMP_CATEGORY)
}

fn precipitation_category() -> Expr {
    let precipitation = col(PRECIPITATION);
    when(precipitation.clone().gt(lit(10.0)))
        .then(lit(PrecipitationCategory::Rainy.as_str()))
        .when(precipitation.gt(lit(0.0)))
        .then(lit(PrecipitationCategory::LightRain.as_str()))
        .otherwise(lit(PrecipitationCategory::Dry.as_str()))
        .alias(PRECIP_CATEGORY)
}

fn uv_category() -> Expr {
    let uv = col(UV_INDEX);
    when(uv.clone().gt_eq(lit(11.0)))
        .then(lit(UvCategory::Extreme.as_str()))
        .when(uv.clone().gt_eq(lit(8.0)))
        .then(lit(UvCategory::VeryHigh.as_str()))
        .when(uv.clone().gt_eq(lit(6.0)))
        .then(lit(UvCategory::High.as_str()))
        .when(uv.gt_eq(lit(3.0)))
        .then(lit(UvCategory::Moderate.as_str()))
        .otherwise(lit(UvCategory::Low.as_str()))
        .alias(UV_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::MemoryReporter;
    use crate::types::observation_batch::{DATE, TIME};

    fn strings(batch: &ObservationBatch, name: &str) -> Result<Vec<Option<String>>, PolarsError> {
        Ok(batch
            .frame
            .column(name)?
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    }

    fn raw_hourly() -> PolarsResult<ObservationBatch> {
        let frame = df!(
            TIME => [Some("01:00 AM"), Some("02:00 AM"), None, Some("01:00 AM"), Some("03:00 AM")],
            TEMPERATURE => [Some(12.0), Some(13.5), Some(11.0), Some(99.0), None],
            PRECIPITATION => [None, Some(0.4), Some(0.0), Some(0.0), Some(1.0)],
            UV_INDEX => [Some(0.0), Some(1.0), Some(0.0), Some(0.0), Some(2.0)],
            LOCATION => ["Paris", "Paris", "Paris", "Paris", "Paris"],
        )?;
        Ok(ObservationBatch::new(frame))
    }

    #[test]
    fn test_clean_drops_nulls_and_duplicates() -> Result<(), Box<dyn std::error::Error>> {
        let reporter = MemoryReporter::new();
        let cleaned = clean(raw_hourly()?, &reporter)?;

        assert_eq!(cleaned.height(), 2);
        assert_eq!(
            strings(&cleaned, TIME)?,
            vec![Some("01:00 AM".to_string()), Some("02:00 AM".to_string())]
        );
        // first arrival wins
        let temps = cleaned.float_values(TEMPERATURE)?.ok_or("temperature missing")?;
        assert_eq!(temps.get(0), Some(12.0));
        assert!(!cleaned.has_column(ARRIVAL_INDEX));
        assert!(reporter.contains("Cleaned data: 5 -> 2 rows"));
        Ok(())
    }

    #[test]
    fn test_clean_fills_numeric_nulls_with_zero() -> Result<(), Box<dyn std::error::Error>> {
        let cleaned = clean(raw_hourly()?, &MemoryReporter::new())?;
        let precipitation = cleaned
            .float_values(PRECIPITATION)?
            .ok_or("precipitation missing")?;
        assert_eq!(precipitation.null_count(), 0);
        assert_eq!(precipitation.get(0), Some(0.0));
        Ok(())
    }

    #[test]
    fn test_clean_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let reporter = MemoryReporter::new();
        let once = clean(raw_hourly()?, &reporter)?;
        let twice = clean(once.clone(), &reporter)?;

        assert!(once.same_contents(&twice));
        // only the first pass changed the row count
        assert_eq!(reporter.entries().len(), 1);
        Ok(())
    }

    #[test]
    fn test_clean_keeps_arrival_order() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            TIME => ["03:00 PM", "01:00 AM", "03:00 PM", "09:00 AM"],
            TEMPERATURE => [20.0, 8.0, 21.0, 14.0],
        )?;
        let cleaned = clean(ObservationBatch::new(frame), &MemoryReporter::new())?;
        assert_eq!(
            strings(&cleaned, TIME)?,
            vec![
                Some("03:00 PM".to_string()),
                Some("01:00 AM".to_string()),
                Some("09:00 AM".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn test_clean_daily_uses_date_key() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            DATE => [Some("2026-02-18"), None, Some("2026-02-18")],
            PRECIPITATION => [1.0, 2.0, 3.0],
        )?;
        let cleaned = clean(ObservationBatch::new(frame), &MemoryReporter::new())?;
        assert_eq!(cleaned.height(), 1);
        Ok(())
    }

    #[test]
    fn test_clean_empty_batch_is_noop() -> Result<(), Box<dyn std::error::Error>> {
        let reporter = MemoryReporter::new();
        let cleaned = clean(ObservationBatch::empty(), &reporter)?;
        assert!(cleaned.is_empty());
        assert!(reporter.entries().is_empty());
        Ok(())
    }

    #[test]
    fn test_enrich_precipitation_categories() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(PRECIPITATION => [0.0, 5.2, 12.5])?;
        let enriched = enrich(ObservationBatch::new(frame))?;
        assert_eq!(
            strings(&enriched, PRECIP_CATEGORY)?,
            vec![
                Some("Dry".to_string()),
                Some("Light_rain".to_string()),
                Some("Rainy".to_string())
            ]
        );
        assert!(!enriched.has_column(TEMP_CATEGORY));
        assert!(!enriched.has_column(UV_CATEGORY));
        Ok(())
    }

    #[test]
    fn test_enrich_temperature_and_uv_boundaries() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            TEMPERATURE => [30.0, 30.5, 9.9, 10.0, 22.0, 0.0],
            UV_INDEX => [2.9, 3.0, 6.0, 8.0, 11.0, 7.99],
        )?;
        let enriched = enrich(ObservationBatch::new(frame))?;

        let temps: Vec<String> = strings(&enriched, TEMP_CATEGORY)?.into_iter().flatten().collect();
        assert_eq!(temps, ["Moderate", "Hot", "Cold", "Moderate", "Moderate", "Cold"]);

        let uv: Vec<String> = strings(&enriched, UV_CATEGORY)?.into_iter().flatten().collect();
        assert_eq!(uv, ["Low", "Moderate", "High", "Very High", "Extreme", "High"]);
        Ok(())
    }

    #[test]
    fn test_enrich_values_come_from_category_sets() -> Result<(), Box<dyn std::error::Error>> {
        let enriched = enrich(clean(raw_hourly()?, &MemoryReporter::new())?)?;
        let sets: [(&str, Vec<&str>); 3] = [
            (TEMP_CATEGORY, TemperatureCategory::ALL.iter().map(|c| c.as_str()).collect()),
            (PRECIP_CATEGORY, PrecipitationCategory::ALL.iter().map(|c| c.as_str()).collect()),
            (UV_CATEGORY, UvCategory::ALL.iter().map(|c| c.as_str()).collect()),
        ];
        for (column, allowed) in sets {
            let values = strings(&enriched, column)?;
            assert_eq!(values.len(), enriched.height());
            for value in values {
                let value = value.ok_or_else(|| format!("null in {column}"))?;
                assert!(allowed.contains(&value.as_str()), "{column}: unexpected {value}");
            }
        }
        Ok(())
    }
}
