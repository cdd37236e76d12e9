//! Structural and value-range checks gating a batch before it is persisted or alerted on.

use crate::reporting::Reporter;
use crate::types::observation_batch::{
    is_numeric, ObservationBatch, PRECIPITATION, TEMPERATURE, UV_INDEX,
};

/// Columns every batch must carry to be evaluated.
pub const REQUIRED_COLUMNS: [&str; 3] = [TEMPERATURE, PRECIPITATION, UV_INDEX];

const MAX_TEMPERATURE: f64 = 60.0;
const MAX_UV_INDEX: f64 = 15.0;

/// Outcome of [`validate`]. `is_valid` is `true` exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Checks that a batch is structurally complete and physically plausible.
///
/// An empty batch or one missing a required column fails with that single error and no
/// range checks are run. Otherwise every range check runs and all violations are
/// collected. The outcome is reported at error level on failure, info on success.
pub fn validate(batch: &ObservationBatch, reporter: &dyn Reporter) -> ValidationReport {
    let report = ValidationReport::from_errors(collect_errors(batch));
    if report.is_valid {
        reporter.info("✅ Data validation passed");
    } else {
        reporter.error(&format!(
            "❌ Data validation failed: {}",
            report.errors.join("; ")
        ));
    }
    report
}

fn collect_errors(batch: &ObservationBatch) -> Vec<String> {
    if batch.is_empty() {
        return vec!["DataFrame is empty".to_string()];
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| !batch.has_column(name))
        .collect();
    if !missing.is_empty() {
        return vec![format!("Missing required columns: {:?}", missing)];
    }

    let (temperature, precipitation, uv_index) = match (
        numeric(batch, TEMPERATURE),
        numeric(batch, PRECIPITATION),
        numeric(batch, UV_INDEX),
    ) {
        (Ok(t), Ok(p), Ok(uv)) => (t, p, uv),
        (t, p, uv) => {
            return [t.err(), p.err(), uv.err()].into_iter().flatten().collect();
        }
    };

    let mut errors = Vec::new();
    if temperature.iter().any(|&t| t > MAX_TEMPERATURE) {
        errors.push("Invalid temperature values (> 60°C)".to_string());
    }
    if precipitation.iter().any(|&p| p < 0.0) {
        errors.push("Negative precipitation values".to_string());
    }
    if uv_index.iter().any(|&uv| uv < 0.0) {
        errors.push("Negative UV index values".to_string());
    }
    if uv_index.iter().any(|&uv| uv > MAX_UV_INDEX) {
        errors.push("Invalid UV index values (> 15)".to_string());
    }
    errors
}

/// Non-null values of a present column, or a structural error if it is not numeric.
fn numeric(batch: &ObservationBatch, name: &str) -> Result<Vec<f64>, String> {
    let not_numeric = || format!("Non-numeric values in column {name}");
    let Ok(column) = batch.frame.column(name) else {
        return Ok(Vec::new());
    };
    if !is_numeric(column.dtype()) {
        return Err(not_numeric());
    }
    match batch.float_values(name) {
        Ok(Some(values)) => Ok(values.into_iter().flatten().collect()),
        Ok(None) => Ok(Vec::new()),
        Err(_) => Err(not_numeric()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::MemoryReporter;
    use log::Level;
    use polars::prelude::*;

    #[test]
    fn test_validate_empty_batch() {
        let reporter = MemoryReporter::new();
        let report = validate(&ObservationBatch::empty(), &reporter);
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec!["DataFrame is empty".to_string()]);
        assert_eq!(reporter.messages_at(Level::Error).len(), 1);
    }

    #[test]
    fn test_validate_missing_column_skips_range_checks() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            TEMPERATURE => [75.0],
            PRECIPITATION => [-1.0],
        )?;
        let report = validate(&ObservationBatch::new(frame), &MemoryReporter::new());
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0], "Missing required columns: [\"uv_index\"]");
        Ok(())
    }

    #[test]
    fn test_validate_collects_every_range_error() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            TEMPERATURE => [61.0, 20.0],
            PRECIPITATION => [0.0, -0.5],
            UV_INDEX => [-1.0, 16.0],
        )?;
        let report = validate(&ObservationBatch::new(frame), &MemoryReporter::new());
        assert_eq!(
            report.errors,
            vec![
                "Invalid temperature values (> 60°C)",
                "Negative precipitation values",
                "Negative UV index values",
                "Invalid UV index values (> 15)",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_validate_passes_at_bounds() -> Result<(), Box<dyn std::error::Error>> {
        let reporter = MemoryReporter::new();
        let frame = df!(
            TEMPERATURE => [60.0, -20.0],
            PRECIPITATION => [0.0, 40.0],
            UV_INDEX => [0.0, 15.0],
        )?;
        let report = validate(&ObservationBatch::new(frame), &reporter);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(reporter.contains("Data validation passed"));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_text_measurements() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            TEMPERATURE => ["hot"],
            PRECIPITATION => [0.0],
            UV_INDEX => [1.0],
        )?;
        let report = validate(&ObservationBatch::new(frame), &MemoryReporter::new());
        assert_eq!(
            report.errors,
            vec!["Non-numeric values in column temperature".to_string()]
        );
        Ok(())
    }
}
