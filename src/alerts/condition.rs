//! Threshold alert conditions and their evaluation against an observation batch.
//!
//! A condition aggregates one column of the batch to its maximum and compares that value
//! to a threshold. Conditions are immutable once built; every check produces a fresh
//! [`AlertResult`].

use crate::reporting::Reporter;
use crate::settings::Settings;
use crate::types::observation_batch::{
    ObservationBatch, DATE, PRECIPITATION, TEMPERATURE, UV_INDEX,
};
use bon::Builder;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::fmt;

/// How urgent a triggered alert is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Emoji prefix used by every notification channel.
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "ℹ️",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator between the aggregated value and the threshold.
///
/// Names that are not recognised are kept verbatim and never trigger.
///
/// # Examples
///
/// ```
/// use weather_alerts::Comparison;
///
/// assert_eq!(Comparison::from("gte"), Comparison::Gte);
/// assert!(Comparison::Gte.holds(8.0, 8.0));
/// assert!(!Comparison::from("between").holds(8.0, 8.0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Unrecognized(String),
}

impl Comparison {
    pub fn as_str(&self) -> &str {
        match self {
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::Eq => "eq",
            Comparison::Unrecognized(name) => name,
        }
    }

    /// `true` if `value <op> threshold` holds.
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Gte => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Lte => value <= threshold,
            Comparison::Eq => value == threshold,
            Comparison::Unrecognized(_) => false,
        }
    }
}

impl From<&str> for Comparison {
    fn from(name: &str) -> Self {
        match name {
            "gt" => Comparison::Gt,
            "gte" => Comparison::Gte,
            "lt" => Comparison::Lt,
            "lte" => Comparison::Lte,
            "eq" => Comparison::Eq,
            other => Comparison::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compares the maximum of `column` against `threshold`.
///
/// # Examples
///
/// ```
/// use weather_alerts::{Comparison, Severity, ThresholdCondition};
///
/// let condition = ThresholdCondition::builder()
///     .name("Frost")
///     .column("temperature")
///     .threshold(0.0)
///     .comparison("lte")
///     .severity(Severity::Critical)
///     .build();
///
/// assert_eq!(condition.comparison(), &Comparison::Lte);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ThresholdCondition {
    #[builder(into)]
    name: String,
    #[builder(into)]
    column: String,
    threshold: f64,
    #[builder(into, default = Comparison::Gt)]
    comparison: Comparison,
    #[builder(default = Severity::Warning)]
    severity: Severity,
}

impl ThresholdCondition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, batch: &ObservationBatch, reporter: &dyn Reporter) -> PolarsResult<AlertResult> {
        let values = match batch.float_values(&self.column)? {
            Some(values) if !batch.is_empty() => values,
            _ => {
                return Ok(AlertResult::not_triggered(
                    &self.name,
                    format!("Column {} not found or data is empty", self.column),
                ))
            }
        };

        let Some(value) = values.max() else {
            return Ok(AlertResult::not_triggered(
                &self.name,
                format!("{}: no numeric values in {}", self.name, self.column),
            ));
        };

        let triggered = self.comparison.holds(value, self.threshold);
        let message = if triggered {
            let message = format!(
                "{}: {}={:?} ({} threshold {:?})",
                self.name, self.column, value, self.comparison, self.threshold
            );
            reporter.warn(&message);
            message
        } else {
            format!("{}: OK ({}={:?})", self.name, self.column, value)
        };

        Ok(AlertResult {
            triggered,
            condition_name: self.name.clone(),
            message,
            severity: if triggered { self.severity } else { Severity::Info },
            value: Some(value),
            threshold: Some(self.threshold),
            date: first_date(batch)?,
        })
    }
}

/// Every kind of alert rule the engine can evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertCondition {
    Threshold(ThresholdCondition),
}

impl AlertCondition {
    pub fn name(&self) -> &str {
        match self {
            AlertCondition::Threshold(condition) => condition.name(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertCondition::Threshold(condition) => condition.severity(),
        }
    }

    /// Evaluates the condition. An empty batch, an absent column or a non-numeric column
    /// never triggers.
    pub fn check(
        &self,
        batch: &ObservationBatch,
        reporter: &dyn Reporter,
    ) -> PolarsResult<AlertResult> {
        match self {
            AlertCondition::Threshold(condition) => condition.check(batch, reporter),
        }
    }
}

impl From<ThresholdCondition> for AlertCondition {
    fn from(condition: ThresholdCondition) -> Self {
        AlertCondition::Threshold(condition)
    }
}

/// Outcome of evaluating one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertResult {
    pub triggered: bool,
    pub condition_name: String,
    pub message: String,
    /// The condition's severity when triggered, otherwise [`Severity::Info`].
    pub severity: Severity,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl AlertResult {
    fn not_triggered(condition_name: &str, message: String) -> Self {
        Self {
            triggered: false,
            condition_name: condition_name.to_string(),
            message,
            severity: Severity::Info,
            value: None,
            threshold: None,
            date: None,
        }
    }
}

fn first_date(batch: &ObservationBatch) -> PolarsResult<Option<NaiveDate>> {
    match batch.frame.column(DATE) {
        Ok(column) if column.dtype() == &DataType::Date => {
            Ok(column.date()?.as_date_iter().flatten().next())
        }
        _ => Ok(None),
    }
}

/// Evaluates every condition in order, returning one result per condition.
pub fn check_all_conditions(
    batch: &ObservationBatch,
    conditions: &[AlertCondition],
    reporter: &dyn Reporter,
) -> PolarsResult<Vec<AlertResult>> {
    conditions
        .iter()
        .map(|condition| {
            let result = condition.check(batch, reporter)?;
            if result.triggered {
                reporter.warn(&format!("Alert triggered: {}", result.message));
            }
            Ok(result)
        })
        .collect()
}

/// The three standard conditions, with thresholds taken from `settings`.
pub fn build_default_conditions(settings: &Settings) -> Vec<AlertCondition> {
    vec![
        ThresholdCondition::builder()
            .name("High Temperature")
            .column(TEMPERATURE)
            .threshold(settings.temp_max_threshold)
            .severity(Severity::Warning)
            .build()
            .into(),
        ThresholdCondition::builder()
            .name("UV Index")
            .column(UV_INDEX)
            .threshold(settings.uv_threshold)
            .severity(Severity::Critical)
            .build()
            .into(),
        ThresholdCondition::builder()
            .name("Heavy Precipitation")
            .column(PRECIPITATION)
            .threshold(settings.precipitation_threshold)
            .severity(Severity::Warning)
            .build()
            .into(),
    ]
}
