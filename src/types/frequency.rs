//! Defines the time granularity of Open-Meteo data and the variables requested for each.

use std::fmt;

/// Represents the time frequency or granularity of fetched weather data.
///
/// Selects which section of the forecast response is requested and therefore which
/// columns the resulting [`crate::ObservationBatch`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// One row per hour. Carries `time`, `temperature`, `precipitation` and `uv_index`.
    Hourly,
    /// One row per day. Carries `temp_max`, `temp_min`, `precipitation` and `wind_speed_max`.
    Daily,
}

impl Frequency {
    /// The query parameter name (and response section) for this frequency.
    pub(crate) fn query_key(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }

    /// Open-Meteo variable names requested for this frequency.
    pub(crate) fn variables(&self) -> Vec<&'static str> {
        match self {
            Frequency::Hourly => vec![
                "temperature_2m",
                "precipitation",
                "uv_index",
                "uv_index_clear_sky",
            ],
            Frequency::Daily => vec![
                "temperature_2m_max",
                "temperature_2m_min",
                "precipitation_sum",
                "wind_speed_10m_max",
            ],
        }
    }
}

/// Allows formatting a `Frequency` variant using its query key.
///
/// # Examples
///
/// ```
/// use weather_alerts::Frequency;
///
/// assert_eq!(format!("{}", Frequency::Hourly), "hourly");
/// assert_eq!(Frequency::Daily.to_string(), "daily");
/// ```
impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_joined_for_query() {
        assert_eq!(
            Frequency::Hourly.variables().join(","),
            "temperature_2m,precipitation,uv_index,uv_index_clear_sky"
        );
        assert_eq!(Frequency::Daily.variables().len(), 4);
    }
}
