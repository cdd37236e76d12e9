//! Blocking client for the Open-Meteo forecast endpoint.
//!
//! The pipeline only depends on the [`WeatherSource`] trait, so tests can substitute a
//! fixture source and never touch the network.

use crate::extract::error::FetchError;
use crate::extract::response::ForecastResponse;
use crate::types::frequency::Frequency;
use crate::types::location::LatLon;
use bon::bon;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use std::time::Duration;

/// Public Open-Meteo API root.
pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Which days a forecast request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastWindow {
    /// A single calendar day, sent as `start_date == end_date`.
    Day(NaiveDate),
    /// An inclusive range of days.
    Range { start: NaiveDate, end: NaiveDate },
    /// The next `n` days starting today, sent as `forecast_days`.
    Upcoming(u32),
}

impl ForecastWindow {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            ForecastWindow::Day(day) => vec![
                ("start_date", day.to_string()),
                ("end_date", day.to_string()),
            ],
            ForecastWindow::Range { start, end } => vec![
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ],
            ForecastWindow::Upcoming(days) => vec![("forecast_days", days.to_string())],
        }
    }
}

/// Anything able to produce a raw forecast for a location.
pub trait WeatherSource {
    fn fetch(
        &self,
        location: LatLon,
        window: ForecastWindow,
        frequency: Frequency,
    ) -> Result<ForecastResponse, FetchError>;
}

/// Client for `GET <base_url>/forecast`.
///
/// # Examples
///
/// ```no_run
/// use weather_alerts::{Frequency, LatLon, OpenMeteoClient};
/// use chrono::NaiveDate;
///
/// # fn run() -> Result<(), weather_alerts::FetchError> {
/// let client = OpenMeteoClient::builder().build()?;
/// let paris = LatLon(48.8566, 2.3522);
///
/// // Hourly observations for one day
/// let today = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
/// let hourly = client.day(paris, today)?;
///
/// // Daily forecast for the next 3 days
/// let daily = client.forecast().location(paris).days(3).call()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    base_url: String,
}

#[bon]
impl OpenMeteoClient {
    /// Builds a client. `base_url` defaults to [`OPEN_METEO_BASE_URL`] and `timeout` to 30 seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the underlying HTTP client cannot be constructed.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| OPEN_METEO_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Hourly observations for a single day.
    pub fn day(&self, location: LatLon, day: NaiveDate) -> Result<ForecastResponse, FetchError> {
        self.fetch(location, ForecastWindow::Day(day), Frequency::Hourly)
    }

    /// Daily forecast for the upcoming days. `days` defaults to 7.
    #[builder]
    pub fn forecast(&self, location: LatLon, days: Option<u32>) -> Result<ForecastResponse, FetchError> {
        self.fetch(
            location,
            ForecastWindow::Upcoming(days.unwrap_or(DEFAULT_FORECAST_DAYS)),
            Frequency::Daily,
        )
    }

    /// Daily values between `start` and `end`, both inclusive.
    #[builder]
    pub fn historical(
        &self,
        location: LatLon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ForecastResponse, FetchError> {
        self.fetch(location, ForecastWindow::Range { start, end }, Frequency::Daily)
    }

    fn forecast_url(&self) -> String {
        format!("{}/forecast", self.base_url)
    }
}

impl WeatherSource for OpenMeteoClient {
    fn fetch(
        &self,
        location: LatLon,
        window: ForecastWindow,
        frequency: Frequency,
    ) -> Result<ForecastResponse, FetchError> {
        let url = self.forecast_url();
        let mut query = vec![
            ("latitude", location.latitude().to_string()),
            ("longitude", location.longitude().to_string()),
            (frequency.query_key(), frequency.variables().join(",")),
            ("timezone", "auto".to_string()),
        ];
        query.extend(window.query_pairs());

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url, e)
                });
            }
        };

        response
            .json::<ForecastResponse>()
            .map_err(|e| FetchError::Decode(url, e))
    }
}
