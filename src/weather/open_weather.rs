use std::time::Duration;

use serde::Deserialize;

use crate::error::{CosechaError, Result};
use crate::weather::aggregator::ForecastPoint;

const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/forecast";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of short-range forecast series for a named location. Implemented
/// over HTTP in production and by fixtures in tests.
pub trait ForecastProvider {
    fn forecast(&self, location: &str) -> Result<Vec<ForecastPoint>>;
}

/// Blocking client for the OpenWeather 5-day/3-hour forecast endpoint.
///
/// The request carries a client-side timeout so an unresponsive upstream
/// surfaces as a failure instead of hanging the caller. Every failure mode
/// maps to an upstream error; callers must block the downstream prediction
/// on it rather than substitute defaults.
pub struct OpenWeatherClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(CosechaError::Input("API key must not be empty".into()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CosechaError::Upstream(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different endpoint, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ForecastProvider for OpenWeatherClient {
    fn forecast(&self, location: &str) -> Result<Vec<ForecastPoint>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .map_err(|e| CosechaError::Upstream(format!("forecast request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CosechaError::Upstream(format!("cannot read forecast body: {e}")))?;

        if !status.is_success() {
            return Err(CosechaError::Upstream(upstream_message(&body, status)));
        }
        parse_forecast(&body)
    }
}

/// Decodes the forecast body into points. Kept separate from transport so
/// the wire format is testable offline.
pub fn parse_forecast(body: &str) -> Result<Vec<ForecastPoint>> {
    let response: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| CosechaError::Upstream(format!("unexpected forecast payload: {e}")))?;

    Ok(response
        .list
        .into_iter()
        .map(|entry| ForecastPoint {
            temperature: entry.main.temp,
            humidity: entry.main.humidity,
            rainfall: entry.rain.and_then(|r| r.three_hours),
        })
        .collect())
}

fn upstream_message(body: &str, status: reqwest::StatusCode) -> String {
    #[derive(Deserialize)]
    struct UpstreamError {
        message: Option<String>,
    }
    match serde_json::from_str::<UpstreamError>(body) {
        Ok(UpstreamError {
            message: Some(message),
        }) => format!("{status}: {message}"),
        _ => format!("forecast service answered {status}"),
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Deserialize)]
struct ForecastEntry {
    main: ForecastMain,
    #[serde(default)]
    rain: Option<ForecastRain>,
}

#[derive(Deserialize)]
struct ForecastMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct ForecastRain {
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}
