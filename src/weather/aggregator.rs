use serde::{Deserialize, Serialize};

/// One forecast sample. `rainfall` is optional because the upstream feed
/// omits the rain block entirely for dry windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: Option<f64>,
}

/// The three climate features the model consumes, reduced from a multi-day
/// forecast series. Recomputed per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherAggregate {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub total_rainfall: f64,
}

/// Averages temperature and humidity over every point and sums rainfall.
///
/// A point with no rainfall reading contributes 0.0 to the sum and still
/// counts toward both averages. That defaulting is deliberate and lives only
/// here: everywhere else in the system a missing value fails loudly.
///
/// An empty series yields `None` — "no data", which callers must treat as
/// "cannot predict" rather than substituting guesses.
pub fn aggregate(points: &[ForecastPoint]) -> Option<WeatherAggregate> {
    if points.is_empty() {
        return None;
    }

    let count = points.len() as f64;
    let mut temperature_sum = 0.0;
    let mut humidity_sum = 0.0;
    let mut total_rainfall = 0.0;
    for point in points {
        temperature_sum += point.temperature;
        humidity_sum += point.humidity;
        total_rainfall += point.rainfall.unwrap_or(0.0);
    }

    Some(WeatherAggregate {
        avg_temperature: temperature_sum / count,
        avg_humidity: humidity_sum / count,
        total_rainfall,
    })
}
