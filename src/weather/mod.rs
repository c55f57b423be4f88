pub mod aggregator;
pub mod open_weather;

pub use aggregator::{ForecastPoint, WeatherAggregate, aggregate};
pub use open_weather::{ForecastProvider, OpenWeatherClient, parse_forecast};
