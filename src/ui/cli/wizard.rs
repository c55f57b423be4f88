use std::path::PathBuf;

use anyhow::{Context, Result};
use inquire::{Confirm, CustomType, Select, Text};

use crate::ui::cli::args::{ClimateSource, RecommendPlan, resolve_api_key};

const FORECAST_MODE: &str = "Forecast for a city";
const MANUAL_MODE: &str = "Enter climate manually";

/// Interactive fallback when the binary is started without a subcommand:
/// collects the same inputs the `recommend` command takes from flags.
pub fn prompt_plan() -> Result<RecommendPlan> {
    let model: PathBuf = Text::new("Model artifact path:")
        .with_default("model.json")
        .prompt()
        .context("failed while prompting for model path")?
        .into();

    let nitrogen = prompt_value("Nitrogen (N):", 90.0)?;
    let phosphorus = prompt_value("Phosphorus (P):", 42.0)?;
    let potassium = prompt_value("Potassium (K):", 43.0)?;
    let ph = prompt_value("Soil pH:", 6.5)?;

    let mode = Select::new("Climate inputs:", vec![FORECAST_MODE, MANUAL_MODE])
        .with_help_message("The forecast flow averages a 5-day forecast for your city")
        .prompt()
        .context("failed while prompting for climate mode")?;

    let climate = if mode == FORECAST_MODE {
        let city = Text::new("City name:")
            .with_placeholder("e.g. Mumbai")
            .prompt()
            .context("failed while prompting for city")?;
        let api_key = Text::new("OpenWeather API key:")
            .with_help_message("Leave blank to use OPENWEATHER_API_KEY")
            .prompt()
            .context("failed while prompting for API key")?;
        let api_key = resolve_api_key(if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key)
        })?;
        ClimateSource::Forecast { city, api_key }
    } else {
        ClimateSource::Manual {
            temperature: prompt_value("Average temperature (°C):", 22.0)?,
            humidity: prompt_value("Average humidity (%):", 80.0)?,
            rainfall: prompt_value("Total rainfall (mm):", 200.0)?,
        }
    };

    let single = Confirm::new("Show only the single best crop?")
        .with_default(false)
        .prompt()
        .context("failed while prompting for output mode")?;

    Ok(RecommendPlan {
        model,
        nitrogen,
        phosphorus,
        potassium,
        ph,
        climate,
        top: 3,
        single,
    })
}

fn prompt_value(label: &str, default: f64) -> Result<f64> {
    CustomType::<f64>::new(label)
        .with_default(default)
        .with_error_message("enter a number")
        .prompt()
        .with_context(|| format!("failed while prompting for '{label}'"))
}
