use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueHint};

use crate::forest::random_forest::RandomForestParameters;
use crate::forest::tree::TreeParameters;
use crate::tasks::train::{ReportFormat, TrainTask};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Crop recommendation from soil nutrients and short-range weather forecasts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train a model on a historical dataset and serialize it
    Train(TrainArgs),
    /// Recommend crops for one set of soil and climate inputs
    Recommend(RecommendArgs),
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Historical dataset (CSV with columns N,P,K,temperature,humidity,ph,rainfall,label)
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub data: PathBuf,

    /// Where to write the trained model artifact
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub model: PathBuf,

    /// Number of trees in the ensemble
    #[arg(
        long,
        default_value_t = 100,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub trees: u64,

    /// Seed for the train/test split and the ensemble randomness
    #[arg(long, default_value_t = 42, value_name = "SEED")]
    pub seed: u64,

    /// Limit tree depth (omit to grow until pure)
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// File to dump the training report after completion
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub report_file: Option<PathBuf>,

    /// Format for the report file (json, csv)
    #[arg(long, value_name = "FORMAT")]
    pub report_format: Option<String>,
}

impl TrainArgs {
    pub fn into_task(self) -> Result<(TrainTask, Option<(PathBuf, ReportFormat)>)> {
        let parameters = RandomForestParameters {
            trees: self.trees as usize,
            tree: TreeParameters {
                max_depth: self.max_depth,
                ..TreeParameters::default()
            },
            seed: self.seed,
        };
        let task = TrainTask::new(self.data, self.model, parameters)
            .context("invalid training configuration")?;

        let report = match self.report_file {
            Some(path) => {
                let format = match self.report_format.as_deref() {
                    Some(raw) => raw
                        .trim()
                        .to_lowercase()
                        .parse::<ReportFormat>()
                        .map_err(|_| anyhow::anyhow!("unknown report format '{raw}'"))?,
                    None => ReportFormat::default(),
                };
                Some((path, format))
            }
            None => None,
        };
        Ok((task, report))
    }
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Trained model artifact
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub model: PathBuf,

    /// Soil nitrogen content
    #[arg(short = 'n', long, value_name = "VALUE")]
    pub nitrogen: f64,

    /// Soil phosphorus content
    #[arg(short = 'p', long, value_name = "VALUE")]
    pub phosphorus: f64,

    /// Soil potassium content
    #[arg(short = 'k', long, value_name = "VALUE")]
    pub potassium: f64,

    /// Soil pH
    #[arg(long, value_name = "VALUE")]
    pub ph: f64,

    /// Average temperature in °C (manual climate entry)
    #[arg(long, value_name = "CELSIUS", requires_all = ["humidity", "rainfall"])]
    pub temperature: Option<f64>,

    /// Average relative humidity in % (manual climate entry)
    #[arg(long, value_name = "PERCENT", requires_all = ["temperature", "rainfall"])]
    pub humidity: Option<f64>,

    /// Total rainfall in mm (manual climate entry)
    #[arg(long, value_name = "MM", requires_all = ["temperature", "humidity"])]
    pub rainfall: Option<f64>,

    /// Fetch the climate features from the forecast for this city instead
    #[arg(
        long,
        value_name = "NAME",
        conflicts_with_all = ["temperature", "humidity", "rainfall"],
    )]
    pub city: Option<String>,

    /// OpenWeather API key (falls back to OPENWEATHER_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// How many ranked candidates to show
    #[arg(
        long,
        default_value_t = 3,
        value_name = "K",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub top: u64,

    /// Print only the single best crop, without confidence
    #[arg(long)]
    pub single: bool,
}

/// Where the three climate features come from for one recommendation.
#[derive(Debug, Clone)]
pub enum ClimateSource {
    Manual {
        temperature: f64,
        humidity: f64,
        rainfall: f64,
    },
    Forecast {
        city: String,
        api_key: String,
    },
}

/// A fully-resolved recommendation request, produced by either the CLI
/// arguments or the interactive wizard.
#[derive(Debug)]
pub struct RecommendPlan {
    pub model: PathBuf,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    pub climate: ClimateSource,
    pub top: usize,
    pub single: bool,
}

impl RecommendArgs {
    pub fn into_plan(self) -> Result<RecommendPlan> {
        let climate = match (self.city, self.temperature, self.humidity, self.rainfall) {
            (Some(city), None, None, None) => ClimateSource::Forecast {
                api_key: resolve_api_key(self.api_key)?,
                city,
            },
            (None, Some(temperature), Some(humidity), Some(rainfall)) => ClimateSource::Manual {
                temperature,
                humidity,
                rainfall,
            },
            _ => bail!("provide either --city or all of --temperature, --humidity and --rainfall"),
        };

        Ok(RecommendPlan {
            model: self.model,
            nitrogen: self.nitrogen,
            phosphorus: self.phosphorus,
            potassium: self.potassium,
            ph: self.ph,
            climate,
            top: self.top as usize,
            single: self.single,
        })
    }
}

pub fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    if let Some(key) = explicit
        && !key.trim().is_empty()
    {
        return Ok(key);
    }
    match std::env::var("OPENWEATHER_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("no API key: pass --api-key or set OPENWEATHER_API_KEY"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "cosecha",
            "recommend",
            "--model",
            "model.json",
            "-n",
            "90",
            "-p",
            "42",
            "-k",
            "43",
            "--ph",
            "6.5",
        ]
    }

    #[test]
    fn manual_climate_builds_a_plan() {
        let mut argv = base_args();
        argv.extend(["--temperature", "22", "--humidity", "80", "--rainfall", "200"]);
        let cli = Cli::try_parse_from(argv).unwrap();
        let Some(Command::Recommend(args)) = cli.command else {
            panic!("expected recommend");
        };
        let plan = args.into_plan().unwrap();
        assert!(matches!(
            plan.climate,
            ClimateSource::Manual {
                temperature: 22.0,
                humidity: 80.0,
                rainfall: 200.0
            }
        ));
        assert_eq!(plan.top, 3);
        assert!(!plan.single);
    }

    #[test]
    fn city_conflicts_with_manual_climate() {
        let mut argv = base_args();
        argv.extend(["--city", "Mumbai", "--temperature", "22"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn partial_manual_climate_is_rejected() {
        let mut argv = base_args();
        argv.extend(["--temperature", "22"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn neither_city_nor_climate_is_rejected() {
        let cli = Cli::try_parse_from(base_args()).unwrap();
        let Some(Command::Recommend(args)) = cli.command else {
            panic!("expected recommend");
        };
        assert!(args.into_plan().is_err());
    }

    #[test]
    fn city_plan_uses_explicit_api_key() {
        let mut argv = base_args();
        argv.extend(["--city", "Mumbai", "--api-key", "secret", "--top", "5"]);
        let cli = Cli::try_parse_from(argv).unwrap();
        let Some(Command::Recommend(args)) = cli.command else {
            panic!("expected recommend");
        };
        let plan = args.into_plan().unwrap();
        match plan.climate {
            ClimateSource::Forecast { city, api_key } => {
                assert_eq!(city, "Mumbai");
                assert_eq!(api_key, "secret");
            }
            other => panic!("expected forecast source, got {other:?}"),
        }
        assert_eq!(plan.top, 5);
    }

    #[test]
    fn top_zero_is_rejected_by_the_parser() {
        let mut argv = base_args();
        argv.extend(["--city", "Mumbai", "--top", "0"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn train_args_build_a_task_with_report() {
        let cli = Cli::try_parse_from([
            "cosecha",
            "train",
            "--data",
            "crops.csv",
            "--model",
            "model.json",
            "--trees",
            "50",
            "--seed",
            "7",
            "--report-file",
            "report.csv",
            "--report-format",
            "csv",
        ])
        .unwrap();
        let Some(Command::Train(args)) = cli.command else {
            panic!("expected train");
        };
        let (_task, report) = args.into_task().unwrap();
        let (path, format) = report.unwrap();
        assert_eq!(path, PathBuf::from("report.csv"));
        assert_eq!(format, ReportFormat::Csv);
    }

    #[test]
    fn unknown_report_format_is_rejected() {
        let cli = Cli::try_parse_from([
            "cosecha",
            "train",
            "--data",
            "crops.csv",
            "--model",
            "model.json",
            "--report-file",
            "r.yaml",
            "--report-format",
            "yaml",
        ])
        .unwrap();
        let Some(Command::Train(args)) = cli.command else {
            panic!("expected train");
        };
        assert!(args.into_task().is_err());
    }
}
