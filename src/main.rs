use anyhow::{Context, Result, bail};
use clap::Parser;

use cosecha::core::features::FeatureVector;
use cosecha::inference::{InferenceEngine, Recommendation};
use cosecha::ui::cli::args::{Cli, ClimateSource, Command, RecommendPlan, TrainArgs};
use cosecha::ui::cli::wizard;
use cosecha::weather::{ForecastProvider, OpenWeatherClient, aggregate};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const FG_CYAN: &str = "\x1b[36m";
const FG_GREEN: &str = "\x1b[32m";
const FG_MAGENTA: &str = "\x1b[35m";
const FG_GREY: &str = "\x1b[90m";

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Train(args)) => run_train(args),
        Some(Command::Recommend(args)) => {
            run_recommend(args.into_plan().context("invalid recommend arguments")?)
        }
        None => {
            let plan = wizard::prompt_plan().context("failed while prompting for inputs")?;
            run_recommend(plan)
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let (task, report_out) = args.into_task()?;

    println!("{BOLD}{FG_CYAN}▶ Training{RESET}  {}", timestamp_now());
    println!(
        "{FG_GREY}────────────────────────────────────────────────────────────────{RESET}"
    );

    let report = task.run().context("training failed")?;

    println!(
        "{FG_GREEN}{BOLD}instances{RESET} {:>6}  {DIM}train{RESET} {:>6}  {DIM}test{RESET} {:>5}  \
         {FG_MAGENTA}{BOLD}classes{RESET} {:>3}",
        report.instances, report.train_instances, report.test_instances, report.classes
    );
    println!(
        "{FG_CYAN}{BOLD}accuracy{RESET} {:>6.2}%  {DIM}cpu{RESET} {:.3}s",
        report.test_accuracy * 100.0,
        report.cpu_seconds
    );

    if let Some((path, format)) = report_out {
        report
            .export(&path, format)
            .with_context(|| format!("failed to export report to {}", path.display()))?;
        println!("{DIM}report written to {}{RESET}", path.display());
    }
    Ok(())
}

fn run_recommend(plan: RecommendPlan) -> Result<()> {
    let engine = InferenceEngine::from_artifact_path(&plan.model)
        .with_context(|| format!("cannot load model from {}", plan.model.display()))?;

    let (temperature, humidity, rainfall) = match &plan.climate {
        ClimateSource::Manual {
            temperature,
            humidity,
            rainfall,
        } => (*temperature, *humidity, *rainfall),
        ClimateSource::Forecast { city, api_key } => {
            let client = OpenWeatherClient::new(api_key.clone())?;
            let points = client
                .forecast(city)
                .with_context(|| format!("forecast lookup failed for '{city}'"))?;
            let Some(agg) = aggregate(&points) else {
                bail!("no forecast data for '{city}', cannot predict");
            };
            println!(
                "{BOLD}{FG_CYAN}▶ Forecast for {city}{RESET}  \
                 {DIM}temp{RESET} {:.1}°C  {DIM}humidity{RESET} {:.1}%  {DIM}rain{RESET} {:.1}mm",
                agg.avg_temperature, agg.avg_humidity, agg.total_rainfall
            );
            (agg.avg_temperature, agg.avg_humidity, agg.total_rainfall)
        }
    };

    let features = FeatureVector::new(
        plan.nitrogen,
        plan.phosphorus,
        plan.potassium,
        temperature,
        humidity,
        plan.ph,
        rainfall,
    );

    if plan.single {
        let label = engine.predict_single(&features)?;
        println!("{BOLD}{FG_GREEN}Recommended crop:{RESET} {label}");
        return Ok(());
    }

    let ranked = engine.predict_top_k(&features, plan.top)?;
    println!("{BOLD}{FG_GREEN}▶ Recommended crops{RESET}");
    for (rank, recommendation) in ranked.iter().enumerate() {
        println!("{}", format_recommendation(rank + 1, recommendation));
    }
    Ok(())
}

fn format_recommendation(rank: usize, recommendation: &Recommendation) -> String {
    format!(
        "  {DIM}{rank}.{RESET} {BOLD}{:<14}{RESET} {} {:>5.1}%",
        recommendation.label,
        confidence_bar(recommendation.probability, 20),
        recommendation.probability * 100.0
    )
}

fn confidence_bar(probability: f64, width: usize) -> String {
    let ratio = probability.clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

fn timestamp_now() -> String {
    use chrono::{Local, SecondsFormat};
    let now = Local::now();
    format!("{DIM}{}{RESET}", now.to_rfc3339_opts(SecondsFormat::Secs, true))
}
