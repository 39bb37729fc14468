use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use nutritrack::alerts::{Alert, AlertSeverity};
use nutritrack::composer::{InsightPriority, WellnessBand};
use nutritrack::engine::HealthReport;
use nutritrack::goals::GoalResult;
use nutritrack::logging::init_logging;
use nutritrack::trend::{TrendResult, UNKNOWN_ETA_DAYS};
use nutritrack::{input, AppConfig, HealthEngine, NutriError};

/// NutriTrack - Personal health analytics CLI
///
/// Analyzes weight, water and meal logs into trends, adaptive goals,
/// predictions, alerts and cross-metric insights.
#[derive(Parser)]
#[command(name = "nutritrack")]
#[command(version)]
#[command(about = "Personal health analytics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one subject
    Analyze {
        /// Subject JSON file
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Analyze a JSON array of subjects in parallel
    Batch {
        /// Batch JSON file
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Milestone ETA")]
    eta: String,
}

fn goal_cell(goal: &GoalResult, unit: &str) -> String {
    let source = if goal.is_manual() { "manual" } else { "auto" };
    format!("{:.1} {} ({})", goal.target, unit, source)
}

fn trend_cell(trend: &TrendResult) -> String {
    if trend.has_data() {
        format!("{} ({:+.2}/wk)", trend.direction, trend.slope_per_week)
    } else {
        "not enough data".to_string()
    }
}

fn eta_cell(days: u32) -> String {
    if days == UNKNOWN_ETA_DAYS {
        "unknown".to_string()
    } else {
        format!("{} days", days)
    }
}

fn alert_line(alert: &Alert) -> String {
    let title = match alert.severity {
        AlertSeverity::Success => alert.title.green().bold(),
        AlertSeverity::Info => alert.title.cyan().bold(),
        AlertSeverity::Warning => alert.title.yellow().bold(),
        AlertSeverity::Critical => alert.title.red().bold(),
    };
    match &alert.action {
        Some(action) => format!("  {} {}: {} {}", alert.icon, title, alert.message, action.dimmed()),
        None => format!("  {} {}: {}", alert.icon, title, alert.message),
    }
}

fn print_report(report: &HealthReport) {
    println!(
        "{}",
        format!("Health report for {} ({})", report.subject_id, report.today)
            .cyan()
            .bold()
    );

    let weight = &report.weight;
    let water = &report.water;
    let meals = &report.meals;
    let rows = vec![
        MetricRow {
            metric: "Weight".to_string(),
            current: weight
                .current_kg
                .map(|kg| format!("{:.1} kg", kg))
                .unwrap_or_else(|| "-".to_string()),
            goal: goal_cell(&weight.goal, "kg"),
            trend: trend_cell(&weight.trend),
            confidence: format!("{}%", weight.trend.confidence),
            eta: eta_cell(weight.prediction.eta_to_goal_days),
        },
        MetricRow {
            metric: "Water".to_string(),
            current: format!("{:.0} mL ({:.0}%)", water.today_ml, water.progress_pct),
            goal: goal_cell(&water.goal, "mL"),
            trend: trend_cell(&water.trend),
            confidence: format!("{}%", water.trend.confidence),
            eta: eta_cell(water.trend.next_milestone.eta_days),
        },
        MetricRow {
            metric: "Calories".to_string(),
            current: format!(
                "{:.0} kcal ({:.0}%)",
                meals.today.calories, meals.calorie_progress_pct
            ),
            goal: goal_cell(&meals.targets.calories, "kcal"),
            trend: trend_cell(&meals.trend),
            confidence: format!("{}%", meals.trend.confidence),
            eta: eta_cell(meals.trend.next_milestone.eta_days),
        },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    println!(
        "Macros target: {:.0} g protein, {:.0} g carbs, {:.0} g fat",
        meals.targets.protein_g, meals.targets.carbs_g, meals.targets.fat_g
    );
    if let Some(bmi) = weight.bmi {
        println!("BMI: {:.1}", bmi);
    }
    println!(
        "Projection: {:.1} kg in 30 days, {:.1} kg in 90 days",
        weight.prediction.horizon_30, weight.prediction.horizon_90
    );

    let alerts: Vec<&Alert> = weight
        .alerts
        .iter()
        .chain(&water.alerts)
        .chain(&meals.alerts)
        .collect();
    if !alerts.is_empty() {
        println!("\n{}", "Alerts".bold());
        for alert in alerts {
            println!("{}", alert_line(alert));
        }
    }

    let composite = &report.composite;
    if !composite.insights.is_empty() {
        println!("\n{}", "Insights".bold());
        for insight in &composite.insights {
            let marker = match insight.priority {
                InsightPriority::High => "!!".red(),
                InsightPriority::Medium => "! ".yellow(),
                InsightPriority::Low => "  ".normal(),
            };
            println!("  {} {}: {}", marker, insight.title.bold(), insight.message);
        }
    }

    let band = composite.wellness_band.to_string();
    let band = match composite.wellness_band {
        WellnessBand::Excellent | WellnessBand::VeryGood => band.green(),
        WellnessBand::Good => band.yellow(),
        WellnessBand::NeedsAttention => band.red(),
    };
    println!(
        "\nWellness score: {} ({})",
        composite.wellness_score.to_string().bold(),
        band
    );
}

/// Log a library error at its severity and turn it into a user-facing error
fn report_error(err: NutriError) -> anyhow::Error {
    let level = err.severity().to_tracing_level();
    if level == tracing::Level::ERROR {
        tracing::error!(error = %err, "Command failed");
    } else if level == tracing::Level::WARN {
        tracing::warn!(error = %err, "Command failed");
    } else {
        tracing::info!(error = %err, "Command failed");
    }
    anyhow::anyhow!(err.user_message())
}

/// An explicit path must load, unless the file is about to be created
fn load_config(path: Option<&PathBuf>, creating: bool) -> Result<AppConfig> {
    match path {
        Some(path) if creating && !path.exists() => Ok(AppConfig::default()),
        Some(path) => AppConfig::load_from_file(path),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let creating = matches!(cli.command, Commands::Config { init: true, .. });
    let mut config = load_config(cli.config.as_ref(), creating)?;
    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    let engine = HealthEngine::with_config(config.engine.clone());

    match cli.command {
        Commands::Analyze { input: path, format } => {
            let subject = input::load_subject(&path).map_err(report_error)?;
            let report = engine.analyze(&subject);
            match format {
                OutputFormat::Table => print_report(&report),
                OutputFormat::Json => {
                    println!("{}", report.to_json_pretty().map_err(report_error)?)
                }
            }
        }

        Commands::Batch { input: path, format } => {
            let subjects = input::load_batch(&path).map_err(report_error)?;
            let reports = engine.analyze_batch(&subjects);
            match format {
                OutputFormat::Table => {
                    for report in &reports {
                        print_report(report);
                        println!();
                    }
                }
                OutputFormat::Json => {
                    for report in &reports {
                        println!("{}", report.to_json_line().map_err(report_error)?);
                    }
                }
            }
            eprintln!(
                "{}",
                format!("✓ Analyzed {} subjects", reports.len()).green()
            );
        }

        Commands::Config { init, show } => {
            if init {
                let path = cli
                    .config
                    .clone()
                    .unwrap_or_else(AppConfig::default_config_path);
                config.save_to_file(&path)?;
                println!("{} {}", "✓ Wrote configuration to".green(), path.display());
            }
            if show || !init {
                println!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to encode configuration")?
                );
            }
        }
    }

    Ok(())
}
