//! Rule-based alert generation
//!
//! Each rule inspects one aspect of a metric's analysis and appends at most
//! one alert. Alerts are ranked by severity, except that success alerts are
//! always surfaced first.

use crate::models::{BmiCategory, MetricKind, Objective};
use crate::trend::{Consistency, TrendDirection, TrendResult, Velocity};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

/// Regularity below which a logging reminder is raised
const LOW_REGULARITY_PCT: u32 = 50;

/// Minimum logged days before regularity is judged
const MIN_DAYS_FOR_REGULARITY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Success,
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    /// Ordering rank, higher is more severe
    pub fn rank(&self) -> u8 {
        match self {
            AlertSeverity::Success => 0,
            AlertSeverity::Info => 1,
            AlertSeverity::Warning => 2,
            AlertSeverity::Critical => 3,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Success => write!(f, "success"),
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Human-readable alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub icon: String,

    /// Suggested follow-up for the subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Alert {
    fn new(severity: AlertSeverity, title: &str, message: String, icon: &str) -> Self {
        Alert {
            severity,
            title: title.to_string(),
            message,
            icon: icon.to_string(),
            action: None,
        }
    }

    fn with_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }
}

/// Alert thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Distance to the weight goal counted as reached (kg)
    pub weight_tolerance_kg: f64,

    /// Distance to the daily water goal counted as reached (mL)
    pub water_tolerance_ml: f64,

    /// Distance to the daily calorie goal counted as reached (kcal)
    pub calorie_tolerance_kcal: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            weight_tolerance_kg: 0.5,
            water_tolerance_ml: 150.0,
            calorie_tolerance_kcal: 100.0,
        }
    }
}

impl AlertConfig {
    pub fn tolerance_for(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Weight => self.weight_tolerance_kg,
            MetricKind::Water => self.water_tolerance_ml,
            MetricKind::Meal => self.calorie_tolerance_kcal,
        }
    }
}

/// Current value against a goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalProximity {
    pub current: f64,
    pub goal: f64,
    pub tolerance: f64,
}

/// Inputs for one metric; rules whose inputs are absent are skipped
#[derive(Debug, Clone, Copy)]
pub struct AlertContext<'a> {
    pub metric: MetricKind,
    pub proximity: Option<GoalProximity>,
    pub bmi: Option<f64>,

    /// Trend and objective for the trend-vs-objective rule
    pub trend_objective: Option<(&'a TrendResult, Objective)>,

    /// Trend for the consistency rule
    pub consistency: Option<&'a TrendResult>,

    /// Logging regularity as (percent, days logged)
    pub regularity: Option<(u32, u32)>,
}

impl<'a> AlertContext<'a> {
    pub fn new(metric: MetricKind) -> Self {
        AlertContext {
            metric,
            proximity: None,
            bmi: None,
            trend_objective: None,
            consistency: None,
            regularity: None,
        }
    }
}

fn unit(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Weight => "kg",
        MetricKind::Water => "mL",
        MetricKind::Meal => "kcal",
    }
}

/// Evaluates alert rules
pub struct AlertGenerator;

impl AlertGenerator {
    /// Run every applicable rule and return the ordered alerts
    pub fn generate(context: &AlertContext<'_>) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if let Some(proximity) = context.proximity {
            alerts.extend(Self::goal_proximity(context.metric, proximity));
        }
        if let Some(bmi) = context.bmi {
            alerts.extend(Self::bmi_classification(bmi));
        }
        if let Some((trend, objective)) = context.trend_objective {
            alerts.extend(Self::trend_vs_objective(trend, objective));
        }
        if let Some(trend) = context.consistency {
            alerts.extend(Self::consistency(trend));
        }
        if let Some((pct, days)) = context.regularity {
            alerts.extend(Self::regularity(context.metric, pct, days));
        }

        Self::order(&mut alerts);
        alerts
    }

    /// Severity descending, then every success alert moved to the front
    pub fn order(alerts: &mut [Alert]) {
        alerts.sort_by_key(|a| Reverse(a.severity.rank()));
        alerts.sort_by_key(|a| a.severity != AlertSeverity::Success);
    }

    fn goal_proximity(metric: MetricKind, proximity: GoalProximity) -> Option<Alert> {
        let GoalProximity {
            current,
            goal,
            tolerance,
        } = proximity;
        if !current.is_finite() || !goal.is_finite() {
            return None;
        }

        let distance = (current - goal).abs();
        let unit = unit(metric);

        if distance <= tolerance {
            Some(Alert::new(
                AlertSeverity::Success,
                "Goal reached",
                format!(
                    "Your {} of {:.1} {} is within {:.1} {} of the {:.1} {} goal.",
                    metric, current, unit, tolerance, unit, goal, unit
                ),
                "trophy",
            ))
        } else if distance <= 2.0 * tolerance {
            Some(Alert::new(
                AlertSeverity::Info,
                "Almost there",
                format!(
                    "Only {:.1} {} left to reach your {} goal of {:.1} {}.",
                    distance, unit, metric, goal, unit
                ),
                "target",
            ))
        } else {
            None
        }
    }

    fn bmi_classification(bmi: f64) -> Option<Alert> {
        if !bmi.is_finite() {
            return None;
        }

        match BmiCategory::from_bmi(bmi) {
            BmiCategory::Obesity => Some(
                Alert::new(
                    AlertSeverity::Critical,
                    "BMI in obesity range",
                    format!(
                        "Your BMI of {:.1} is in the obesity range. A supervised plan is recommended.",
                        bmi
                    ),
                    "alert-octagon",
                )
                .with_action("Schedule a consultation"),
            ),
            BmiCategory::Overweight => Some(Alert::new(
                AlertSeverity::Warning,
                "BMI above healthy range",
                format!("Your BMI of {:.1} is in the overweight range.", bmi),
                "alert-triangle",
            )),
            BmiCategory::Underweight => Some(Alert::new(
                AlertSeverity::Warning,
                "BMI below healthy range",
                format!("Your BMI of {:.1} is in the underweight range.", bmi),
                "alert-triangle",
            )),
            BmiCategory::Normal => None,
        }
    }

    fn trend_vs_objective(trend: &TrendResult, objective: Objective) -> Option<Alert> {
        if trend.velocity != Velocity::Fast {
            return None;
        }

        let desired = match objective {
            Objective::Lose => TrendDirection::Falling,
            Objective::Gain => TrendDirection::Rising,
            Objective::Maintain => TrendDirection::Flat,
        };

        match trend.direction {
            TrendDirection::Rising | TrendDirection::Falling if trend.direction == desired => {
                Some(Alert::new(
                    AlertSeverity::Info,
                    "Rapid change",
                    format!(
                        "You are changing quickly ({:+.2} per week). Make sure the pace is healthy.",
                        trend.slope_per_week
                    ),
                    "zap",
                ))
            }
            TrendDirection::Rising | TrendDirection::Falling => Some(
                Alert::new(
                    AlertSeverity::Warning,
                    "Contrary to goal",
                    format!(
                        "Your trend is {} quickly ({:+.2} per week) while your objective is to {}.",
                        trend.direction, trend.slope_per_week, objective
                    ),
                    "trending-up",
                )
                .with_action("Review your plan"),
            ),
            TrendDirection::Flat | TrendDirection::Oscillating => None,
        }
    }

    fn consistency(trend: &TrendResult) -> Option<Alert> {
        if trend.has_data() && trend.consistency == Consistency::VeryIrregular {
            Some(Alert::new(
                AlertSeverity::Warning,
                "Irregular measurements",
                "Your measurements vary a lot from day to day. Measure at the same time each day."
                    .to_string(),
                "activity",
            ))
        } else {
            None
        }
    }

    fn regularity(metric: MetricKind, pct: u32, days_logged: u32) -> Option<Alert> {
        if days_logged >= MIN_DAYS_FOR_REGULARITY && pct < LOW_REGULARITY_PCT {
            Some(
                Alert::new(
                    AlertSeverity::Info,
                    "Log more regularly",
                    format!("You logged {} on {}% of days. Regular logs improve your insights.", metric, pct),
                    "calendar",
                )
                .with_action("Enable daily reminders"),
            )
        } else {
            None
        }
    }
}
