//! Analysis pipeline
//!
//! Wires the components together per metric:
//!
//! ```text
//! raw logs -> Sanitizer -> {StatisticsAggregator, TrendAnalyzer}
//!          -> {Predictor, GoalEngine} -> AlertGenerator
//! ```
//!
//! and hands the three per-metric bundles to the [`CrossMetricComposer`].
//! Every function here is a pure transformation of its inputs; the only state
//! is the optional result cache of [`MemoizedEngine`].

use crate::alerts::{Alert, AlertConfig, AlertContext, AlertGenerator, GoalProximity};
use crate::composer::{CompositeReport, CrossMetricComposer};
use crate::goals::{GoalConfig, GoalEngine, GoalResult, NutritionGoal};
use crate::models::{
    BmiCategory, DailyIntake, ExternalSignals, MealEntry, MeasurementPoint, MetricKind, Profile,
    SubjectInput,
};
use crate::prediction::{Prediction, Predictor};
use crate::sanitize::Sanitizer;
use crate::statistics::{finite_or, StatisticsAggregator, StatisticsBundle};
use crate::trend::{TrendAnalyzer, TrendResult};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Engine settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub goals: GoalConfig,
    pub alerts: AlertConfig,
}

/// Body weight analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBundle {
    pub series: Vec<MeasurementPoint>,

    /// Latest sanitized reading
    pub current_kg: Option<f64>,

    /// Days between the latest reading and the reference day
    pub days_since_last_log: Option<i64>,

    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub statistics: StatisticsBundle,
    pub trend: TrendResult,
    pub goal: GoalResult,
    pub prediction: Prediction,
    pub alerts: Vec<Alert>,
}

/// Water intake analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterBundle {
    pub statistics: StatisticsBundle,
    pub trend: TrendResult,
    pub goal: GoalResult,

    /// Intake logged for the reference day
    pub today_ml: f64,

    /// Today's intake as a percentage of the target
    pub progress_pct: f64,

    /// Mean of the last 7 logged days as a percentage of the target
    pub average_7d_pct: Option<f64>,

    pub alerts: Vec<Alert>,
}

/// Meal and macro analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealBundle {
    pub daily: Vec<DailyIntake>,

    /// Statistics of the daily calorie series
    pub statistics: StatisticsBundle,

    /// Trend of the daily calorie series
    pub trend: TrendResult,

    pub targets: NutritionGoal,
    pub today: DailyIntake,

    /// Today's calories as a percentage of the target
    pub calorie_progress_pct: f64,

    /// Mean calories of the last 7 logged days as a percentage of the target
    pub calorie_adherence_7d_pct: Option<f64>,

    /// Mean protein of the last 7 logged days as a percentage of the target
    pub protein_adherence_7d_pct: Option<f64>,

    pub alerts: Vec<Alert>,
}

/// Full analysis of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub subject_id: String,
    pub today: NaiveDate,

    /// Profile after refreshing the weight from the latest log
    pub profile: Profile,

    pub weight: WeightBundle,
    pub water: WaterBundle,
    pub meals: MealBundle,
    pub composite: CompositeReport,
}

impl HealthReport {
    /// Indented JSON for a single report
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Single-line JSON, one report per line in batch output
    pub fn to_json_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// `part / whole * 100`, 0 when the ratio is undefined
fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        finite_or(part / whole * 100.0, 0.0)
    } else {
        0.0
    }
}

/// Stateless analytics engine
#[derive(Debug, Clone, Default)]
pub struct HealthEngine {
    goals: GoalEngine,
    alerts: AlertConfig,
}

impl HealthEngine {
    pub fn new() -> Self {
        HealthEngine::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        HealthEngine {
            goals: GoalEngine::with_config(config.goals),
            alerts: config.alerts,
        }
    }

    pub fn goals(&self) -> &GoalEngine {
        &self.goals
    }

    /// Analyze body weight logs
    pub fn analyze_weight(
        &self,
        logs: &[MeasurementPoint],
        profile: &Profile,
        manual_goal_kg: Option<f64>,
        today: NaiveDate,
    ) -> WeightBundle {
        let series = Sanitizer::sanitize(logs);
        let current_kg = series.last().map(|p| p.value);
        let profile = match current_kg {
            Some(weight) => profile.with_weight(weight),
            None => profile.clone(),
        };

        let statistics = StatisticsAggregator::aggregate(&series);
        let goal = self.goals.weight_target(&profile, manual_goal_kg);
        let trend = TrendAnalyzer::analyze(&series, Some(goal.target));
        let prediction = Predictor::predict(current_kg, Some(goal.target), &trend, &statistics);
        let bmi = profile.bmi();

        let mut context = AlertContext::new(MetricKind::Weight);
        context.proximity = current_kg.map(|current| GoalProximity {
            current,
            goal: goal.target,
            tolerance: self.alerts.weight_tolerance_kg,
        });
        context.bmi = bmi;
        if trend.has_data() {
            context.trend_objective = Some((&trend, profile.objective));
        }
        context.consistency = Some(&trend);
        let alerts = AlertGenerator::generate(&context);

        debug!(
            points = series.len(),
            direction = %trend.direction,
            confidence = trend.confidence,
            target = goal.target,
            alerts = alerts.len(),
            "Weight analysis complete"
        );

        WeightBundle {
            current_kg,
            days_since_last_log: series.last().map(|p| (today - p.date).num_days()),
            bmi,
            bmi_category: bmi.map(BmiCategory::from_bmi),
            statistics,
            trend,
            goal,
            prediction,
            alerts,
            series,
        }
    }

    /// Analyze water intake logs
    pub fn analyze_water(
        &self,
        logs: &[MeasurementPoint],
        profile: &Profile,
        manual_cups: Option<u32>,
        signals: &ExternalSignals,
        today: NaiveDate,
    ) -> WaterBundle {
        let series = Sanitizer::sanitize(logs);
        let statistics = StatisticsAggregator::aggregate(&series);
        let goal = self
            .goals
            .water_target(profile, signals, &series, today, manual_cups);
        let trend = TrendAnalyzer::analyze(&series, Some(goal.target));

        let today_ml = series
            .iter()
            .find(|p| p.date == today)
            .map(|p| p.value)
            .unwrap_or(0.0);
        let average_7d_pct = (!series.is_empty())
            .then(|| percent(StatisticsAggregator::trailing_mean(&series, 7), goal.target));

        let mut context = AlertContext::new(MetricKind::Water);
        context.proximity = Some(GoalProximity {
            current: today_ml,
            goal: goal.target,
            tolerance: self.alerts.water_tolerance_ml,
        });
        context.regularity = Some((statistics.regularity_pct, statistics.days_logged));
        let alerts = AlertGenerator::generate(&context);

        debug!(
            points = series.len(),
            target = goal.target,
            today_ml,
            "Water analysis complete"
        );

        WaterBundle {
            statistics,
            trend,
            progress_pct: percent(today_ml, goal.target),
            goal,
            today_ml,
            average_7d_pct,
            alerts,
        }
    }

    /// Analyze meal logs
    pub fn analyze_meals(
        &self,
        meals: &[MealEntry],
        profile: &Profile,
        manual_calories: Option<f64>,
        today: NaiveDate,
    ) -> MealBundle {
        let daily = Sanitizer::aggregate_meals(meals);
        let calories = Sanitizer::calorie_series(&daily);
        let statistics = StatisticsAggregator::aggregate(&calories);
        let targets = self.goals.nutrition_targets(profile, manual_calories);
        let calorie_target = targets.calories.target;
        let trend = TrendAnalyzer::analyze(&calories, Some(calorie_target));

        let today_intake = daily
            .iter()
            .find(|d| d.date == today)
            .copied()
            .unwrap_or_else(|| DailyIntake::empty(today));

        let recent = &daily[daily.len().saturating_sub(7)..];
        let calorie_adherence_7d_pct = (!recent.is_empty()).then(|| {
            let mean = recent.iter().map(|d| d.calories).sum::<f64>() / recent.len() as f64;
            percent(mean, calorie_target)
        });
        let protein_adherence_7d_pct = (!recent.is_empty()).then(|| {
            let mean = recent.iter().map(|d| d.protein_g).sum::<f64>() / recent.len() as f64;
            percent(mean, targets.protein_g)
        });

        let mut context = AlertContext::new(MetricKind::Meal);
        if today_intake.meal_count > 0 {
            context.proximity = Some(GoalProximity {
                current: today_intake.calories,
                goal: calorie_target,
                tolerance: self.alerts.calorie_tolerance_kcal,
            });
        }
        context.regularity = Some((statistics.regularity_pct, statistics.days_logged));
        let alerts = AlertGenerator::generate(&context);

        debug!(
            days = daily.len(),
            target = calorie_target,
            today_kcal = today_intake.calories,
            "Meal analysis complete"
        );

        MealBundle {
            daily,
            statistics,
            trend,
            calorie_progress_pct: percent(today_intake.calories, calorie_target),
            targets,
            today: today_intake,
            calorie_adherence_7d_pct,
            protein_adherence_7d_pct,
            alerts,
        }
    }

    /// Run the full pipeline for one subject
    pub fn analyze(&self, input: &SubjectInput) -> HealthReport {
        let weight = self.analyze_weight(
            &input.weight_logs,
            &input.profile,
            input.manual_goals.weight_kg,
            input.today,
        );
        let profile = match weight.current_kg {
            Some(kg) => input.profile.with_weight(kg),
            None => input.profile.clone(),
        };

        let water = self.analyze_water(
            &input.water_logs,
            &profile,
            input.manual_goals.water_cups,
            &input.signals,
            input.today,
        );
        let meals = self.analyze_meals(
            &input.meal_logs,
            &profile,
            input.manual_goals.calories,
            input.today,
        );
        let composite = CrossMetricComposer::compose(&weight, &water, &meals, &profile);

        HealthReport {
            subject_id: input.subject_id.clone(),
            today: input.today,
            profile,
            weight,
            water,
            meals,
            composite,
        }
    }

    /// Analyze many subjects in parallel; output order follows input order
    pub fn analyze_batch(&self, inputs: &[SubjectInput]) -> Vec<HealthReport> {
        inputs.par_iter().map(|input| self.analyze(input)).collect()
    }
}

/// [`HealthEngine`] with results cached by input digest.
///
/// Recomputation is deterministic, so a cached report is interchangeable
/// with a fresh one. The cache is unbounded; call [`MemoizedEngine::clear`]
/// to drop it.
#[derive(Debug, Default)]
pub struct MemoizedEngine {
    engine: HealthEngine,
    cache: HashMap<[u8; 32], HealthReport>,
}

impl MemoizedEngine {
    pub fn new(engine: HealthEngine) -> Self {
        MemoizedEngine {
            engine,
            cache: HashMap::new(),
        }
    }

    /// SHA-256 of the JSON encoding of the input.
    ///
    /// Log order is part of the key: it decides which same-day duplicate wins.
    pub fn input_digest(input: &SubjectInput) -> Option<[u8; 32]> {
        let bytes = serde_json::to_vec(input).ok()?;
        Some(Sha256::digest(&bytes).into())
    }

    pub fn analyze(&mut self, input: &SubjectInput) -> HealthReport {
        let Some(key) = Self::input_digest(input) else {
            return self.engine.analyze(input);
        };

        if let Some(report) = self.cache.get(&key) {
            trace!(subject = %input.subject_id, "Analysis cache hit");
            return report.clone();
        }

        let report = self.engine.analyze(input);
        self.cache.insert(key, report.clone());
        report
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
