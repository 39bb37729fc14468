//! Cross-metric insights and the overall wellness score
//!
//! Per-metric bundles only look at one signal at a time. The composer reads
//! the three of them together with the profile and produces prioritized
//! insights plus a single 0-100 wellness score.
//!
//! The score averages whichever domain scores are available:
//!
//! | domain    | input                               | 100    | 75     | 50     | 25   |
//! |-----------|-------------------------------------|--------|--------|--------|------|
//! | weight    | BMI category                        | normal | over   | under  | obese|
//! | hydration | 7-day average, % of target          | ≥ 90   | ≥ 70   | ≥ 50   | else |
//! | nutrition | 7-day calories, deviation from 100% | ≤ 10   | ≤ 20   | ≤ 35   | else |

use crate::engine::{MealBundle, WaterBundle, WeightBundle};
use crate::models::{BmiCategory, MetricKind, Objective, Profile};
use crate::trend::TrendDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

const LOW_REGULARITY_PCT: u32 = 50;
const MIN_DAYS_FOR_REGULARITY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

impl fmt::Display for InsightPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightPriority::Low => write!(f, "low"),
            InsightPriority::Medium => write!(f, "medium"),
            InsightPriority::High => write!(f, "high"),
        }
    }
}

/// Observation spanning one or more metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub priority: InsightPriority,
    pub title: String,
    pub message: String,

    /// Metrics the observation is based on
    pub metrics: Vec<MetricKind>,
}

impl Insight {
    fn new(
        priority: InsightPriority,
        title: &str,
        message: impl Into<String>,
        metrics: &[MetricKind],
    ) -> Self {
        Insight {
            priority,
            title: title.to_string(),
            message: message.into(),
            metrics: metrics.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellnessBand {
    Excellent,
    VeryGood,
    Good,
    NeedsAttention,
}

impl WellnessBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => WellnessBand::Excellent,
            75..=89 => WellnessBand::VeryGood,
            60..=74 => WellnessBand::Good,
            _ => WellnessBand::NeedsAttention,
        }
    }
}

impl fmt::Display for WellnessBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellnessBand::Excellent => write!(f, "excellent"),
            WellnessBand::VeryGood => write!(f, "very good"),
            WellnessBand::Good => write!(f, "good"),
            WellnessBand::NeedsAttention => write!(f, "needs attention"),
        }
    }
}

/// Per-domain scores; `None` when the domain had no data
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DomainScores {
    pub weight: Option<u32>,
    pub hydration: Option<u32>,
    pub nutrition: Option<u32>,
}

impl DomainScores {
    /// Rounded mean of the available scores, 0 when none is available
    pub fn overall(&self) -> u32 {
        let available: Vec<u32> = [self.weight, self.hydration, self.nutrition]
            .into_iter()
            .flatten()
            .collect();
        if available.is_empty() {
            return 0;
        }
        let sum: u32 = available.iter().sum();
        (sum as f64 / available.len() as f64).round() as u32
    }
}

/// Headline numbers the insight rules read
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub weight_direction: Option<TrendDirection>,

    /// 7-day water average as a percentage of the target
    pub hydration_pct: Option<f64>,

    /// 7-day calorie average as a percentage of the target
    pub calorie_pct: Option<f64>,

    /// 7-day protein average as a percentage of the target
    pub protein_pct: Option<f64>,

    /// Lowest logging regularity among metrics with enough history
    pub min_regularity_pct: Option<u32>,
}

impl ProgressSnapshot {
    pub fn from_bundles(weight: &WeightBundle, water: &WaterBundle, meals: &MealBundle) -> Self {
        let min_regularity_pct = [
            &weight.statistics,
            &water.statistics,
            &meals.statistics,
        ]
        .into_iter()
        .filter(|s| s.days_logged >= MIN_DAYS_FOR_REGULARITY)
        .map(|s| s.regularity_pct)
        .min();

        ProgressSnapshot {
            weight_direction: weight.trend.has_data().then_some(weight.trend.direction),
            hydration_pct: water.average_7d_pct,
            calorie_pct: meals.calorie_adherence_7d_pct,
            protein_pct: meals.protein_adherence_7d_pct,
            min_regularity_pct,
        }
    }
}

/// Output of the composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReport {
    /// Sorted by priority, high first
    pub insights: Vec<Insight>,

    pub wellness_score: u32,
    pub wellness_band: WellnessBand,
    pub domain_scores: DomainScores,
    pub snapshot: ProgressSnapshot,
}

pub struct CrossMetricComposer;

impl CrossMetricComposer {
    pub fn compose(
        weight: &WeightBundle,
        water: &WaterBundle,
        meals: &MealBundle,
        profile: &Profile,
    ) -> CompositeReport {
        let snapshot = ProgressSnapshot::from_bundles(weight, water, meals);
        let insights = Self::insights(&snapshot, profile);

        let domain_scores = DomainScores {
            weight: weight.bmi_category.map(Self::weight_score),
            hydration: snapshot.hydration_pct.map(Self::hydration_score),
            nutrition: snapshot.calorie_pct.map(Self::nutrition_score),
        };
        let wellness_score = domain_scores.overall();

        CompositeReport {
            insights,
            wellness_score,
            wellness_band: WellnessBand::from_score(wellness_score),
            domain_scores,
            snapshot,
        }
    }

    /// Evaluate the insight rules, high priority first
    pub fn insights(snapshot: &ProgressSnapshot, profile: &Profile) -> Vec<Insight> {
        use MetricKind::{Meal, Water, Weight};

        let mut insights = Vec::new();
        let objective = profile.objective;
        let falling = snapshot.weight_direction == Some(TrendDirection::Falling);
        let rising = snapshot.weight_direction == Some(TrendDirection::Rising);
        let calories_on_target = snapshot
            .calorie_pct
            .map_or(false, |pct| (90.0..=110.0).contains(&pct));

        if let Some(hydration) = snapshot.hydration_pct {
            if hydration >= 80.0 && falling && objective == Objective::Lose {
                insights.push(Insight::new(
                    InsightPriority::High,
                    "Hydration supports your progress",
                    format!(
                        "You are drinking {:.0}% of your water target while your weight is going down.",
                        hydration
                    ),
                    &[Water, Weight],
                ));
            }
        }

        if let Some(calories) = snapshot.calorie_pct {
            if calories > 110.0 && objective == Objective::Lose {
                insights.push(Insight::new(
                    InsightPriority::High,
                    "Calories above target",
                    format!(
                        "Your intake averages {:.0}% of target, which slows weight loss.",
                        calories
                    ),
                    &[Meal, Weight],
                ));
            } else if calories < 90.0 && objective == Objective::Gain {
                insights.push(Insight::new(
                    InsightPriority::High,
                    "Calories below target",
                    format!(
                        "Your intake averages {:.0}% of target, too little to gain weight.",
                        calories
                    ),
                    &[Meal, Weight],
                ));
            }
        }

        if let Some(hydration) = snapshot.hydration_pct {
            if hydration < 60.0 {
                insights.push(Insight::new(
                    InsightPriority::Medium,
                    "Low hydration",
                    format!(
                        "You are reaching only {:.0}% of your water target on average.",
                        hydration
                    ),
                    &[Water],
                ));
            }
        }

        if let Some(protein) = snapshot.protein_pct {
            let needs_protein =
                objective == Objective::Gain || profile.activity_level.is_high_intensity();
            if protein < 80.0 && needs_protein {
                insights.push(Insight::new(
                    InsightPriority::Medium,
                    "Protein below target",
                    format!(
                        "Protein intake averages {:.0}% of target; muscle gain and recovery need more.",
                        protein
                    ),
                    &[Meal],
                ));
            }
        }

        if rising && objective == Objective::Lose && calories_on_target {
            insights.push(Insight::new(
                InsightPriority::Medium,
                "Weight rising despite calories on target",
                "Your logged calories match the target but weight is going up. Check that every meal is logged.",
                &[Weight, Meal],
            ));
        }

        let flat = snapshot.weight_direction == Some(TrendDirection::Flat);
        if flat && objective == Objective::Maintain && calories_on_target {
            insights.push(Insight::new(
                InsightPriority::Low,
                "Stable maintenance",
                "Weight and calorie intake are both steady.",
                &[Weight, Meal],
            ));
        }

        if let Some(regularity) = snapshot.min_regularity_pct {
            if regularity < LOW_REGULARITY_PCT {
                insights.push(Insight::new(
                    InsightPriority::Low,
                    "Log more consistently",
                    format!(
                        "Some metrics were logged on only {}% of days; insights improve with regular logs.",
                        regularity
                    ),
                    &[Weight, Water, Meal],
                ));
            }
        }

        // stable: equal priorities keep rule order
        insights.sort_by(|a, b| b.priority.cmp(&a.priority));
        insights
    }

    pub fn weight_score(category: BmiCategory) -> u32 {
        match category {
            BmiCategory::Normal => 100,
            BmiCategory::Overweight => 75,
            BmiCategory::Underweight => 50,
            BmiCategory::Obesity => 25,
        }
    }

    pub fn hydration_score(pct: f64) -> u32 {
        if pct >= 90.0 {
            100
        } else if pct >= 70.0 {
            75
        } else if pct >= 50.0 {
            50
        } else {
            25
        }
    }

    pub fn nutrition_score(pct: f64) -> u32 {
        let deviation = (pct - 100.0).abs();
        if deviation <= 10.0 {
            100
        } else if deviation <= 20.0 {
            75
        } else if deviation <= 35.0 {
            50
        } else {
            25
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityLevel;

    fn profile(objective: Objective) -> Profile {
        Profile {
            objective,
            ..Profile::default()
        }
    }

    fn titles(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_hydrated_weight_loss() {
        let snapshot = ProgressSnapshot {
            weight_direction: Some(TrendDirection::Falling),
            hydration_pct: Some(85.0),
            calorie_pct: Some(100.0),
            ..ProgressSnapshot::default()
        };
        let insights = CrossMetricComposer::insights(&snapshot, &profile(Objective::Lose));

        assert_eq!(titles(&insights), vec!["Hydration supports your progress"]);
        assert_eq!(insights[0].priority, InsightPriority::High);
    }

    #[test]
    fn test_priority_ordering() {
        let snapshot = ProgressSnapshot {
            weight_direction: Some(TrendDirection::Falling),
            hydration_pct: Some(40.0),
            calorie_pct: Some(130.0),
            protein_pct: Some(60.0),
            min_regularity_pct: Some(30),
            ..ProgressSnapshot::default()
        };
        let lose = Profile {
            activity_level: ActivityLevel::Intense,
            ..profile(Objective::Lose)
        };
        let insights = CrossMetricComposer::insights(&snapshot, &lose);

        assert_eq!(
            titles(&insights),
            vec![
                "Calories above target",
                "Low hydration",
                "Protein below target",
                "Log more consistently",
            ]
        );
        let priorities: Vec<InsightPriority> = insights.iter().map(|i| i.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_gain_objective_rules() {
        let snapshot = ProgressSnapshot {
            calorie_pct: Some(80.0),
            protein_pct: Some(70.0),
            ..ProgressSnapshot::default()
        };
        let insights = CrossMetricComposer::insights(&snapshot, &profile(Objective::Gain));

        assert_eq!(
            titles(&insights),
            vec!["Calories below target", "Protein below target"]
        );
    }

    #[test]
    fn test_maintenance_and_rising_weight() {
        let steady = ProgressSnapshot {
            weight_direction: Some(TrendDirection::Flat),
            calorie_pct: Some(97.0),
            ..ProgressSnapshot::default()
        };
        let insights = CrossMetricComposer::insights(&steady, &profile(Objective::Maintain));
        assert_eq!(titles(&insights), vec!["Stable maintenance"]);

        let rising = ProgressSnapshot {
            weight_direction: Some(TrendDirection::Rising),
            calorie_pct: Some(105.0),
            ..ProgressSnapshot::default()
        };
        let insights = CrossMetricComposer::insights(&rising, &profile(Objective::Lose));
        assert_eq!(
            titles(&insights),
            vec!["Weight rising despite calories on target"]
        );
    }

    #[test]
    fn test_no_data_no_insights() {
        let insights =
            CrossMetricComposer::insights(&ProgressSnapshot::default(), &Profile::default());
        assert!(insights.is_empty());
    }

    #[test]
    fn test_domain_scores() {
        assert_eq!(CrossMetricComposer::weight_score(BmiCategory::Normal), 100);
        assert_eq!(CrossMetricComposer::weight_score(BmiCategory::Obesity), 25);
        assert_eq!(CrossMetricComposer::hydration_score(95.0), 100);
        assert_eq!(CrossMetricComposer::hydration_score(70.0), 75);
        assert_eq!(CrossMetricComposer::hydration_score(49.9), 25);
        assert_eq!(CrossMetricComposer::nutrition_score(108.0), 100);
        assert_eq!(CrossMetricComposer::nutrition_score(82.0), 75);
        assert_eq!(CrossMetricComposer::nutrition_score(130.0), 50);
        assert_eq!(CrossMetricComposer::nutrition_score(40.0), 25);
    }

    #[test]
    fn test_overall_score_and_band() {
        let scores = DomainScores {
            weight: Some(75),
            hydration: Some(100),
            nutrition: None,
        };
        // (75 + 100) / 2 = 87.5
        assert_eq!(scores.overall(), 88);
        assert_eq!(WellnessBand::from_score(88), WellnessBand::VeryGood);

        assert_eq!(DomainScores::default().overall(), 0);
        assert_eq!(WellnessBand::from_score(0), WellnessBand::NeedsAttention);
        assert_eq!(WellnessBand::from_score(90), WellnessBand::Excellent);
        assert_eq!(WellnessBand::from_score(60), WellnessBand::Good);
    }

    #[test]
    fn test_snapshot_from_bundles() {
        use crate::engine::HealthEngine;
        use crate::models::{ExternalSignals, MeasurementPoint};
        use chrono::NaiveDate;

        fn day(offset: u64) -> NaiveDate {
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + chrono::Days::new(offset)
        }
        let engine = HealthEngine::new();
        let profile = profile(Objective::Lose);

        let weight_logs: Vec<MeasurementPoint> = (0..10)
            .map(|i| MeasurementPoint::new(day(i * 2), 90.0 - i as f64 * 0.2))
            .collect();
        let water_logs: Vec<MeasurementPoint> = (0..19)
            .map(|i| MeasurementPoint::new(day(i), 2000.0))
            .collect();

        let weight = engine.analyze_weight(&weight_logs, &profile, None, day(18));
        let water =
            engine.analyze_water(&water_logs, &profile, None, &ExternalSignals::default(), day(18));
        let meals = engine.analyze_meals(&[], &profile, None, day(18));

        let snapshot = ProgressSnapshot::from_bundles(&weight, &water, &meals);
        assert_eq!(snapshot.weight_direction, Some(TrendDirection::Falling));
        assert!(snapshot.hydration_pct.is_some());
        assert!(snapshot.calorie_pct.is_none());
        assert_eq!(snapshot.min_regularity_pct, Some(53));
    }
}
