//! Adaptive goal calculation
//!
//! Three independent calculators produce personalized targets for body weight,
//! daily nutrition and daily water intake. Every result carries a
//! [`GoalSource`]: either a manual override supplied by the caller, or an
//! automatic target together with the rationale that produced it.

pub mod nutrition;
pub mod water;
pub mod weight;

use crate::models::{ExternalSignals, MeasurementPoint, Profile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use nutrition::{NutritionGoal, NutritionRationale};
pub use water::{WaterAdjustment, WaterRationale, WaterStep};
pub use weight::WeightRationale;

/// Goal calculator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalConfig {
    /// Volume of one cup in mL; water targets are multiples of it
    pub cup_size_ml: u32,

    /// Number of past days averaged by the water history correction
    pub water_history_days: usize,
}

impl Default for GoalConfig {
    fn default() -> Self {
        GoalConfig {
            cup_size_ml: 250,
            water_history_days: 5,
        }
    }
}

/// Why an automatic target has its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum GoalRationale {
    Weight(WeightRationale),
    Nutrition(NutritionRationale),
    Water(WaterRationale),
    /// Static default used because the profile lacked required fields
    Fallback { reason: String },
}

/// Where a target came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rationale", rename_all = "snake_case")]
pub enum GoalSource {
    Manual,
    Automatic(GoalRationale),
}

/// A target value and its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalResult {
    pub target: f64,
    pub source: GoalSource,
}

impl GoalResult {
    pub fn manual(target: f64) -> Self {
        GoalResult {
            target,
            source: GoalSource::Manual,
        }
    }

    pub fn automatic(target: f64, rationale: GoalRationale) -> Self {
        GoalResult {
            target,
            source: GoalSource::Automatic(rationale),
        }
    }

    pub fn fallback(target: f64, reason: impl Into<String>) -> Self {
        GoalResult::automatic(
            target,
            GoalRationale::Fallback {
                reason: reason.into(),
            },
        )
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, GoalSource::Manual)
    }

    pub fn rationale(&self) -> Option<&GoalRationale> {
        match &self.source {
            GoalSource::Manual => None,
            GoalSource::Automatic(rationale) => Some(rationale),
        }
    }
}

/// Entry point for the three goal calculators
#[derive(Debug, Clone, Default)]
pub struct GoalEngine {
    config: GoalConfig,
}

impl GoalEngine {
    pub fn new() -> Self {
        GoalEngine::default()
    }

    pub fn with_config(config: GoalConfig) -> Self {
        GoalEngine { config }
    }

    pub fn config(&self) -> &GoalConfig {
        &self.config
    }

    /// Target body weight
    pub fn weight_target(&self, profile: &Profile, manual_kg: Option<f64>) -> GoalResult {
        weight::weight_target(profile, manual_kg)
    }

    /// Daily calorie and macronutrient targets
    pub fn nutrition_targets(&self, profile: &Profile, manual_kcal: Option<f64>) -> NutritionGoal {
        nutrition::nutrition_targets(profile, manual_kcal)
    }

    /// Daily water target.
    ///
    /// `history` is the sanitized water series; only readings before `today`
    /// feed the history correction.
    pub fn water_target(
        &self,
        profile: &Profile,
        signals: &ExternalSignals,
        history: &[MeasurementPoint],
        today: NaiveDate,
        manual_cups: Option<u32>,
    ) -> GoalResult {
        if let Some(cups) = manual_cups {
            return water::manual_water_target(cups, self.config.cup_size_ml);
        }

        let base_ml = nutrition::water_baseline_ml(profile);
        let recent: Vec<f64> = history
            .iter()
            .filter(|p| p.date < today)
            .rev()
            .take(self.config.water_history_days)
            .map(|p| p.value)
            .collect();

        water::adaptive_water_target(
            base_ml,
            profile,
            signals,
            &recent,
            self.config.cup_size_ml,
        )
    }
}
