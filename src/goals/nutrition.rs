//! Daily calorie, macronutrient and baseline water targets
//!
//! Energy needs follow Mifflin-St Jeor for BMR, scaled by the activity factor
//! into TDEE and shifted by the subject's objective:
//!
//! ```text
//! BMR  = 10 * kg + 6.25 * cm - 5 * age + sex_offset
//! TDEE = BMR * activity_factor
//! kcal = TDEE + objective_adjustment
//! ```
//!
//! Macros: protein is weight-based (1.6 g/kg, 2.0 g/kg for intense activity),
//! fat takes 25% of calories, carbohydrates fill the remainder.

use super::{GoalRationale, GoalResult};
use crate::models::{Objective, Profile, Sex};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CALORIES: f64 = 2000.0;
pub const DEFAULT_PROTEIN_G: f64 = 150.0;
pub const DEFAULT_CARBS_G: f64 = 250.0;
pub const DEFAULT_FAT_G: f64 = 65.0;

/// Water baseline when body weight is unknown
pub const DEFAULT_WATER_ML: f64 = 2000.0;

/// Baseline water per kg of body weight
pub const WATER_ML_PER_KG: f64 = 35.0;

const FAT_CALORIE_SHARE: f64 = 0.25;
const KCAL_PER_G_FAT: f64 = 9.0;
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRationale {
    pub bmr: f64,
    pub tdee: f64,
    pub activity_factor: f64,
    pub objective: Objective,
    pub objective_adjustment_kcal: f64,
    pub protein_g_per_kg: f64,
}

/// Daily nutrition targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionGoal {
    /// Calorie target (kcal) and its provenance
    pub calories: GoalResult,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,

    /// Baseline water need derived from body weight
    pub water_ml: f64,
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day
pub fn mifflin_st_jeor(weight_kg: f64, height_cm: f64, age: u32, sex: Option<Sex>) -> f64 {
    let sex_offset = match sex {
        Some(Sex::Male) => 5.0,
        Some(Sex::Female) => -5.0,
        None => 0.0,
    };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + sex_offset
}

/// Calorie shift applied for the objective
pub fn objective_adjustment_kcal(objective: Objective) -> f64 {
    match objective {
        Objective::Lose => -500.0,
        Objective::Gain => 300.0,
        Objective::Maintain => 0.0,
    }
}

/// Daily water baseline (≈35 mL/kg), 2000 mL when weight is unknown
pub fn water_baseline_ml(profile: &Profile) -> f64 {
    profile
        .known_weight()
        .map(|kg| (kg * WATER_ML_PER_KG).round())
        .unwrap_or(DEFAULT_WATER_ML)
}

/// Split a calorie budget into protein/carbs/fat grams
fn macro_split(calories: f64, protein_g: f64) -> (f64, f64, f64) {
    let fat_g = (calories * FAT_CALORIE_SHARE / KCAL_PER_G_FAT).round();
    let remaining = calories - protein_g * KCAL_PER_G_PROTEIN - fat_g * KCAL_PER_G_FAT;
    let carbs_g = (remaining / KCAL_PER_G_CARBS).max(0.0).round();
    (protein_g, carbs_g, fat_g)
}

fn protein_g_per_kg(profile: &Profile) -> f64 {
    if profile.activity_level.is_high_intensity() {
        2.0
    } else {
        1.6
    }
}

pub(crate) fn nutrition_targets(profile: &Profile, manual_kcal: Option<f64>) -> NutritionGoal {
    let water_ml = water_baseline_ml(profile);
    let manual_kcal = manual_kcal.filter(|kcal| {
        let valid = kcal.is_finite() && *kcal > 0.0;
        if !valid {
            debug!(manual_kcal = kcal, "Ignoring invalid manual calorie goal");
        }
        valid
    });

    let biometrics = match (profile.known_weight(), profile.known_height(), profile.age) {
        (Some(weight), Some(height), Some(age)) => Some((weight, height, age)),
        _ => None,
    };

    let Some((weight, height, age)) = biometrics else {
        return match manual_kcal {
            Some(kcal) => {
                let scale = kcal / DEFAULT_CALORIES;
                NutritionGoal {
                    calories: GoalResult::manual(kcal),
                    protein_g: (DEFAULT_PROTEIN_G * scale).round(),
                    carbs_g: (DEFAULT_CARBS_G * scale).round(),
                    fat_g: (DEFAULT_FAT_G * scale).round(),
                    water_ml,
                }
            }
            None => NutritionGoal {
                calories: GoalResult::fallback(
                    DEFAULT_CALORIES,
                    "weight, height or age unknown; using default targets",
                ),
                protein_g: DEFAULT_PROTEIN_G,
                carbs_g: DEFAULT_CARBS_G,
                fat_g: DEFAULT_FAT_G,
                water_ml,
            },
        };
    };

    let per_kg = protein_g_per_kg(profile);
    let protein_g = (weight * per_kg).round();

    if let Some(kcal) = manual_kcal {
        let (protein_g, carbs_g, fat_g) = macro_split(kcal, protein_g);
        return NutritionGoal {
            calories: GoalResult::manual(kcal),
            protein_g,
            carbs_g,
            fat_g,
            water_ml,
        };
    }

    let bmr = mifflin_st_jeor(weight, height, age, profile.sex);
    let activity_factor = profile.activity_level.factor();
    let tdee = bmr * activity_factor;
    let adjustment = objective_adjustment_kcal(profile.objective);
    let calories = (tdee + adjustment).round();
    let (protein_g, carbs_g, fat_g) = macro_split(calories, protein_g);

    let rationale = NutritionRationale {
        bmr,
        tdee,
        activity_factor,
        objective: profile.objective,
        objective_adjustment_kcal: adjustment,
        protein_g_per_kg: per_kg,
    };

    NutritionGoal {
        calories: GoalResult::automatic(calories, GoalRationale::Nutrition(rationale)),
        protein_g,
        carbs_g,
        fat_g,
        water_ml,
    }
}
