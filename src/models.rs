use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric families tracked by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Weight,
    Water,
    Meal,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Weight => write!(f, "weight"),
            MetricKind::Water => write!(f, "water"),
            MetricKind::Meal => write!(f, "meal"),
        }
    }
}

/// Single daily reading of a scalar metric (kg for weight, mL for water)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    /// Calendar day of the reading
    pub date: NaiveDate,

    /// Measured value
    pub value: f64,
}

impl MeasurementPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        MeasurementPoint { date, value }
    }
}

/// One logged meal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    /// Day the meal was eaten
    pub date: NaiveDate,

    /// Energy in kcal
    pub calories: f64,

    /// Protein in grams
    pub protein_g: f64,

    /// Carbohydrates in grams
    pub carbs_g: f64,

    /// Fat in grams
    pub fat_g: f64,
}

impl MealEntry {
    /// True when every field is a finite, non-negative number
    pub fn is_well_formed(&self) -> bool {
        [self.calories, self.protein_g, self.carbs_g, self.fat_g]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Sum of all meals logged on one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyIntake {
    pub date: NaiveDate,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,

    /// Number of meals folded into this day
    pub meal_count: u32,
}

impl DailyIntake {
    pub fn empty(date: NaiveDate) -> Self {
        DailyIntake {
            date,
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            meal_count: 0,
        }
    }

    pub fn add(&mut self, meal: &MealEntry) {
        self.calories += meal.calories;
        self.protein_g += meal.protein_g;
        self.carbs_g += meal.carbs_g;
        self.fat_g += meal.fat_g;
        self.meal_count = self.meal_count.saturating_add(1);
    }
}

/// Biological sex used by the BMR formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Habitual activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Intense,
    VeryIntense,
}

impl ActivityLevel {
    /// TDEE multiplier applied on top of BMR
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Intense => 1.725,
            ActivityLevel::VeryIntense => 1.9,
        }
    }

    /// Intense and very intense levels get the higher protein allowance
    pub fn is_high_intensity(&self) -> bool {
        matches!(self, ActivityLevel::Intense | ActivityLevel::VeryIntense)
    }
}

/// Body-weight objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Lose,
    Gain,
    #[default]
    Maintain,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Lose => write!(f, "lose"),
            Objective::Gain => write!(f, "gain"),
            Objective::Maintain => write!(f, "maintain"),
        }
    }
}

/// WHO body mass index categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obesity,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obesity
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obesity => "Obesity",
        }
    }
}

/// Biometric profile of a tracked subject
///
/// Every biometric field is optional; calculators fall back to static
/// defaults when the data they need is missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Body weight in kilograms
    #[serde(default)]
    pub weight_kg: Option<f64>,

    /// Height in centimeters
    #[serde(default)]
    pub height_cm: Option<f64>,

    /// Age in years
    #[serde(default)]
    pub age: Option<u32>,

    #[serde(default)]
    pub sex: Option<Sex>,

    #[serde(default)]
    pub activity_level: ActivityLevel,

    #[serde(default)]
    pub objective: Objective,
}

impl Profile {
    /// Weight if present, finite and positive
    pub fn known_weight(&self) -> Option<f64> {
        self.weight_kg.filter(|w| w.is_finite() && *w > 0.0)
    }

    /// Height if present, finite and positive
    pub fn known_height(&self) -> Option<f64> {
        self.height_cm.filter(|h| h.is_finite() && *h > 0.0)
    }

    /// Body mass index, `None` when weight or height is unknown
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.known_weight()?;
        let height_m = self.known_height()? / 100.0;
        Some(weight / (height_m * height_m))
    }

    pub fn bmi_category(&self) -> Option<BmiCategory> {
        self.bmi().map(BmiCategory::from_bmi)
    }

    /// Copy of this profile with the weight replaced by a fresher reading
    pub fn with_weight(&self, weight_kg: f64) -> Self {
        Profile {
            weight_kg: Some(weight_kg),
            ..self.clone()
        }
    }
}

/// External signals consumed by the water calculator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalSignals {
    /// Current ambient temperature in degrees Celsius
    #[serde(default)]
    pub ambient_temperature_c: Option<f64>,
}

/// Manual goal overrides set by the subject or their clinician
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ManualGoals {
    /// Target body weight in kg
    #[serde(default)]
    pub weight_kg: Option<f64>,

    /// Daily water target expressed in cups
    #[serde(default)]
    pub water_cups: Option<u32>,

    /// Daily calorie target in kcal
    #[serde(default)]
    pub calories: Option<f64>,
}

/// Complete input for one analysis run of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInput {
    pub subject_id: String,

    /// Reference day; the engine never reads the wall clock
    pub today: NaiveDate,

    #[serde(default)]
    pub profile: Profile,

    #[serde(default)]
    pub weight_logs: Vec<MeasurementPoint>,

    #[serde(default)]
    pub water_logs: Vec<MeasurementPoint>,

    #[serde(default)]
    pub meal_logs: Vec<MealEntry>,

    #[serde(default)]
    pub manual_goals: ManualGoals,

    #[serde(default)]
    pub signals: ExternalSignals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_calculation() {
        let profile = Profile {
            weight_kg: Some(110.0),
            height_cm: Some(170.0),
            ..Profile::default()
        };

        let bmi = profile.bmi().unwrap();
        assert!((bmi - 38.06).abs() < 0.01);
        assert_eq!(profile.bmi_category(), Some(BmiCategory::Obesity));
    }

    #[test]
    fn test_bmi_missing_fields() {
        let profile = Profile {
            weight_kg: Some(70.0),
            height_cm: None,
            ..Profile::default()
        };
        assert!(profile.bmi().is_none());

        let zero_height = Profile {
            weight_kg: Some(70.0),
            height_cm: Some(0.0),
            ..Profile::default()
        };
        assert!(zero_height.bmi().is_none());
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obesity);
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: Profile = serde_json::from_str(r#"{"height_cm": 180}"#).unwrap();
        assert_eq!(profile.height_cm, Some(180.0));
        assert_eq!(profile.activity_level, ActivityLevel::Sedentary);
        assert_eq!(profile.objective, Objective::Maintain);

        let profile: Profile =
            serde_json::from_str(r#"{"activity_level": "very_intense", "objective": "lose"}"#)
                .unwrap();
        assert_eq!(profile.activity_level, ActivityLevel::VeryIntense);
        assert_eq!(profile.objective, Objective::Lose);
    }

    #[test]
    fn test_meal_well_formed() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let meal = MealEntry {
            date,
            calories: 500.0,
            protein_g: 30.0,
            carbs_g: 60.0,
            fat_g: 15.0,
        };
        assert!(meal.is_well_formed());

        let broken = MealEntry {
            calories: f64::NAN,
            ..meal
        };
        assert!(!broken.is_well_formed());

        let negative = MealEntry {
            fat_g: -1.0,
            ..meal
        };
        assert!(!negative.is_well_formed());
    }

    #[test]
    fn test_daily_intake_accumulates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let meal = MealEntry {
            date,
            calories: 400.0,
            protein_g: 25.0,
            carbs_g: 50.0,
            fat_g: 10.0,
        };

        let mut intake = DailyIntake::empty(date);
        intake.add(&meal);
        intake.add(&meal);
        assert_eq!(intake.calories, 800.0);
        assert_eq!(intake.meal_count, 2);

        intake.meal_count = u32::MAX;
        intake.add(&meal);
        assert_eq!(intake.meal_count, u32::MAX);
    }
}
