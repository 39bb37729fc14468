//! Weight target calculator
//!
//! The automatic target moves the subject towards the weight that yields a
//! BMI of 22.5 at their height, but never by more than 10% of the current
//! weight in one cycle.

use super::{GoalRationale, GoalResult};
use crate::models::Profile;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// BMI the automatic target aims for
pub const IDEAL_BMI: f64 = 22.5;

/// Maximum adjustment per cycle as a fraction of current weight
pub const MAX_ADJUSTMENT_FRACTION: f64 = 0.10;

/// Upper bound of the recommended rate of change
pub const MAX_WEEKLY_RATE_KG: f64 = 0.8;

/// Target used when the profile carries no weight and no height
pub const DEFAULT_WEIGHT_TARGET_KG: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRationale {
    pub current_weight_kg: f64,
    pub ideal_weight_kg: f64,
    pub bmi: f64,

    /// True when the ±10% per-cycle cap limited the adjustment
    pub adjustment_capped: bool,

    /// Recommended rate of change in kg/week
    pub weekly_rate_kg: f64,

    /// Days to reach the target at the recommended rate
    pub eta_days: u32,
}

/// Weight at which a person of `height_cm` has the ideal BMI
pub fn ideal_weight_kg(height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    IDEAL_BMI * height_m * height_m
}

/// Recommended weekly rate for a change of `delta_kg`
pub fn weekly_rate_kg(delta_kg: f64) -> f64 {
    (delta_kg.abs() / 4.0).min(MAX_WEEKLY_RATE_KG)
}

/// Days needed to change by `delta_kg` at `rate_kg_per_week`
pub fn eta_days(delta_kg: f64, rate_kg_per_week: f64) -> u32 {
    if delta_kg == 0.0 || rate_kg_per_week <= 0.0 {
        return 0;
    }
    // absorb rounding noise so an exact number of days does not ceil up
    let days = delta_kg.abs() * 7.0 / rate_kg_per_week;
    (days - 1e-9).ceil().max(0.0) as u32
}

pub(crate) fn weight_target(profile: &Profile, manual_kg: Option<f64>) -> GoalResult {
    if let Some(kg) = manual_kg {
        if kg.is_finite() && kg > 0.0 {
            return GoalResult::manual(kg);
        }
        debug!(manual_kg = kg, "Ignoring invalid manual weight goal");
    }

    let (weight, height) = match (profile.known_weight(), profile.known_height()) {
        (Some(weight), Some(height)) => (weight, height),
        (Some(weight), None) => {
            return GoalResult::fallback(weight, "height unknown; holding current weight");
        }
        (None, Some(height)) => {
            return GoalResult::fallback(
                ideal_weight_kg(height),
                "current weight unknown; using ideal weight for height",
            );
        }
        (None, None) => {
            return GoalResult::fallback(
                DEFAULT_WEIGHT_TARGET_KG,
                "weight and height unknown; using default target",
            );
        }
    };

    let ideal = ideal_weight_kg(height);
    let cap = weight * MAX_ADJUSTMENT_FRACTION;
    let raw_delta = ideal - weight;
    let delta = raw_delta.clamp(-cap, cap);
    let rate = weekly_rate_kg(delta);

    let rationale = WeightRationale {
        current_weight_kg: weight,
        ideal_weight_kg: ideal,
        bmi: profile.bmi().unwrap_or(0.0),
        adjustment_capped: delta != raw_delta,
        weekly_rate_kg: rate,
        eta_days: eta_days(delta, rate),
    };

    GoalResult::automatic(weight + delta, GoalRationale::Weight(rationale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::GoalSource;

    fn profile(weight: f64, height: f64) -> Profile {
        Profile {
            weight_kg: Some(weight),
            height_cm: Some(height),
            ..Profile::default()
        }
    }

    fn rationale(goal: &GoalResult) -> &WeightRationale {
        match &goal.source {
            GoalSource::Automatic(GoalRationale::Weight(r)) => r,
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_ideal_weight() {
        assert!((ideal_weight_kg(180.0) - 72.9).abs() < 1e-9);
    }

    #[test]
    fn test_adjustment_is_capped() {
        // ideal 65.025 kg, 10% cap of 110 kg is 11 kg
        let goal = weight_target(&profile(110.0, 170.0), None);
        assert!((goal.target - 99.0).abs() < 1e-9);

        let r = rationale(&goal);
        assert!(r.adjustment_capped);
        assert_eq!(r.weekly_rate_kg, MAX_WEEKLY_RATE_KG);
        // 11 kg at 0.8 kg/week
        assert_eq!(r.eta_days, 97);
    }

    #[test]
    fn test_small_adjustment_not_capped() {
        // ideal for 175 cm is 68.906 kg; delta -3.094 kg
        let goal = weight_target(&profile(72.0, 175.0), None);
        let r = rationale(&goal);

        assert!(!r.adjustment_capped);
        assert!((goal.target - 68.90625).abs() < 1e-9);
        assert!((r.weekly_rate_kg - 0.7734375).abs() < 1e-9);
        assert_eq!(r.eta_days, 28);
    }

    #[test]
    fn test_gain_direction() {
        let goal = weight_target(&profile(50.0, 180.0), None);
        // ideal 72.9, capped at +5
        assert!((goal.target - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_override() {
        let goal = weight_target(&profile(90.0, 180.0), Some(80.0));
        assert!(goal.is_manual());
        assert_eq!(goal.target, 80.0);

        let ignored = weight_target(&profile(90.0, 180.0), Some(f64::NAN));
        assert!(!ignored.is_manual());
    }

    #[test]
    fn test_fallbacks() {
        let no_height = Profile {
            weight_kg: Some(82.0),
            ..Profile::default()
        };
        assert_eq!(weight_target(&no_height, None).target, 82.0);

        let empty = weight_target(&Profile::default(), None);
        assert_eq!(empty.target, DEFAULT_WEIGHT_TARGET_KG);
        assert!(matches!(
            empty.rationale(),
            Some(GoalRationale::Fallback { .. })
        ));
    }
}
