//! Adaptive daily water target
//!
//! Starting from the weight-based baseline, the target goes through a fixed
//! sequence of adjustments:
//!
//! 1. ambient temperature bonus
//! 2. very intense activity bonus
//! 3. correction from recent intake history, then the global safety bounds
//! 4. clamp to the band for the subject's BMI (skipped when BMI is unknown)
//! 5. rounding to a whole number of cups
//!
//! Every step that changes the value is recorded in the rationale.

use super::{GoalRationale, GoalResult};
use crate::models::{ActivityLevel, ExternalSignals, Profile};
use serde::{Deserialize, Serialize};

/// Bounds every automatic target is held within before the BMI clamp
pub const SAFETY_BOUNDS_ML: (f64, f64) = (1500.0, 4000.0);

const VERY_INTENSE_BONUS_ML: f64 = 500.0;
const LOW_INTAKE_RATIO: f64 = 0.7;
const HIGH_INTAKE_RATIO: f64 = 1.1;
const LOW_INTAKE_SCALE: f64 = 0.9;
const HIGH_INTAKE_SCALE: f64 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterStep {
    Temperature,
    Activity,
    History,
    SafetyBounds,
    BmiBand,
    CupRounding,
}

/// One recorded change of the running target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterAdjustment {
    pub step: WaterStep,
    pub before_ml: f64,
    pub after_ml: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterRationale {
    pub base_ml: f64,
    pub adjustments: Vec<WaterAdjustment>,

    /// Average of the recent history window, if any history was available
    pub recent_average_ml: Option<f64>,

    /// Band applied for the subject's BMI
    pub bmi_band_ml: Option<(f64, f64)>,

    pub cup_size_ml: u32,
}

/// Extra water for hot weather
pub fn temperature_bonus_ml(temperature_c: f64) -> f64 {
    if temperature_c > 32.0 {
        600.0
    } else if temperature_c > 28.0 {
        400.0
    } else if temperature_c > 24.0 {
        200.0
    } else {
        0.0
    }
}

/// Allowed target range for a BMI
pub fn bmi_band_ml(bmi: f64) -> (f64, f64) {
    if bmi < 18.5 {
        (1800.0, 3200.0)
    } else if bmi < 25.0 {
        (1800.0, 3800.0)
    } else {
        (1600.0, 3600.0)
    }
}

/// Round to the nearest whole number of cups, staying inside `bounds` when a
/// cup multiple exists there. The result is always at least one cup.
pub fn round_to_cups(value_ml: f64, cup_size_ml: u32, bounds: (f64, f64)) -> f64 {
    let cup = cup_size_ml.max(1) as f64;
    let (lo, hi) = bounds;

    let mut cups = (value_ml / cup).round();
    if cups * cup < lo {
        cups = (lo / cup).ceil();
    }
    if cups * cup > hi {
        let floor = (hi / cup).floor();
        // band narrower than a cup: keep the nearest multiple instead
        if floor * cup >= lo {
            cups = floor;
        }
    }

    cups.max(1.0) * cup
}

pub(crate) fn manual_water_target(cups: u32, cup_size_ml: u32) -> GoalResult {
    GoalResult::manual(cups.max(1) as f64 * cup_size_ml.max(1) as f64)
}

/// Automatic water target from a baseline and external signals.
///
/// `recent_intake_ml` holds the history window (most recent first).
pub(crate) fn adaptive_water_target(
    base_ml: f64,
    profile: &Profile,
    signals: &ExternalSignals,
    recent_intake_ml: &[f64],
    cup_size_ml: u32,
) -> GoalResult {
    let mut adjustments = Vec::new();
    let mut target = base_ml;

    let mut apply = |step: WaterStep, target: &mut f64, next: f64| {
        if next != *target {
            adjustments.push(WaterAdjustment {
                step,
                before_ml: *target,
                after_ml: next,
            });
            *target = next;
        }
    };

    if let Some(temperature) = signals.ambient_temperature_c.filter(|t| t.is_finite()) {
        let next = target + temperature_bonus_ml(temperature);
        apply(WaterStep::Temperature, &mut target, next);
    }

    if profile.activity_level == ActivityLevel::VeryIntense {
        let next = target + VERY_INTENSE_BONUS_ML;
        apply(WaterStep::Activity, &mut target, next);
    }

    let valid_history: Vec<f64> = recent_intake_ml
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let recent_average_ml = if valid_history.is_empty() {
        None
    } else {
        Some(valid_history.iter().sum::<f64>() / valid_history.len() as f64)
    };

    if let Some(average) = recent_average_ml {
        let (floor, cap) = SAFETY_BOUNDS_ML;
        if average < LOW_INTAKE_RATIO * target {
            let next = (target * LOW_INTAKE_SCALE).max(floor);
            apply(WaterStep::History, &mut target, next);
        } else if average > HIGH_INTAKE_RATIO * target {
            let next = (target * HIGH_INTAKE_SCALE).min(cap);
            apply(WaterStep::History, &mut target, next);
        }
    }

    let bounded = target.clamp(SAFETY_BOUNDS_ML.0, SAFETY_BOUNDS_ML.1);
    apply(WaterStep::SafetyBounds, &mut target, bounded);

    let bmi_band = profile.bmi().map(bmi_band_ml);
    if let Some((lo, hi)) = bmi_band {
        let clamped = target.clamp(lo, hi);
        apply(WaterStep::BmiBand, &mut target, clamped);
    }

    let rounded = round_to_cups(target, cup_size_ml, bmi_band.unwrap_or(SAFETY_BOUNDS_ML));
    apply(WaterStep::CupRounding, &mut target, rounded);

    let rationale = WaterRationale {
        base_ml,
        adjustments,
        recent_average_ml,
        bmi_band_ml: bmi_band,
        cup_size_ml,
    };

    GoalResult::automatic(target, GoalRationale::Water(rationale))
}
