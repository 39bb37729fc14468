//! Log sanitization
//!
//! Turns raw, possibly unordered log rows into chronologically sorted daily
//! series with at most one point per calendar day.

use crate::models::{DailyIntake, MealEntry, MeasurementPoint};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Deduplicates and orders raw measurement logs
pub struct Sanitizer;

impl Sanitizer {
    /// Produce an ascending daily series from raw readings.
    ///
    /// Same-day duplicates resolve by insertion order: the last row in
    /// `points` for a given day wins. Rows with a non-finite value are dropped.
    pub fn sanitize(points: &[MeasurementPoint]) -> Vec<MeasurementPoint> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut dropped = 0usize;

        for point in points {
            if !point.value.is_finite() {
                dropped += 1;
                continue;
            }
            by_day.insert(point.date, point.value);
        }

        if dropped > 0 {
            debug!(dropped, "Dropped non-finite measurement rows");
        }

        by_day
            .into_iter()
            .map(|(date, value)| MeasurementPoint { date, value })
            .collect()
    }

    /// Fold individual meals into one intake record per day.
    ///
    /// Meals are additive, so same-day rows are summed rather than replaced.
    pub fn aggregate_meals(meals: &[MealEntry]) -> Vec<DailyIntake> {
        let mut daily: BTreeMap<NaiveDate, DailyIntake> = BTreeMap::new();
        let mut dropped = 0usize;

        for meal in meals {
            if !meal.is_well_formed() {
                dropped += 1;
                continue;
            }
            daily
                .entry(meal.date)
                .or_insert_with(|| DailyIntake::empty(meal.date))
                .add(meal);
        }

        if dropped > 0 {
            debug!(dropped, "Dropped malformed meal rows");
        }

        daily.into_values().collect()
    }

    /// Calorie series of aggregated daily intakes
    pub fn calorie_series(intakes: &[DailyIntake]) -> Vec<MeasurementPoint> {
        intakes
            .iter()
            .map(|day| MeasurementPoint::new(day.date, day.calories))
            .collect()
    }
}
