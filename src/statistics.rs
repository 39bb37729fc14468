//! Descriptive statistics over a sanitized daily series
//!
//! Rolling means, volatility of day-to-day changes, gain/loss streaks and
//! logging regularity.

use crate::models::MeasurementPoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Direction of a streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakKind {
    Loss,
    Gain,
}

/// Maximal run of same-signed day-to-day changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub kind: StreakKind,

    /// Number of same-signed changes in the run
    pub days: u32,

    /// Absolute cumulative change over the run
    pub magnitude: f64,

    /// Date of the reading the run starts from
    pub start: NaiveDate,

    /// Date of the last reading in the run
    pub end: NaiveDate,
}

/// Summary statistics for one metric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatisticsBundle {
    /// Mean of the last 7 points
    pub mean_7d: f64,

    /// Mean of the last 30 points
    pub mean_30d: f64,

    /// Population standard deviation of day-to-day deltas
    pub volatility: f64,

    pub longest_loss_streak: Option<Streak>,
    pub longest_gain_streak: Option<Streak>,

    /// Percentage of days in the logged span that carry a reading (0-100)
    pub regularity_pct: u32,

    /// Number of distinct days with a reading
    pub days_logged: u32,
}

impl StatisticsBundle {
    pub fn loss_streak_days(&self) -> u32 {
        self.longest_loss_streak.map(|s| s.days).unwrap_or(0)
    }

    pub fn gain_streak_days(&self) -> u32 {
        self.longest_gain_streak.map(|s| s.days).unwrap_or(0)
    }
}

/// Computes [`StatisticsBundle`]s from sanitized series
pub struct StatisticsAggregator;

impl StatisticsAggregator {
    /// Aggregate statistics for a sanitized (sorted, one point per day) series.
    ///
    /// Fewer than two points yields an all-zero bundle.
    pub fn aggregate(series: &[MeasurementPoint]) -> StatisticsBundle {
        if series.len() < 2 {
            return StatisticsBundle::default();
        }

        let (longest_loss_streak, longest_gain_streak) = Self::longest_streaks(series);

        StatisticsBundle {
            mean_7d: Self::trailing_mean(series, 7),
            mean_30d: Self::trailing_mean(series, 30),
            volatility: Self::volatility(series),
            longest_loss_streak,
            longest_gain_streak,
            regularity_pct: Self::regularity_pct(series),
            days_logged: series.len() as u32,
        }
    }

    /// Arithmetic mean of the last `window` points (or all, if fewer)
    pub fn trailing_mean(series: &[MeasurementPoint], window: usize) -> f64 {
        if series.is_empty() || window == 0 {
            return 0.0;
        }
        let start = series.len().saturating_sub(window);
        let mean = series[start..].iter().map(|p| p.value).mean();
        finite_or(mean, 0.0)
    }

    /// Consecutive differences `v[i] - v[i-1]`
    pub fn deltas(series: &[MeasurementPoint]) -> Vec<f64> {
        series
            .windows(2)
            .map(|pair| pair[1].value - pair[0].value)
            .collect()
    }

    /// Population standard deviation of day-to-day deltas
    pub fn volatility(series: &[MeasurementPoint]) -> f64 {
        let deltas = Self::deltas(series);
        if deltas.is_empty() {
            return 0.0;
        }
        finite_or(deltas.iter().population_std_dev(), 0.0)
    }

    /// Share of calendar days between first and last reading that were logged
    pub fn regularity_pct(series: &[MeasurementPoint]) -> u32 {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return 0;
        };
        let span_days = (last.date - first.date).num_days() + 1;
        if span_days <= 0 {
            return 0;
        }
        let pct = (100.0 * series.len() as f64 / span_days as f64).round();
        pct.min(100.0) as u32
    }

    /// Longest loss and gain streaks.
    ///
    /// A zero delta neither extends nor breaks the running streak. Ties keep
    /// the earliest run.
    pub fn longest_streaks(series: &[MeasurementPoint]) -> (Option<Streak>, Option<Streak>) {
        let mut longest_loss: Option<Streak> = None;
        let mut longest_gain: Option<Streak> = None;
        let mut current: Option<Streak> = None;

        for pair in series.windows(2) {
            let delta = pair[1].value - pair[0].value;
            let kind = if delta < 0.0 {
                StreakKind::Loss
            } else if delta > 0.0 {
                StreakKind::Gain
            } else {
                continue;
            };

            match current.as_mut() {
                Some(run) if run.kind == kind => {
                    run.days += 1;
                    run.magnitude += delta.abs();
                    run.end = pair[1].date;
                }
                _ => {
                    if let Some(finished) = current.take() {
                        Self::keep_longest(finished, &mut longest_loss, &mut longest_gain);
                    }
                    current = Some(Streak {
                        kind,
                        days: 1,
                        magnitude: delta.abs(),
                        start: pair[0].date,
                        end: pair[1].date,
                    });
                }
            }
        }

        if let Some(finished) = current {
            Self::keep_longest(finished, &mut longest_loss, &mut longest_gain);
        }

        (longest_loss, longest_gain)
    }

    fn keep_longest(run: Streak, loss: &mut Option<Streak>, gain: &mut Option<Streak>) {
        let slot = match run.kind {
            StreakKind::Loss => loss,
            StreakKind::Gain => gain,
        };
        if slot.map_or(true, |best| run.days > best.days) {
            *slot = Some(run);
        }
    }
}

/// Replace NaN/Infinity with a neutral value
pub(crate) fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
