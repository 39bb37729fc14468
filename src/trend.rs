//! Trend analysis over a sanitized daily series
//!
//! Fits an ordinary least-squares line over the most recent readings and
//! classifies the result into direction, velocity and consistency bands with
//! a 0-100 confidence score.
//!
//! # Thresholds
//!
//! All thresholds are expressed per week of slope:
//! - `|slope| <= 0.1` is flat
//! - `|slope| > 0.3` is moderate, `> 0.8` is fast
//!
//! The windowed fit uses between 5 and 30 of the most recent points. Series
//! with fewer than 5 distinct days produce a neutral, zero-confidence result.

use crate::models::MeasurementPoint;
use crate::statistics::{finite_or, StatisticsAggregator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum distinct days before a trend is fitted
pub const MIN_TREND_POINTS: usize = 5;

/// Maximum points used by the regression window
pub const MAX_TREND_POINTS: usize = 30;

/// Sentinel ETA meaning "unknown / not reachable on the current trend"
pub const UNKNOWN_ETA_DAYS: u32 = 999;

/// Weekly slope at or below which a series is considered flat
pub const FLAT_SLOPE_PER_WEEK: f64 = 0.1;

const MODERATE_SLOPE_PER_WEEK: f64 = 0.3;
const FAST_SLOPE_PER_WEEK: f64 = 0.8;

/// Minimum confidence for a milestone to count as reachable
pub const MIN_REACHABLE_CONFIDENCE: u32 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
    Oscillating,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Rising => write!(f, "rising"),
            TrendDirection::Falling => write!(f, "falling"),
            TrendDirection::Flat => write!(f, "flat"),
            TrendDirection::Oscillating => write!(f, "oscillating"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Velocity {
    Slow,
    Moderate,
    Fast,
}

impl Velocity {
    pub fn from_slope_per_week(slope_per_week: f64) -> Self {
        let magnitude = slope_per_week.abs();
        if magnitude > FAST_SLOPE_PER_WEEK {
            Velocity::Fast
        } else if magnitude > MODERATE_SLOPE_PER_WEEK {
            Velocity::Moderate
        } else {
            Velocity::Slow
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    Consistent,
    Irregular,
    VeryIrregular,
}

impl Consistency {
    /// Classify from regression fit and mean-squared daily delta
    pub fn classify(r_squared: f64, variance_of_deltas: f64) -> Self {
        if r_squared < 0.3 || variance_of_deltas > 1.0 {
            Consistency::VeryIrregular
        } else if r_squared < 0.6 || variance_of_deltas > 0.3 {
            Consistency::Irregular
        } else {
            Consistency::Consistent
        }
    }

    /// Weight of this class in the confidence score
    pub fn factor(&self) -> f64 {
        match self {
            Consistency::Consistent => 1.0,
            Consistency::Irregular => 0.5,
            Consistency::VeryIrregular => 0.2,
        }
    }
}

/// Next value the trend is heading towards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub value: f64,

    /// Days until the value is reached, [`UNKNOWN_ETA_DAYS`] when unreachable
    pub eta_days: u32,

    /// Likelihood of reaching the value on the current trend (0-100)
    pub probability: f64,
}

impl Milestone {
    pub fn unknown(value: f64) -> Self {
        Milestone {
            value,
            eta_days: UNKNOWN_ETA_DAYS,
            probability: 0.0,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.eta_days != UNKNOWN_ETA_DAYS
    }
}

/// Result of a trend analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub velocity: Velocity,
    pub consistency: Consistency,

    /// Composite score 0-100
    pub confidence: u32,

    pub slope_per_day: f64,
    pub slope_per_week: f64,

    /// Coefficient of determination of the windowed fit
    pub r_squared: f64,

    /// Number of points in the regression window
    pub window_size: usize,

    pub next_milestone: Milestone,
}

impl TrendResult {
    /// Neutral result for series too short to analyze
    pub fn insufficient(last_value: Option<f64>, target: Option<f64>) -> Self {
        TrendResult {
            direction: TrendDirection::Flat,
            velocity: Velocity::Slow,
            consistency: Consistency::Irregular,
            confidence: 0,
            slope_per_day: 0.0,
            slope_per_week: 0.0,
            r_squared: 0.0,
            window_size: 0,
            next_milestone: Milestone::unknown(target.or(last_value).unwrap_or(0.0)),
        }
    }

    pub fn has_data(&self) -> bool {
        self.window_size > 0
    }
}

/// Ordinary least-squares fit `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit a line through `(x, y)` pairs.
    ///
    /// Degenerate inputs (fewer than two points, zero variance in x) yield a
    /// horizontal line through the mean. `r_squared` is 0 when `SStot == 0`.
    pub fn fit(xs: &[f64], ys: &[f64]) -> LinearFit {
        let n = xs.len().min(ys.len());
        if n == 0 {
            return LinearFit {
                intercept: 0.0,
                slope: 0.0,
                r_squared: 0.0,
            };
        }

        // constant series: skip the accumulation so rounding cannot leak into the slope
        if ys[..n].iter().all(|y| *y == ys[0]) {
            return LinearFit {
                intercept: ys[0],
                slope: 0.0,
                r_squared: 0.0,
            };
        }

        let nf = n as f64;
        let mean_x = xs[..n].iter().sum::<f64>() / nf;
        let mean_y = ys[..n].iter().sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (x, y) in xs[..n].iter().zip(&ys[..n]) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_x;

        let mut ss_tot = 0.0;
        let mut ss_res = 0.0;
        for (x, y) in xs[..n].iter().zip(&ys[..n]) {
            let predicted = intercept + slope * x;
            ss_res += (y - predicted) * (y - predicted);
            ss_tot += (y - mean_y) * (y - mean_y);
        }

        let r_squared = if ss_tot > 0.0 {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        } else {
            0.0
        };

        LinearFit {
            intercept: finite_or(intercept, mean_y),
            slope: finite_or(slope, 0.0),
            r_squared: finite_or(r_squared, 0.0),
        }
    }
}

/// Classifies trends of sanitized series
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Analyze a sanitized series, optionally against a target value
    pub fn analyze(series: &[MeasurementPoint], target: Option<f64>) -> TrendResult {
        let last_value = series.last().map(|p| p.value);
        if series.len() < MIN_TREND_POINTS {
            return TrendResult::insufficient(last_value, target);
        }

        let window_size = series.len().clamp(MIN_TREND_POINTS, MAX_TREND_POINTS);
        let window = &series[series.len() - window_size..];
        let origin = window[0].date;

        let xs: Vec<f64> = window
            .iter()
            .map(|p| (p.date - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = window.iter().map(|p| p.value).collect();
        let fit = LinearFit::fit(&xs, &ys);

        let slope_per_day = fit.slope;
        let slope_per_week = slope_per_day * 7.0;

        let direction = Self::direction(series, slope_per_week);
        let velocity = Velocity::from_slope_per_week(slope_per_week);
        let variance_of_deltas = Self::mean_squared_delta(window);
        let consistency = Consistency::classify(fit.r_squared, variance_of_deltas);
        let confidence = Self::confidence(window_size, fit.r_squared, consistency);

        let volatility = StatisticsAggregator::volatility(series);
        let current = last_value.unwrap_or(0.0);
        let next_milestone = match target {
            Some(target) => Self::milestone(current, target, slope_per_day, confidence, volatility),
            None => Milestone::unknown(current),
        };

        TrendResult {
            direction,
            velocity,
            consistency,
            confidence,
            slope_per_day,
            slope_per_week,
            r_squared: fit.r_squared,
            window_size,
            next_milestone,
        }
    }

    /// Direction from the weekly slope, overridden to oscillating when rises
    /// and falls over the whole series are nearly balanced.
    fn direction(series: &[MeasurementPoint], slope_per_week: f64) -> TrendDirection {
        let deltas = StatisticsAggregator::deltas(series);
        let rises = deltas.iter().filter(|d| **d > 0.0).count() as i64;
        let falls = deltas.iter().filter(|d| **d < 0.0).count() as i64;

        if rises > 0 && falls > 0 && (rises - falls).abs() < 2 {
            return TrendDirection::Oscillating;
        }

        if slope_per_week.abs() <= FLAT_SLOPE_PER_WEEK {
            TrendDirection::Flat
        } else if slope_per_week > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        }
    }

    fn mean_squared_delta(window: &[MeasurementPoint]) -> f64 {
        let deltas = StatisticsAggregator::deltas(window);
        if deltas.is_empty() {
            return 0.0;
        }
        deltas.iter().map(|d| d * d).sum::<f64>() / deltas.len() as f64
    }

    /// `40 * min(1, n/30) + 40 * R² + 20 * consistency_factor`, rounded to 0-100
    pub fn confidence(sample_size: usize, r_squared: f64, consistency: Consistency) -> u32 {
        let sample_term = 40.0 * (sample_size as f64 / MAX_TREND_POINTS as f64).min(1.0);
        let fit_term = 40.0 * finite_or(r_squared, 0.0);
        let consistency_term = 20.0 * consistency.factor();
        (sample_term + fit_term + consistency_term).clamp(0.0, 100.0).round() as u32
    }

    /// Whether a trend with this slope and confidence closes `gap`
    pub fn is_reachable(gap: f64, slope_per_week: f64, confidence: u32) -> bool {
        gap != 0.0
            && slope_per_week.signum() == gap.signum()
            && slope_per_week.abs() > FLAT_SLOPE_PER_WEEK
            && confidence >= MIN_REACHABLE_CONFIDENCE
    }

    /// Probability of reaching a value: confidence discounted by excess volatility
    pub fn milestone_probability(confidence: u32, volatility: f64) -> f64 {
        let penalty = (volatility - 0.3).max(0.0) * 30.0;
        finite_or((confidence as f64 - penalty).max(0.0), 0.0)
    }

    fn milestone(
        current: f64,
        target: f64,
        slope_per_day: f64,
        confidence: u32,
        volatility: f64,
    ) -> Milestone {
        let gap = target - current;
        if gap.abs() < f64::EPSILON {
            return Milestone {
                value: target,
                eta_days: 0,
                probability: 100.0,
            };
        }

        let probability = Self::milestone_probability(confidence, volatility);
        if Self::is_reachable(gap, slope_per_day * 7.0, confidence) {
            Milestone {
                value: target,
                eta_days: eta_days(gap, slope_per_day),
                probability,
            }
        } else {
            Milestone {
                value: target,
                eta_days: UNKNOWN_ETA_DAYS,
                probability,
            }
        }
    }
}

/// `round(|gap| / |slope_per_day|)`, capped below the unknown sentinel
pub(crate) fn eta_days(gap: f64, slope_per_day: f64) -> u32 {
    if slope_per_day == 0.0 {
        return UNKNOWN_ETA_DAYS;
    }
    let days = (gap.abs() / slope_per_day.abs()).round();
    if !days.is_finite() || days >= UNKNOWN_ETA_DAYS as f64 {
        UNKNOWN_ETA_DAYS
    } else {
        days as u32
    }
}
