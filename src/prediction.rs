//! Multi-horizon projections and time-to-goal estimates
//!
//! Projections extend the fitted trend line linearly from the latest reading.
//! Time-to-goal uses the same reachability rule as trend milestones, with the
//! weekly slope clamped to ±1.2 to avoid runaway extrapolation.

use crate::statistics::{finite_or, StatisticsBundle};
use crate::trend::{eta_days, TrendAnalyzer, TrendResult, UNKNOWN_ETA_DAYS};
use serde::{Deserialize, Serialize};

/// Short projection horizon in days
pub const SHORT_HORIZON_DAYS: f64 = 30.0;

/// Long projection horizon in days
pub const LONG_HORIZON_DAYS: f64 = 90.0;

/// Maximum weekly slope used for time-to-goal estimates
pub const MAX_ETA_SLOPE_PER_WEEK: f64 = 1.2;

const OPTIMISTIC_ETA_FACTOR: f64 = 0.7;
const PESSIMISTIC_ETA_FACTOR: f64 = 1.5;

/// Which way the goal requires the value to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalDirection {
    Decrease,
    Increase,
    Hold,
}

impl GoalDirection {
    pub fn between(current: f64, goal: Option<f64>) -> Self {
        match goal {
            Some(goal) if goal < current => GoalDirection::Decrease,
            Some(goal) if goal > current => GoalDirection::Increase,
            _ => GoalDirection::Hold,
        }
    }
}

/// Projected values under one scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub horizon_30: f64,
    pub horizon_90: f64,
    pub eta_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    pub optimistic: Scenario,
    pub realistic: Scenario,
    pub pessimistic: Scenario,
}

/// Projection bundle for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Projected value 30 days out
    pub horizon_30: f64,

    /// Projected value 90 days out
    pub horizon_90: f64,

    /// Days to goal, [`UNKNOWN_ETA_DAYS`] when unreachable or no goal
    pub eta_to_goal_days: u32,

    /// Confidence carried over from the trend (0-100)
    pub confidence: u32,

    pub goal_direction: GoalDirection,
    pub scenarios: Scenarios,
}

/// Builds [`Prediction`]s from trend and statistics outputs
pub struct Predictor;

impl Predictor {
    /// Project from `current` along the trend slope.
    ///
    /// `current` is the latest sanitized reading; `None` (no data) projects a
    /// flat line at the goal, or at zero without a goal.
    pub fn predict(
        current: Option<f64>,
        goal: Option<f64>,
        trend: &TrendResult,
        statistics: &StatisticsBundle,
    ) -> Prediction {
        let current = current
            .filter(|v| v.is_finite())
            .or(goal)
            .unwrap_or(0.0);
        let slope = finite_or(trend.slope_per_day, 0.0);

        let project = |days: f64| finite_or(current + slope * days, current);
        let horizon_30 = project(SHORT_HORIZON_DAYS);
        let horizon_90 = project(LONG_HORIZON_DAYS);

        let eta = match goal {
            Some(goal) => Self::eta_to_goal(current, goal, slope, trend.confidence),
            None => UNKNOWN_ETA_DAYS,
        };

        let goal_direction = GoalDirection::between(current, goal);
        let realistic = Scenario {
            horizon_30,
            horizon_90,
            eta_days: eta,
        };

        let spread = 2.0 * finite_or(statistics.volatility, 0.0);
        // optimistic moves further towards the goal, pessimistic away from it
        let towards_goal = match goal_direction {
            GoalDirection::Decrease => -spread,
            GoalDirection::Increase => spread,
            GoalDirection::Hold => 0.0,
        };

        let optimistic = Scenario {
            horizon_30: horizon_30 + towards_goal,
            horizon_90: horizon_90 + towards_goal,
            eta_days: scale_eta(eta, OPTIMISTIC_ETA_FACTOR),
        };
        let pessimistic = Scenario {
            horizon_30: horizon_30 - towards_goal,
            horizon_90: horizon_90 - towards_goal,
            eta_days: scale_eta(eta, PESSIMISTIC_ETA_FACTOR),
        };

        Prediction {
            horizon_30,
            horizon_90,
            eta_to_goal_days: eta,
            confidence: trend.confidence,
            goal_direction,
            scenarios: Scenarios {
                optimistic,
                realistic,
                pessimistic,
            },
        }
    }

    /// Days to close the gap with the slope clamped to ±1.2/week
    pub fn eta_to_goal(current: f64, goal: f64, slope_per_day: f64, confidence: u32) -> u32 {
        let gap = goal - current;
        if gap.abs() < f64::EPSILON {
            return 0;
        }

        let slope_per_week =
            (slope_per_day * 7.0).clamp(-MAX_ETA_SLOPE_PER_WEEK, MAX_ETA_SLOPE_PER_WEEK);
        if TrendAnalyzer::is_reachable(gap, slope_per_week, confidence) {
            eta_days(gap, slope_per_week / 7.0)
        } else {
            UNKNOWN_ETA_DAYS
        }
    }
}

/// Scale an ETA, preserving the unknown sentinel
fn scale_eta(eta: u32, factor: f64) -> u32 {
    if eta == UNKNOWN_ETA_DAYS {
        return UNKNOWN_ETA_DAYS;
    }
    let scaled = (eta as f64 * factor).round();
    if scaled >= UNKNOWN_ETA_DAYS as f64 {
        UNKNOWN_ETA_DAYS
    } else {
        scaled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementPoint;
    use crate::statistics::StatisticsAggregator;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<MeasurementPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| MeasurementPoint::new(start + chrono::Days::new(i as u64), *v))
            .collect()
    }

    fn predict(values: &[f64], goal: Option<f64>) -> Prediction {
        let s = series(values);
        let trend = TrendAnalyzer::analyze(&s, goal);
        let stats = StatisticsAggregator::aggregate(&s);
        Predictor::predict(s.last().map(|p| p.value), goal, &trend, &stats)
    }

    #[test]
    fn test_linear_projection() {
        let values: Vec<f64> = (0..20).map(|i| 90.0 - i as f64 * 0.1).collect();
        let prediction = predict(&values, Some(80.0));

        // current 88.1, slope -0.1/day
        assert!((prediction.horizon_30 - 85.1).abs() < 1e-6);
        assert!((prediction.horizon_90 - 79.1).abs() < 1e-6);
        assert_eq!(prediction.goal_direction, GoalDirection::Decrease);
        assert_eq!(prediction.eta_to_goal_days, 81);
    }

    #[test]
    fn test_eta_uses_clamped_slope() {
        // 0.5 kg/day is 3.5 kg/week, clamped to 1.2 kg/week
        assert_eq!(Predictor::eta_to_goal(100.0, 94.0, -0.5, 80), 35);
        assert_eq!(Predictor::eta_to_goal(100.0, 106.0, -0.5, 80), UNKNOWN_ETA_DAYS);
        assert_eq!(Predictor::eta_to_goal(100.0, 94.0, -0.5, 20), UNKNOWN_ETA_DAYS);
        assert_eq!(Predictor::eta_to_goal(100.0, 100.0, 0.0, 0), 0);
    }

    #[test]
    fn test_scenarios_for_weight_loss() {
        let values = [90.0, 89.6, 89.5, 89.0, 88.9, 88.4, 88.3, 87.9, 87.8, 87.3];
        let prediction = predict(&values, Some(80.0));
        let s = prediction.scenarios;

        assert!(s.optimistic.horizon_30 < s.realistic.horizon_30);
        assert!(s.pessimistic.horizon_30 > s.realistic.horizon_30);
        assert_eq!(s.realistic.eta_days, prediction.eta_to_goal_days);
        assert_ne!(s.realistic.eta_days, UNKNOWN_ETA_DAYS);
        assert_eq!(
            s.optimistic.eta_days,
            (s.realistic.eta_days as f64 * 0.7).round() as u32
        );
        assert_eq!(
            s.pessimistic.eta_days,
            (s.realistic.eta_days as f64 * 1.5).round() as u32
        );
    }

    #[test]
    fn test_scenario_spread_is_twice_volatility() {
        let values = [90.0, 89.6, 89.5, 89.0, 88.9, 88.4, 88.3, 87.9, 87.8, 87.3];
        let stats = StatisticsAggregator::aggregate(&series(&values));
        let prediction = predict(&values, Some(80.0));
        let s = prediction.scenarios;

        assert!(stats.volatility > 0.0);
        let spread = 2.0 * stats.volatility;
        assert!((s.optimistic.horizon_30 - (s.realistic.horizon_30 - spread)).abs() < 1e-9);
        assert!((s.pessimistic.horizon_30 - (s.realistic.horizon_30 + spread)).abs() < 1e-9);
        assert!((s.optimistic.horizon_90 - (s.realistic.horizon_90 - spread)).abs() < 1e-9);

        let gain = [60.0, 60.3, 60.4, 60.8, 60.9, 61.3, 61.4, 61.8];
        let stats = StatisticsAggregator::aggregate(&series(&gain));
        let s = predict(&gain, Some(65.0)).scenarios;
        let spread = 2.0 * stats.volatility;
        assert!((s.optimistic.horizon_30 - (s.realistic.horizon_30 + spread)).abs() < 1e-9);
    }

    #[test]
    fn test_scenarios_for_gain() {
        let values = [60.0, 60.3, 60.4, 60.8, 60.9, 61.3, 61.4, 61.8];
        let prediction = predict(&values, Some(65.0));
        let s = prediction.scenarios;

        assert_eq!(prediction.goal_direction, GoalDirection::Increase);
        assert!(s.optimistic.horizon_90 > s.realistic.horizon_90);
        assert!(s.pessimistic.horizon_90 < s.realistic.horizon_90);
    }

    #[test]
    fn test_sentinel_preserved() {
        let prediction = predict(&[70.0, 70.0, 70.0], Some(60.0));

        assert_eq!(prediction.eta_to_goal_days, UNKNOWN_ETA_DAYS);
        assert_eq!(prediction.scenarios.optimistic.eta_days, UNKNOWN_ETA_DAYS);
        assert_eq!(prediction.scenarios.pessimistic.eta_days, UNKNOWN_ETA_DAYS);
        assert_eq!(prediction.horizon_30, 70.0);
        assert_eq!(prediction.confidence, 0);
    }

    #[test]
    fn test_no_data() {
        let trend = TrendAnalyzer::analyze(&[], None);
        let prediction = Predictor::predict(None, None, &trend, &StatisticsBundle::default());

        assert_eq!(prediction.horizon_30, 0.0);
        assert_eq!(prediction.horizon_90, 0.0);
        assert_eq!(prediction.goal_direction, GoalDirection::Hold);
    }
}
