use chrono::NaiveDate;
use nutritrack::alerts::AlertSeverity;
use nutritrack::models::{ExternalSignals, MeasurementPoint, Profile};
use nutritrack::sanitize::Sanitizer;
use nutritrack::trend::{TrendAnalyzer, TrendDirection};
use nutritrack::HealthEngine;
use proptest::prelude::*;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
}

fn points() -> impl Strategy<Value = Vec<MeasurementPoint>> {
    proptest::collection::vec((0u64..60, 40.0f64..160.0), 0..80).prop_map(|raw| {
        raw.into_iter()
            .map(|(offset, value)| MeasurementPoint::new(start() + chrono::Days::new(offset), value))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_trend_outputs_are_finite(series in points()) {
        let clean = Sanitizer::sanitize(&series);
        let trend = TrendAnalyzer::analyze(&clean, Some(75.0));

        prop_assert!(trend.slope_per_day.is_finite());
        prop_assert!(trend.r_squared >= 0.0 && trend.r_squared <= 1.0);
        prop_assert!(trend.confidence <= 100);
        prop_assert!(trend.next_milestone.probability >= 0.0);
        prop_assert!(trend.next_milestone.probability <= 100.0);
    }

    #[test]
    fn test_constant_weight_is_flat(value in 40.0f64..160.0, days in 2usize..40) {
        let series: Vec<MeasurementPoint> = (0..days)
            .map(|i| MeasurementPoint::new(start() + chrono::Days::new(i as u64), value))
            .collect();
        let bundle = HealthEngine::new().analyze_weight(&series, &Profile::default(), None, start());

        prop_assert_eq!(bundle.trend.slope_per_day, 0.0);
        prop_assert_eq!(bundle.trend.direction, TrendDirection::Flat);
        prop_assert_eq!(bundle.statistics.volatility, 0.0);
    }

    #[test]
    fn test_success_alerts_lead(
        series in points(),
        height in 140.0f64..210.0,
        goal in 40.0f64..160.0
    ) {
        let profile = Profile {
            height_cm: Some(height),
            ..Profile::default()
        };
        let bundle = HealthEngine::new().analyze_weight(&series, &profile, Some(goal), start());

        let first_other = bundle
            .alerts
            .iter()
            .position(|a| a.severity != AlertSeverity::Success)
            .unwrap_or(bundle.alerts.len());
        prop_assert!(bundle.alerts[first_other..]
            .iter()
            .all(|a| a.severity != AlertSeverity::Success));
    }

    #[test]
    fn test_water_target_is_cup_multiple(
        weight in 35.0f64..200.0,
        temperature in -20.0f64..50.0,
        history in proptest::collection::vec(0.0f64..6000.0, 0..10)
    ) {
        let profile = Profile {
            weight_kg: Some(weight),
            ..Profile::default()
        };
        let logs: Vec<MeasurementPoint> = history
            .iter()
            .enumerate()
            .map(|(i, v)| MeasurementPoint::new(start() + chrono::Days::new(i as u64), *v))
            .collect();
        let today = start() + chrono::Days::new(history.len() as u64);
        let signals = ExternalSignals {
            ambient_temperature_c: Some(temperature),
        };

        let bundle = HealthEngine::new().analyze_water(&logs, &profile, None, &signals, today);
        let cups = bundle.goal.target / 250.0;

        prop_assert!(bundle.goal.target >= 1500.0 && bundle.goal.target <= 4000.0);
        prop_assert_eq!(cups, cups.round());
    }
}
