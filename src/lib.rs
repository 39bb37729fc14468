// Library interface for NutriTrack modules
// Analytics are pure functions of their inputs; the binary adds IO around them

pub mod alerts;
pub mod composer;
pub mod config;
pub mod engine;
pub mod error;
pub mod goals;
pub mod input;
pub mod logging;
pub mod models;
pub mod prediction;
pub mod sanitize;
pub mod statistics;
pub mod trend;

// Re-export commonly used types for convenience
pub use alerts::{Alert, AlertConfig, AlertGenerator, AlertSeverity};
pub use composer::{CompositeReport, CrossMetricComposer, Insight, InsightPriority, WellnessBand};
pub use config::AppConfig;
pub use engine::{EngineConfig, HealthEngine, HealthReport, MemoizedEngine};
pub use error::{NutriError, Result};
pub use goals::{GoalConfig, GoalEngine, GoalResult, GoalSource};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use prediction::{Prediction, Predictor};
pub use sanitize::Sanitizer;
pub use statistics::{StatisticsAggregator, StatisticsBundle};
pub use trend::{TrendAnalyzer, TrendDirection, TrendResult};
