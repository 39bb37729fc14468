use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::error::NutriError;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Goal and alert settings
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            engine: EngineConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nutritrack")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Using default configuration"
                );
                Self::default()
            }
        }
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        let goals = &self.engine.goals;
        let alerts = &self.engine.alerts;

        if goals.cup_size_ml == 0 {
            return Err(NutriError::Configuration(
                "goals.cup_size_ml must be positive".to_string(),
            ));
        }
        if goals.water_history_days == 0 {
            return Err(NutriError::Configuration(
                "goals.water_history_days must be at least 1".to_string(),
            ));
        }

        let tolerances = [
            ("alerts.weight_tolerance_kg", alerts.weight_tolerance_kg),
            ("alerts.water_tolerance_ml", alerts.water_tolerance_ml),
            ("alerts.calorie_tolerance_kcal", alerts.calorie_tolerance_kcal),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(NutriError::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.engine, deserialized.engine);
        assert_eq!(config.logging, deserialized.logging);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-01-01T00:00:00Z"
            updated_at = "2024-01-01T00:00:00Z"

            [engine.goals]
            cup_size_ml = 330

            [logging]
            level = "debug"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.engine.goals.cup_size_ml, 330);
        assert_eq!(config.engine.goals.water_history_days, 5);
        assert_eq!(config.engine.alerts.weight_tolerance_kg, 0.5);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.engine.goals.cup_size_ml = 0;
        assert!(matches!(
            config.validate(),
            Err(NutriError::Configuration(_))
        ));

        let mut config = AppConfig::default();
        config.engine.alerts.water_tolerance_ml = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.engine.goals.cup_size_ml = 200;
        original.logging.level = LogLevel::Info;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.engine.goals.cup_size_ml, 200);
        assert_eq!(loaded.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "this is = = not toml").unwrap();

        assert!(AppConfig::load_from_file(&config_path).is_err());
        assert!(AppConfig::load_from_file(temp_dir.path().join("missing.toml")).is_err());
    }
}
