use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::analyzer::PerformanceWeights;

pub const APP_DIR: &str = "zpd-coach";

pub const DEFAULT_TOPIC_CATALOG: &[&str] = &[
    "Space",
    "Oceans",
    "Robots",
    "Climate",
    "Nature",
    "Energy",
    "Math",
    "Physics",
    "Chemistry",
    "Biology",
    "Engineering",
    "Art",
    "Music",
    "Coding",
    "History",
    "Philosophy",
    "Ethics",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,
    #[serde(default = "default_level_up_threshold")]
    pub level_up_threshold: f64,
    #[serde(default = "default_level_down_threshold")]
    pub level_down_threshold: f64,
    #[serde(default = "default_zpd_lower")]
    pub zpd_lower: f64,
    #[serde(default = "default_zpd_upper")]
    pub zpd_upper: f64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_difficulty")]
    pub default_difficulty: i64,
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default = "default_fallback_topic")]
    pub fallback_topic: String,
    #[serde(default = "default_topic_catalog")]
    pub topic_catalog: Vec<String>,
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    #[serde(default = "default_trend_sensitivity")]
    pub trend_sensitivity: f64,
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    // Tables serialize after plain values.
    #[serde(default)]
    pub performance_weights: PerformanceWeights,
}

fn default_smoothing_alpha() -> f64 {
    0.3
}
fn default_level_up_threshold() -> f64 {
    0.8
}
fn default_level_down_threshold() -> f64 {
    0.4
}
fn default_zpd_lower() -> f64 {
    0.4
}
fn default_zpd_upper() -> f64 {
    0.7
}
fn default_history_limit() -> usize {
    50
}
fn default_difficulty() -> i64 {
    2
}
fn default_topic() -> String {
    "Space".to_string()
}
fn default_fallback_topic() -> String {
    "General Knowledge".to_string()
}
fn default_topic_catalog() -> Vec<String> {
    DEFAULT_TOPIC_CATALOG.iter().map(|t| t.to_string()).collect()
}
fn default_trend_window() -> usize {
    5
}
fn default_trend_sensitivity() -> f64 {
    0.03
}
fn default_checkpoint_every() -> u32 {
    5
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .to_string_lossy()
        .to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smoothing_alpha: default_smoothing_alpha(),
            level_up_threshold: default_level_up_threshold(),
            level_down_threshold: default_level_down_threshold(),
            zpd_lower: default_zpd_lower(),
            zpd_upper: default_zpd_upper(),
            history_limit: default_history_limit(),
            default_difficulty: default_difficulty(),
            default_topic: default_topic(),
            fallback_topic: default_fallback_topic(),
            topic_catalog: default_topic_catalog(),
            trend_window: default_trend_window(),
            trend_sensitivity: default_trend_sensitivity(),
            checkpoint_every: default_checkpoint_every(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            performance_weights: PerformanceWeights::default(),
        }
    }
}

impl Config {
    /// Load from the user config directory; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.validate();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Repair out-of-range values left by hand edits or older files.
    pub fn validate(&mut self) {
        if !(self.smoothing_alpha.is_finite()
            && self.smoothing_alpha > 0.0
            && self.smoothing_alpha <= 1.0)
        {
            self.smoothing_alpha = default_smoothing_alpha();
        }

        self.level_up_threshold = unit_or(self.level_up_threshold, default_level_up_threshold());
        self.level_down_threshold =
            unit_or(self.level_down_threshold, default_level_down_threshold());
        if self.level_down_threshold > self.level_up_threshold {
            std::mem::swap(&mut self.level_down_threshold, &mut self.level_up_threshold);
        }

        self.zpd_lower = unit_or(self.zpd_lower, default_zpd_lower());
        self.zpd_upper = unit_or(self.zpd_upper, default_zpd_upper());
        if self.zpd_lower > self.zpd_upper {
            std::mem::swap(&mut self.zpd_lower, &mut self.zpd_upper);
        }

        self.history_limit = self.history_limit.max(1);
        self.default_difficulty = self.default_difficulty.clamp(1, 5);
        self.trend_window = self.trend_window.max(2);
        if !self.trend_sensitivity.is_finite() || self.trend_sensitivity < 0.0 {
            self.trend_sensitivity = default_trend_sensitivity();
        }

        if self.default_topic.trim().is_empty() {
            self.default_topic = default_topic();
        }
        if self.fallback_topic.trim().is_empty() {
            self.fallback_topic = default_fallback_topic();
        }
        self.topic_catalog.retain(|t| !t.trim().is_empty());

        let w = &mut self.performance_weights;
        for v in [&mut w.comprehension, &mut w.curiosity, &mut w.confidence] {
            if !v.is_finite() || *v < 0.0 {
                *v = 0.0;
            }
        }
        if w.total() <= 0.0 {
            *w = PerformanceWeights::default();
        }

        if self.log_level.trim().is_empty() {
            self.log_level = default_log_level();
        }
    }
}

fn unit_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.topic_catalog.len(), 17);
        assert!(config.data_dir.contains(APP_DIR));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let toml_str = r#"
smoothing_alpha = 0.5
default_topic = "Oceans"

[performance_weights]
comprehension = 0.5
curiosity = 0.3
confidence = 0.2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.smoothing_alpha, 0.5);
        assert_eq!(config.default_topic, "Oceans");
        assert_eq!(config.performance_weights.curiosity, 0.3);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.level_up_threshold, 0.8);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_validate_swaps_inverted_thresholds() {
        let mut config = Config {
            level_up_threshold: 0.3,
            level_down_threshold: 0.9,
            zpd_lower: 0.8,
            zpd_upper: 0.2,
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.level_up_threshold, 0.9);
        assert_eq!(config.level_down_threshold, 0.3);
        assert_eq!(config.zpd_lower, 0.2);
        assert_eq!(config.zpd_upper, 0.8);
    }

    #[test]
    fn test_validate_clamps_ranges() {
        let mut config = Config {
            smoothing_alpha: 0.0,
            level_up_threshold: 3.0,
            history_limit: 0,
            default_difficulty: -4,
            trend_window: 0,
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.smoothing_alpha, 0.3);
        assert_eq!(config.level_up_threshold, 1.0);
        assert_eq!(config.history_limit, 1);
        assert_eq!(config.default_difficulty, 1);
        assert_eq!(config.trend_window, 2);
    }

    #[test]
    fn test_validate_resets_blank_topics_and_zero_weights() {
        let mut config = Config {
            default_topic: "  ".to_string(),
            fallback_topic: String::new(),
            topic_catalog: vec!["Space".to_string(), " ".to_string()],
            performance_weights: PerformanceWeights {
                comprehension: -1.0,
                curiosity: 0.0,
                confidence: 0.0,
            },
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.default_topic, "Space");
        assert_eq!(config.fallback_topic, "General Knowledge");
        assert_eq!(config.topic_catalog, vec!["Space".to_string()]);
        assert_eq!(config.performance_weights, PerformanceWeights::default());
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            checkpoint_every: 2,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
