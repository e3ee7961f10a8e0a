use serde::{Deserialize, Serialize};

use crate::counter::DEFAULT_INCREMENT_ML;
use crate::detector::{COOLDOWN_MS, DEFAULT_MATCH_PATTERNS};

/// Detection and accounting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Host patterns for recognized AI services
    #[serde(default = "default_match_patterns")]
    pub match_patterns: Vec<String>,

    /// Minimum spacing between accepted detections per subject (milliseconds)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,

    /// Milliliters credited per accepted usage event
    #[serde(default = "default_increment_ml")]
    pub increment_ml: u32,
}

fn default_match_patterns() -> Vec<String> {
    DEFAULT_MATCH_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_cooldown_ms() -> i64 {
    COOLDOWN_MS
}

fn default_increment_ml() -> u32 {
    DEFAULT_INCREMENT_ML
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            match_patterns: default_match_patterns(),
            cooldown_ms: default_cooldown_ms(),
            increment_ml: default_increment_ml(),
        }
    }
}

impl WatchSettings {
    /// Normalize degenerate values so a bad config file cannot disable
    /// detection or turn the cooldown into a busy accept-everything loop.
    pub fn validate(&mut self) {
        const MIN_COOLDOWN_MS: i64 = 1_000;

        if self.cooldown_ms < MIN_COOLDOWN_MS {
            self.cooldown_ms = MIN_COOLDOWN_MS;
        }
        if self.increment_ml == 0 {
            self.increment_ml = default_increment_ml();
        }
        if self.match_patterns.is_empty() {
            self.match_patterns = default_match_patterns();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings() {
        let settings = WatchSettings::default();
        assert_eq!(settings.cooldown_ms, 60_000);
        assert_eq!(settings.increment_ml, 50);
        assert!(settings
            .match_patterns
            .iter()
            .any(|p| p.contains("openai.com")));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            match_patterns = ["*://claude.ai/*"]
            cooldown_ms = 30000
        "#;

        let settings: WatchSettings = toml::from_str(toml).expect("should parse TOML");
        assert_eq!(settings.match_patterns, vec!["*://claude.ai/*"]);
        assert_eq!(settings.cooldown_ms, 30_000);
        // Unset field falls back to its default
        assert_eq!(settings.increment_ml, 50);
    }

    #[test]
    fn test_validate_clamps_degenerate_values() {
        let mut settings = WatchSettings {
            match_patterns: Vec::new(),
            cooldown_ms: 0,
            increment_ml: 0,
        };
        settings.validate();
        assert_eq!(settings.cooldown_ms, 1_000);
        assert_eq!(settings.increment_ml, 50);
        assert!(!settings.match_patterns.is_empty());
    }

    #[test]
    fn test_validate_keeps_sane_values() {
        let mut settings = WatchSettings::default();
        settings.cooldown_ms = 120_000;
        settings.validate();
        assert_eq!(settings.cooldown_ms, 120_000);
    }
}
