/// Curation settings, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::filter::DEFAULT_SIMILARITY_THRESHOLD;
use crate::core::sequence::SequenceOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every knob of the curation pipeline. Missing fields take their
/// defaults, so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    pub similarity_threshold: f32,
    /// Suggestions kept per preceding step when recommending for a schema.
    pub keep_per_group: usize,
    /// Suggestions kept for a single interactive request.
    pub interactive_keep: usize,
    /// Global cap on recommended suggestions per schema.
    pub budget: usize,
    pub min_sequence_len: usize,
    pub max_sequence_len: usize,
    pub starting_steps_only: bool,
    /// Denylist replacing the embedded one.
    pub bad_words_file: Option<String>,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        let sequences = SequenceOptions::default();
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            keep_per_group: 3,
            interactive_keep: 5,
            budget: 12,
            min_sequence_len: sequences.min_len,
            max_sequence_len: sequences.max_len,
            starting_steps_only: sequences.starting_steps_only,
            bad_words_file: None,
        }
    }
}

impl CuratorConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<CuratorConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and check a config from a RON string.
    pub fn parse_ron(input: &str) -> Result<CuratorConfig, ConfigError> {
        let config: CuratorConfig = ron::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.max_sequence_len == 0 {
            return Err(ConfigError::Invalid(
                "max_sequence_len must be at least 1".to_string(),
            ));
        }
        if self.min_sequence_len > self.max_sequence_len {
            return Err(ConfigError::Invalid(format!(
                "min_sequence_len {} exceeds max_sequence_len {}",
                self.min_sequence_len, self.max_sequence_len
            )));
        }
        Ok(())
    }

    pub fn sequence_options(&self) -> SequenceOptions {
        SequenceOptions {
            min_len: self.min_sequence_len,
            max_len: self.max_sequence_len,
            starting_steps_only: self.starting_steps_only,
        }
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CuratorConfig::default();
        assert_eq!(config.similarity_threshold, 0.8);
        assert_eq!(config.keep_per_group, 3);
        assert_eq!(config.interactive_keep, 5);
        assert_eq!(config.budget, 12);
        assert_eq!(config.sequence_options(), SequenceOptions::default());
        assert!(config.bad_words_file.is_none());
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let config = CuratorConfig::parse_ron("(budget: 20, starting_steps_only: false)").unwrap();
        assert_eq!(config.budget, 20);
        assert!(!config.starting_steps_only);
        assert_eq!(config.keep_per_group, 3);
    }

    #[test]
    fn ron_roundtrip() {
        let config = CuratorConfig {
            bad_words_file: Some("data/bad_words_en.txt".to_string()),
            ..CuratorConfig::default()
        };
        let text = config.to_ron().unwrap();
        assert_eq!(CuratorConfig::parse_ron(&text).unwrap(), config);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = CuratorConfig::parse_ron("(similarity_threshold: 1.5)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn inverted_lengths_rejected() {
        let err = CuratorConfig::parse_ron("(min_sequence_len: 5, max_sequence_len: 2)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_ron_is_a_ron_error() {
        assert!(matches!(
            CuratorConfig::parse_ron("(budget: "),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn load_default_config_file() {
        let path = std::path::PathBuf::from("data/curator.ron");
        let config = CuratorConfig::load_from_ron(&path).unwrap();
        assert_eq!(config, CuratorConfig::default());
    }
}
