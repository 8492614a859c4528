//! Harness configuration.

use serde::Deserialize;
use std::path::Path;

use crank_core::{Error, Result};
use crank_lzss::LzssConfig;
use crank_stream::{BufferSizing, DEFAULT_MARGIN, DEFAULT_STALL_LIMIT};

/// What to do when the decoder recovers a different number of bytes than
/// were encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPolicy {
    /// Fail the run with [`Error::SizeMismatch`].
    Strict,
    /// Log a warning, record a finding and go on to compare content.
    #[default]
    Advisory,
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarnessConfig {
    /// First fixture size
    #[serde(default = "default_ladder_start")]
    pub ladder_start: usize,

    /// Sizes stop before this bound
    #[serde(default = "default_ladder_end")]
    pub ladder_end: usize,

    /// Slack added to every round buffer
    #[serde(default = "default_margin")]
    pub margin: usize,

    /// Handling of recovered-length mismatches
    #[serde(default)]
    pub length_policy: LengthPolicy,

    /// Consecutive empty `More` polls tolerated before a stall
    #[serde(default = "default_stall_limit")]
    pub stall_limit: usize,

    /// Reference codec parameters
    #[serde(default)]
    pub lzss: LzssConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            ladder_start: default_ladder_start(),
            ladder_end: default_ladder_end(),
            margin: default_margin(),
            length_policy: LengthPolicy::default(),
            stall_limit: default_stall_limit(),
            lzss: LzssConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Parse and validate a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config = Self::parse(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without validating it.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Read and parse a TOML file.
    ///
    /// The result is not validated, so that overrides can be applied first.
    /// Call [`HarnessConfig::validate`] before use.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Check the ladder and codec parameters.
    pub fn validate(&self) -> Result<()> {
        if self.ladder_start == 0 {
            return Err(Error::invalid_config("ladder_start must be positive"));
        }
        if self.ladder_end <= self.ladder_start {
            return Err(Error::invalid_config(format!(
                "ladder_end {} leaves no sizes after ladder_start {}",
                self.ladder_end, self.ladder_start
            )));
        }
        self.lzss.validate()
    }

    /// Buffer sizing for every round.
    pub fn sizing(&self) -> BufferSizing {
        BufferSizing::with_margin(self.margin)
    }
}

fn default_ladder_start() -> usize {
    4
}

fn default_ladder_end() -> usize {
    256
}

fn default_margin() -> usize {
    DEFAULT_MARGIN
}

fn default_stall_limit() -> usize {
    DEFAULT_STALL_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = HarnessConfig::from_toml_str("").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.length_policy, LengthPolicy::Advisory);
        assert_eq!(config.sizing().capacity_for(32), 52);
    }

    #[test]
    fn test_partial_document() {
        let config = HarnessConfig::from_toml_str(
            r#"
            ladder_end = 64
            length_policy = "strict"

            [lzss]
            window_bits = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.ladder_start, 4);
        assert_eq!(config.ladder_end, 64);
        assert_eq!(config.length_policy, LengthPolicy::Strict);
        assert_eq!(config.lzss.window_bits, 10);
        assert_eq!(config.lzss.lookahead_bits, 4);
        assert_eq!(config.lzss.input_buffer_size, 32);
    }

    #[test]
    fn test_rejects_zero_start() {
        let err = HarnessConfig::from_toml_str("ladder_start = 0").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_codec() {
        let err = HarnessConfig::from_toml_str("[lzss]\nlookahead_bits = 9").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let err = HarnessConfig::from_toml_str("length_policy = \"lenient\"").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_load_defers_validation() {
        let path = std::env::temp_dir().join(format!("crank-load-{}.toml", std::process::id()));
        std::fs::write(&path, "[lzss]\nwindow_bits = 20\n").unwrap();

        let loaded = HarnessConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let mut config = loaded.unwrap();
        assert_eq!(config.lzss.window_bits, 20);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.lzss.window_bits = 10;
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_still_rejects_bad_syntax() {
        assert!(HarnessConfig::parse("ladder_start = 0").is_ok());
        let err = HarnessConfig::parse("ladder_start = \"four\"").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_file_is_io() {
        let err = HarnessConfig::load("/nonexistent/crank.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
