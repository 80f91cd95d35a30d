//! Configuration types for Hartape

use serde::{Deserialize, Serialize};

use crate::matching::{Cardinality, RulesMatcher, UriPart, ValueComparison};
use crate::repository::ArchiveSettings;
use crate::{HartapeError, Result};

/// Operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Replay when a recording exists, record otherwise
    #[default]
    Auto,
    /// Call the network and append to the recording
    Record,
    /// Serve from the recording only
    Replay,
    /// Call the network without touching the recording
    Passthrough,
}

impl Mode {
    /// Whether this is [`Mode::Auto`]
    #[must_use]
    pub fn is_auto(self) -> bool {
        self == Self::Auto
    }

    /// Whether this is [`Mode::Record`]
    #[must_use]
    pub fn is_record(self) -> bool {
        self == Self::Record
    }

    /// Whether this is [`Mode::Replay`]
    #[must_use]
    pub fn is_replay(self) -> bool {
        self == Self::Replay
    }

    /// Whether this is [`Mode::Passthrough`]
    #[must_use]
    pub fn is_passthrough(self) -> bool {
        self == Self::Passthrough
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Record => "record",
            Self::Replay => "replay",
            Self::Passthrough => "passthrough",
        };
        f.write_str(name)
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Interaction name (archive path)
    pub interaction: String,
    /// Operating mode
    #[serde(default)]
    pub mode: Mode,
    /// Replay matching
    #[serde(default)]
    pub matcher: MatcherConfig,
    /// Archive serialization
    #[serde(default)]
    pub archive: ArchiveSettings,
}

/// Matcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Whether matched messages leave the pool
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Rules every candidate must satisfy
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            cardinality: Cardinality::default(),
            rules: default_rules(),
        }
    }
}

fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::Method,
        RuleConfig::Uri {
            part: UriPart::Full,
        },
    ]
}

/// One matching rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Same HTTP method
    Method,
    /// Same URI, up to `part`
    Uri {
        /// Portion of the URI compared
        #[serde(default)]
        part: UriPart,
    },
    /// Same header value
    Header {
        /// Header name
        name: String,
        /// Compare values ignoring case
        #[serde(default)]
        case_insensitive: bool,
    },
    /// Byte-identical body
    Content,
    /// Structurally equal JSON body
    JsonContent,
}

impl MatcherConfig {
    /// Build the configured matcher
    #[must_use]
    pub fn build(&self) -> RulesMatcher {
        self.rules
            .iter()
            .fold(RulesMatcher::with_cardinality(self.cardinality), |matcher, rule| {
                match rule {
                    RuleConfig::Method => matcher.by_http_method(),
                    RuleConfig::Uri { part } => matcher.by_request_uri(*part),
                    RuleConfig::Header {
                        name,
                        case_insensitive,
                    } => {
                        let comparison = if *case_insensitive {
                            ValueComparison::CaseInsensitive
                        } else {
                            ValueComparison::CaseSensitive
                        };
                        matcher.by_header_with(name, comparison)
                    }
                    RuleConfig::Content => matcher.by_content(),
                    RuleConfig::JsonContent => matcher.by_json_content::<serde_json::Value>(),
                }
            })
    }
}

impl RecorderConfig {
    /// Configuration for `interaction` with default settings
    pub fn new(interaction: impl Into<String>) -> Self {
        Self {
            interaction: interaction.into(),
            mode: Mode::default(),
            matcher: MatcherConfig::default(),
            archive: ArchiveSettings::default(),
        }
    }

    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or validated
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HartapeError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| HartapeError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.interaction.trim().is_empty() {
            return Err(HartapeError::ConfigError(
                "interaction name cannot be empty".to_string(),
            ));
        }

        for (i, rule) in self.matcher.rules.iter().enumerate() {
            if let RuleConfig::Header { name, .. } = rule {
                if name.trim().is_empty() {
                    return Err(HartapeError::ConfigError(format!(
                        "Rule {i}: header name cannot be empty"
                    )));
                }
            }
        }

        if self.archive.extension.is_empty() {
            return Err(HartapeError::ConfigError(
                "archive extension cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
