//! Configuration types for Tapedeck

use serde::{Deserialize, Serialize};

use crate::match_rules::MatchRules;
use crate::tape::TapeMode;
use crate::{Result, TapeError};

/// Longest accepted tape name, in bytes
pub const MAX_TAPE_NAME_LEN: usize = 255;

/// Tape configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeConfig {
    /// Tape name, also used by persistence layers as a file stem
    pub name: String,
    /// Operating mode
    #[serde(default)]
    pub mode: TapeMode,
    /// Rules used to match live requests, evaluated in order
    #[serde(default = "default_match_rules")]
    pub match_rules: Vec<MatchRules>,
}

fn default_match_rules() -> Vec<MatchRules> {
    MatchRules::DEFAULT.to_vec()
}

impl TapeConfig {
    /// Configuration with the default mode and match rules
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: TapeMode::default(),
            match_rules: default_match_rules(),
        }
    }

    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or validated
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TapeError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TapeError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if the tape name is invalid or no match rule is set
    pub fn validate(&self) -> Result<()> {
        validate_tape_name(&self.name)?;

        if self.match_rules.is_empty() {
            return Err(TapeError::ConfigError(
                "At least one match rule must be configured".to_string(),
            ));
        }

        Ok(())
    }
}

/// Name shapes a persistence layer could resolve outside its tape directory
const REJECTED_NAMES: &[(fn(&str) -> bool, &str)] = &[
    (str::is_empty, "is empty"),
    (|name| name.contains(['/', '\\']), "contains a path separator"),
    (|name| name.starts_with('.'), "starts with a dot"),
    (|name| name.contains(".."), "contains '..'"),
    (|name| name.contains('\0'), "contains a null byte"),
];

/// Validate a tape name
///
/// # Errors
///
/// Returns `InvalidTapeName` naming the first rule the name breaks
pub fn validate_tape_name(name: &str) -> Result<()> {
    if name.len() > MAX_TAPE_NAME_LEN {
        return Err(TapeError::InvalidTapeName(format!(
            "{} bytes exceeds the {MAX_TAPE_NAME_LEN} byte limit",
            name.len()
        )));
    }

    match REJECTED_NAMES.iter().find(|(rejects, _)| rejects(name)) {
        Some((_, reason)) => Err(TapeError::InvalidTapeName(format!("{name:?} {reason}"))),
        None => Ok(()),
    }
}
