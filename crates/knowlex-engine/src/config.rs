//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an absent file or an
//! empty table is a valid configuration.
//!
//! ```toml
//! conflict_retries = 3
//! default_priority = "routine"
//! diff_ignore_paths = ["/id", "/meta", "/date"]
//! logging = "production"
//! ```

#![allow(clippy::result_large_err)]

use std::path::Path;

use knowlex_core::diff::primitive::DEFAULT_IGNORE_PATHS;
use knowlex_core::diff::JsonStructuralDiff;
use knowlex_core::errors::{ExError, ExErrorKind};
use knowlex_core::lifecycle::DEFAULT_PRIORITY;
use knowlex_core::logging_facility::Profile;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Extra attempts after a uniqueness conflict
    pub conflict_retries: u32,
    /// Priority stamped by package when the author assigned none
    pub default_priority: String,
    /// JSON pointer prefixes the structural diff skips
    pub diff_ignore_paths: Vec<String>,
    /// `development` or `production`
    pub logging: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 2,
            default_priority: DEFAULT_PRIORITY.to_string(),
            diff_ignore_paths: DEFAULT_IGNORE_PATHS.iter().map(|p| p.to_string()).collect(),
            logging: "development".to_string(),
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// `InvalidInput` for malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ExError> {
        toml::from_str(content).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message(e.to_string())
        })
    }

    /// Load `path`, or defaults when no path is given or the file is missing
    ///
    /// # Errors
    ///
    /// `Io` when the file exists but cannot be read, `InvalidInput` when it
    /// does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ExError> {
        let Some(path) = path.filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// `InvalidInput` for an unknown profile name.
    pub fn logging_profile(&self) -> Result<Profile, ExError> {
        self.logging.parse().map_err(|e: String| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message(e)
        })
    }

    pub fn differ(&self) -> JsonStructuralDiff {
        JsonStructuralDiff::with_ignore_paths(self.diff_ignore_paths.iter().cloned())
    }
}
