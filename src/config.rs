//! Pipeline configuration
//!
//! Settings can be given in code through [`crate::PipelineBuilder`] or loaded
//! from a TOML file. Every key is optional.
//!
//! # Example
//!
//! ```rust
//! use symtrend::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_toml_str(r#"
//!     parallel = true
//!     date_format = "%Y-%m-%d"
//! "#).unwrap();
//! assert!(config.parallel);
//! assert!(config.reverse_input);
//! ```

use std::path::Path;

use crate::{Error, Result};

/// Default date format of the raw input (`DD.MM.YYYY`)
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

/// File-level pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
  /// Reject NaN/infinite prices before classification
  pub validate_data: bool,
  /// Build the record set on the rayon pool
  pub parallel: bool,
  /// chrono format string for the `date` column
  pub date_format: String,
  /// Raw input is newest-first and must be reversed before encoding
  pub reverse_input: bool,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      validate_data: true,
      parallel: false,
      date_format: DEFAULT_DATE_FORMAT.to_string(),
      reverse_input: true,
    }
  }
}

impl PipelineConfig {
  /// Parse a TOML document
  pub fn from_toml_str(source: &str) -> Result<Self> {
    let config: Self = toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Load a TOML file
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
      .map_err(|source| Error::Io { path: path.display().to_string(), source })?;
    Self::from_toml_str(&source)
  }

  /// Check the settings are usable
  pub fn validate(&self) -> Result<()> {
    if self.date_format.trim().is_empty() {
      return Err(Error::Config("date_format must not be empty".to_string()));
    }
    Ok(())
  }
}

// ============================================================
// TESTS
// ============================================================
