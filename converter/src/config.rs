//! Conversion options.
//!
//! Options are layered, later sources winning:
//!
//! 1. built-in defaults ([`ConvertOptions::default`])
//! 2. an optional JSON config file
//! 3. `O3FORMS_*` environment variables (a `.env` file is loaded by the CLI)
//! 4. command line flags
//!
//! ```json
//! {
//!   "option_sets_sheet": "OptionSets",
//!   "header_row": 2,
//!   "sheets": ["F01-MHPSS_Baseline", "F02-MHPSS_Follow-up"],
//!   "encounter": "Consultation"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

// Environment variable names
pub const ENV_OPTION_SETS_SHEET: &str = "O3FORMS_OPTION_SETS_SHEET";
pub const ENV_HEADER_ROW: &str = "O3FORMS_HEADER_ROW";
pub const ENV_ENCOUNTER: &str = "O3FORMS_ENCOUNTER";
pub const ENV_DESCRIPTION_PREFIX: &str = "O3FORMS_DESCRIPTION_PREFIX";

/// Options for converting a workbook into forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Sheet holding the answer lists
    pub option_sets_sheet: String,

    /// 1-based row holding column headers (row 1 is a title banner)
    pub header_row: usize,

    /// Sheets to convert; empty means every sheet except the option sets
    pub sheets: Vec<String>,

    /// Form description is "<prefix> - <sheet name>"
    pub description_prefix: String,

    pub version: String,

    pub encounter: String,

    pub processor: String,

    pub published: bool,

    /// Initial state of every section
    pub section_expanded: bool,

    /// Skip schema validation of generated forms
    pub skip_validation: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            option_sets_sheet: "OptionSets".to_string(),
            header_row: 2,
            sheets: Vec::new(),
            description_prefix: "MSF Form".to_string(),
            version: "1".to_string(),
            encounter: "Consultation".to_string(),
            processor: "EncounterFormProcessor".to_string(),
            published: true,
            section_expanded: false,
            skip_validation: false,
        }
    }
}

impl ConvertOptions {
    /// Load options from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&content)?;
        options.validate()
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let options = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        options.with_env()
    }

    /// Apply `O3FORMS_*` environment variables.
    pub fn with_env(self) -> ConfigResult<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from a key lookup (environment or test fixture).
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(sheet) = lookup(ENV_OPTION_SETS_SHEET) {
            self.option_sets_sheet = sheet;
        }
        if let Some(row) = lookup(ENV_HEADER_ROW) {
            self.header_row = row.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_HEADER_ROW.to_string(),
                value: row.clone(),
            })?;
        }
        if let Some(encounter) = lookup(ENV_ENCOUNTER) {
            self.encounter = encounter;
        }
        if let Some(prefix) = lookup(ENV_DESCRIPTION_PREFIX) {
            self.description_prefix = prefix;
        }
        self.validate()
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(self) -> ConfigResult<Self> {
        if self.header_row == 0 {
            return Err(ConfigError::InvalidValue {
                key: "header_row".to_string(),
                value: "0".to_string(),
            });
        }
        if self.option_sets_sheet.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "option_sets_sheet".to_string(),
                value: self.option_sets_sheet,
            });
        }
        Ok(self)
    }

    /// Value written to every section's `isExpanded`.
    pub fn section_expanded_flag(&self) -> String {
        self.section_expanded.to_string()
    }
}
