//! User settings for splitbook
//!
//! Manages editing preferences: the date format used while editing,
//! the reconciled-child delete policy, and audit logging.

use serde::{Deserialize, Serialize};

use super::paths::SplitbookPaths;
use crate::error::SplitbookError;
use crate::models::DateFormat;

/// User settings for splitbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Date format used by editable transactions
    #[serde(default)]
    pub date_format: DateFormat,

    /// Ask for confirmation before deleting a single leg of a reconciled split
    #[serde(default)]
    pub confirm_reconciled_child_delete: bool,

    /// Whether committed batches are written to the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,

    /// Rows per page when listing transactions
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_schema_version() -> u32 {
    1
}

fn default_audit_enabled() -> bool {
    true
}

fn default_page_size() -> usize {
    25
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            date_format: DateFormat::default(),
            confirm_reconciled_child_delete: false,
            audit_enabled: default_audit_enabled(),
            page_size: default_page_size(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &SplitbookPaths) -> Result<Self, SplitbookError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| SplitbookError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| SplitbookError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &SplitbookPaths) -> Result<(), SplitbookError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SplitbookError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| SplitbookError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
