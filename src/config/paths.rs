//! Path management for splitbook
//!
//! ## Path Resolution Order
//!
//! 1. `SPLITBOOK_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/splitbook` or `~/.config/splitbook`
//! 3. Windows: `%APPDATA%\splitbook`

use std::path::PathBuf;

use crate::error::SplitbookError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "SPLITBOOK_DATA_DIR";

/// Manages all paths used by splitbook
#[derive(Debug, Clone)]
pub struct SplitbookPaths {
    base_dir: PathBuf,
}

impl SplitbookPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home or application data directory can be found.
    pub fn new() -> Result<Self, SplitbookError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths under a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/splitbook/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    /// Get the path to the last-used transaction defaults
    pub fn last_transaction_file(&self) -> PathBuf {
        self.data_dir().join("last_transaction.json")
    }

    pub fn rules_file(&self) -> PathBuf {
        self.data_dir().join("rules.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), SplitbookError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| SplitbookError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| SplitbookError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, SplitbookError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                SplitbookError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("splitbook"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, SplitbookError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| SplitbookError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("splitbook"))
}
