//! Configuration module for splitbook
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::SplitbookPaths;
pub use settings::Settings;
