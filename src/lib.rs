//! splitbook - split-transaction editing for envelope budgeting
//!
//! A transaction can be split into legs, each with its own amount and
//! category. The legs must add up to the parent amount before the group can
//! be saved.
//!
//! # Architecture
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Transactions, split groups, ids and money
//! - `session`: The split edit session and everything it coordinates
//! - `storage`: JSON file storage implementing the session boundaries
//! - `audit`: Audit logging of committed batches
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use splitbook::config::{SplitbookPaths, Settings};
//! use splitbook::session::{SessionOptions, SplitSession};
//! use splitbook::storage::Storage;
//!
//! let paths = SplitbookPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths)?;
//! storage.load_all()?;
//!
//! let mut session = SplitSession::load(&storage, &id, SessionOptions::from(&settings))?;
//! let leg = session.split(&id)?;
//! session.commit(&storage, &storage)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

pub use error::{SplitbookError, SplitbookResult};
