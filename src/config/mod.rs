//! Configuration management for barberia-ui
//!
//! This module provides two stores:
//! - **settings**: timings and hosts read from the JSON config file
//! - **storage**: the persisted key/value store (theme preference)

pub mod settings;
pub mod storage;

// Re-export commonly used types
pub use settings::Settings;
pub use storage::Storage;
