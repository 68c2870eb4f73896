//! # Core Module
//!
//! Configuration, error taxonomy and Discord message chunking shared by every feature.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Add playback error for unconfigured voice relays
//! - 1.2.0: Add typed classification and handler-format errors
//! - 1.1.0: Add response module with Discord message chunking utilities
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::{ClassificationError, HandlerFormatError, PlaybackError};
pub use response::{chunk_for_message, chunk_text, truncate_for_message, MESSAGE_LIMIT};
