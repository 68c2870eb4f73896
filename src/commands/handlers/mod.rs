//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 3.0.0: Fefe, label, reminder and media handlers
//! - 1.0.0: Initial extraction from the monolithic command handler

pub mod fefe;
pub mod label;
pub mod media;
pub mod remind;

use std::sync::Arc;

use super::handler::SlashCommandHandler;

/// Every handler, ready to be registered with a `CommandRegistry`
pub fn create_all_handlers() -> Vec<Arc<dyn SlashCommandHandler>> {
    vec![
        Arc::new(fefe::FefeHandler),
        Arc::new(label::LabelHandler),
        Arc::new(remind::RemindHandler),
        Arc::new(media::MediaHandler),
    ]
}
