//! # Reminders Feature
//!
//! Durable reminders parsed from chat or set explicitly, delivered once by a
//! periodic scheduler.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Channel reconciliation, claim-before-send delivery, JSON extraction
//! - 1.0.0: Initial scheduled delivery

pub mod parser;
pub mod scheduler;

pub use parser::{parse_explicit, parse_reminder_reply, reminder_turns, ParsedReminder};
pub use scheduler::{ReminderScheduler, TickReport};

use chrono::{DateTime, Utc};

use crate::database::Reminder;

pub const PAST_TIME_MESSAGE: &str = "Cannot set a reminder for a past time.";

pub fn confirmation_text(due_at: DateTime<Utc>) -> String {
    format!("Reminder set for {}.", due_at.format(crate::database::TIMESTAMP_FORMAT))
}

pub fn delivery_text(reminder: &Reminder) -> String {
    format!("@{}, you set a reminder: {}", reminder.owner, reminder.body_text)
}

/// Short human offset such as `in 2h 5m`
pub fn format_relative(due_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (due_at - now).num_seconds();
    if seconds <= 0 {
        return "due now".to_string();
    }

    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes.max(1)));
    }
    format!("in {}", parts.join(" "))
}
