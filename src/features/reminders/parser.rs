//! Reminder extraction from free text
//!
//! The completion service is asked for a strict JSON object; the first object
//! in its reply is decoded and validated. Nothing in the reply is evaluated.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::core::HandlerFormatError;
use crate::database::TIMESTAMP_FORMAT;
use crate::features::completion::Turn;

const ACCEPTED_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReminder {
    pub message: String,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ReminderPayload {
    message: String,
    reminder_time: String,
}

/// Few-shot turns anchored on `now`, ending with the user's request
pub fn reminder_turns(request: &str, now: DateTime<Utc>) -> Vec<Turn> {
    let fmt = |t: DateTime<Utc>| t.format("%Y-%m-%d %H:%M:00").to_string();
    let next_week_morning = (now + Duration::weeks(1)).format("%Y-%m-%d 09:00:00").to_string();

    let example = |message: &str, time: String| {
        Turn::assistant(format!(r#"{{"message": "{message}", "reminder_time": "{time}"}}"#))
    };

    vec![
        Turn::system(format!(
            "The current UTC time is {}. Extract reminders as a single JSON object with the keys \
             \"message\" and \"reminder_time\" (UTC, format YYYY-MM-DD HH:MM:SS). Reply with the JSON only.",
            now.format(TIMESTAMP_FORMAT)
        )),
        Turn::user("remind me to turn in my homework next week in the morning."),
        example("Turn in homework", next_week_morning),
        Turn::user("Remind me in three hours to pick up the kids."),
        example("Pick up the kids", fmt(now + Duration::hours(3))),
        Turn::user("Remind me to buy groceries tomorrow."),
        example("Buy groceries", fmt(now + Duration::days(1))),
        Turn::user("Remind me in 30 minutes to call my mom."),
        example("Call mom", fmt(now + Duration::minutes(30))),
        Turn::user(format!("Put this in the same format as before: {request}")),
    ]
}

/// Decode the first JSON object in `reply` into a future reminder
pub fn parse_reminder_reply(reply: &str, now: DateTime<Utc>) -> Result<ParsedReminder, HandlerFormatError> {
    let start = reply.find('{').ok_or(HandlerFormatError::MissingObject)?;
    let payload: ReminderPayload = serde_json::Deserializer::from_str(&reply[start..])
        .into_iter::<ReminderPayload>()
        .next()
        .ok_or(HandlerFormatError::MissingObject)??;

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(HandlerFormatError::EmptyMessage);
    }

    let due_at = parse_reminder_time(&payload.reminder_time)?;
    ensure_future(due_at, now)?;

    Ok(ParsedReminder {
        message: message.to_string(),
        due_at,
    })
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD HH:MM`, read as UTC
pub fn parse_reminder_time(raw: &str) -> Result<DateTime<Utc>, HandlerFormatError> {
    let raw = raw.trim();
    ACCEPTED_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| HandlerFormatError::InvalidTime(raw.to_string()))
}

/// `/reminder date time` arguments
pub fn parse_explicit(date: &str, time: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, HandlerFormatError> {
    let due_at = parse_reminder_time(&format!("{} {}", date.trim(), time.trim()))?;
    ensure_future(due_at, now)?;
    Ok(due_at)
}

fn ensure_future(due_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), HandlerFormatError> {
    if due_at < now {
        return Err(HandlerFormatError::PastTime(due_at.format(TIMESTAMP_FORMAT).to_string()));
    }
    Ok(())
}
