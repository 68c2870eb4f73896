//! Reminder command handlers
//!
//! Handles: reminder, reminders, clear_reminders, clear_all_reminders
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Absolute date/time reminders, owner and admin bulk clears
//! - 1.0.0: Extracted from the monolithic command handler

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use log::info;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::{
    channel_name_of, is_administrator, respond, respond_ephemeral, CommandContext, ADMIN_ONLY_MESSAGE,
    GUILD_ONLY_MESSAGE,
};
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::get_string_option;
use crate::core::{truncate_for_message, HandlerFormatError};
use crate::database::{NewReminder, Reminder, TIMESTAMP_FORMAT};
use crate::features::reminders::{confirmation_text, format_relative, parse_explicit, PAST_TIME_MESSAGE};

const INVALID_TIME_MESSAGE: &str = "Invalid date or time. Use `YYYY-MM-DD` for the date and `HH:MM` (UTC) for the time.";

pub struct RemindHandler;

#[async_trait]
impl SlashCommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["reminder", "reminders", "clear_reminders", "clear_all_reminders"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "reminder" => self.handle_reminder(&ctx, serenity_ctx, command).await,
            "reminders" => self.handle_list(&ctx, serenity_ctx, command).await,
            "clear_reminders" => self.handle_clear_own(&ctx, serenity_ctx, command).await,
            "clear_all_reminders" => self.handle_clear_all(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl RemindHandler {
    /// /reminder date time message
    async fn handle_reminder(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        if command.guild_id.is_none() {
            return respond_ephemeral(serenity_ctx, command, GUILD_ONLY_MESSAGE).await;
        }

        let options = &command.data.options;
        let date = get_string_option(options, "date").ok_or_else(|| anyhow::anyhow!("Missing date parameter"))?;
        let time = get_string_option(options, "time").ok_or_else(|| anyhow::anyhow!("Missing time parameter"))?;
        let message =
            get_string_option(options, "message").ok_or_else(|| anyhow::anyhow!("Missing message parameter"))?;

        let due_at = match parse_explicit(&date, &time, Utc::now()) {
            Ok(due_at) => due_at,
            Err(HandlerFormatError::PastTime(_)) => {
                return respond(serenity_ctx, command, PAST_TIME_MESSAGE).await;
            }
            Err(_) => return respond_ephemeral(serenity_ctx, command, INVALID_TIME_MESSAGE).await,
        };

        let id = ctx
            .database
            .add_reminder(&NewReminder {
                owner: command.user.name.clone(),
                body_text: message,
                channel_id: command.channel_id.to_string(),
                channel_name: channel_name_of(serenity_ctx, command).await,
                due_at,
            })
            .await?;
        info!("Created reminder #{id} for {} due {due_at}", command.user.name);

        respond(serenity_ctx, command, &confirmation_text(due_at)).await
    }

    async fn handle_list(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let reminders = ctx.database.reminders_for_owner(&command.user.name).await?;
        respond_ephemeral(serenity_ctx, command, &truncate_for_message(&format_list(&reminders))).await
    }

    async fn handle_clear_own(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let removed = ctx.database.delete_reminders_for_owner(&command.user.name).await?;
        info!("Cleared {removed} reminders for {}", command.user.name);
        respond(serenity_ctx, command, "All your reminders have been cleared.").await
    }

    async fn handle_clear_all(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        if !is_administrator(command) {
            return respond_ephemeral(serenity_ctx, command, ADMIN_ONLY_MESSAGE).await;
        }
        let removed = ctx.database.delete_all_reminders().await?;
        info!("{} cleared all {removed} reminders", command.user.name);
        respond(serenity_ctx, command, "All reminders have been cleared.").await
    }
}

fn format_list(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return "You have no pending reminders.".to_string();
    }

    let now = Utc::now();
    let mut lines = vec![format!("**Your reminders ({}):**", reminders.len())];
    for reminder in reminders {
        let relative = NaiveDateTime::parse_from_str(&reminder.due_at, TIMESTAMP_FORMAT)
            .map(|naive| format_relative(Utc.from_utc_datetime(&naive), now))
            .unwrap_or_default();
        lines.push(format!(
            "• {} | {} UTC ({relative}) in #{}",
            reminder.body_text, reminder.due_at, reminder.channel_name
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_empty_list() {
        assert_eq!(format_list(&[]), "You have no pending reminders.");
    }

    #[test]
    fn test_format_list() {
        let due = (Utc::now() + Duration::hours(2) + Duration::minutes(1))
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let reminders = vec![Reminder {
            id: 3,
            owner: "ana".to_string(),
            body_text: "Call mom".to_string(),
            channel_id: "1".to_string(),
            channel_name: "general".to_string(),
            due_at: due.clone(),
        }];

        let text = format_list(&reminders);

        assert!(text.starts_with("**Your reminders (1):**"));
        assert!(text.contains(&format!("• Call mom | {due} UTC (in 2h")));
        assert!(text.ends_with("in #general"));
    }
}
