//! Classifier training commands
//!
//! Handles: label_last, retrain
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::{defer, is_administrator, respond, respond_ephemeral, CommandContext, ADMIN_ONLY_MESSAGE};
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::get_string_option;
use crate::features::classifier::{label_last, TrainingSummary};

pub struct LabelHandler;

#[async_trait]
impl SlashCommandHandler for LabelHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["label_last", "retrain"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "label_last" => self.handle_label_last(&ctx, serenity_ctx, command).await,
            "retrain" => self.handle_retrain(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl LabelHandler {
    async fn handle_label_last(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let label = get_string_option(&command.data.options, "label")
            .ok_or_else(|| anyhow::anyhow!("Missing label argument"))?;

        let outcome = label_last(
            &ctx.conversations,
            &ctx.database,
            &command.channel_id.to_string(),
            &command.user.name,
            &label,
        )
        .await?;
        respond(serenity_ctx, command, &outcome.message()).await
    }

    async fn handle_retrain(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        if !is_administrator(command) {
            return respond_ephemeral(serenity_ctx, command, ADMIN_ONLY_MESSAGE).await;
        }

        info!("Retrain requested by {}", command.user.name);
        defer(serenity_ctx, command).await?;

        let reply = match ctx.classifier.retrain(&ctx.database).await {
            Ok(summary) => retrain_message(&summary),
            Err(e) => {
                error!("Retraining failed: {e:#}");
                "Retraining failed. The previous model is still in use.".to_string()
            }
        };
        command
            .edit_original_interaction_response(&serenity_ctx.http, |r| r.content(reply))
            .await?;
        Ok(())
    }
}

fn retrain_message(summary: &TrainingSummary) -> String {
    format!(
        "Model retrained on {} seed and {} corrected examples ({} words, {} epochs).",
        summary.seed_count, summary.corrected_count, summary.vocabulary_size, summary.epochs_run
    )
}
