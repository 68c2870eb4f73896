//! Dispatch entry point
//!
//! Handles: fefe

use anyhow::Result;
use async_trait::async_trait;
use log::error;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::{channel_name_of, defer, respond_ephemeral, CommandContext, GUILD_ONLY_MESSAGE};
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::get_string_option;
use crate::features::dispatch::InboundMessage;
use crate::gateway::InteractionResponder;

pub struct FefeHandler;

#[async_trait]
impl SlashCommandHandler for FefeHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["fefe"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = command.guild_id else {
            return respond_ephemeral(serenity_ctx, command, GUILD_ONLY_MESSAGE).await;
        };
        let text = get_string_option(&command.data.options, "message")
            .ok_or_else(|| anyhow::anyhow!("Missing message argument"))?;

        defer(serenity_ctx, command).await.map_err(|e| {
            error!("Failed to defer /fefe interaction: {e}");
            e
        })?;

        let msg = InboundMessage {
            actor: command.user.name.clone(),
            actor_id: command.user.id.0,
            guild_id: Some(guild_id.0),
            channel_id: command.channel_id.to_string(),
            channel_name: channel_name_of(serenity_ctx, command).await,
            text,
        };
        let responder = InteractionResponder::new(serenity_ctx.http.clone(), command.clone());
        ctx.router.handle(&msg, &responder).await;
        Ok(())
    }
}
