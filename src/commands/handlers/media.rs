//! Media command handlers
//!
//! Handles: play, search_youtube, stop_music

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::{defer, respond, respond_ephemeral, CommandContext, GUILD_ONLY_MESSAGE};
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::get_string_option;
use crate::core::truncate_for_message;
use crate::features::media::{format_search_results, play_query};

const SEARCH_RESULT_LIMIT: usize = 3;

pub struct MediaHandler;

#[async_trait]
impl SlashCommandHandler for MediaHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["play", "search_youtube", "stop_music"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "play" => self.handle_play(&ctx, serenity_ctx, command).await,
            "search_youtube" => self.handle_search(&ctx, serenity_ctx, command).await,
            "stop_music" => self.handle_stop(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl MediaHandler {
    /// /play query, bypassing the classifier
    async fn handle_play(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = command.guild_id else {
            return respond_ephemeral(serenity_ctx, command, GUILD_ONLY_MESSAGE).await;
        };
        let query = get_string_option(&command.data.options, "query")
            .ok_or_else(|| anyhow::anyhow!("Missing query argument"))?;
        info!("/play '{query}' requested by {}", command.user.name);
        defer(serenity_ctx, command).await?;

        let reply = match play_query(
            ctx.media.as_ref(),
            ctx.voice.as_ref(),
            guild_id.0,
            command.user.id.0,
            &query,
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("/play '{query}' failed: {e:#}");
                "Sorry, I couldn't play that.".to_string()
            }
        };
        command
            .edit_original_interaction_response(&serenity_ctx.http, |r| r.content(truncate_for_message(&reply)))
            .await?;
        Ok(())
    }

    async fn handle_search(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let query = get_string_option(&command.data.options, "query")
            .ok_or_else(|| anyhow::anyhow!("Missing query argument"))?;
        defer(serenity_ctx, command).await?;

        let reply = match ctx.media.search(&query, SEARCH_RESULT_LIMIT).await {
            Ok(items) => format_search_results(&query, &items),
            Err(e) => {
                error!("YouTube search for '{query}' failed: {e:#}");
                "An error occurred while searching YouTube.".to_string()
            }
        };
        command
            .edit_original_interaction_response(&serenity_ctx.http, |r| r.content(truncate_for_message(&reply)))
            .await?;
        Ok(())
    }

    async fn handle_stop(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = command.guild_id else {
            return respond_ephemeral(serenity_ctx, command, GUILD_ONLY_MESSAGE).await;
        };

        if ctx.voice.stop(guild_id.0).await? {
            info!("{} stopped playback in guild {guild_id}", command.user.name);
            respond(serenity_ctx, command, "Stopped the music.").await
        } else {
            respond_ephemeral(serenity_ctx, command, "Nothing is playing right now.").await
        }
    }
}
