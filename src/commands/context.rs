//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Router, classifier and media collaborators replace the chat services
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Channel;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::database::Database;
use crate::features::classifier::IntentClassifier;
use crate::features::conversation::ConversationStore;
use crate::features::dispatch::DispatchRouter;
use crate::features::media::MediaProvider;
use crate::gateway::VoiceGateway;

pub const ADMIN_ONLY_MESSAGE: &str = "Please contact a server admin to use this command.";
pub const GUILD_ONLY_MESSAGE: &str = "This command only works in a server channel.";

/// Services every command handler can reach
#[derive(Clone)]
pub struct CommandContext {
    pub database: Database,
    pub conversations: ConversationStore,
    pub classifier: IntentClassifier,
    pub router: Arc<DispatchRouter>,
    pub media: Arc<dyn MediaProvider>,
    pub voice: Arc<dyn VoiceGateway>,
}

/// Whether the invoking member holds the Administrator permission
pub fn is_administrator(command: &ApplicationCommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .map(|p| p.administrator())
        .unwrap_or(false)
}

/// Display name of the channel a command was issued in
pub async fn channel_name_of(serenity_ctx: &Context, command: &ApplicationCommandInteraction) -> String {
    if let Some(channel) = serenity_ctx.cache.guild_channel(command.channel_id) {
        return channel.name;
    }
    match serenity_ctx.http.get_channel(command.channel_id.0).await {
        Ok(Channel::Guild(channel)) => channel.name,
        _ => command.channel_id.to_string(),
    }
}

/// Immediate reply, visible to everyone in the channel
pub async fn respond(serenity_ctx: &Context, command: &ApplicationCommandInteraction, text: &str) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |r| {
            r.kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|m| m.content(text))
        })
        .await?;
    Ok(())
}

/// Immediate reply only the invoking user sees
pub async fn respond_ephemeral(serenity_ctx: &Context, command: &ApplicationCommandInteraction, text: &str) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |r| {
            r.kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|m| m.content(text).ephemeral(true))
        })
        .await?;
    Ok(())
}

pub async fn defer(serenity_ctx: &Context, command: &ApplicationCommandInteraction) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context_clone() {
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<CommandContext>();
    }
}
