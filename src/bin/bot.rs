use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use fefe::commands::{register_global_commands, register_guild_commands, CommandContext, CommandRegistry};
use fefe::core::Config;
use fefe::database::Database;
use fefe::features::{
    ConversationStore, DispatchRouter, IntentClassifier, MediaProvider, OpenAiCompletion, ReminderScheduler,
    YouTubeProvider,
};
use fefe::gateway::{ChannelDirectory, SerenityGateway};

struct Handler {
    registry: CommandRegistry,
    /// Filled once the client exists, since the gateway needs its cache and http
    context: Arc<OnceCell<Arc<CommandContext>>>,
    guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        let registered = match self.guild_id {
            Some(guild_id) => register_guild_commands(&ctx, guild_id).await,
            None => register_global_commands(&ctx).await,
        };
        if let Err(e) = registered {
            error!("Failed to register slash commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };
        let Some(context) = self.context.get() else {
            warn!("Ignoring /{} received before startup finished", command.data.name);
            return;
        };

        if let Err(e) = self.registry.dispatch(Arc::clone(context), &ctx, &command).await {
            error!("Error handling slash command '{}': {e:#}", command.data.name);

            let error_message = "❌ Sorry, I encountered an error processing your command. Please try again.";

            // Edit the deferred response, or answer fresh if nothing was deferred
            if command
                .edit_original_interaction_response(&ctx.http, |response| response.content(error_message))
                .await
                .is_err()
            {
                let _ = command
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| message.content(error_message))
                    })
                    .await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from the environment
    std::env::set_var("OPENAI_API_KEY", &config.openai_api_key);
    std::env::set_var("OPENAI_KEY", &config.openai_api_key);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();

    info!("Starting Fefe Discord Bot...");

    let database = Database::new(&config.database_path).await?;
    let conversations = ConversationStore::new(database.clone(), config.conversation_cache_size);

    let unscheduled = database.delete_unscheduled_reminders().await?;
    if unscheduled > 0 {
        info!("🧹 Removed {unscheduled} reminders without a due time");
    }
    let evicted = conversations.evict_if_over_capacity().await?;
    info!(
        "💬 Conversation store ready (capacity {}, {evicted} evicted at boot)",
        conversations.capacity()
    );

    let classifier = IntentClassifier::new(config.classifier_epochs);
    if let Err(e) = classifier.retrain(&database).await {
        error!("Initial classifier training failed: {e:#}. Messages will fall back until /retrain succeeds.");
    }

    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let context_cell = Arc::new(OnceCell::new());
    let handler = Handler {
        registry: CommandRegistry::with_all_handlers(),
        context: Arc::clone(&context_cell),
        guild_id,
    };

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::GUILD_VOICE_STATES;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    let gateway = Arc::new(SerenityGateway::new(
        client.cache_and_http.http.clone(),
        client.cache_and_http.cache.clone(),
        config.media_player_command.clone(),
    ));
    let media: Arc<dyn MediaProvider> = Arc::new(YouTubeProvider::new(
        config.youtube_api_key.clone(),
        config.ytdlp_path.clone(),
    ));
    if config.youtube_api_key.is_none() {
        info!("📺 No YOUTUBE_API_KEY set, searching through {}", config.ytdlp_path);
    }

    let router = DispatchRouter::new(
        classifier.clone(),
        conversations.clone(),
        database.clone(),
        Arc::new(OpenAiCompletion::new(config.openai_model.clone())),
        Arc::clone(&media),
        gateway.clone(),
        config.history_turns,
    );

    context_cell
        .set(Arc::new(CommandContext {
            database: database.clone(),
            conversations: conversations.clone(),
            classifier,
            router: Arc::new(router),
            media,
            voice: gateway.clone(),
        }))
        .map_err(|_| anyhow::anyhow!("Command context initialised twice"))?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    let scheduler = Arc::new(ReminderScheduler::new(
        database,
        conversations,
        Duration::from_secs(config.reminder_interval_secs),
    ));
    let directory: Arc<dyn ChannelDirectory> = gateway;
    tokio::spawn(scheduler.run(directory));

    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!("Failed to establish gateway connection: {}", why));
    }

    Ok(())
}
