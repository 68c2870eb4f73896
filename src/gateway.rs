//! Messaging gateway seams
//!
//! The router and scheduler only talk to Discord through these traits, so
//! tests can swap in fakes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Channel;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::collections::HashSet;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::{Child, Command};

use crate::core::{chunk_for_message, PlaybackError};
use crate::features::media::PlayableSource;

/// Replies to whoever issued the current request
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send one message no longer than the gateway limit
    async fn say(&self, text: &str) -> Result<()>;

    /// Send `text` split into as many messages as the limit requires
    async fn say_chunked(&self, text: &str) -> Result<()> {
        for chunk in chunk_for_message(text) {
            self.say(&chunk).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
}

#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Names of every channel currently visible to the bot
    fn live_channel_names(&self) -> HashSet<String>;

    fn resolve_channel(&self, channel_id: &str) -> Option<ChannelRef>;

    async fn send_to_channel(&self, channel: &ChannelRef, text: &str) -> Result<()>;
}

#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// The voice channel `user_id` currently sits in, if any
    fn voice_channel_of(&self, guild_id: u64, user_id: u64) -> Option<u64>;

    /// Whether the bot may connect and speak in `voice_channel_id`
    fn can_join(&self, guild_id: u64, voice_channel_id: u64) -> bool;

    /// Fails with `PlaybackError::NotConfigured` when there is no relay to play through
    async fn play(&self, guild_id: u64, voice_channel_id: u64, source: &PlayableSource) -> Result<()>;

    /// Returns true when something was still playing
    async fn stop(&self, guild_id: u64) -> Result<bool>;
}

/// Responds to a deferred slash command: the first message edits the
/// placeholder, later messages become followups.
pub struct InteractionResponder {
    http: Arc<Http>,
    command: ApplicationCommandInteraction,
    answered: AtomicBool,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, command: ApplicationCommandInteraction) -> Self {
        Self {
            http,
            command,
            answered: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn say(&self, text: &str) -> Result<()> {
        if !self.answered.swap(true, Ordering::SeqCst) {
            self.command
                .edit_original_interaction_response(&self.http, |r| r.content(text))
                .await?;
        } else {
            self.command
                .create_followup_message(&self.http, |m| m.content(text))
                .await?;
        }
        Ok(())
    }
}

/// Cache-backed channel directory plus an external-process voice relay
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
    player_command: Option<String>,
    players: DashMap<u64, Child>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, player_command: Option<String>) -> Self {
        Self {
            http,
            cache,
            player_command,
            players: DashMap::new(),
        }
    }

    fn spawn_player(&self, command_line: &str, guild_id: u64, voice_channel_id: u64, source: &PlayableSource) -> Result<Child> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("MEDIA_PLAYER_COMMAND is empty"))?;

        let child = Command::new(program)
            .args(parts)
            .arg(&source.stream_url)
            .env("FEFE_GUILD_ID", guild_id.to_string())
            .env("FEFE_VOICE_CHANNEL_ID", voice_channel_id.to_string())
            .env("FEFE_STREAM_URL", &source.stream_url)
            .env("FEFE_TITLE", &source.title)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        Ok(child)
    }
}

#[async_trait]
impl ChannelDirectory for SerenityGateway {
    fn live_channel_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        for guild_id in self.cache.guilds() {
            if let Some(guild) = self.cache.guild(guild_id) {
                for channel in guild.channels.values() {
                    if let Channel::Guild(gc) = channel {
                        names.insert(gc.name.clone());
                    }
                }
                for thread in &guild.threads {
                    names.insert(thread.name.clone());
                }
            }
        }
        names
    }

    fn resolve_channel(&self, channel_id: &str) -> Option<ChannelRef> {
        let id: u64 = channel_id.parse().ok()?;
        self.cache.guild_channel(ChannelId(id)).map(|gc| ChannelRef {
            id: gc.id.0,
            name: gc.name.clone(),
        })
    }

    async fn send_to_channel(&self, channel: &ChannelRef, text: &str) -> Result<()> {
        for chunk in chunk_for_message(text) {
            ChannelId(channel.id).say(&self.http, chunk).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl VoiceGateway for SerenityGateway {
    fn voice_channel_of(&self, guild_id: u64, user_id: u64) -> Option<u64> {
        let guild = self.cache.guild(GuildId(guild_id))?;
        guild
            .voice_states
            .get(&UserId(user_id))
            .and_then(|state| state.channel_id)
            .map(|id| id.0)
    }

    fn can_join(&self, guild_id: u64, voice_channel_id: u64) -> bool {
        let Some(guild) = self.cache.guild(GuildId(guild_id)) else {
            return false;
        };
        let Some(Channel::Guild(channel)) = guild.channels.get(&ChannelId(voice_channel_id)) else {
            return false;
        };
        let Some(member) = guild.members.get(&self.cache.current_user_id()) else {
            // Own member not cached yet; let the relay report the failure
            debug!("Bot member not cached in guild {guild_id}, skipping voice permission check");
            return true;
        };
        match guild.user_permissions_in(channel, member) {
            Ok(permissions) => permissions.connect() && permissions.speak(),
            Err(e) => {
                warn!("Could not compute voice permissions in guild {guild_id}: {e}");
                false
            }
        }
    }

    async fn play(&self, guild_id: u64, voice_channel_id: u64, source: &PlayableSource) -> Result<()> {
        let Some(command_line) = &self.player_command else {
            warn!("No MEDIA_PLAYER_COMMAND configured, cannot play '{}'", source.title);
            return Err(PlaybackError::NotConfigured.into());
        };

        self.stop(guild_id).await?;
        let child = self.spawn_player(command_line, guild_id, voice_channel_id, source)?;
        info!("🎵 Playing '{}' in voice channel {voice_channel_id} (guild {guild_id})", source.title);
        self.players.insert(guild_id, child);
        Ok(())
    }

    async fn stop(&self, guild_id: u64) -> Result<bool> {
        match self.players.remove(&guild_id) {
            Some((_, mut child)) => {
                if let Ok(Some(status)) = child.try_wait() {
                    debug!("Player for guild {guild_id} had already exited ({status})");
                    return Ok(false);
                }
                if let Err(e) = child.kill().await {
                    debug!("Player for guild {guild_id} could not be killed: {e}");
                }
                info!("⏹️ Stopped playback in guild {guild_id}");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
