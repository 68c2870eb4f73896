//! # Feature: Media
//!
//! Search-and-play for the media intent, `/play` and `/search_youtube`.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Shared search-and-play path for `/play`, honest reply when playback is unavailable
//! - 1.2.0: Strip `query:` labels from model search queries
//! - 1.1.0: yt-dlp search fallback when no YouTube API key is configured
//! - 1.0.0: YouTube Data API search and yt-dlp stream resolution

pub mod youtube;

pub use youtube::YouTubeProvider;

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use regex::Regex;

use crate::core::PlaybackError;
use crate::features::completion::Turn;
use crate::gateway::VoiceGateway;

pub const NO_VOICE_CHANNEL_MESSAGE: &str = "No channel to join. Make sure you are in a voice channel.";
pub const NO_VOICE_PERMISSION_MESSAGE: &str = "I don't have permission to join or speak in that voice channel.";

/// Ranked search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub title: String,
    pub id: String,
}

impl MediaItem {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }

    pub fn short_url(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }

    /// Markdown link for result listings
    pub fn markdown_link(&self) -> String {
        format!("[{}]({})", self.title, self.watch_url())
    }
}

/// A resolved item that a voice relay can stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableSource {
    pub title: String,
    /// Page URL shown to users
    pub url: String,
    /// Direct audio stream URL
    pub stream_url: String,
}

#[async_trait]
pub trait MediaProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MediaItem>>;

    async fn fetch_playable(&self, id: &str) -> Result<PlayableSource>;
}

const QUERY_INSTRUCTION: &str = "Return a youtube search query based on the following message: ";

/// Few-shot turns that turn a chat message into a search query
pub fn search_query_turns(message: &str) -> Vec<Turn> {
    vec![
        Turn::user(format!("{QUERY_INSTRUCTION}Play spirit in the sky")),
        Turn::assistant("Spirit in the Sky"),
        Turn::user(format!("{QUERY_INSTRUCTION}Play the Lion King song")),
        Turn::assistant("I just can't wait to be king"),
        Turn::user(format!("{QUERY_INSTRUCTION}{message}")),
    ]
}

/// Strip the label and quoting models like to wrap a bare query in
pub fn clean_query(raw: &str) -> String {
    let mut query = raw.trim().to_string();
    if let Ok(re) = Regex::new(r"(?i)^(?:youtube\s+)?(?:search\s+)?query\s*:\s*") {
        query = re.replace(&query, "").into_owned();
    }
    query
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

/// Result of searching for a query and trying to play the top hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    NoResults { query: String },
    Playing { item: MediaItem, source: PlayableSource },
    /// Found, but the bot has no voice relay to play through
    Unavailable { item: MediaItem },
}

impl PlayOutcome {
    pub fn message(&self) -> String {
        match self {
            PlayOutcome::NoResults { query } => format!("No results found for '{query}'."),
            PlayOutcome::Playing { item, source } => {
                format!("### Playing: {}\n{}", source.title, item.short_url())
            }
            PlayOutcome::Unavailable { item } => format!(
                "Voice playback isn't set up on this bot, so I can't play it. Top result: {}\n{}",
                item.title,
                item.short_url()
            ),
        }
    }
}

/// Search `query` and hand the top result to the voice relay
pub async fn play_top_result(
    media: &dyn MediaProvider,
    voice: &dyn VoiceGateway,
    guild_id: u64,
    voice_channel_id: u64,
    query: &str,
) -> Result<PlayOutcome> {
    let Some(item) = media.search(query, 1).await?.into_iter().next() else {
        return Ok(PlayOutcome::NoResults { query: query.to_string() });
    };

    let source = media.fetch_playable(&item.id).await?;
    match voice.play(guild_id, voice_channel_id, &source).await {
        Ok(()) => Ok(PlayOutcome::Playing { item, source }),
        Err(e) if e.downcast_ref::<PlaybackError>() == Some(&PlaybackError::NotConfigured) => {
            warn!("Found '{}' for '{query}' but playback is not configured", item.title);
            Ok(PlayOutcome::Unavailable { item })
        }
        Err(e) => Err(e),
    }
}

/// `/play query`: voice and permission checks, then search and play.
///
/// Returns the reply text.
pub async fn play_query(
    media: &dyn MediaProvider,
    voice: &dyn VoiceGateway,
    guild_id: u64,
    user_id: u64,
    query: &str,
) -> Result<String> {
    let Some(voice_channel_id) = voice.voice_channel_of(guild_id, user_id) else {
        return Ok(NO_VOICE_CHANNEL_MESSAGE.to_string());
    };
    if !voice.can_join(guild_id, voice_channel_id) {
        info!("Missing connect/speak permission in voice channel {voice_channel_id}");
        return Ok(NO_VOICE_PERMISSION_MESSAGE.to_string());
    }

    Ok(play_top_result(media, voice, guild_id, voice_channel_id, query.trim())
        .await?
        .message())
}

/// `/search_youtube` reply body
pub fn format_search_results(query: &str, items: &[MediaItem]) -> String {
    if items.is_empty() {
        return format!("No results found for '{query}'.");
    }
    let links: Vec<String> = items.iter().map(MediaItem::markdown_link).collect();
    format!("Search results for '{query}':\n{}", links.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::completion::Role;
    use anyhow::anyhow;
    use tokio::sync::Mutex;

    struct OneHit;

    #[async_trait]
    impl MediaProvider for OneHit {
        async fn search(&self, query: &str, _limit: usize) -> Result<Vec<MediaItem>> {
            if query == "nothing" {
                return Ok(Vec::new());
            }
            Ok(vec![MediaItem { title: "Spirit in the Sky".to_string(), id: "abcdefghijk".to_string() }])
        }

        async fn fetch_playable(&self, id: &str) -> Result<PlayableSource> {
            Ok(PlayableSource {
                title: "Spirit in the Sky".to_string(),
                url: format!("https://youtu.be/{id}"),
                stream_url: "https://rr1.example/audio".to_string(),
            })
        }
    }

    struct Voice {
        channel: Option<u64>,
        allowed: bool,
        configured: bool,
        played: Mutex<Vec<(u64, u64)>>,
    }

    impl Voice {
        fn new(channel: Option<u64>, allowed: bool, configured: bool) -> Self {
            Self { channel, allowed, configured, played: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl VoiceGateway for Voice {
        fn voice_channel_of(&self, _guild_id: u64, _user_id: u64) -> Option<u64> {
            self.channel
        }

        fn can_join(&self, _guild_id: u64, _voice_channel_id: u64) -> bool {
            self.allowed
        }

        async fn play(&self, guild_id: u64, voice_channel_id: u64, _source: &PlayableSource) -> Result<()> {
            if !self.configured {
                return Err(PlaybackError::NotConfigured.into());
            }
            self.played.lock().await.push((guild_id, voice_channel_id));
            Ok(())
        }

        async fn stop(&self, _guild_id: u64) -> Result<bool> {
            Err(anyhow!("not used"))
        }
    }

    #[tokio::test]
    async fn test_play_query_requires_voice_channel() {
        let voice = Voice::new(None, true, true);
        let reply = play_query(&OneHit, &voice, 7, 42, "spirit in the sky").await.unwrap();
        assert_eq!(reply, NO_VOICE_CHANNEL_MESSAGE);
        assert!(voice.played.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_play_query_requires_connect_and_speak() {
        let voice = Voice::new(Some(55), false, true);
        let reply = play_query(&OneHit, &voice, 7, 42, "spirit in the sky").await.unwrap();
        assert_eq!(reply, NO_VOICE_PERMISSION_MESSAGE);
        assert!(voice.played.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_play_query_plays_top_hit() {
        let voice = Voice::new(Some(55), true, true);
        let reply = play_query(&OneHit, &voice, 7, 42, " spirit in the sky ").await.unwrap();
        assert_eq!(reply, "### Playing: Spirit in the Sky\nhttps://youtu.be/abcdefghijk");
        assert_eq!(*voice.played.lock().await, vec![(7, 55)]);
    }

    #[tokio::test]
    async fn test_play_query_without_results() {
        let voice = Voice::new(Some(55), true, true);
        let reply = play_query(&OneHit, &voice, 7, 42, "nothing").await.unwrap();
        assert_eq!(reply, "No results found for 'nothing'.");
    }

    #[tokio::test]
    async fn test_unconfigured_playback_is_reported_not_announced() {
        let voice = Voice::new(Some(55), true, false);

        let outcome = play_top_result(&OneHit, &voice, 7, 55, "spirit in the sky").await.unwrap();

        assert!(matches!(outcome, PlayOutcome::Unavailable { .. }));
        let reply = outcome.message();
        assert!(reply.starts_with("Voice playback isn't set up"));
        assert!(!reply.contains("Playing"));
    }

    #[test]
    fn test_query_prompt_ends_with_message() {
        let turns = search_query_turns("put on some jazz");
        assert_eq!(turns.len(), 5);
        let last = turns.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.ends_with("put on some jazz"));
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("  \"Spirit in the Sky\" "), "Spirit in the Sky");
        assert_eq!(clean_query("I just can't wait to be king"), "I just can't wait to be king");
        assert_eq!(clean_query("Search query: \"lofi beats\""), "lofi beats");
        assert_eq!(clean_query("query:jazz"), "jazz");
    }

    #[test]
    fn test_format_search_results() {
        let items = vec![
            MediaItem { title: "One".to_string(), id: "aaaaaaaaaaa".to_string() },
            MediaItem { title: "Two".to_string(), id: "bbbbbbbbbbb".to_string() },
        ];
        assert_eq!(
            format_search_results("q", &items),
            "Search results for 'q':\n[One](https://www.youtube.com/watch?v=aaaaaaaaaaa)\n[Two](https://www.youtube.com/watch?v=bbbbbbbbbbb)"
        );
        assert_eq!(format_search_results("q", &[]), "No results found for 'q'.");
    }

    #[test]
    fn test_short_url() {
        let item = MediaItem { title: "t".to_string(), id: "dQw4w9WgXcQ".to_string() };
        assert_eq!(item.short_url(), "https://youtu.be/dQw4w9WgXcQ");
    }
}
