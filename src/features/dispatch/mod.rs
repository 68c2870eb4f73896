//! # Feature: Dispatch Router
//!
//! Classifies a `/fefe` message and hands it to the reminder, completion or
//! media handler. Every call writes exactly one conversation record and
//! never returns an error to the caller.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Unconfigured voice playback is reported instead of announced
//! - 1.2.0: Media handler resolves playback through the voice gateway
//! - 1.1.0: Raw completion text is shown when reminder extraction fails
//! - 1.0.0: Initial classifier-driven routing

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::HandlerFormatError;
use crate::database::{Database, NewReminder};
use crate::features::classifier::{IntentClassifier, IntentLabel};
use crate::features::completion::{CompletionService, SamplingParams, Turn};
use crate::features::conversation::{ConversationStore, ERROR_LABEL};
use crate::features::media::{clean_query, play_top_result, search_query_turns, MediaProvider};
use crate::features::reminders::{confirmation_text, parse_reminder_reply, reminder_turns, PAST_TIME_MESSAGE};
use crate::gateway::{Responder, VoiceGateway};

const SYSTEM_PROMPT: &str = "You are Fefe, a friendly and concise assistant in a Discord server.";
pub const JOIN_VOICE_MESSAGE: &str = "Join a voice channel and ask me again.";
pub const HANDLER_FAILURE_MESSAGE: &str = "Sorry, I ran into a problem handling that. Please try again in a moment.";

/// One `/fefe` invocation
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub actor: String,
    pub actor_id: u64,
    pub guild_id: Option<u64>,
    pub channel_id: String,
    pub channel_name: String,
    pub text: String,
}

/// Which path a message took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Fallback,
    Handled(IntentLabel),
    Failed(IntentLabel),
}

/// Sent when the classifier cannot label a message
pub fn fallback_message() -> String {
    format!(
        "I'm not sure what to do with that yet. Label it with `/label_last` using one of {} \
         and ask a server admin to run `/retrain`.",
        IntentLabel::valid_list()
    )
}

pub struct DispatchRouter {
    classifier: IntentClassifier,
    conversations: ConversationStore,
    database: Database,
    completion: Arc<dyn CompletionService>,
    media: Arc<dyn MediaProvider>,
    voice: Arc<dyn VoiceGateway>,
    history_turns: usize,
}

impl DispatchRouter {
    pub fn new(
        classifier: IntentClassifier,
        conversations: ConversationStore,
        database: Database,
        completion: Arc<dyn CompletionService>,
        media: Arc<dyn MediaProvider>,
        voice: Arc<dyn VoiceGateway>,
        history_turns: usize,
    ) -> Self {
        Self {
            classifier,
            conversations,
            database,
            completion,
            media,
            voice,
            history_turns,
        }
    }

    pub async fn handle(&self, msg: &InboundMessage, responder: &dyn Responder) -> DispatchOutcome {
        let request_id = Uuid::new_v4();
        info!(
            "[{request_id}] /fefe | User: {} | Channel: #{} | Length: {}",
            msg.actor,
            msg.channel_name,
            msg.text.len()
        );

        let label = match self.classifier.classify(&msg.text) {
            Ok(label) => label,
            Err(e) => {
                warn!("[{request_id}] Classification failed: {e}");
                send(responder, &fallback_message(), request_id).await;
                self.record(msg, "", ERROR_LABEL, request_id).await;
                return DispatchOutcome::Fallback;
            }
        };
        debug!("[{request_id}] Classified as {label}");

        let result = match label {
            IntentLabel::Reminder => self.handle_reminder(msg, responder, request_id).await,
            IntentLabel::Other => self.handle_completion(msg, responder, request_id).await,
            IntentLabel::Media => self.handle_media(msg, responder, request_id).await,
        };

        match result {
            Ok(output) => {
                self.record(msg, &output, label.as_str(), request_id).await;
                DispatchOutcome::Handled(label)
            }
            Err(e) => {
                error!("[{request_id}] {label} handler failed: {e:#}");
                send(responder, HANDLER_FAILURE_MESSAGE, request_id).await;
                self.record(msg, "", label.as_str(), request_id).await;
                DispatchOutcome::Failed(label)
            }
        }
    }

    /// Returns the text stored as the record output
    async fn handle_reminder(&self, msg: &InboundMessage, responder: &dyn Responder, request_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let reply = self
            .completion
            .complete(&reminder_turns(&msg.text, now), &SamplingParams::extraction())
            .await?;

        match parse_reminder_reply(&reply, now) {
            Ok(parsed) => {
                let id = self
                    .database
                    .add_reminder(&NewReminder {
                        owner: msg.actor.clone(),
                        body_text: parsed.message,
                        channel_id: msg.channel_id.clone(),
                        channel_name: msg.channel_name.clone(),
                        due_at: parsed.due_at,
                    })
                    .await?;
                let confirmation = confirmation_text(parsed.due_at);
                info!("[{request_id}] Reminder #{id} scheduled for {}", parsed.due_at);
                responder.say(&confirmation).await?;
                Ok(confirmation)
            }
            Err(HandlerFormatError::PastTime(due)) => {
                info!("[{request_id}] Rejected reminder in the past ({due})");
                responder.say(PAST_TIME_MESSAGE).await?;
                Ok(PAST_TIME_MESSAGE.to_string())
            }
            Err(e) => {
                warn!("[{request_id}] Could not extract a reminder: {e}");
                if reply.trim().is_empty() {
                    return Err(anyhow!("empty completion for reminder request"));
                }
                responder.say_chunked(&reply).await?;
                Ok(reply)
            }
        }
    }

    async fn handle_completion(&self, msg: &InboundMessage, responder: &dyn Responder, request_id: Uuid) -> Result<String> {
        let history = self.conversations.recent_for(&msg.channel_id, self.history_turns).await?;
        debug!("[{request_id}] Replaying {} history records", history.len());

        let mut turns = vec![Turn::system(SYSTEM_PROMPT)];
        for record in &history {
            turns.push(Turn::user(record.input_text.clone()));
            if !record.output_text.is_empty() {
                turns.push(Turn::assistant(record.output_text.clone()));
            }
        }
        turns.push(Turn::user(msg.text.clone()));

        let reply = self.completion.complete(&turns, &SamplingParams::default()).await?;
        if reply.is_empty() {
            return Err(anyhow!("completion service returned an empty reply"));
        }
        responder.say_chunked(&reply).await?;
        Ok(reply)
    }

    async fn handle_media(&self, msg: &InboundMessage, responder: &dyn Responder, request_id: Uuid) -> Result<String> {
        let target = msg
            .guild_id
            .and_then(|guild_id| self.voice.voice_channel_of(guild_id, msg.actor_id).map(|vc| (guild_id, vc)));
        let Some((guild_id, voice_channel_id)) = target else {
            debug!("[{request_id}] {} is not in a voice channel", msg.actor);
            responder.say(JOIN_VOICE_MESSAGE).await?;
            return Ok(String::new());
        };

        let raw_query = self
            .completion
            .complete(&search_query_turns(&msg.text), &SamplingParams::extraction())
            .await?;
        let query = clean_query(&raw_query);
        if query.is_empty() {
            return Err(anyhow!("completion service returned an empty search query"));
        }
        info!("[{request_id}] Media search query: '{query}'");

        let outcome = play_top_result(
            self.media.as_ref(),
            self.voice.as_ref(),
            guild_id,
            voice_channel_id,
            &query,
        )
        .await?;
        responder.say(&outcome.message()).await?;
        Ok(query)
    }

    async fn record(&self, msg: &InboundMessage, output: &str, classified_as: &str, request_id: Uuid) {
        if let Err(e) = self
            .conversations
            .append(
                &msg.actor,
                &msg.text,
                self.completion.model_name(),
                output,
                &msg.channel_id,
                &msg.channel_name,
                classified_as,
            )
            .await
        {
            error!("[{request_id}] Failed to record conversation: {e:#}");
        }
    }
}

async fn send(responder: &dyn Responder, text: &str, request_id: Uuid) {
    if let Err(e) = responder.say(text).await {
        error!("[{request_id}] Failed to send reply: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ConversationRecord;
    use crate::core::PlaybackError;
    use crate::features::completion::Role;
    use crate::features::media::{MediaItem, PlayableSource};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FakeCompletion {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<Vec<Turn>>>,
    }

    impl FakeCompletion {
        fn replying(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionService for FakeCompletion {
        async fn complete(&self, turns: &[Turn], _params: &SamplingParams) -> Result<String> {
            self.calls.lock().await.push(turns.to_vec());
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no scripted reply")))
        }

        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    #[derive(Default)]
    struct FakeMedia {
        items: Vec<MediaItem>,
    }

    #[async_trait]
    impl MediaProvider for FakeMedia {
        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<MediaItem>> {
            Ok(self.items.iter().take(limit).cloned().collect())
        }

        async fn fetch_playable(&self, id: &str) -> Result<PlayableSource> {
            let item = self.items.iter().find(|i| i.id == id).ok_or_else(|| anyhow!("unknown id"))?;
            Ok(PlayableSource {
                title: item.title.clone(),
                url: item.short_url(),
                stream_url: format!("https://stream.example/{id}"),
            })
        }
    }

    #[derive(Default)]
    struct FakeVoice {
        voice_channel: Option<u64>,
        unconfigured: bool,
        played: Mutex<Vec<(u64, u64, String)>>,
    }

    #[async_trait]
    impl VoiceGateway for FakeVoice {
        fn voice_channel_of(&self, _guild_id: u64, _user_id: u64) -> Option<u64> {
            self.voice_channel
        }

        fn can_join(&self, _guild_id: u64, _voice_channel_id: u64) -> bool {
            true
        }

        async fn play(&self, guild_id: u64, voice_channel_id: u64, source: &PlayableSource) -> Result<()> {
            if self.unconfigured {
                return Err(PlaybackError::NotConfigured.into());
            }
            self.played.lock().await.push((guild_id, voice_channel_id, source.title.clone()));
            Ok(())
        }

        async fn stop(&self, _guild_id: u64) -> Result<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Responder for Recorder {
        async fn say(&self, text: &str) -> Result<()> {
            self.sent.lock().await.push(text.to_string());
            Ok(())
        }
    }

    impl Recorder {
        async fn sent(&self) -> Vec<String> {
            self.sent.lock().await.clone()
        }
    }

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            actor: "ana".to_string(),
            actor_id: 42,
            guild_id: Some(7),
            channel_id: "100".to_string(),
            channel_name: "general".to_string(),
            text: text.to_string(),
        }
    }

    struct Harness {
        db: Database,
        router: DispatchRouter,
        completion: Arc<FakeCompletion>,
        voice: Arc<FakeVoice>,
    }

    async fn harness(trained: bool, replies: Vec<Result<String>>, voice: FakeVoice, media: FakeMedia) -> Harness {
        let db = Database::new(":memory:").await.unwrap();
        let classifier = IntentClassifier::new(500);
        if trained {
            classifier.train_with(&[]).unwrap();
        }
        let completion = FakeCompletion::replying(replies);
        let voice = Arc::new(voice);
        let router = DispatchRouter::new(
            classifier,
            ConversationStore::new(db.clone(), 200),
            db.clone(),
            completion.clone(),
            Arc::new(media),
            voice.clone(),
            5,
        );
        Harness { db, router, completion, voice }
    }

    async fn records(db: &Database) -> Vec<ConversationRecord> {
        db.recent_conversations("100", 50).await.unwrap()
    }

    #[tokio::test]
    async fn test_untrained_router_falls_back_with_one_error_record() {
        let h = harness(false, vec![], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Remind me to call mom at 3pm."), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Fallback);
        assert_eq!(responder.sent().await, vec![fallback_message()]);
        let stored = records(&h.db).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].classified_as, ERROR_LABEL);
        assert_eq!(stored[0].output_text, "");
        assert!(h.completion.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_vocabulary_falls_back() {
        let h = harness(true, vec![], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("xyzzy plugh"), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Fallback);
        assert_eq!(records(&h.db).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reminder_is_stored_and_confirmed() {
        let due = (Utc::now() + Duration::days(1)).format("%Y-%m-%d %H:%M:00").to_string();
        let reply = format!(r#"{{"message": "Call mom", "reminder_time": "{due}"}}"#);
        let h = harness(true, vec![Ok(reply)], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Remind me to call mom at 3pm."), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Handled(IntentLabel::Reminder));
        let expected = format!("Reminder set for {due}.");
        assert_eq!(responder.sent().await, vec![expected.clone()]);

        let reminders = h.db.reminders_for_owner("ana").await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].body_text, "Call mom");
        assert_eq!(reminders[0].due_at, due);
        assert_eq!(reminders[0].channel_name, "general");

        let stored = records(&h.db).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].output_text, expected);
        assert_eq!(stored[0].classified_as, "reminder");
        assert_eq!(stored[0].handler_label, "test-model");
    }

    #[tokio::test]
    async fn test_malformed_reminder_reply_is_shown_raw() {
        let raw = "I'm not sure when you want that reminder.";
        let h = harness(true, vec![Ok(raw.to_string())], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Remind me to charge my phone."), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Handled(IntentLabel::Reminder));
        assert_eq!(responder.sent().await, vec![raw.to_string()]);
        assert_eq!(h.db.count_reminders().await.unwrap(), 0);
        assert_eq!(records(&h.db).await[0].output_text, raw);
    }

    #[tokio::test]
    async fn test_past_reminder_is_rejected() {
        let reply = r#"{"message": "Too late", "reminder_time": "2001-01-01 00:00:00"}"#.to_string();
        let h = harness(true, vec![Ok(reply)], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        h.router.handle(&message("Remind me to charge my phone."), &responder).await;

        assert_eq!(responder.sent().await, vec![PAST_TIME_MESSAGE.to_string()]);
        assert_eq!(h.db.count_reminders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_completion_replays_history_and_chunks_reply() {
        let long_reply = ["a".repeat(1500), "b".repeat(1500), "c".repeat(10)].join("\n");
        let h = harness(true, vec![Ok(long_reply.clone())], FakeVoice::default(), FakeMedia::default()).await;
        let store = ConversationStore::new(h.db.clone(), 200);
        store.append("bo", "first question", "m", "first answer", "100", "general", "other").await.unwrap();
        store.append("bo", "unlabeled", "m", "", "100", "general", ERROR_LABEL).await.unwrap();
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Can you tell me a joke?"), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Handled(IntentLabel::Other));
        let sent = responder.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent.join("\n"), long_reply);

        let calls = h.completion.calls.lock().await;
        let turns = &calls[0];
        let replay: Vec<(Role, &str)> = turns.iter().skip(1).map(|t| (t.role, t.content.as_str())).collect();
        assert_eq!(
            replay,
            vec![
                (Role::User, "first question"),
                (Role::Assistant, "first answer"),
                (Role::User, "unlabeled"),
                (Role::User, "Can you tell me a joke?"),
            ]
        );
        assert_eq!(records(&h.db).await.len(), 3);
    }

    #[tokio::test]
    async fn test_completion_failure_is_reported_and_recorded() {
        let h = harness(true, vec![Err(anyhow!("timed out"))], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Can you tell me a joke?"), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Failed(IntentLabel::Other));
        assert_eq!(responder.sent().await, vec![HANDLER_FAILURE_MESSAGE.to_string()]);
        let stored = records(&h.db).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].output_text, "");
    }

    #[tokio::test]
    async fn test_media_without_voice_channel() {
        let h = harness(true, vec![], FakeVoice::default(), FakeMedia::default()).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Play Spirit in the Sky."), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Handled(IntentLabel::Media));
        assert_eq!(responder.sent().await, vec![JOIN_VOICE_MESSAGE.to_string()]);
        let stored = records(&h.db).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].output_text, "");
        assert_eq!(stored[0].classified_as, "media");
        assert!(h.completion.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_media_plays_top_result() {
        let media = FakeMedia {
            items: vec![MediaItem {
                title: "Spirit in the Sky".to_string(),
                id: "abcdefghijk".to_string(),
            }],
        };
        let voice = FakeVoice {
            voice_channel: Some(55),
            ..FakeVoice::default()
        };
        let h = harness(true, vec![Ok("\"Spirit in the Sky\"".to_string())], voice, media).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Play Spirit in the Sky."), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Handled(IntentLabel::Media));
        assert_eq!(
            responder.sent().await,
            vec!["### Playing: Spirit in the Sky\nhttps://youtu.be/abcdefghijk".to_string()]
        );
        assert_eq!(
            *h.voice.played.lock().await,
            vec![(7, 55, "Spirit in the Sky".to_string())]
        );
        assert_eq!(records(&h.db).await[0].output_text, "Spirit in the Sky");
    }

    #[tokio::test]
    async fn test_media_with_no_results() {
        let voice = FakeVoice {
            voice_channel: Some(55),
            ..FakeVoice::default()
        };
        let h = harness(true, vec![Ok("obscure".to_string())], voice, FakeMedia::default()).await;
        let responder = Recorder::default();

        h.router.handle(&message("Play Spirit in the Sky."), &responder).await;

        assert_eq!(responder.sent().await, vec!["No results found for 'obscure'.".to_string()]);
        assert!(h.voice.played.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_media_without_playback_relay_is_not_announced_as_playing() {
        let media = FakeMedia {
            items: vec![MediaItem {
                title: "Spirit in the Sky".to_string(),
                id: "abcdefghijk".to_string(),
            }],
        };
        let voice = FakeVoice {
            voice_channel: Some(55),
            unconfigured: true,
            ..FakeVoice::default()
        };
        let h = harness(true, vec![Ok("Spirit in the Sky".to_string())], voice, media).await;
        let responder = Recorder::default();

        let outcome = h.router.handle(&message("Play Spirit in the Sky."), &responder).await;

        assert_eq!(outcome, DispatchOutcome::Handled(IntentLabel::Media));
        let sent = responder.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Voice playback isn't set up"), "{}", sent[0]);
        assert!(!sent[0].contains("### Playing"));
        assert!(h.voice.played.lock().await.is_empty());
        assert_eq!(records(&h.db).await.len(), 1);
    }
}
