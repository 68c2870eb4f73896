//! # Feature: Conversation Store
//!
//! Bounded log of routed messages per channel. Feeds history into completion
//! replies and supplies the record that `/label_last` corrects.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};

use crate::database::{ConversationRecord, Database, NewConversation};

/// `classified_as` value written when the classifier could not label a message
pub const ERROR_LABEL: &str = "ERROR";

#[derive(Clone)]
pub struct ConversationStore {
    database: Database,
    capacity: usize,
}

impl ConversationStore {
    pub fn new(database: Database, capacity: usize) -> Self {
        Self { database, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Persist one routed message, stamped with the current time
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        actor: &str,
        input_text: &str,
        handler_label: &str,
        output_text: &str,
        channel_id: &str,
        channel_name: &str,
        classified_as: &str,
    ) -> Result<i64> {
        let id = self
            .database
            .insert_conversation(&NewConversation {
                actor: actor.to_string(),
                input_text: input_text.to_string(),
                handler_label: handler_label.to_string(),
                output_text: output_text.to_string(),
                channel_id: channel_id.to_string(),
                channel_name: channel_name.to_string(),
                classified_as: classified_as.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        debug!("Recorded conversation #{id} in #{channel_name} as {classified_as}");
        Ok(id)
    }

    /// Up to `limit` records for a channel in chronological order, ready for replay
    pub async fn recent_for(&self, channel_id: &str, limit: usize) -> Result<Vec<ConversationRecord>> {
        let mut records = self.database.recent_conversations(channel_id, limit).await?;
        records.reverse();
        Ok(records)
    }

    pub async fn latest_for(&self, channel_id: &str, actor: &str) -> Result<Option<ConversationRecord>> {
        self.database.latest_conversation_for(channel_id, actor).await
    }

    /// Trim the oldest records once the store grows past capacity.
    ///
    /// Keeps `capacity + 1` records, the same margin the store has always had.
    pub async fn evict_if_over_capacity(&self) -> Result<usize> {
        let count = self.database.count_conversations().await?;
        let excess = count - self.capacity as i64 - 1;
        if excess <= 0 {
            return Ok(0);
        }

        let removed = self.database.delete_oldest_conversations(excess).await?;
        info!("🧹 Evicted {removed} old conversation records (capacity {})", self.capacity);
        Ok(removed)
    }
}
