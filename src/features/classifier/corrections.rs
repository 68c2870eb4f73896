//! Label corrections for the caller's most recent message

use anyhow::Result;
use log::info;

use super::IntentLabel;
use crate::database::Database;
use crate::features::conversation::ConversationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOutcome {
    Labeled { label: IntentLabel, input_text: String },
    InvalidLabel(String),
    NoRecord,
}

impl LabelOutcome {
    pub fn message(&self) -> String {
        match self {
            LabelOutcome::Labeled { label, input_text } => {
                format!("Last prompt labeled as: {label} - {input_text}")
            }
            LabelOutcome::InvalidLabel(raw) => format!(
                "Invalid label `{raw}`. Use one of {}: `reminder` to set a reminder, \
                 `media` to play something, or `other` for a regular reply.",
                IntentLabel::valid_list()
            ),
            LabelOutcome::NoRecord => "No previous prompt found to label.".to_string(),
        }
    }
}

/// Copy the caller's latest record in `channel_id` into the Label Store under `raw_label`
pub async fn label_last(
    conversations: &ConversationStore,
    database: &Database,
    channel_id: &str,
    actor: &str,
    raw_label: &str,
) -> Result<LabelOutcome> {
    let label = match raw_label.parse::<IntentLabel>() {
        Ok(label) => label,
        Err(_) => return Ok(LabelOutcome::InvalidLabel(raw_label.trim().to_string())),
    };

    let Some(record) = conversations.latest_for(channel_id, actor).await? else {
        return Ok(LabelOutcome::NoRecord);
    };

    database.insert_labeled_conversation(&record, label.as_str()).await?;
    info!("🏷️ {actor} labeled conversation #{} as {label}", record.id);

    Ok(LabelOutcome::Labeled {
        label,
        input_text: record.input_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::conversation::ERROR_LABEL;

    async fn store() -> (Database, ConversationStore) {
        let db = Database::new(":memory:").await.unwrap();
        (db.clone(), ConversationStore::new(db, 200))
    }

    #[tokio::test]
    async fn test_invalid_label_leaves_label_store_unchanged() {
        let (db, conversations) = store().await;
        conversations
            .append("ana", "blast some synthwave", "m", "", "1", "general", ERROR_LABEL)
            .await
            .unwrap();

        let outcome = label_last(&conversations, &db, "1", "ana", "music").await.unwrap();

        assert_eq!(outcome, LabelOutcome::InvalidLabel("music".to_string()));
        assert!(outcome.message().starts_with("Invalid label `music`"));
        assert_eq!(db.count_labeled_conversations().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_labels_latest_record_for_actor_and_channel() {
        let (db, conversations) = store().await;
        conversations.append("ana", "older", "m", "", "1", "general", "other").await.unwrap();
        conversations.append("ana", "blast some synthwave", "m", "", "1", "general", "other").await.unwrap();
        conversations.append("bo", "not mine", "m", "", "1", "general", "other").await.unwrap();
        conversations.append("ana", "other channel", "m", "", "2", "random", "other").await.unwrap();

        let outcome = label_last(&conversations, &db, "1", "ana", "Media").await.unwrap();

        assert_eq!(
            outcome.message(),
            "Last prompt labeled as: media - blast some synthwave"
        );
        assert_eq!(
            db.corrected_examples().await.unwrap(),
            vec![("blast some synthwave".to_string(), "media".to_string())]
        );
    }

    #[tokio::test]
    async fn test_youtube_alias_is_stored_as_media() {
        let (db, conversations) = store().await;
        conversations.append("ana", "play jazz", "m", "", "1", "general", "other").await.unwrap();

        label_last(&conversations, &db, "1", "ana", "youtube").await.unwrap();

        assert_eq!(db.corrected_examples().await.unwrap()[0].1, "media");
    }

    #[tokio::test]
    async fn test_no_record_to_label() {
        let (db, conversations) = store().await;
        let outcome = label_last(&conversations, &db, "1", "ana", "reminder").await.unwrap();
        assert_eq!(outcome, LabelOutcome::NoRecord);
        assert_eq!(db.count_labeled_conversations().await.unwrap(), 0);
    }
}
