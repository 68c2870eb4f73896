//! # Feature: Intent Classifier
//!
//! Routes free text to one handler label. Trained at startup from built-in seed
//! examples plus user label corrections, and retrained on demand by admins.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: `media` label replaces `youtube` (still accepted as an alias)
//! - 1.0.0: Initial release with perceptron model and swappable state

pub mod corrections;
pub mod model;
pub mod seeds;

pub use corrections::{label_last, LabelOutcome};
pub use model::{tokenize, train, ClassifierState, TrainingExample};
pub use seeds::seed_examples;

use anyhow::Result;
use log::{info, warn};
use parking_lot::RwLock;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::ClassificationError;
use crate::database::Database;

/// Closed set of handler labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentLabel {
    Other,
    Reminder,
    Media,
}

impl IntentLabel {
    pub const ALL: [IntentLabel; 3] = [IntentLabel::Other, IntentLabel::Reminder, IntentLabel::Media];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLabel::Other => "other",
            IntentLabel::Reminder => "reminder",
            IntentLabel::Media => "media",
        }
    }

    /// Comma separated list for user-facing help text
    pub fn valid_list() -> String {
        IntentLabel::ALL
            .iter()
            .map(|l| format!("`{}`", l.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown label `{}`", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for IntentLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "other" => Ok(IntentLabel::Other),
            "reminder" => Ok(IntentLabel::Reminder),
            "media" | "youtube" => Ok(IntentLabel::Media),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

/// What a training run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    pub seed_count: usize,
    pub corrected_count: usize,
    pub vocabulary_size: usize,
    pub epochs_run: usize,
}

/// Shared handle to the current model.
///
/// Readers clone the inner `Arc` and classify without holding the lock, so a
/// retrain never blocks an in-flight classification.
#[derive(Clone)]
pub struct IntentClassifier {
    state: Arc<RwLock<Option<Arc<ClassifierState>>>>,
    epochs: usize,
}

impl IntentClassifier {
    /// An untrained classifier; `classify` fails until `retrain` succeeds
    pub fn new(epochs: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(None)),
            epochs,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn snapshot(&self) -> Option<Arc<ClassifierState>> {
        self.state.read().clone()
    }

    pub fn classify(&self, text: &str) -> Result<IntentLabel, ClassificationError> {
        let state = self.snapshot().ok_or(ClassificationError::NotTrained)?;
        state.classify(text)
    }

    /// Train on seeds plus `corrected` and swap the new state in
    pub fn train_with(&self, corrected: &[TrainingExample]) -> Result<TrainingSummary, ClassificationError> {
        let seeds = seed_examples();
        let state = train(&seeds, corrected, self.epochs)?;
        let summary = TrainingSummary {
            seed_count: seeds.len(),
            corrected_count: corrected.len(),
            vocabulary_size: state.vocabulary_size(),
            epochs_run: state.epochs_run(),
        };
        *self.state.write() = Some(Arc::new(state));
        Ok(summary)
    }

    /// Reload corrections from the Label Store and retrain off the async runtime
    pub async fn retrain(&self, database: &Database) -> Result<TrainingSummary> {
        let corrected = load_corrected_examples(database).await?;
        let classifier = self.clone();
        let summary = tokio::task::spawn_blocking(move || classifier.train_with(&corrected)).await??;

        info!(
            "🧠 Intent classifier trained | Seeds: {} | Corrections: {} | Vocabulary: {} | Epochs: {}",
            summary.seed_count, summary.corrected_count, summary.vocabulary_size, summary.epochs_run
        );
        Ok(summary)
    }
}

/// Corrections whose label no longer exists are skipped
async fn load_corrected_examples(database: &Database) -> Result<Vec<TrainingExample>> {
    let rows = database.corrected_examples().await?;
    let mut examples = Vec::with_capacity(rows.len());
    for (text, label) in rows {
        match label.parse::<IntentLabel>() {
            Ok(label) => examples.push(TrainingExample::new(text, label)),
            Err(e) => warn!("Skipping stored correction for `{text}`: {e}"),
        }
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NewConversation;
    use chrono::Utc;

    // Early stopping keeps this cheap once the set separates
    const EPOCHS: usize = 500;

    #[test]
    fn test_label_parsing() {
        assert_eq!("reminder".parse::<IntentLabel>().unwrap(), IntentLabel::Reminder);
        assert_eq!(" OTHER ".parse::<IntentLabel>().unwrap(), IntentLabel::Other);
        assert_eq!("youtube".parse::<IntentLabel>().unwrap(), IntentLabel::Media);
        assert!("game".parse::<IntentLabel>().is_err());
        assert!("".parse::<IntentLabel>().is_err());
    }

    #[test]
    fn test_untrained_classifier_fails() {
        let classifier = IntentClassifier::new(EPOCHS);
        assert!(!classifier.is_trained());
        assert_eq!(
            classifier.classify("remind me to stretch").unwrap_err(),
            ClassificationError::NotTrained
        );
    }

    #[test]
    fn test_every_seed_round_trips_after_training() {
        let classifier = IntentClassifier::new(EPOCHS);
        classifier.train_with(&[]).unwrap();

        for example in seed_examples() {
            assert_eq!(
                classifier.classify(&example.text).unwrap(),
                example.label,
                "misclassified seed: {}",
                example.text
            );
        }
    }

    #[test]
    fn test_snapshot_survives_retrain() {
        let classifier = IntentClassifier::new(EPOCHS);
        classifier.train_with(&[]).unwrap();
        let before = classifier.snapshot().unwrap();

        classifier
            .train_with(&[TrainingExample::new("spin up vinyl tunes", IntentLabel::Media)])
            .unwrap();
        let after = classifier.snapshot().unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        // The old state still answers
        assert!(before.classify("Remind me to charge my phone.").is_ok());
    }

    #[tokio::test]
    async fn test_retrain_with_empty_label_store_uses_seeds() {
        let db = Database::new(":memory:").await.unwrap();
        let classifier = IntentClassifier::new(EPOCHS);

        let summary = classifier.retrain(&db).await.unwrap();

        assert_eq!(summary.corrected_count, 0);
        assert_eq!(summary.seed_count, seed_examples().len());
        assert!(classifier.is_trained());
    }

    #[tokio::test]
    async fn test_retrain_includes_stored_corrections() {
        let db = Database::new(":memory:").await.unwrap();
        db.insert_conversation(&NewConversation {
            actor: "ana".to_string(),
            input_text: "blast some synthwave".to_string(),
            handler_label: "gpt-4o-mini".to_string(),
            output_text: String::new(),
            channel_id: "1".to_string(),
            channel_name: "general".to_string(),
            classified_as: "other".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        let record = db.latest_conversation_for("1", "ana").await.unwrap().unwrap();
        db.insert_labeled_conversation(&record, "media").await.unwrap();
        db.insert_labeled_conversation(&record, "retired-label").await.unwrap();

        let classifier = IntentClassifier::new(EPOCHS);
        let summary = classifier.retrain(&db).await.unwrap();

        assert_eq!(summary.corrected_count, 1);
        assert_eq!(classifier.classify("blast some synthwave").unwrap(), IntentLabel::Media);
    }
}
