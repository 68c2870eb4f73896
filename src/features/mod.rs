//! # Features
//!
//! One module per capability. Each carries its own version header.

pub mod classifier;
pub mod completion;
pub mod conversation;
pub mod dispatch;
pub mod media;
pub mod reminders;

pub use classifier::{IntentClassifier, IntentLabel, LabelOutcome, TrainingSummary};
pub use completion::{CompletionService, OpenAiCompletion, SamplingParams, Turn};
pub use conversation::ConversationStore;
pub use dispatch::{DispatchOutcome, DispatchRouter, InboundMessage};
pub use media::{MediaItem, MediaProvider, PlayableSource, YouTubeProvider};
pub use reminders::{ReminderScheduler, TickReport};
