// Core layer - shared types and configuration
pub mod core;

// Features layer - classifier, routing, reminders, media
pub mod features;

// Infrastructure
pub mod database;
pub mod gateway;

// Application layer
pub mod commands;

pub use core::Config;

pub use features::{
    // Routing
    DispatchRouter, InboundMessage, IntentClassifier, IntentLabel,
    // Stores
    ConversationStore,
    // Collaborators
    CompletionService, MediaProvider, OpenAiCompletion, YouTubeProvider,
    // Reminders
    ReminderScheduler,
};
