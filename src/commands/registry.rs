//! Command handler registry
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Build from the full handler set, dispatch by interaction name
//! - 1.0.0: Initial implementation for handler dispatch

use anyhow::{anyhow, Result};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::CommandContext;
use super::handler::SlashCommandHandler;
use super::handlers::create_all_handlers;

/// Maps command names to their handlers
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn SlashCommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in handler
    pub fn with_all_handlers() -> Self {
        let mut registry = Self::new();
        for handler in create_all_handlers() {
            registry.register(handler);
        }
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn SlashCommandHandler>) {
        for &name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SlashCommandHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Counts names, not handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn command_names(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    pub async fn dispatch(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let name = command.data.name.as_str();
        let handler = self
            .get(name)
            .ok_or_else(|| anyhow!("No handler registered for /{name}"))?;
        handler.handle(ctx, serenity_ctx, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::slash::create_slash_commands;
    use async_trait::async_trait;

    struct MockHandler {
        names: &'static [&'static str],
    }

    #[async_trait]
    impl SlashCommandHandler for MockHandler {
        fn command_names(&self) -> &'static [&'static str] {
            self.names
        }

        async fn handle(
            &self,
            _ctx: Arc<CommandContext>,
            _serenity_ctx: &Context,
            _command: &ApplicationCommandInteraction,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("fefe").is_none());
    }

    #[test]
    fn test_handler_registered_under_every_name() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler {
            names: &["reminder", "reminders"],
        }));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("reminder"));
        assert!(registry.contains("reminders"));
        assert!(!registry.contains("fefe"));
    }

    #[test]
    fn test_every_slash_command_has_a_handler() {
        let registry = CommandRegistry::with_all_handlers();
        for command in create_slash_commands() {
            let name = command.0.get("name").and_then(|v| v.as_str()).unwrap().to_string();
            assert!(registry.contains(&name), "no handler for /{name}");
        }
        assert_eq!(registry.len(), create_slash_commands().len());
    }
}
