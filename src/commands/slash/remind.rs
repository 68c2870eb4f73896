//! Reminder slash commands: /reminder, /reminders, /clear_reminders

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_reminder_command(),
        create_reminders_command(),
        create_clear_reminders_command(),
    ]
}

fn create_reminder_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("reminder")
        .description("Set a reminder for an exact date and time (UTC)")
        .dm_permission(false)
        .create_option(|option| {
            option
                .name("date")
                .description("Date as YYYY-MM-DD")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("time")
                .description("Time as HH:MM (24 hour, UTC)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("message")
                .description("What to remind you about")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .to_owned()
}

fn create_reminders_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("reminders")
        .description("List your pending reminders")
        .to_owned()
}

fn create_clear_reminders_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("clear_reminders")
        .description("Delete all of your reminders")
        .to_owned()
}
