//! Routing slash commands: /fefe, /label_last

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_fefe_command(), create_label_last_command()]
}

fn create_fefe_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("fefe")
        .description("Ask Fefe anything: questions, reminders, or music")
        .dm_permission(false)
        .create_option(|option| {
            option
                .name("message")
                .description("What you want Fefe to do")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .to_owned()
}

fn create_label_last_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("label_last")
        .description("Correct how Fefe understood your last message in this channel")
        .create_option(|option| {
            option
                .name("label")
                .description("What your last message should have been treated as")
                .kind(CommandOptionType::String)
                .required(true)
                .add_string_choice("other - regular reply", "other")
                .add_string_choice("reminder - set a reminder", "reminder")
                .add_string_choice("media - play or find a video", "media")
        })
        .to_owned()
}
