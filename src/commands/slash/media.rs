//! Media slash commands: /play, /search_youtube, /stop_music

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_play_command(),
        create_search_youtube_command(),
        create_stop_music_command(),
    ]
}

fn create_play_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("play")
        .description("Play the top YouTube result in your voice channel")
        .dm_permission(false)
        .create_option(|option| {
            option
                .name("query")
                .description("Song or video to play")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .to_owned()
}

fn create_search_youtube_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("search_youtube")
        .description("Show the top YouTube results for a search")
        .create_option(|option| {
            option
                .name("query")
                .description("What to search for")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .to_owned()
}

fn create_stop_music_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("stop_music")
        .description("Stop whatever Fefe is playing in this server")
        .dm_permission(false)
        .to_owned()
}
