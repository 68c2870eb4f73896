//! Admin slash commands: /retrain, /clear_all_reminders

use serenity::builder::CreateApplicationCommand;
use serenity::model::permissions::Permissions;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_retrain_command(), create_clear_all_reminders_command()]
}

/// Permission checks are repeated in the handlers; these defaults only hide the commands
fn create_retrain_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("retrain")
        .description("Retrain the intent classifier from seeds and label corrections (Admin)")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .to_owned()
}

fn create_clear_all_reminders_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("clear_all_reminders")
        .description("Delete every reminder on the bot (Admin)")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .to_owned()
}
